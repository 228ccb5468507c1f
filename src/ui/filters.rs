use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, MouseEvent};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::api::FilterCriteria;
use crate::models::OperationKind;
use crate::ui::location::LocationField;
use crate::ui::select::{SelectOption, SelectState};

/// Named price range shorthand expanding to both bounds at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBracket {
    /// Hasta $500K
    Low,
    /// $500K - $1M
    Mid,
    /// Más de $1M
    High,
}

impl PriceBracket {
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "low" => Some(PriceBracket::Low),
            "mid" => Some(PriceBracket::Mid),
            "high" => Some(PriceBracket::High),
            _ => None,
        }
    }

    /// (min, max) price bounds in ARS
    pub fn bounds(self) -> (i64, i64) {
        match self {
            PriceBracket::Low => (0, 500_000),
            PriceBracket::Mid => (500_000, 1_000_000),
            PriceBracket::High => (1_000_000, 999_999_999),
        }
    }
}

/// Which filter control currently has keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterControl {
    Location,
    Operation,
    Bedrooms,
    Price,
    Pets,
    Clear,
}

const FOCUS_ORDER: [FilterControl; 6] = [
    FilterControl::Location,
    FilterControl::Operation,
    FilterControl::Bedrooms,
    FilterControl::Price,
    FilterControl::Pets,
    FilterControl::Clear,
];

/// Holds the active search constraints and the controls that edit them
///
/// Every accepted edit replaces the whole criteria value in one
/// transition and returns the updated copy to the caller; the caller is
/// responsible for resetting pagination and re-fetching. A price bracket
/// sets both bounds within a single replacement.
pub struct FilterPanel {
    criteria: FilterCriteria,
    location: LocationField,
    operation: SelectState,
    bedrooms: SelectState,
    price: SelectState,
    focus: FilterControl,
    pets_area: Rect,
    clear_area: Rect,
}

impl FilterPanel {
    pub fn new() -> Self {
        let operation = SelectState::new(
            "Tipo",
            vec![
                SelectOption::new("", "Tipo"),
                SelectOption::new("alquiler", "Alquiler"),
                SelectOption::new("venta", "Venta"),
            ],
        );
        let bedrooms = SelectState::new(
            "Habitaciones",
            vec![
                SelectOption::new("", "Habitaciones"),
                SelectOption::new("1", "1+ hab"),
                SelectOption::new("2", "2+ hab"),
                SelectOption::new("3", "3+ hab"),
                SelectOption::new("4", "4+ hab"),
            ],
        );
        let price = SelectState::new(
            "Precio",
            vec![
                SelectOption::new("", "Precio"),
                SelectOption::new("low", "Hasta $500K"),
                SelectOption::new("mid", "$500K - $1M"),
                SelectOption::new("high", "Más de $1M"),
            ],
        );

        Self {
            criteria: FilterCriteria::default(),
            location: LocationField::new(),
            operation,
            bedrooms,
            price,
            focus: FilterControl::Location,
            pets_area: Rect::default(),
            clear_area: Rect::default(),
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn focus(&self) -> FilterControl {
        self.focus
    }

    pub fn set_vocabulary(&mut self, vocabulary: Vec<String>) {
        self.location.set_vocabulary(vocabulary);
    }

    pub fn location_field(&self) -> &LocationField {
        &self.location
    }

    /// True while any dropdown or the suggestion panel is showing
    pub fn any_popup_open(&self) -> bool {
        self.operation.is_open()
            || self.bedrooms.is_open()
            || self.price.is_open()
            || self.location.panel_open()
    }

    /// Apply a pending deferred suggestion-panel hide
    pub fn tick(&mut self, now: Instant) {
        self.location.tick(now);
    }

    /// Replace the criteria in one transition and hand back the new copy
    fn update(&mut self, edit: impl FnOnce(&mut FilterCriteria)) -> FilterCriteria {
        let mut next = self.criteria.clone();
        edit(&mut next);
        self.criteria = next.clone();
        next
    }

    /// Clear every dimension back to "no constraint"
    pub fn reset(&mut self) -> FilterCriteria {
        self.location.clear();
        self.operation.set_value(None);
        self.bedrooms.set_value(None);
        self.price.set_value(None);
        self.update(|criteria| *criteria = FilterCriteria::default())
    }

    fn apply_operation(&mut self, value: &str) -> FilterCriteria {
        let operation = match value {
            "alquiler" => Some(OperationKind::Rental),
            "venta" => Some(OperationKind::Sale),
            _ => None,
        };
        self.update(|criteria| criteria.operation = operation)
    }

    fn apply_bedrooms(&mut self, value: &str) -> FilterCriteria {
        let bedrooms = value.parse::<u32>().ok();
        self.update(|criteria| criteria.bedrooms = bedrooms)
    }

    fn apply_price(&mut self, value: &str) -> FilterCriteria {
        let bounds = PriceBracket::from_value(value).map(PriceBracket::bounds);
        // Both bounds change together, never one at a time
        self.update(|criteria| match bounds {
            Some((min, max)) => {
                criteria.min_price = Some(min);
                criteria.max_price = Some(max);
            }
            None => {
                criteria.min_price = None;
                criteria.max_price = None;
            }
        })
    }

    fn apply_location(&mut self, text: String) -> FilterCriteria {
        let location = if text.is_empty() { None } else { Some(text) };
        self.update(|criteria| criteria.location = location)
    }

    fn toggle_pets(&mut self) -> FilterCriteria {
        let next = match self.criteria.accepts_pets {
            None => Some(true),
            Some(true) => Some(false),
            Some(false) => None,
        };
        self.update(|criteria| criteria.accepts_pets = next)
    }

    fn cycle_focus(&mut self, reverse: bool, now: Instant) {
        if self.focus == FilterControl::Location {
            self.location.blur(now);
        }
        let index = FOCUS_ORDER
            .iter()
            .position(|control| *control == self.focus)
            .unwrap_or(0);
        let next = if reverse {
            (index + FOCUS_ORDER.len() - 1) % FOCUS_ORDER.len()
        } else {
            (index + 1) % FOCUS_ORDER.len()
        };
        self.focus = FOCUS_ORDER[next];
    }

    /// Feed one key event; returns the full updated criteria whenever a
    /// dimension changed
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Option<FilterCriteria> {
        match key.code {
            KeyCode::Tab => {
                self.cycle_focus(false, now);
                return None;
            }
            KeyCode::BackTab => {
                self.cycle_focus(true, now);
                return None;
            }
            _ => {}
        }

        match self.focus {
            FilterControl::Location => {
                let changed = self.location.handle_key(key)?;
                Some(self.apply_location(changed))
            }
            FilterControl::Operation => {
                let value = self.operation.handle_key(key)?;
                Some(self.apply_operation(&value))
            }
            FilterControl::Bedrooms => {
                let value = self.bedrooms.handle_key(key)?;
                Some(self.apply_bedrooms(&value))
            }
            FilterControl::Price => {
                let value = self.price.handle_key(key)?;
                Some(self.apply_price(&value))
            }
            FilterControl::Pets => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => Some(self.toggle_pets()),
                _ => None,
            },
            FilterControl::Clear => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => Some(self.reset()),
                _ => None,
            },
        }
    }

    /// Feed one mouse event; an open dropdown sees it first so an
    /// outside press dismisses it before anything else reacts
    pub fn handle_mouse(&mut self, mouse: &MouseEvent, now: Instant) -> Option<FilterCriteria> {
        use crossterm::event::{MouseButton, MouseEventKind};
        use ratatui::layout::Position;

        if self.operation.is_open() {
            let value = self.operation.handle_mouse(mouse)?;
            return Some(self.apply_operation(&value));
        }
        if self.bedrooms.is_open() {
            let value = self.bedrooms.handle_mouse(mouse)?;
            return Some(self.apply_bedrooms(&value));
        }
        if self.price.is_open() {
            let value = self.price.handle_mouse(mouse)?;
            return Some(self.apply_price(&value));
        }

        if let Some(picked) = self.location.handle_mouse(mouse, now) {
            return Some(self.apply_location(picked));
        }

        if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
            let position = Position::new(mouse.column, mouse.row);
            if self.pets_area.contains(position) {
                return Some(self.toggle_pets());
            }
            if self.clear_area.contains(position) {
                return Some(self.reset());
            }
        }

        self.operation.handle_mouse(mouse);
        self.bedrooms.handle_mouse(mouse);
        self.price.handle_mouse(mouse);
        None
    }

    pub fn render(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let columns = Layout::horizontal([
            Constraint::Percentage(32),
            Constraint::Percentage(15),
            Constraint::Percentage(18),
            Constraint::Percentage(17),
            Constraint::Percentage(10),
            Constraint::Percentage(8),
        ])
        .spacing(1)
        .split(area);

        self.operation
            .render(frame, columns[1], self.focus == FilterControl::Operation);
        self.bedrooms
            .render(frame, columns[2], self.focus == FilterControl::Bedrooms);
        self.price
            .render(frame, columns[3], self.focus == FilterControl::Price);

        self.pets_area = columns[4];
        let pets_label = match self.criteria.accepts_pets {
            None => "Mascotas: -",
            Some(true) => "Mascotas: sí",
            Some(false) => "Mascotas: no",
        };
        let pets_style = if self.focus == FilterControl::Pets {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        frame.render_widget(
            Paragraph::new(Line::from(pets_label)).style(pets_style),
            columns[4],
        );

        self.clear_area = columns[5];
        let clear_style = if self.focus == FilterControl::Clear {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        frame.render_widget(
            Paragraph::new(Line::from("Limpiar")).style(clear_style),
            columns[5],
        );

        // Location last: its suggestion panel overlays the row below
        self.location
            .render(frame, columns[0], self.focus == FilterControl::Location);
    }
}

impl Default for FilterPanel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn now() -> Instant {
        Instant::now()
    }

    fn focus_on(panel: &mut FilterPanel, control: FilterControl) {
        while panel.focus() != control {
            panel.handle_key(key(KeyCode::Tab), now());
        }
    }

    #[test]
    fn bracket_sets_both_bounds_in_one_transition() {
        let mut panel = FilterPanel::new();
        focus_on(&mut panel, FilterControl::Price);

        panel.handle_key(key(KeyCode::Enter), now());
        panel.handle_key(key(KeyCode::Down), now());
        panel.handle_key(key(KeyCode::Down), now());
        let changed = panel.handle_key(key(KeyCode::Enter), now()).unwrap();

        assert_eq!(changed.min_price, Some(500_000));
        assert_eq!(changed.max_price, Some(1_000_000));
        assert_eq!(&changed, panel.criteria());
    }

    #[test]
    fn operation_commit_updates_the_dimension() {
        let mut panel = FilterPanel::new();
        focus_on(&mut panel, FilterControl::Operation);

        panel.handle_key(key(KeyCode::Enter), now());
        panel.handle_key(key(KeyCode::Down), now());
        let changed = panel.handle_key(key(KeyCode::Enter), now()).unwrap();

        assert_eq!(changed.operation, Some(OperationKind::Rental));
    }

    #[test]
    fn empty_option_clears_the_dimension() {
        let mut panel = FilterPanel::new();
        focus_on(&mut panel, FilterControl::Operation);

        panel.handle_key(key(KeyCode::Enter), now());
        panel.handle_key(key(KeyCode::Down), now());
        panel.handle_key(key(KeyCode::Enter), now());
        assert!(panel.criteria().operation.is_some());

        // Re-open and pick the first ("Tipo") entry
        panel.handle_key(key(KeyCode::Enter), now());
        let changed = panel.handle_key(key(KeyCode::Enter), now()).unwrap();
        assert_eq!(changed.operation, None);
    }

    #[test]
    fn typing_location_updates_criteria_per_keystroke() {
        let mut panel = FilterPanel::new();
        panel.set_vocabulary(vec!["PALERMO".to_string()]);

        let changed = panel.handle_key(key(KeyCode::Char('p')), now()).unwrap();
        assert_eq!(changed.location.as_deref(), Some("p"));

        let changed = panel.handle_key(key(KeyCode::Char('a')), now()).unwrap();
        assert_eq!(changed.location.as_deref(), Some("pa"));

        // Deleting the last character removes the constraint entirely
        panel.handle_key(key(KeyCode::Backspace), now());
        let changed = panel.handle_key(key(KeyCode::Backspace), now()).unwrap();
        assert_eq!(changed.location, None);
    }

    #[test]
    fn pets_cycles_through_all_three_states() {
        let mut panel = FilterPanel::new();
        focus_on(&mut panel, FilterControl::Pets);

        let changed = panel.handle_key(key(KeyCode::Enter), now()).unwrap();
        assert_eq!(changed.accepts_pets, Some(true));
        let changed = panel.handle_key(key(KeyCode::Enter), now()).unwrap();
        assert_eq!(changed.accepts_pets, Some(false));
        let changed = panel.handle_key(key(KeyCode::Enter), now()).unwrap();
        assert_eq!(changed.accepts_pets, None);
    }

    #[test]
    fn reset_reports_empty_criteria() {
        let mut panel = FilterPanel::new();
        panel.set_vocabulary(vec!["PALERMO".to_string()]);
        panel.handle_key(key(KeyCode::Char('p')), now());
        focus_on(&mut panel, FilterControl::Price);
        panel.handle_key(key(KeyCode::Enter), now());
        panel.handle_key(key(KeyCode::Down), now());
        panel.handle_key(key(KeyCode::Enter), now());
        assert!(!panel.criteria().is_empty());

        focus_on(&mut panel, FilterControl::Clear);
        let changed = panel.handle_key(key(KeyCode::Enter), now()).unwrap();
        assert!(changed.is_empty());
        assert_eq!(panel.location_field().input(), "");
    }

    #[test]
    fn tab_cycles_focus_and_wraps() {
        let mut panel = FilterPanel::new();
        assert_eq!(panel.focus(), FilterControl::Location);
        for expected in [
            FilterControl::Operation,
            FilterControl::Bedrooms,
            FilterControl::Price,
            FilterControl::Pets,
            FilterControl::Clear,
            FilterControl::Location,
        ] {
            panel.handle_key(key(KeyCode::Tab), now());
            assert_eq!(panel.focus(), expected);
        }
    }

    #[test]
    fn each_change_reports_the_full_criteria() {
        let mut panel = FilterPanel::new();
        focus_on(&mut panel, FilterControl::Bedrooms);
        panel.handle_key(key(KeyCode::Enter), now());
        panel.handle_key(key(KeyCode::Down), now());
        panel.handle_key(key(KeyCode::Down), now());
        let changed = panel.handle_key(key(KeyCode::Enter), now()).unwrap();

        assert_eq!(changed.bedrooms, Some(2));
        assert_eq!(changed.operation, None);
        assert_eq!(changed.location, None);
    }
}
