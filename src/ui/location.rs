use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};
use ratatui::Frame;

/// How long a blur keeps the suggestion panel alive, so a click on a
/// suggestion (which also blurs the field) still lands
pub const BLUR_HIDE_DELAY: Duration = Duration::from_millis(200);

const PLACEHOLDER: &str = "Ubicación (ej: Palermo, CABA)";

/// Free-text location input with autocomplete over a fixed vocabulary
///
/// The vocabulary is fetched once at startup; every keystroke recomputes
/// the case-insensitive substring matches. The panel shows only while the
/// input is non-empty and at least one match exists.
#[derive(Debug)]
pub struct LocationField {
    vocabulary: Vec<String>,
    input: String,
    matches: Vec<String>,
    panel_open: bool,
    /// Deferred blur-hide deadline, applied by `tick`
    hide_at: Option<Instant>,
    input_area: Rect,
    panel_area: Rect,
}

impl LocationField {
    pub fn new() -> Self {
        Self {
            vocabulary: Vec::new(),
            input: String::new(),
            matches: Vec::new(),
            panel_open: false,
            hide_at: None,
            input_area: Rect::default(),
            panel_area: Rect::default(),
        }
    }

    /// Install the location vocabulary; an empty one is a valid degraded
    /// state (autocomplete simply never offers anything)
    pub fn set_vocabulary(&mut self, vocabulary: Vec<String>) {
        self.vocabulary = vocabulary;
        self.refilter();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn matches(&self) -> &[String] {
        &self.matches
    }

    pub fn panel_open(&self) -> bool {
        self.panel_open
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.refilter();
        self.hide_at = None;
    }

    fn refilter(&mut self) {
        let needle = self.input.to_lowercase();
        self.matches = self
            .vocabulary
            .iter()
            .filter(|entry| entry.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        self.panel_open = !self.input.is_empty() && !self.matches.is_empty();
    }

    /// Feed one key event; returns the new input text whenever it changed
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<String> {
        match key.code {
            KeyCode::Char(c) => {
                self.input.push(c);
                self.hide_at = None;
                self.refilter();
                Some(self.input.clone())
            }
            KeyCode::Backspace => {
                if self.input.pop().is_some() {
                    self.hide_at = None;
                    self.refilter();
                    Some(self.input.clone())
                } else {
                    None
                }
            }
            KeyCode::Esc => {
                self.panel_open = false;
                None
            }
            _ => None,
        }
    }

    /// Adopt a suggestion: the input becomes that exact string and the
    /// panel hides
    pub fn pick(&mut self, index: usize) -> Option<String> {
        let picked = self.matches.get(index)?.clone();
        self.input = picked.clone();
        self.panel_open = false;
        self.hide_at = None;
        Some(picked)
    }

    /// The field lost focus; hide the panel, but only after a grace
    /// period so a click on a suggestion fires first
    pub fn blur(&mut self, now: Instant) {
        if self.panel_open {
            self.hide_at = Some(now + BLUR_HIDE_DELAY);
        }
    }

    /// Apply a pending deferred hide once its deadline has passed
    pub fn tick(&mut self, now: Instant) {
        if let Some(deadline) = self.hide_at {
            if now >= deadline {
                self.panel_open = false;
                self.hide_at = None;
            }
        }
    }

    /// Feed one mouse event; returns the picked suggestion, if any
    pub fn handle_mouse(&mut self, mouse: &MouseEvent, now: Instant) -> Option<String> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return None;
        }
        let position = Position::new(mouse.column, mouse.row);
        if self.panel_open && self.panel_area.contains(position) {
            let index = (mouse.row - self.panel_area.y) as usize;
            return self.pick(index);
        }
        if !self.input_area.contains(position) {
            self.blur(now);
        }
        None
    }

    pub fn render(&mut self, frame: &mut Frame<'_>, area: Rect, focused: bool) {
        self.input_area = area;

        let style = if focused {
            Style::default().fg(Color::Yellow)
        } else if self.input.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        let shown = if self.input.is_empty() {
            PLACEHOLDER
        } else {
            self.input.as_str()
        };
        frame.render_widget(Paragraph::new(Line::from(shown)).style(style), area);

        if !self.panel_open {
            self.panel_area = Rect::default();
            return;
        }

        let height = (self.matches.len() as u16).saturating_add(2);
        let panel = Rect::new(area.x, area.y.saturating_add(1), area.width, height)
            .intersection(frame.area());
        frame.render_widget(Clear, panel);

        let block = Block::default().borders(Borders::ALL);
        self.panel_area = block.inner(panel);

        let items: Vec<ListItem> = self
            .matches
            .iter()
            .map(|entry| ListItem::new(entry.clone()))
            .collect();
        frame.render_widget(List::new(items).block(block), panel);
    }
}

impl Default for LocationField {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn field() -> LocationField {
        let mut field = LocationField::new();
        field.set_vocabulary(vec![
            "PALERMO".to_string(),
            "BELGRANO".to_string(),
            "RECOLETA".to_string(),
        ]);
        field
    }

    fn type_text(field: &mut LocationField, text: &str) -> Option<String> {
        let mut last = None;
        for c in text.chars() {
            last = field.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        last
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let mut field = field();
        let changed = type_text(&mut field, "pal");
        assert_eq!(changed, Some("pal".to_string()));
        assert_eq!(field.matches(), ["PALERMO".to_string()]);
        assert!(field.panel_open());
    }

    #[test]
    fn no_match_hides_the_panel() {
        let mut field = field();
        type_text(&mut field, "zzz");
        assert!(field.matches().is_empty());
        assert!(!field.panel_open());
    }

    #[test]
    fn empty_input_hides_the_panel() {
        let mut field = field();
        type_text(&mut field, "p");
        assert!(field.panel_open());
        field.handle_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(field.input(), "");
        assert!(!field.panel_open());
    }

    #[test]
    fn picking_a_suggestion_sets_the_exact_string() {
        let mut field = field();
        type_text(&mut field, "ol");
        assert_eq!(field.matches(), ["RECOLETA".to_string()]);
        let picked = field.pick(0);
        assert_eq!(picked, Some("RECOLETA".to_string()));
        assert_eq!(field.input(), "RECOLETA");
        assert!(!field.panel_open());
    }

    #[test]
    fn blur_hide_is_deferred() {
        let mut field = field();
        type_text(&mut field, "pal");
        let t0 = Instant::now();
        field.blur(t0);

        // Still visible inside the grace period: a click can land
        field.tick(t0 + Duration::from_millis(100));
        assert!(field.panel_open());
        assert_eq!(field.pick(0), Some("PALERMO".to_string()));
    }

    #[test]
    fn blur_hide_applies_after_the_delay() {
        let mut field = field();
        type_text(&mut field, "pal");
        let t0 = Instant::now();
        field.blur(t0);
        field.tick(t0 + BLUR_HIDE_DELAY + Duration::from_millis(50));
        assert!(!field.panel_open());
    }

    #[test]
    fn typing_cancels_a_pending_hide() {
        let mut field = field();
        type_text(&mut field, "pal");
        let t0 = Instant::now();
        field.blur(t0);
        type_text(&mut field, "e");
        field.tick(t0 + BLUR_HIDE_DELAY + Duration::from_millis(50));
        assert!(field.panel_open());
    }

    #[test]
    fn empty_vocabulary_is_a_valid_degraded_state() {
        let mut field = LocationField::new();
        field.set_vocabulary(Vec::new());
        type_text(&mut field, "palermo");
        assert!(!field.panel_open());
        assert_eq!(field.input(), "palermo");
    }
}
