use std::collections::HashSet;

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use crate::app::FetchState;
use crate::models::Listing;

/// Navigation or card action requested from the results view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    Prev,
    Next,
    Goto(u32),
    OpenDetail(String),
    ToggleFavorite(String),
}

/// Everything the results view needs to draw one frame
pub struct ResultsContext<'a> {
    pub items: &'a [Listing],
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub state: &'a FetchState,
    pub favorites: &'a HashSet<String>,
    pub session_present: bool,
}

/// Listing cards plus the page-number controls derived from the total
/// count; records button rects for mouse hit-testing
pub struct ResultsView {
    selected: usize,
    list_area: Rect,
    prev_area: Rect,
    next_area: Rect,
    page_areas: Vec<(u32, Rect)>,
}

impl ResultsView {
    pub fn new() -> Self {
        Self {
            selected: 0,
            list_area: Rect::default(),
            prev_area: Rect::default(),
            next_area: Rect::default(),
            page_areas: Vec::new(),
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn reset_selection(&mut self) {
        self.selected = 0;
    }

    #[cfg(test)]
    pub(crate) fn page_buttons(&self) -> Vec<u32> {
        self.page_areas.iter().map(|(page, _)| *page).collect()
    }

    /// Feed one key event; prev/next are inert at their respective edges
    pub fn handle_key(&mut self, key: KeyEvent, ctx: &ResultsContext<'_>) -> Option<PageAction> {
        match key.code {
            KeyCode::Left => {
                if ctx.page > 1 {
                    Some(PageAction::Prev)
                } else {
                    None
                }
            }
            KeyCode::Right => {
                if ctx.page < ctx.total_pages {
                    Some(PageAction::Next)
                } else {
                    None
                }
            }
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                if !ctx.items.is_empty() {
                    self.selected = (self.selected + 1).min(ctx.items.len() - 1);
                }
                None
            }
            KeyCode::Enter => ctx
                .items
                .get(self.selected)
                .map(|listing| PageAction::OpenDetail(listing.id.clone())),
            KeyCode::Char('f') => {
                if !ctx.session_present {
                    return None;
                }
                ctx.items
                    .get(self.selected)
                    .map(|listing| PageAction::ToggleFavorite(listing.id.clone()))
            }
            _ => None,
        }
    }

    pub fn handle_mouse(
        &mut self,
        mouse: &MouseEvent,
        ctx: &ResultsContext<'_>,
    ) -> Option<PageAction> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return None;
        }
        let position = Position::new(mouse.column, mouse.row);

        if self.prev_area.contains(position) {
            return Some(PageAction::Prev);
        }
        if self.next_area.contains(position) {
            return Some(PageAction::Next);
        }
        for (page, area) in &self.page_areas {
            if area.contains(position) {
                return Some(PageAction::Goto(*page));
            }
        }
        if self.list_area.contains(position) {
            let index = (mouse.row - self.list_area.y) as usize;
            if index < ctx.items.len() {
                self.selected = index;
            }
        }
        None
    }

    pub fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &ResultsContext<'_>) {
        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

        self.render_header(frame, rows[0], ctx);
        self.render_body(frame, rows[1], ctx);
        self.render_pagination(frame, rows[2], ctx);
    }

    fn render_header(&self, frame: &mut Frame<'_>, area: Rect, ctx: &ResultsContext<'_>) {
        let from = u64::from((ctx.page - 1) * ctx.limit + 1).min(ctx.total);
        let to = u64::from(ctx.page * ctx.limit).min(ctx.total);
        let header = if ctx.total == 0 {
            "0 propiedades".to_string()
        } else {
            format!(
                "{} propiedad{} — Mostrando {}-{} de {}",
                ctx.total,
                if ctx.total == 1 { "" } else { "es" },
                from,
                to,
                ctx.total
            )
        };
        frame.render_widget(
            Paragraph::new(Line::from(header)).style(Style::default().add_modifier(Modifier::BOLD)),
            area,
        );
    }

    fn render_body(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &ResultsContext<'_>) {
        let block = Block::default().borders(Borders::ALL);
        self.list_area = block.inner(area);

        match ctx.state {
            FetchState::Loading => {
                frame.render_widget(
                    Paragraph::new("Cargando propiedades...").block(block),
                    area,
                );
                return;
            }
            FetchState::Failed(message) => {
                let text = format!(
                    "Error al cargar las propiedades\n{message}\nVerificá que el backend esté corriendo."
                );
                frame.render_widget(
                    Paragraph::new(text)
                        .style(Style::default().fg(Color::Red))
                        .block(block),
                    area,
                );
                return;
            }
            FetchState::Loaded => {}
        }

        if ctx.items.is_empty() {
            frame.render_widget(
                Paragraph::new("No hay propiedades disponibles")
                    .style(Style::default().fg(Color::DarkGray))
                    .block(block),
                area,
            );
            return;
        }

        let items: Vec<ListItem> = ctx
            .items
            .iter()
            .enumerate()
            .map(|(index, listing)| {
                let mut spans = vec![Span::raw(format!(
                    "{} — {} | ${} | {} hab {} baños {} amb | {}",
                    listing.title,
                    listing.address,
                    listing.price_ars,
                    listing.bedrooms,
                    listing.bathrooms,
                    listing.rooms,
                    listing.operation.label(),
                ))];
                if listing.accepts_pets {
                    spans.push(Span::raw(" 🐾"));
                }
                if ctx.favorites.contains(&listing.id) {
                    spans.push(Span::styled(" ★", Style::default().fg(Color::Yellow)));
                }
                let mut style = Style::default();
                if index == self.selected {
                    style = style.bg(Color::DarkGray);
                }
                ListItem::new(Line::from(spans)).style(style)
            })
            .collect();
        frame.render_widget(List::new(items).block(block), area);
    }

    fn render_pagination(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &ResultsContext<'_>) {
        self.prev_area = Rect::default();
        self.next_area = Rect::default();
        self.page_areas.clear();

        if ctx.total_pages <= 1 {
            return;
        }

        let mut spans = Vec::new();
        let mut x = area.x;

        let prev_enabled = ctx.page > 1;
        let prev = "[Anterior]";
        if prev_enabled {
            self.prev_area = Rect::new(x, area.y, prev.len() as u16, 1);
            spans.push(Span::raw(prev));
        } else {
            spans.push(Span::styled(prev, Style::default().fg(Color::DarkGray)));
        }
        x += prev.len() as u16 + 1;
        spans.push(Span::raw(" "));

        for page in 1..=ctx.total_pages {
            let label = format!("[{page}]");
            let width = label.len() as u16;
            let style = if page == ctx.page {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            self.page_areas.push((page, Rect::new(x, area.y, width, 1)));
            spans.push(Span::styled(label, style));
            spans.push(Span::raw(" "));
            x += width + 1;
        }

        let next_enabled = ctx.page < ctx.total_pages;
        let next = "[Siguiente]";
        if next_enabled {
            self.next_area = Rect::new(x, area.y, next.len() as u16, 1);
            spans.push(Span::raw(next));
        } else {
            spans.push(Span::styled(next, Style::default().fg(Color::DarkGray)));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

impl Default for ResultsView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OperationKind;
    use chrono::Utc;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn listing(id: &str) -> Listing {
        Listing {
            id: id.to_string(),
            title: format!("Depto {id}"),
            description: String::new(),
            address: "Calle 123".to_string(),
            accepts_pets: false,
            price_ars: 500_000,
            price_usd: 500,
            monthly_fee: 50_000,
            bedrooms: 2,
            bathrooms: 1,
            rooms: 3,
            operation: OperationKind::Rental,
            images: Vec::new(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ctx<'a>(
        items: &'a [Listing],
        state: &'a FetchState,
        favorites: &'a HashSet<String>,
        page: u32,
        total: u64,
    ) -> ResultsContext<'a> {
        ResultsContext {
            items,
            total,
            page,
            limit: 10,
            total_pages: total.div_ceil(10) as u32,
            state,
            favorites,
            session_present: true,
        }
    }

    fn render(view: &mut ResultsView, ctx: &ResultsContext<'_>) {
        let backend = TestBackend::new(80, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| view.render(frame, Rect::new(0, 0, 80, 20), ctx))
            .unwrap();
    }

    #[test]
    fn only_reachable_pages_are_clickable() {
        let items: Vec<Listing> = (0..10).map(|i| listing(&i.to_string())).collect();
        let state = FetchState::Loaded;
        let favorites = HashSet::new();
        let ctx = ctx(&items, &state, &favorites, 1, 25);

        let mut view = ResultsView::new();
        render(&mut view, &ctx);
        assert_eq!(view.page_buttons(), vec![1, 2, 3]);
    }

    #[test]
    fn prev_is_inert_on_the_first_page() {
        let items = vec![listing("a")];
        let state = FetchState::Loaded;
        let favorites = HashSet::new();
        let ctx = ctx(&items, &state, &favorites, 1, 25);

        let mut view = ResultsView::new();
        assert_eq!(view.handle_key(key(KeyCode::Left), &ctx), None);
        assert_eq!(
            view.handle_key(key(KeyCode::Right), &ctx),
            Some(PageAction::Next)
        );
    }

    #[test]
    fn next_is_inert_on_the_last_page() {
        let items = vec![listing("a")];
        let state = FetchState::Loaded;
        let favorites = HashSet::new();
        let ctx = ctx(&items, &state, &favorites, 3, 25);

        let mut view = ResultsView::new();
        assert_eq!(view.handle_key(key(KeyCode::Right), &ctx), None);
        assert_eq!(
            view.handle_key(key(KeyCode::Left), &ctx),
            Some(PageAction::Prev)
        );
    }

    #[test]
    fn clicking_a_page_number_jumps_directly() {
        let items: Vec<Listing> = (0..10).map(|i| listing(&i.to_string())).collect();
        let state = FetchState::Loaded;
        let favorites = HashSet::new();
        let ctx = ctx(&items, &state, &favorites, 1, 25);

        let mut view = ResultsView::new();
        render(&mut view, &ctx);
        let (page, area) = view.page_areas[1];
        assert_eq!(page, 2);

        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: area.x,
            row: area.y,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(view.handle_mouse(&click, &ctx), Some(PageAction::Goto(2)));
    }

    #[test]
    fn favorite_toggle_requires_a_session() {
        let items = vec![listing("a")];
        let state = FetchState::Loaded;
        let favorites = HashSet::new();
        let mut ctx = ctx(&items, &state, &favorites, 1, 1);
        ctx.session_present = false;

        let mut view = ResultsView::new();
        assert_eq!(view.handle_key(key(KeyCode::Char('f')), &ctx), None);

        ctx.session_present = true;
        assert_eq!(
            view.handle_key(key(KeyCode::Char('f')), &ctx),
            Some(PageAction::ToggleFavorite("a".to_string()))
        );
    }

    #[test]
    fn selection_stays_within_the_page() {
        let items: Vec<Listing> = (0..3).map(|i| listing(&i.to_string())).collect();
        let state = FetchState::Loaded;
        let favorites = HashSet::new();
        let ctx = ctx(&items, &state, &favorites, 1, 3);

        let mut view = ResultsView::new();
        for _ in 0..5 {
            view.handle_key(key(KeyCode::Down), &ctx);
        }
        assert_eq!(view.selected(), 2);
        for _ in 0..5 {
            view.handle_key(key(KeyCode::Up), &ctx);
        }
        assert_eq!(view.selected(), 0);
    }
}
