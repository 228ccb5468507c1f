use std::collections::HashSet;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{debug, info, warn};

use crate::api::{FilterCriteria, PageRequest, PageResult};
use crate::models::Listing;
use crate::session::Session;
use crate::ui::filters::FilterPanel;
use crate::ui::results::{PageAction, ResultsContext, ResultsView};

/// Listings per page, mirroring the backend default
pub const PAGE_SIZE: u32 = 10;

/// Lifecycle of the current page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    Loading,
    Loaded,
    Failed(String),
}

/// Side effect the event loop runs on the app's behalf
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchPage { token: u64, request: PageRequest },
    FetchLocations,
    FetchFavorites { user_id: String },
    FetchDetail { id: String },
    AddFavorite { user_id: String, property_id: String },
    RemoveFavorite { user_id: String, property_id: String },
}

/// Completion message delivered back from a network task
#[derive(Debug)]
pub enum ApiEvent {
    Page {
        token: u64,
        result: Result<PageResult, String>,
    },
    Locations(Result<Vec<String>, String>),
    Favorites(Result<Vec<String>, String>),
    Detail(Result<Listing, String>),
    FavoriteSaved {
        property_id: String,
        added: bool,
        result: Result<(), String>,
    },
}

/// Which region owns plain key events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Filters,
    Results,
}

/// Top-level state: current criteria, current page, the last answer the
/// backend gave us, and the widgets that edit all of it
///
/// Every outgoing page request carries a token from a monotonically
/// increasing counter; a response is applied only when its token still
/// matches, so a stale in-flight response can never clobber a newer one.
pub struct App {
    criteria: FilterCriteria,
    page: u32,
    limit: u32,
    items: Vec<Listing>,
    total: u64,
    total_pages: u32,
    state: FetchState,
    latest_token: u64,
    filters: FilterPanel,
    results: ResultsView,
    favorites: HashSet<String>,
    session: Option<Session>,
    focus: Focus,
    detail: Option<Listing>,
    status: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(session: Option<Session>) -> Self {
        Self {
            criteria: FilterCriteria::default(),
            page: 1,
            limit: PAGE_SIZE,
            items: Vec::new(),
            total: 0,
            total_pages: 0,
            state: FetchState::Loading,
            latest_token: 0,
            filters: FilterPanel::new(),
            results: ResultsView::new(),
            favorites: HashSet::new(),
            session,
            focus: Focus::Results,
            detail: None,
            status: None,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    /// Work to kick off right after startup
    pub fn startup_commands(&mut self) -> Vec<Command> {
        let mut commands = vec![Command::FetchLocations, self.issue_fetch()];
        if let Some(session) = &self.session {
            commands.push(Command::FetchFavorites {
                user_id: session.user_id.clone(),
            });
        }
        commands
    }

    /// Build the next page request under a fresh token
    fn issue_fetch(&mut self) -> Command {
        self.latest_token += 1;
        self.state = FetchState::Loading;
        Command::FetchPage {
            token: self.latest_token,
            request: PageRequest::new(self.page, self.limit, self.criteria.clone()),
        }
    }

    /// A filter dimension changed: adopt the new criteria and restart
    /// from page 1
    fn on_filters_changed(&mut self, criteria: FilterCriteria) -> Command {
        debug!("Filter criteria changed: {:?}", criteria);
        self.criteria = criteria;
        self.page = 1;
        self.results.reset_selection();
        self.issue_fetch()
    }

    pub(crate) fn apply_action(&mut self, action: PageAction) -> Option<Command> {
        match action {
            PageAction::Prev => {
                self.page = self.page.saturating_sub(1).max(1);
                self.results.reset_selection();
                Some(self.issue_fetch())
            }
            PageAction::Next => {
                self.page = (self.page + 1).min(self.total_pages.max(1));
                self.results.reset_selection();
                Some(self.issue_fetch())
            }
            PageAction::Goto(page) => {
                self.page = page;
                self.results.reset_selection();
                Some(self.issue_fetch())
            }
            PageAction::OpenDetail(id) => Some(Command::FetchDetail { id }),
            PageAction::ToggleFavorite(property_id) => {
                let session = self.session.as_ref()?;
                let user_id = session.user_id.clone();
                if self.favorites.contains(&property_id) {
                    Some(Command::RemoveFavorite {
                        user_id,
                        property_id,
                    })
                } else {
                    Some(Command::AddFavorite {
                        user_id,
                        property_id,
                    })
                }
            }
        }
    }

    /// Absorb one completed network call
    pub fn apply(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::Page { token, result } => {
                if token != self.latest_token {
                    debug!(
                        "Discarding stale page response (token {} < {})",
                        token, self.latest_token
                    );
                    return;
                }
                match result {
                    Ok(page) => {
                        self.total = page.total;
                        self.total_pages = page.total_pages();
                        self.items = page.items;
                        self.state = FetchState::Loaded;
                    }
                    Err(message) => {
                        warn!("Page fetch failed: {}", message);
                        self.state = FetchState::Failed(message);
                    }
                }
            }
            ApiEvent::Locations(result) => match result {
                Ok(vocabulary) => {
                    info!("Loaded {} known locations", vocabulary.len());
                    self.filters.set_vocabulary(vocabulary);
                }
                Err(message) => {
                    // Degraded state: autocomplete just offers nothing
                    warn!("Location vocabulary fetch failed: {}", message);
                }
            },
            ApiEvent::Favorites(result) => match result {
                Ok(ids) => {
                    self.favorites = ids.into_iter().collect();
                }
                Err(message) => {
                    warn!("Favorites fetch failed: {}", message);
                }
            },
            ApiEvent::Detail(result) => match result {
                Ok(listing) => {
                    self.detail = Some(listing);
                }
                Err(message) => {
                    warn!("Detail fetch failed: {}", message);
                    self.status = Some("No se pudo cargar la propiedad".to_string());
                }
            },
            ApiEvent::FavoriteSaved {
                property_id,
                added,
                result,
            } => match result {
                Ok(()) => {
                    if added {
                        self.favorites.insert(property_id);
                    } else {
                        self.favorites.remove(&property_id);
                    }
                }
                Err(message) => {
                    warn!("Favorite toggle failed: {}", message);
                    self.status = Some("No se pudo guardar el favorito".to_string());
                }
            },
        }
    }

    /// Apply deferred UI timers (suggestion-panel blur hide)
    pub fn tick(&mut self, now: Instant) {
        self.filters.tick(now);
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Option<Command> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        if self.detail.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                self.detail = None;
            }
            return None;
        }

        match self.focus {
            Focus::Filters => {
                if key.code == KeyCode::Esc && !self.filters.any_popup_open() {
                    self.focus = Focus::Results;
                    return None;
                }
                let criteria = self.filters.handle_key(key, now)?;
                Some(self.on_filters_changed(criteria))
            }
            Focus::Results => match key.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    None
                }
                KeyCode::Char('/') | KeyCode::Tab => {
                    self.focus = Focus::Filters;
                    None
                }
                _ => {
                    let ctx = ResultsContext {
                        items: &self.items,
                        total: self.total,
                        page: self.page,
                        limit: self.limit,
                        total_pages: self.total_pages,
                        state: &self.state,
                        favorites: &self.favorites,
                        session_present: self.session.is_some(),
                    };
                    let action = self.results.handle_key(key, &ctx)?;
                    self.apply_action(action)
                }
            },
        }
    }

    pub fn handle_mouse(&mut self, mouse: &MouseEvent, now: Instant) -> Option<Command> {
        if self.detail.is_some() {
            return None;
        }

        // Filter popups take the event first so an outside press
        // dismisses them before the results react
        if let Some(criteria) = self.filters.handle_mouse(mouse, now) {
            return Some(self.on_filters_changed(criteria));
        }
        if self.filters.any_popup_open() {
            return None;
        }

        let ctx = ResultsContext {
            items: &self.items,
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            state: &self.state,
            favorites: &self.favorites,
            session_present: self.session.is_some(),
        };
        let action = self.results.handle_mouse(mouse, &ctx)?;
        self.apply_action(action)
    }

    pub fn render(&mut self, frame: &mut Frame<'_>) {
        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

        let ctx = ResultsContext {
            items: &self.items,
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            state: &self.state,
            favorites: &self.favorites,
            session_present: self.session.is_some(),
        };
        self.results.render(frame, rows[1], &ctx);

        // Filters after the results so open dropdowns overlay them
        self.filters.render(frame, rows[0]);

        self.render_status(frame, rows[2]);

        if let Some(listing) = &self.detail {
            render_detail(frame, listing);
        }
    }

    fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let help = match self.focus {
            Focus::Filters => "Tab siguiente filtro | Esc resultados",
            Focus::Results => "Tab filtros | ←/→ página | f favorito | Enter detalle | q salir",
        };
        let text = match (&self.status, &self.session) {
            (Some(status), _) => format!("{status} | {help}"),
            (None, Some(session)) => format!("{} | {help}", session.display_name),
            (None, None) => help.to_string(),
        };
        frame.render_widget(
            Paragraph::new(Line::from(text)).style(Style::default().fg(Color::DarkGray)),
            area,
        );
    }
}

fn render_detail(frame: &mut Frame<'_>, listing: &Listing) {
    let area = centered_rect(70, 60, frame.area());
    frame.render_widget(Clear, area);

    let text = format!(
        "{}\n{}\n\n{}\n\nPrecio: ${} ARS (${} USD) + ${} expensas\n{} hab, {} baños, {} ambientes\n{} | Mascotas: {}\nImágenes: {}\n\nEsc para cerrar",
        listing.title,
        listing.address,
        listing.description,
        listing.price_ars,
        listing.price_usd,
        listing.monthly_fee,
        listing.bedrooms,
        listing.bathrooms,
        listing.rooms,
        listing.operation.label(),
        if listing.accepts_pets { "sí" } else { "no" },
        listing.images.len(),
    );
    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Propiedad").borders(Borders::ALL)),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);
    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OperationKind;
    use chrono::Utc;

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

    fn page_result(total: u64, count: usize) -> PageResult {
        PageResult {
            items: (0..count).map(|i| listing(&i.to_string())).collect(),
            total,
            page: 1,
            limit: PAGE_SIZE,
        }
    }

    fn fetch_token(command: &Command) -> u64 {
        match command {
            Command::FetchPage { token, .. } => *token,
            other => panic!("expected FetchPage, got {other:?}"),
        }
    }

    fn fetch_request(command: &Command) -> &PageRequest {
        match command {
            Command::FetchPage { request, .. } => request,
            other => panic!("expected FetchPage, got {other:?}"),
        }
    }

    #[test]
    fn startup_issues_locations_and_first_page() {
        let mut app = App::new(None);
        let commands = app.startup_commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0], Command::FetchLocations);
        let request = fetch_request(&commands[1]);
        assert_eq!(request.page, 1);
        assert!(request.criteria.is_empty());
    }

    #[test]
    fn filter_change_resets_page_to_one() {
        let mut app = App::new(None);
        app.startup_commands();
        app.apply(ApiEvent::Page {
            token: 1,
            result: Ok(page_result(30, 10)),
        });

        let goto = app.apply_action(PageAction::Goto(3)).unwrap();
        assert_eq!(fetch_request(&goto).page, 3);
        assert_eq!(app.page(), 3);

        let criteria = FilterCriteria {
            bedrooms: Some(2),
            ..FilterCriteria::default()
        };
        let command = app.on_filters_changed(criteria.clone());
        let request = fetch_request(&command);
        assert_eq!(request.page, 1);
        assert_eq!(request.criteria, criteria);
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut app = App::new(None);
        let commands = app.startup_commands();
        let first_token = fetch_token(&commands[1]);

        // A newer request supersedes the first before it completes
        let newer = app.apply_action(PageAction::Goto(2)).unwrap();
        let newer_token = fetch_token(&newer);
        assert!(newer_token > first_token);

        app.apply(ApiEvent::Page {
            token: first_token,
            result: Ok(page_result(99, 10)),
        });
        assert_eq!(app.state(), &FetchState::Loading);

        app.apply(ApiEvent::Page {
            token: newer_token,
            result: Ok(page_result(25, 10)),
        });
        assert_eq!(app.state(), &FetchState::Loaded);
        assert_eq!(app.total, 25);
        assert_eq!(app.total_pages, 3);
    }

    #[test]
    fn fetch_failure_surfaces_an_error_state() {
        let mut app = App::new(None);
        let commands = app.startup_commands();
        let token = fetch_token(&commands[1]);

        app.apply(ApiEvent::Page {
            token,
            result: Err("connection refused".to_string()),
        });
        assert_eq!(
            app.state(),
            &FetchState::Failed("connection refused".to_string())
        );
    }

    #[test]
    fn vocabulary_failure_degrades_to_empty() {
        let mut app = App::new(None);
        app.apply(ApiEvent::Locations(Err("boom".to_string())));
        assert!(app.filters.location_field().matches().is_empty());
    }

    #[test]
    fn favorite_toggle_picks_add_or_remove() {
        let session = Session {
            user_id: "u1".to_string(),
            display_name: "Ana".to_string(),
        };
        let mut app = App::new(Some(session));
        app.apply(ApiEvent::Favorites(Ok(vec!["a".to_string()])));

        let command = app
            .apply_action(PageAction::ToggleFavorite("a".to_string()))
            .unwrap();
        assert_eq!(
            command,
            Command::RemoveFavorite {
                user_id: "u1".to_string(),
                property_id: "a".to_string(),
            }
        );

        let command = app
            .apply_action(PageAction::ToggleFavorite("b".to_string()))
            .unwrap();
        assert_eq!(
            command,
            Command::AddFavorite {
                user_id: "u1".to_string(),
                property_id: "b".to_string(),
            }
        );

        // Membership only changes once the backend confirms
        assert!(app.favorites.contains("a"));
        app.apply(ApiEvent::FavoriteSaved {
            property_id: "a".to_string(),
            added: false,
            result: Ok(()),
        });
        assert!(!app.favorites.contains("a"));
    }

    #[test]
    fn favorite_toggle_without_session_is_inert() {
        let mut app = App::new(None);
        assert_eq!(
            app.apply_action(PageAction::ToggleFavorite("a".to_string())),
            None
        );
    }
}
