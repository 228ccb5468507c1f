use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};
use ratatui::Frame;

/// A (value, label) pair offered by the select widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Single-select dropdown with keyboard navigation and outside-click
/// dismissal
///
/// Closed, it shows the selected option's label (or the placeholder).
/// Open, it lists every option in caller order with one shared highlight
/// index driven by both arrow keys and pointer hover. Committing a choice
/// always surfaces the option's value, never its label.
#[derive(Debug)]
pub struct SelectState {
    options: Vec<SelectOption>,
    placeholder: String,
    value: Option<String>,
    open: bool,
    /// Highlight index into `options`; -1 means none
    highlighted: isize,
    control_area: Rect,
    list_area: Rect,
}

impl SelectState {
    pub fn new(placeholder: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self {
            options,
            placeholder: placeholder.into(),
            value: None,
            open: false,
            highlighted: -1,
            control_area: Rect::default(),
            list_area: Rect::default(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    pub fn highlighted(&self) -> isize {
        self.highlighted
    }

    /// Label shown on the closed control; a bound value missing from the
    /// option list degrades to the placeholder
    pub fn selected_label(&self) -> &str {
        self.value
            .as_deref()
            .filter(|value| !value.is_empty())
            .and_then(|value| self.options.iter().find(|opt| opt.value == value))
            .map(|opt| opt.label.as_str())
            .unwrap_or(&self.placeholder)
    }

    fn open(&mut self) {
        self.open = true;
        if self.highlighted < 0 {
            self.highlighted = 0;
        }
    }

    fn close(&mut self) {
        self.open = false;
        self.highlighted = -1;
    }

    fn commit(&mut self, index: usize) -> Option<String> {
        let value = self.options.get(index)?.value.clone();
        self.value = Some(value.clone());
        self.close();
        Some(value)
    }

    /// Feed one key event; returns the committed value when a choice
    /// is made
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<String> {
        if !self.open {
            if matches!(
                key.code,
                KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Down
            ) {
                self.open();
            }
            return None;
        }

        match key.code {
            KeyCode::Esc => {
                self.close();
                None
            }
            KeyCode::Down => {
                let len = self.options.len() as isize;
                if len > 0 {
                    self.highlighted = if self.highlighted < len - 1 {
                        self.highlighted + 1
                    } else {
                        0
                    };
                }
                None
            }
            KeyCode::Up => {
                let len = self.options.len() as isize;
                if len > 0 {
                    self.highlighted = if self.highlighted > 0 {
                        self.highlighted - 1
                    } else {
                        len - 1
                    };
                }
                None
            }
            KeyCode::Enter => {
                if self.highlighted >= 0 {
                    self.commit(self.highlighted as usize)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Feed one mouse event; a press on an option commits it immediately,
    /// a press anywhere outside the widget dismisses without committing
    pub fn handle_mouse(&mut self, mouse: &MouseEvent) -> Option<String> {
        let position = Position::new(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.open {
                    if self.list_area.contains(position) {
                        let index = (mouse.row - self.list_area.y) as usize;
                        if index < self.options.len() {
                            return self.commit(index);
                        }
                        None
                    } else {
                        // Press on the control toggles; anywhere else dismisses
                        self.close();
                        None
                    }
                } else if self.control_area.contains(position) {
                    self.open();
                    None
                } else {
                    None
                }
            }
            MouseEventKind::Moved => {
                if self.open && self.list_area.contains(position) {
                    self.highlighted = (mouse.row - self.list_area.y) as isize;
                }
                None
            }
            _ => None,
        }
    }

    /// Render the closed control into `area`, and the dropdown beneath it
    /// when open; records both rects for mouse hit-testing
    pub fn render(&mut self, frame: &mut Frame<'_>, area: Rect, focused: bool) {
        self.control_area = area;

        let arrow = if self.open { "▴" } else { "▾" };
        let style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let control = Paragraph::new(Line::from(format!(
            "{} {}",
            self.selected_label(),
            arrow
        )))
        .style(style);
        frame.render_widget(control, area);

        if !self.open {
            self.list_area = Rect::default();
            return;
        }

        let height = (self.options.len() as u16).saturating_add(2);
        let dropdown = Rect::new(area.x, area.y.saturating_add(1), area.width, height)
            .intersection(frame.area());
        frame.render_widget(Clear, dropdown);

        let block = Block::default().borders(Borders::ALL);
        self.list_area = block.inner(dropdown);

        let items: Vec<ListItem> = self
            .options
            .iter()
            .enumerate()
            .map(|(index, opt)| {
                let mut style = Style::default();
                if self.value.as_deref() == Some(opt.value.as_str()) {
                    style = style.add_modifier(Modifier::BOLD);
                }
                if index as isize == self.highlighted {
                    style = style.bg(Color::DarkGray);
                }
                ListItem::new(opt.label.clone()).style(style)
            })
            .collect();
        frame.render_widget(List::new(items).block(block), dropdown);
    }
}
