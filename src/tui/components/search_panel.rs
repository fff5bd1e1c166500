//! # SearchPanel Component
//!
//! Overlay for global search results: one tab per content type that has
//! hits ("Tous" first), and a scrollable list of hit cards.
//!
//! Cards have variable height (wrapped summaries), so the list is laid out
//! in a `ScrollView` with cached prefix heights, and keyboard selection
//! scrolls the selected card into view.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, Paragraph, Tabs, Wrap};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::format;
use crate::core::search::{ContentType, SearchHit, SearchResults};
use crate::tui::components::centered_rect;
use crate::tui::event::TuiEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// Open the admin page of the hit's collection, narrowed to its title.
    Open { content_type: ContentType, title: String },
    Close,
}

/// Persistent state for the search overlay.
#[derive(Default)]
pub struct SearchPanelState {
    pub tab: usize,
    pub selected: usize,
    pub scroll_state: ScrollViewState,
    /// Cumulative card heights from the last render
    prefix_heights: Vec<u16>,
    viewport_height: u16,
}

impl SearchPanelState {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_tab(&self, results: &SearchResults) -> Option<ContentType> {
        results.tabs().get(self.tab).and_then(|(ty, _)| *ty)
    }

    fn visible<'r>(&self, results: &'r SearchResults) -> Vec<&'r SearchHit> {
        results.filtered(self.current_tab(results))
    }

    fn switch_tab(&mut self, index: usize) {
        self.tab = index;
        self.selected = 0;
        self.scroll_state.set_offset(Position { x: 0, y: 0 });
    }

    pub fn handle_event(&mut self, results: &SearchResults, event: &TuiEvent) -> Option<SearchEvent> {
        let tabs = results.tabs().len();
        let count = self.visible(results).len();
        match event {
            TuiEvent::Escape => return Some(SearchEvent::Close),
            TuiEvent::Tab | TuiEvent::CursorRight => self.switch_tab((self.tab + 1) % tabs),
            TuiEvent::BackTab | TuiEvent::CursorLeft => {
                self.switch_tab((self.tab + tabs - 1) % tabs)
            }
            TuiEvent::CursorUp => {
                self.selected = self.selected.saturating_sub(1);
                self.scroll_to_selected();
            }
            TuiEvent::CursorDown => {
                if self.selected + 1 < count {
                    self.selected += 1;
                }
                self.scroll_to_selected();
            }
            TuiEvent::PageUp => self.scroll_state.scroll_page_up(),
            TuiEvent::PageDown => self.scroll_state.scroll_page_down(),
            TuiEvent::Submit => {
                return self.visible(results).get(self.selected).map(|hit| SearchEvent::Open {
                    content_type: hit.content_type,
                    title: hit.title.clone(),
                });
            }
            _ => {}
        }
        None
    }

    fn scroll_to_selected(&mut self) {
        let Some(&bottom) = self.prefix_heights.get(self.selected) else {
            return;
        };
        let top = match self.selected {
            0 => 0,
            i => self.prefix_heights[i - 1],
        };
        let offset_y = self.scroll_state.offset().y;
        if top < offset_y {
            self.scroll_state.set_offset(Position { x: 0, y: top });
        } else if bottom > offset_y + self.viewport_height {
            let y = bottom.saturating_sub(self.viewport_height);
            self.scroll_state.set_offset(Position { x: 0, y });
        }
    }
}

/// Transient render wrapper for the search overlay.
pub struct SearchPanel<'a> {
    state: &'a mut SearchPanelState,
    results: &'a SearchResults,
}

fn card<'h>(hit: &'h SearchHit, selected: bool) -> Paragraph<'h> {
    let border = if selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut lines = vec![Line::from(Span::styled(
        hit.title.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if !hit.summary.is_empty() {
        lines.push(Line::from(hit.summary.as_str()));
    }
    let mut block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(border)
        .title(format!(" {} ", hit.content_type.label()));
    if !hit.created_at.is_empty() {
        block = block.title(Line::from(format!(" {} ", format::long_date(&hit.created_at))).right_aligned());
    }
    Paragraph::new(lines).block(block).wrap(Wrap { trim: true })
}

impl<'a> SearchPanel<'a> {
    pub fn new(state: &'a mut SearchPanelState, results: &'a SearchResults) -> Self {
        Self { state, results }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(80, 80, area);
        frame.render_widget(Clear, overlay);

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" Recherche « {} » ", self.results.query))
            .title_bottom(Line::from(" Tab Type  ↑↓ Choisir  Enter Ouvrir  Esc Fermer ").centered());
        let inner = block.inner(overlay);
        frame.render_widget(block, overlay);

        let [tabs_area, list_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);

        let titles = self.results.tabs().into_iter().map(|(ty, count)| {
            let label = ty.map_or("Tous", ContentType::label);
            format!("{label} ({count})")
        });
        frame.render_widget(
            Tabs::new(titles)
                .select(self.state.tab)
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            tabs_area,
        );

        let hits = self.state.visible(self.results);
        if hits.is_empty() {
            let message = if self.results.query.is_empty() {
                "Saisissez une recherche (Ctrl+F)".to_string()
            } else {
                format!("Aucun résultat pour « {} »", self.results.query)
            };
            frame.render_widget(
                Paragraph::new(message).style(Style::default().fg(Color::DarkGray)),
                list_area,
            );
            return;
        }

        // Leave one column for the scrollbar
        let width = list_area.width.saturating_sub(1);
        let cards: Vec<(Paragraph, u16)> = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                let paragraph = card(hit, i == self.state.selected);
                let height = paragraph.line_count(width) as u16;
                (paragraph, height)
            })
            .collect();

        self.state.prefix_heights = cards
            .iter()
            .scan(0u16, |acc, (_, h)| {
                *acc += h;
                Some(*acc)
            })
            .collect();
        self.state.viewport_height = list_area.height;
        let total = self.state.prefix_heights.last().copied().unwrap_or(0);

        let mut scroll_view = ScrollView::new(Size::new(width, total))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);
        let mut y = 0;
        for (paragraph, height) in cards {
            scroll_view.render_widget(paragraph, Rect::new(0, y, width, height));
            y += height;
        }
        frame.render_stateful_widget(scroll_view, list_area, &mut self.state.scroll_state);
    }
}
