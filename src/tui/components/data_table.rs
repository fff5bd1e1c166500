//! # DataTable Component
//!
//! The body of an admin page: stat cards, status tabs, the row table and a
//! footer with paging, selection, search and filters.
//!
//! ```text
//! ┌ Total actualités ┐┌ Brouillon ┐┌ Publié ┐┌ Archivé ┐
//! │        5         ││     1     ││   3    ││    1    │
//! └──────────────────┘└───────────┘└────────┘└─────────┘
//!  Tous │ Brouillon │ Publié │ Archivé
//!      Titre ▼            Catégorie        Statut      Date
//! [x]  Lancement du ...   Communiqué       Publié      03/08/2024
//! Page 1/1 · 5 éléments · 1 sélectionné(s)
//! ```
//!
//! Stateless: it borrows the `AdminPage` for one frame. The ratatui row
//! cursor is rebuilt from `TableState::cursor` each render.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Cell, Paragraph, Row, Table, TableState as RowCursor, Tabs,
};

use crate::backend::SortOrder;
use crate::core::pages::AdminPage;
use crate::tui::component::Component;
use crate::tui::components::tone_style;

const SELECT_COLUMN: u16 = 4;

pub struct DataTable<'a> {
    pub page: &'a AdminPage,
}

impl<'a> DataTable<'a> {
    pub fn new(page: &'a AdminPage) -> Self {
        Self { page }
    }

    fn render_stats(&self, frame: &mut Frame, area: Rect) {
        let cards = &self.page.stats;
        if cards.is_empty() {
            return;
        }
        let areas = Layout::horizontal(vec![Constraint::Fill(1); cards.len()]).split(area);
        for (card, card_area) in cards.iter().zip(areas.iter()) {
            let style = tone_style(card.tone);
            let paragraph = Paragraph::new(card.value.to_string())
                .alignment(Alignment::Center)
                .style(style.add_modifier(Modifier::BOLD))
                .block(
                    Block::bordered()
                        .border_type(BorderType::Rounded)
                        .border_style(style.add_modifier(Modifier::DIM))
                        .title(format!(" {} ", card.label)),
                );
            frame.render_widget(paragraph, *card_area);
        }
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let tabs = Tabs::new(self.page.tabs.iter().map(|t| t.label.as_str()))
            .select(self.page.tab)
            .style(Style::default().fg(Color::Gray))
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, area);
    }

    fn header(&self) -> Row<'a> {
        let table = &self.page.table;
        let mut cells = vec![Cell::from("")];
        for (i, field) in table.columns().into_iter().enumerate() {
            let mut label = field.label.clone();
            if table.options.sort_by.as_deref() == Some(field.name.as_str()) {
                label.push_str(match table.options.sort_order {
                    SortOrder::Asc => " ▲",
                    SortOrder::Desc => " ▼",
                });
            }
            if let Some(value) = table.filter_value(&field.name) {
                label.push_str(&format!(" = {}", field.kind.option_label(value)));
            }
            let mut style = Style::default().add_modifier(Modifier::BOLD);
            if i == table.column {
                style = style.add_modifier(Modifier::UNDERLINED).fg(Color::Cyan);
            }
            cells.push(Cell::from(label).style(style));
        }
        Row::new(cells)
    }

    fn rows(&self) -> Vec<Row<'a>> {
        let table = &self.page.table;
        table
            .page
            .data
            .iter()
            .map(|record| {
                let mark = if table.is_selected(record) { "[x]" } else { "[ ]" };
                let mut cells = vec![Cell::from(mark)];
                cells.extend(table.cells(record).into_iter().map(|cell| match cell.badge {
                    Some(tone) => Cell::from(Span::styled(cell.text, tone_style(tone))),
                    None => Cell::from(cell.text),
                }));
                Row::new(cells)
            })
            .collect()
    }

    fn render_rows(&self, frame: &mut Frame, area: Rect) {
        let table = &self.page.table;
        if table.page.data.is_empty() {
            let (text, style) = match (&table.error, table.loading) {
                (Some(error), _) => (error.as_str(), Style::default().fg(Color::Red)),
                (None, true) => ("Chargement…", Style::default().fg(Color::DarkGray)),
                (None, false) => ("Aucun élément", Style::default().fg(Color::DarkGray)),
            };
            frame.render_widget(
                Paragraph::new(text).alignment(Alignment::Center).style(style),
                area,
            );
            return;
        }

        let columns = table.columns().len();
        let mut widths = vec![Constraint::Length(SELECT_COLUMN)];
        widths.extend(std::iter::repeat_n(Constraint::Fill(1), columns));

        let widget = Table::new(self.rows(), widths)
            .header(self.header())
            .column_spacing(1)
            .row_highlight_style(Style::default().bg(Color::DarkGray));
        let mut cursor = RowCursor::default().with_selected(Some(table.cursor));
        frame.render_stateful_widget(widget, area, &mut cursor);
    }

    fn footer(&self) -> Line<'a> {
        let table = &self.page.table;
        let mut parts = vec![table.footer()];
        if !table.selected.is_empty() {
            parts.push(format!("{} sélectionné(s)", table.selected.len()));
        }
        if !table.options.search.is_empty() {
            parts.push(format!("recherche « {} »", table.options.search));
        }
        let mut line = Line::from(parts.join(" · "));
        if let Some(error) = &table.error
            && !table.page.data.is_empty()
        {
            line.push_span(Span::styled(
                format!(" · {error}"),
                Style::default().fg(Color::Red),
            ));
        }
        line
    }
}

impl Component for DataTable<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        use Constraint::{Length, Min};
        let stats_height = if self.page.stats.is_empty() { 0 } else { 3 };
        let tabs_height = if self.page.tabs.len() > 1 { 1 } else { 0 };
        let [stats_area, tabs_area, rows_area, footer_area] =
            Layout::vertical([Length(stats_height), Length(tabs_height), Min(0), Length(1)])
                .areas(area);

        self.render_stats(frame, stats_area);
        if tabs_height > 0 {
            self.render_tabs(frame, tabs_area);
        }
        self.render_rows(frame, rows_area);
        frame.render_widget(self.footer(), footer_area);
    }
}
