//! # DashboardView Component
//!
//! Analytics overlay: one row per collection with its row count, and a bar
//! chart of the most searched terms.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, BorderType, Clear, Paragraph, Row, Table};

use crate::core::analytics::Dashboard;
use crate::tui::component::Component;
use crate::tui::components::centered_rect;

pub struct DashboardView<'a> {
    pub dashboard: &'a Dashboard,
    pub is_loading: bool,
}

impl<'a> DashboardView<'a> {
    pub fn new(dashboard: &'a Dashboard, is_loading: bool) -> Self {
        Self {
            dashboard,
            is_loading,
        }
    }

    fn counts_table(&self) -> Table<'a> {
        let rows = self.dashboard.counts.iter().map(|(label, count)| {
            let value = match count {
                Some(n) => n.to_string(),
                None => "—".to_string(),
            };
            Row::new(vec![label.clone(), value])
        });
        Table::new(rows, [Constraint::Fill(1), Constraint::Length(8)])
            .header(Row::new(vec!["Collection", "Éléments"]).style(Style::default().fg(Color::Cyan)))
            .block(Block::bordered().border_type(BorderType::Rounded).title(" Contenus "))
    }

    fn terms_chart(&self) -> BarChart<'a> {
        let bars: Vec<Bar> = self
            .dashboard
            .top_terms
            .iter()
            .map(|(term, count)| {
                Bar::default()
                    .label(Line::from(term.clone()))
                    .value(*count as u64)
                    .style(Style::default().fg(Color::Green))
            })
            .collect();
        BarChart::default()
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .title(" Recherches fréquentes "),
            )
            .direction(ratatui::layout::Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .data(BarGroup::default().bars(&bars))
    }
}

impl Component for DashboardView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(80, 80, area);
        frame.render_widget(Clear, overlay);

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Tableau de bord ")
            .title_bottom(Line::from(" Esc Fermer ").centered());
        let inner = block.inner(overlay);
        frame.render_widget(block, overlay);

        if self.is_loading && self.dashboard.counts.is_empty() {
            frame.render_widget(
                Paragraph::new("Chargement…").style(Style::default().fg(Color::DarkGray)),
                inner,
            );
            return;
        }

        let [left, right] =
            Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(inner);
        frame.render_widget(self.counts_table(), left);
        if self.dashboard.top_terms.is_empty() {
            frame.render_widget(
                Paragraph::new("Aucune recherche enregistrée").block(
                    Block::bordered()
                        .border_type(BorderType::Rounded)
                        .title(" Recherches fréquentes "),
                ),
                right,
            );
        } else {
            frame.render_widget(self.terms_chart(), right);
        }
    }
}
