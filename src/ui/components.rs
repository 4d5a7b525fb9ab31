//! UI Components for the explorer screen

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState,
};
use ratatui::Frame;

use crate::explorer::{BusinessRow, CategoryCount, Selector, ZipSummary, RESULT_COLUMNS};

fn panel(title: &str, focused: bool) -> Block<'_> {
    let border = if focused { Color::Yellow } else { Color::Blue };
    Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title))
        .border_style(Style::default().fg(border))
}

fn highlight() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

/// One of the four cascading lists
pub struct SelectorPanel<'a> {
    pub title: &'a str,
    pub selector: &'a Selector,
    pub cursor: usize,
    pub focused: bool,
}

impl SelectorPanel<'_> {
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .selector
            .options
            .iter()
            .map(|option| {
                let chosen = self.selector.selected.as_deref() == Some(option.as_str());
                let marker = if chosen { "● " } else { "  " };
                let style = if chosen {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                ListItem::new(Span::styled(format!("{}{}", marker, option), style))
            })
            .collect();

        let mut list_state = ListState::default();
        if self.focused && !self.selector.options.is_empty() {
            list_state.select(Some(self.cursor));
        }

        let list = List::new(items)
            .block(panel(self.title, self.focused))
            .highlight_style(highlight());
        frame.render_stateful_widget(list, area, &mut list_state);
    }
}

/// Business listing
pub struct ResultsPanel<'a> {
    pub rows: &'a [BusinessRow],
    pub cursor: usize,
    pub focused: bool,
}

impl ResultsPanel<'_> {
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(RESULT_COLUMNS.iter().map(|h| Cell::from(*h)))
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

        let rows = self
            .rows
            .iter()
            .map(|row| Row::new(row.cells().into_iter().map(Cell::from)));

        let widths = [
            Constraint::Percentage(24),
            Constraint::Percentage(24),
            Constraint::Percentage(14),
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(10),
        ];

        let title = format!("Businesses ({})", self.rows.len());
        let table = Table::new(rows, widths)
            .header(header)
            .block(panel(&title, self.focused))
            .row_highlight_style(highlight());

        let mut table_state = TableState::default();
        if self.focused && !self.rows.is_empty() {
            table_state.select(Some(self.cursor));
        }
        frame.render_stateful_widget(table, area, &mut table_state);
    }
}

/// Business count, population and income for the selected zipcode
pub struct StatsPanel<'a> {
    pub summary: Option<&'a ZipSummary>,
}

impl StatsPanel<'_> {
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let label = Style::default().fg(Color::Gray);
        let lines = match self.summary {
            Some(summary) => vec![
                Line::from(vec![
                    Span::styled(" Businesses:     ", label),
                    Span::raw(summary.business_count.to_string()),
                ]),
                Line::from(vec![
                    Span::styled(" Population:     ", label),
                    Span::raw(summary.population_display()),
                ]),
                Line::from(vec![
                    Span::styled(" Average income: ", label),
                    Span::raw(summary.income_display()),
                ]),
            ],
            None => vec![Line::from(Span::styled(" Select a zipcode", label))],
        };

        let title = match self.summary {
            Some(summary) => format!("Zipcode {}", summary.zipcode),
            None => "Zipcode statistics".to_string(),
        };
        frame.render_widget(Paragraph::new(lines).block(panel(&title, false)), area);
    }
}

/// Categories meeting the popularity threshold in the selected zipcode
pub struct TopCategoriesPanel<'a> {
    pub categories: &'a [CategoryCount],
    pub threshold: u32,
}

impl TopCategoriesPanel<'_> {
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .categories
            .iter()
            .map(|c| ListItem::new(format!(" {:>4}  {}", c.count, c.name)))
            .collect();

        let title = format!("Top categories (≥ {})", self.threshold);
        frame.render_widget(List::new(items).block(panel(&title, false)), area);
    }
}

/// Latest notice plus key help
pub struct ActivityPanel<'a> {
    pub entries: &'a [String],
}

impl ActivityPanel<'_> {
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let help = Span::styled(
            " Tab focus  ↑/↓ move  Enter select  s search  c clear  q quit",
            Style::default().fg(Color::DarkGray),
        );
        let latest = self
            .entries
            .last()
            .map(|entry| Span::styled(format!(" {}", entry), Style::default().fg(Color::White)))
            .unwrap_or_else(|| Span::raw(""));

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Activity ")
            .border_style(Style::default().fg(Color::Blue));

        frame.render_widget(
            Paragraph::new(vec![Line::from(latest), Line::from(help)]).block(block),
            area,
        );
    }
}
