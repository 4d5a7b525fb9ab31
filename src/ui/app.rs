//! Interactive explorer screen

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::Duration;
use tracing::warn;

use super::components::{
    ActivityPanel, ResultsPanel, SelectorPanel, StatsPanel, TopCategoriesPanel,
};
use crate::error::Result;
use crate::explorer::{Catalog, Event, ExplorerState, Selector};

/// Which panel receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    State,
    City,
    Zip,
    Category,
    Results,
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Focus::State,
        Focus::City,
        Focus::Zip,
        Focus::Category,
        Focus::Results,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// Explorer state plus cursor positions; everything the screen shows
pub struct ExplorerView {
    pub state: ExplorerState,
    pub focus: Focus,
    /// Cursor per selector, State..Category
    cursors: [usize; 4],
    results_cursor: usize,
    activity: Vec<String>,
}

impl ExplorerView {
    const MAX_ACTIVITY: usize = 100;

    pub fn new(state: ExplorerState) -> Self {
        Self {
            state,
            focus: Focus::State,
            cursors: [0; 4],
            results_cursor: 0,
            activity: Vec::new(),
        }
    }

    pub fn activity(&self) -> &[String] {
        &self.activity
    }

    pub fn cursor(&self, focus: Focus) -> usize {
        match focus {
            Focus::Results => self.results_cursor,
            other => self.cursors[other.index()],
        }
    }

    fn selector(&self, focus: Focus) -> Option<&Selector> {
        match focus {
            Focus::State => Some(&self.state.states),
            Focus::City => Some(&self.state.cities),
            Focus::Zip => Some(&self.state.zipcodes),
            Focus::Category => Some(&self.state.categories),
            Focus::Results => None,
        }
    }

    fn len(&self, focus: Focus) -> usize {
        match self.selector(focus) {
            Some(selector) => selector.options.len(),
            None => self.state.results.len(),
        }
    }

    fn push_activity(&mut self, message: impl Into<String>) {
        self.activity.push(message.into());
        if self.activity.len() > Self::MAX_ACTIVITY {
            self.activity.remove(0);
        }
    }

    fn move_cursor(&mut self, down: bool) {
        let len = self.len(self.focus);
        if len == 0 {
            return;
        }
        let current = self.cursor(self.focus).min(len - 1);
        let moved = if down {
            (current + 1).min(len - 1)
        } else {
            current.saturating_sub(1)
        };
        match self.focus {
            Focus::Results => self.results_cursor = moved,
            other => self.cursors[other.index()] = moved,
        }
    }

    /// Event for Enter on the focused list
    fn selection_event(&self) -> Option<Event> {
        let selector = self.selector(self.focus)?;
        let value = selector.options.get(self.cursor(self.focus))?.clone();
        Some(match self.focus {
            Focus::State => Event::SelectState(value),
            Focus::City => Event::SelectCity(value),
            Focus::Zip => Event::SelectZip(value),
            Focus::Category | Focus::Results => Event::SelectCategory(value),
        })
    }

    fn dispatch(&mut self, event: Event, catalog: &impl Catalog) {
        let from = self.focus;
        match self.state.apply(event.clone(), catalog) {
            Ok(next) => {
                self.state = next;
                if let Some(notice) = self.state.notice.clone() {
                    self.push_activity(notice);
                }
            }
            Err(e) => {
                warn!("Query failed for {:?}: {}", event, e);
                self.push_activity(format!("Query failed: {}", e));
                return;
            }
        }

        match event {
            Event::Clear => {
                self.cursors = [0; 4];
                self.focus = Focus::State;
            }
            Event::Search => {}
            _ => {
                // Lists below the changed one were repopulated
                for idx in from.index() + 1..self.cursors.len() {
                    self.cursors[idx] = 0;
                }
                if from != Focus::Category {
                    self.focus = from.next();
                }
            }
        }
        self.results_cursor = 0;
        if !self.state.results.is_empty() {
            self.push_activity(format!("{} businesses", self.state.results.len()));
        }
    }

    /// Apply one key press. Returns true when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode, catalog: &impl Catalog) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(false),
            KeyCode::Enter => {
                if let Some(event) = self.selection_event() {
                    self.dispatch(event, catalog);
                }
            }
            KeyCode::Char('s') => self.dispatch(Event::Search, catalog),
            KeyCode::Char('c') => self.dispatch(Event::Clear, catalog),
            _ => {}
        }
        false
    }
}

/// Full-screen explorer
pub struct ExplorerApp<C: Catalog> {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    view: ExplorerView,
    catalog: C,
}

impl<C: Catalog> ExplorerApp<C> {
    /// Load the state list, then enter the alternate screen
    pub fn new(catalog: C, top_category_threshold: u32) -> Result<Self> {
        let state = ExplorerState::new(&catalog, top_category_threshold)?;

        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            view: ExplorerView::new(state),
            catalog,
        })
    }

    /// Process key presses until the user quits
    pub fn run(mut self) -> Result<()> {
        loop {
            self.draw()?;

            if event::poll(Duration::from_millis(250))? {
                if let CrosstermEvent::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press
                        && self.view.handle_key(key.code, &self.catalog)
                    {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let view = &self.view;

        self.terminal.draw(|frame| {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(10), Constraint::Length(4)])
                .split(frame.area());

            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(30), Constraint::Min(40)])
                .split(rows[0]);

            let selectors = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Ratio(1, 4); 4])
                .split(columns[0]);

            let right = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(8), Constraint::Min(5)])
                .split(columns[1]);

            let panels = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(right[0]);

            let lists = [
                ("State", Focus::State),
                ("City", Focus::City),
                ("Zipcode", Focus::Zip),
                ("Category", Focus::Category),
            ];
            for (area, (title, focus)) in selectors.iter().zip(lists) {
                if let Some(selector) = view.selector(focus) {
                    SelectorPanel {
                        title,
                        selector,
                        cursor: view.cursor(focus),
                        focused: view.focus == focus,
                    }
                    .render(frame, *area);
                }
            }

            StatsPanel {
                summary: view.state.zip_summary.as_ref(),
            }
            .render(frame, panels[0]);

            TopCategoriesPanel {
                categories: &view.state.top_categories,
                threshold: view.state.top_category_threshold,
            }
            .render(frame, panels[1]);

            ResultsPanel {
                rows: &view.state.results,
                cursor: view.cursor(Focus::Results),
                focused: view.focus == Focus::Results,
            }
            .render(frame, right[1]);

            ActivityPanel {
                entries: view.activity(),
            }
            .render(frame, rows[1]);
        })?;

        Ok(())
    }

}

impl<C: Catalog> Drop for ExplorerApp<C> {
    /// Runs once, on quit or when `run` bails out with an error
    fn drop(&mut self) {
        terminal::disable_raw_mode().ok();
        self.terminal
            .backend_mut()
            .execute(LeaveAlternateScreen)
            .ok();
        self.terminal.show_cursor().ok();
    }
}
