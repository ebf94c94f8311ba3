// TUI module - interactive tendency override editor
use crate::catalog::Catalog;
use crate::export::{resolve_output_path, write_snapshot};
use crate::generation::Generated;
use crate::tendency::{ColorClass, TendencyEditor, TendencyEntry};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    prelude::CrosstermBackend,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// App state for the TUI
pub struct App {
    pub editor: TendencyEditor,
    generated: Generated,
    pub player_idx: usize,
    pub selected_tab: usize,
    pub selected_row: usize,
    /// Text being typed into the override field, when editing
    pub input: Option<String>,
    pub status_message: String,
    export_dir: Option<PathBuf>,
}

impl App {
    pub fn new(catalog: Arc<Catalog>, generated: Generated, player_idx: usize) -> Self {
        let player_idx = player_idx.min(generated.players().len().saturating_sub(1));
        let mut editor = TendencyEditor::new(catalog);
        if let Some(result) = generated.players().get(player_idx) {
            editor.load(result);
        }

        Self {
            editor,
            generated,
            player_idx,
            selected_tab: 0,
            selected_row: 0,
            input: None,
            status_message: "Enter: edit | x: export | q: quit".to_string(),
            export_dir: None,
        }
    }

    pub fn with_export_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.export_dir = dir;
        self
    }

    fn group_count(&self) -> usize {
        self.editor.groups().len()
    }

    fn row_count(&self) -> usize {
        self.editor
            .groups()
            .get(self.selected_tab)
            .map(|(_, entries)| entries.len())
            .unwrap_or(0)
    }

    pub fn selected_entry(&self) -> Option<&TendencyEntry> {
        self.editor
            .groups()
            .into_iter()
            .nth(self.selected_tab)
            .and_then(|(_, entries)| entries.into_iter().nth(self.selected_row))
    }

    pub fn next_tab(&mut self) {
        let count = self.group_count();
        if count > 0 {
            self.selected_tab = (self.selected_tab + 1) % count;
            self.selected_row = 0;
        }
    }

    pub fn prev_tab(&mut self) {
        let count = self.group_count();
        if count > 0 {
            self.selected_tab = if self.selected_tab == 0 {
                count - 1
            } else {
                self.selected_tab - 1
            };
            self.selected_row = 0;
        }
    }

    pub fn next_row(&mut self) {
        let max_rows = self.row_count();
        if max_rows > 0 {
            self.selected_row = (self.selected_row + 1) % max_rows;
        }
    }

    pub fn prev_row(&mut self) {
        let max_rows = self.row_count();
        if max_rows > 0 {
            self.selected_row = if self.selected_row == 0 {
                max_rows - 1
            } else {
                self.selected_row - 1
            };
        }
    }

    pub fn begin_edit(&mut self) {
        if let Some(entry) = self.selected_entry() {
            let seed = entry
                .pending
                .clone()
                .unwrap_or_else(|| entry.current.to_string());
            self.input = Some(seed);
        }
    }

    pub fn type_char(&mut self, c: char) {
        if let Some(input) = self.input.as_mut() {
            input.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(input) = self.input.as_mut() {
            input.pop();
        }
    }

    pub fn cancel_edit(&mut self) {
        self.input = None;
    }

    /// Run the typed text through the engine; invalid text stays flagged on the row
    pub fn commit_edit(&mut self) {
        let Some(raw) = self.input.take() else {
            return;
        };
        let Some(name) = self.selected_entry().map(|e| e.name.clone()) else {
            return;
        };

        self.status_message = match self.editor.apply_override(&name, &raw) {
            Ok(value) => format!("{} set to {}", name, value),
            Err(err) => format!("{}: {} (kept {})", name, err, self.editor.current(&name).unwrap_or(0)),
        };
    }

    /// Switch to another bulk-result card, replacing the whole set
    pub fn select_player(&mut self, idx: usize) {
        let Some(result) = self.generated.players().get(idx).copied() else {
            return;
        };
        self.editor.load(result);
        self.player_idx = idx;
        self.selected_tab = 0;
        self.selected_row = 0;
        self.input = None;
        self.status_message = format!("Loaded {}", result.name);
    }

    pub fn next_player(&mut self) {
        let count = self.generated.players().len();
        if count > 1 {
            self.select_player((self.player_idx + 1) % count);
        }
    }

    pub fn prev_player(&mut self) {
        let count = self.generated.players().len();
        if count > 1 {
            self.select_player((self.player_idx + count - 1) % count);
        }
    }

    pub fn export(&mut self) -> Result<PathBuf> {
        let snapshot = self.editor.snapshot();
        let path = resolve_output_path(None, self.export_dir.as_deref(), &snapshot.name);
        write_snapshot(&snapshot, &path)?;
        self.status_message = format!("Exported to {}", path.display());
        Ok(path)
    }

    /// Returns false when the app should quit
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.input.is_some() {
            match code {
                KeyCode::Enter => self.commit_edit(),
                KeyCode::Esc => self.cancel_edit(),
                KeyCode::Backspace => self.backspace(),
                KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => self.type_char(c),
                _ => {}
            }
            return true;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => self.next_tab(),
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => self.prev_tab(),
            KeyCode::Down | KeyCode::Char('j') => self.next_row(),
            KeyCode::Up | KeyCode::Char('k') => self.prev_row(),
            KeyCode::Enter | KeyCode::Char('e') => self.begin_edit(),
            KeyCode::Char('n') => self.next_player(),
            KeyCode::Char('p') => self.prev_player(),
            KeyCode::Char('x') => {
                if let Err(err) = self.export() {
                    warn!("Export failed: {:#}", err);
                    self.status_message = format!("Export failed: {}", err);
                }
            }
            _ => {}
        }
        true
    }
}

/// Run the TUI application
pub fn run_tui(app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = app;
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !app.handle_key(key.code) {
                    return Ok(());
                }
            }
        }
    }
}

fn band_color(color: ColorClass) -> Color {
    match color {
        ColorClass::Green => Color::Green,
        ColorClass::Yellow => Color::Yellow,
        ColorClass::Red => Color::Red,
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Category tabs
            Constraint::Length(3), // Player + status
            Constraint::Min(10),   // Tendency table
            Constraint::Length(3), // Footer
        ])
        .split(f.area());

    let groups = app.editor.groups();
    let titles: Vec<String> = groups.iter().map(|(name, _)| name.to_string()).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" tendedit - Tendency Editor "),
        )
        .select(app.selected_tab)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, chunks[0]);

    let player = app.editor.player();
    let status = Paragraph::new(app.status_message.clone()).block(
        Block::default().borders(Borders::ALL).title(format!(
            " {} {} {} ",
            player.name, player.team, player.position
        )),
    );
    f.render_widget(status, chunks[1]);

    match groups.get(app.selected_tab) {
        Some((name, entries)) => render_category(f, app, name, entries, chunks[2]),
        None => {
            let placeholder = Paragraph::new("No tendencies loaded.")
                .block(Block::default().borders(Borders::ALL).title(" Tendencies "));
            f.render_widget(placeholder, chunks[2]);
        }
    }

    let footer_text = if app.input.is_some() {
        " Enter:Commit | Esc:Cancel | 0-9,-:Type | Backspace:Delete "
    } else {
        " q:Quit | Tab:Category | j/k:Navigate | Enter:Edit | n/p:Player | x:Export "
    };
    let footer = Paragraph::new(footer_text)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[3]);
}

fn render_category(f: &mut Frame, app: &App, name: &str, entries: &[&TendencyEntry], area: Rect) {
    let rows: Vec<Row> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let selected = i == app.selected_row;
            let style = if selected {
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let override_cell = match (&app.input, selected) {
                (Some(buf), true) => Cell::from(format!("{}▏", buf))
                    .style(Style::default().fg(Color::Cyan)),
                _ => match &entry.pending {
                    Some(raw) if entry.invalid => Cell::from(format!("{} ✗ invalid", raw))
                        .style(Style::default().fg(Color::Red)),
                    _ => Cell::from(entry.current.to_string()),
                },
            };

            Row::new(vec![
                Cell::from(entry.name.clone()),
                Cell::from(entry.cap.to_string()),
                Cell::from(entry.current.to_string())
                    .style(Style::default().fg(band_color(entry.color))),
                override_cell,
            ])
            .style(style)
        })
        .collect();

    let header = Row::new(vec!["Tendency", "Cap", "Value", "Override"])
        .style(Style::default().add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let table = Table::new(
        rows,
        [
            Constraint::Min(30),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ({}) ", name, entries.len())),
    );

    f.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bulk() -> Generated {
        Generated::from_value(json!([
            {"name": "Jayson Tatum", "team": "BOS", "position": "SF", "tendencies": {"Shot": 70}},
            {"name": "Jrue Holiday", "team": "BOS", "position": "PG", "tendencies": {"Shot": 45}}
        ]))
        .unwrap()
    }

    #[test]
    fn test_edit_flow_commits_valid_value() {
        let mut app = App::new(Catalog::builtin(), bulk(), 0);
        assert_eq!(app.selected_entry().map(|e| e.name.as_str()), Some("Shot"));

        app.handle_key(KeyCode::Enter);
        assert_eq!(app.input.as_deref(), Some("70"));
        app.handle_key(KeyCode::Backspace);
        app.handle_key(KeyCode::Backspace);
        for c in "90".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        app.handle_key(KeyCode::Enter);

        assert!(app.input.is_none());
        assert_eq!(app.editor.current("Shot"), Some(75));
        assert_eq!(app.status_message, "Shot set to 75");
    }

    #[test]
    fn test_invalid_edit_is_flagged_and_reseeded() {
        let mut app = App::new(Catalog::builtin(), bulk(), 0);
        app.begin_edit();
        app.input = Some("37".to_string());
        app.commit_edit();

        let entry = app.selected_entry().unwrap();
        assert!(entry.invalid);
        assert_eq!(entry.current, 70);

        // Re-opening the field shows the rejected text again
        app.begin_edit();
        assert_eq!(app.input.as_deref(), Some("37"));
    }

    #[test]
    fn test_letters_ignored_while_editing() {
        let mut app = App::new(Catalog::builtin(), bulk(), 0);
        app.begin_edit();
        app.handle_key(KeyCode::Char('q'));
        assert_eq!(app.input.as_deref(), Some("70"));
        assert!(app.handle_key(KeyCode::Esc));
        assert!(app.input.is_none());
        assert!(!app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = App::new(Catalog::builtin(), bulk(), 0);
        app.prev_tab();
        assert_eq!(app.selected_tab, app.group_count() - 1);
        app.next_tab();
        assert_eq!(app.selected_tab, 0);

        app.prev_row();
        assert_eq!(app.selected_row, 24);
        app.next_row();
        assert_eq!(app.selected_row, 0);
    }

    #[test]
    fn test_switching_player_replaces_set() {
        let mut app = App::new(Catalog::builtin(), bulk(), 0);
        app.input = Some("50".to_string());
        app.commit_edit();
        assert_eq!(app.editor.current("Shot"), Some(50));

        app.next_player();
        assert_eq!(app.player_idx, 1);
        assert_eq!(app.editor.player().name, "Jrue Holiday");
        assert_eq!(app.editor.current("Shot"), Some(45));

        app.prev_player();
        assert_eq!(app.editor.current("Shot"), Some(70));
    }

    #[test]
    fn test_export_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(Catalog::builtin(), bulk(), 1)
            .with_export_dir(Some(dir.path().to_path_buf()));
        let path = app.export().unwrap();
        assert_eq!(path, dir.path().join("Jrue_Holiday_tendencies.json"));
        assert!(path.exists());
    }
}
