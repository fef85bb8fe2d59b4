// 🖥️ Terminal UI - live results table with filters, details and export

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::path::Path;
use std::time::Duration;
use valid_guard::{
    classify, summarize, write_csv, ColorTag, DisplayRecord, ExportLayout, Filter, RecordStore,
    SummaryStats,
};

/// Redraw interval while registry checks are still resolving
const TICK: Duration = Duration::from_millis(100);

pub struct App {
    store: RecordStore,
    pub filter: Filter,
    pub rows: Vec<DisplayRecord>,
    pub summary: SummaryStats,
    pub pending: usize,
    pub state: TableState,
    pub show_detail: bool,
    pub message: Option<String>,
}

impl App {
    pub fn new(store: RecordStore, filter: Filter) -> Self {
        let mut app = Self {
            store,
            filter,
            rows: Vec::new(),
            summary: summarize(&[]),
            pending: 0,
            state: TableState::default(),
            show_detail: false,
            message: None,
        };
        app.refresh();
        app
    }

    /// Re-read the store; statuses may have changed since the last frame
    pub fn refresh(&mut self) {
        let snapshot = self.store.snapshot();
        self.summary = summarize(&snapshot);
        self.pending = snapshot.iter().filter(|r| r.awaiting_registry()).count();
        self.rows = classify(&snapshot, self.filter);

        let selected = match (self.state.selected(), self.rows.len()) {
            (_, 0) => None,
            (Some(i), len) if i >= len => Some(len - 1),
            (Some(i), _) => Some(i),
            (None, _) => Some(0),
        };
        self.state.select(selected);
    }

    pub fn apply_filter(&mut self, filter: Filter) {
        self.filter = filter;
        self.state.select(None);
        self.refresh();
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_row(&self) -> Option<&DisplayRecord> {
        self.state.selected().and_then(|i| self.rows.get(i))
    }

    pub fn next(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| (i + 20).min(len - 1));
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = self.state.selected().map_or(0, |i| i.saturating_sub(20));
        self.state.select(Some(i));
    }

    /// Export the rows currently shown
    pub fn export(&mut self, layout: ExportLayout) {
        let path = Path::new(layout.file_name());
        self.message = Some(match write_csv(path, &self.rows, layout) {
            Ok(()) => format!("Exported {} rows to {}", self.rows.len(), path.display()),
            Err(e) => format!("Export failed: {}", e),
        });
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        app.refresh();
        terminal.draw(|f| ui(f, app))?;

        if !event::poll(TICK)? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab | KeyCode::Char('f') => app.apply_filter(app.filter.next()),
                KeyCode::Char('1') => app.apply_filter(Filter::All),
                KeyCode::Char('2') => app.apply_filter(Filter::Valid),
                KeyCode::Char('3') => app.apply_filter(Filter::Regular),
                KeyCode::Char('4') => app.apply_filter(Filter::Invalid),
                KeyCode::Char('e') => app.export(ExportLayout::Registry),
                KeyCode::Char('p') => app.export(ExportLayout::PersonRecord),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.state.select(Some(0)),
                KeyCode::End => {
                    if !app.rows.is_empty() {
                        app.state.select(Some(app.rows.len() - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn color_of(tag: ColorTag) -> Color {
    match tag {
        ColorTag::Success => Color::Green,
        ColorTag::Danger => Color::Red,
        ColorTag::Info => Color::LightBlue,
        ColorTag::Warning => Color::Yellow,
        ColorTag::InProgress => Color::DarkGray,
        ColorTag::Neutral => Color::Gray,
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Summary + filters
            Constraint::Min(0),    // Results
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let s = &app.summary;

    let mut spans = vec![
        Span::styled(format!("Total: {}", s.total), Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(format!("✓ {}", s.valid_count), Style::default().fg(Color::Green)),
        Span::raw("  "),
        Span::styled(format!("✗ {}", s.invalid_count), Style::default().fg(Color::Red)),
        Span::raw("  "),
        Span::styled(format!("Regular: {}", s.regular_count), Style::default().fg(Color::LightBlue)),
        Span::raw("  "),
        Span::styled(format!("Taxa: {}", s.valid_rate), Style::default().fg(Color::Cyan)),
        Span::raw("  |  "),
    ];

    for (i, filter) in Filter::ALL_FILTERS.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *filter == app.filter {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("{} {}", i + 1, filter.label()), style));
    }

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Nome", "CPF", "Nascimento", "Status", "Região", "Receita"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.rows.iter().map(|d| {
        let cells = vec![
            Cell::from(truncate(&d.record.name, 30)),
            Cell::from(d.formatted_id_number.clone()),
            Cell::from(d.record.date_of_birth.clone()),
            Cell::from(d.status_label.clone()).style(Style::default().fg(color_of(d.status_color))),
            Cell::from(truncate(d.record.region.as_deref().unwrap_or("-"), 24)),
            Cell::from(d.registry_label.clone())
                .style(Style::default().fg(color_of(d.registry_color))),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(26),
            Constraint::Length(11),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" CPFs - {} ", app.filter.label())),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.rows.len()),
        Style::default().fg(Color::Cyan),
    )];

    if app.pending > 0 {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Consultando Receita: {}", app.pending),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::SLOW_BLINK),
        ));
    }

    if let Some(message) = &app.message {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(message.clone(), Style::default().fg(Color::Green)));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Filter | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Details | "));
    status_spans.push(Span::styled("e/p", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Export | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Detalhes ");

    let Some(d) = app.selected_row() else {
        f.render_widget(Paragraph::new("Nenhum registro selecionado").block(block), area);
        return;
    };

    let label = |text: &'static str| {
        Span::styled(text, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    };

    let content = vec![
        Line::from(""),
        Line::from(vec![label("  Nome: "), Span::raw(d.record.name.clone())]),
        Line::from(""),
        Line::from(vec![label("  CPF: "), Span::raw(d.formatted_id_number.clone())]),
        Line::from(vec![label("  Original: "), Span::raw(d.record.id_number.clone())]),
        Line::from(""),
        Line::from(vec![label("  Nascimento: "), Span::raw(d.record.date_of_birth.clone())]),
        Line::from(""),
        Line::from(vec![
            label("  Status: "),
            Span::styled(d.status_label.clone(), Style::default().fg(color_of(d.status_color))),
        ]),
        Line::from(""),
        Line::from(vec![
            label("  Região: "),
            Span::raw(d.record.region.clone().unwrap_or_else(|| "-".to_string())),
        ]),
        Line::from(""),
        Line::from(vec![
            label("  Receita: "),
            Span::styled(d.registry_label.clone(), Style::default().fg(color_of(d.registry_color))),
        ]),
        Line::from(""),
        Line::from(vec![
            label("  Verificado em: "),
            Span::raw(d.record.checked_at.format("%d/%m/%Y %H:%M:%S").to_string()),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Press Enter to close",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valid_guard::{RegistryStatus, ValidatedRecord};

    fn store_with(numbers: &[&str]) -> RecordStore {
        let store = RecordStore::new();
        store.prepend_batch(
            numbers
                .iter()
                .map(|n| ValidatedRecord::from_id_number(n.to_string()))
                .collect(),
        );
        store
    }

    #[test]
    fn test_refresh_picks_up_status_changes() {
        let store = store_with(&["06819885253", "12345678900"]);
        let mut app = App::new(store.clone(), Filter::Regular);
        assert!(app.rows.is_empty());
        assert_eq!(app.pending, 1);

        let id = store.snapshot()[0].id.clone();
        store.update_status(&id, RegistryStatus::Regular);
        app.refresh();

        assert_eq!(app.rows.len(), 1);
        assert_eq!(app.summary.regular_count, 1);
        assert_eq!(app.pending, 0);
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = App::new(store_with(&["06819885253", "12345678900", "123"]), Filter::All);
        assert_eq!(app.state.selected(), Some(0));
        app.previous();
        assert_eq!(app.state.selected(), Some(2));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
        app.page_down();
        assert_eq!(app.state.selected(), Some(2));
        app.page_up();
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_filter_keeps_summary_global() {
        let mut app = App::new(store_with(&["06819885253", "12345678900", "123"]), Filter::All);
        app.apply_filter(Filter::Invalid);
        assert_eq!(app.rows.len(), 2);
        assert_eq!(app.summary.total, 3);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("MARIA", 10), "MARIA");
        assert_eq!(truncate("JOÃO DA CONCEIÇÃO", 10), "JOÃO DA...");
    }
}
