use anyhow::Result;
use contractor_lookup::{
    format_currency, BusinessProfile, ContractsOutcome, LookupEngine, SearchStatus, Session,
    SessionView,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

pub struct App {
    pub engine: LookupEngine,
    pub session: Session,
    pub input: String,
    pub view: SessionView,
    pub candidate_state: ListState,
    pub contract_state: TableState,
}

impl App {
    pub fn new(engine: LookupEngine) -> Self {
        let session = Session::new();
        let view = session.view(&engine);

        Self {
            engine,
            session,
            input: String::new(),
            view,
            candidate_state: ListState::default(),
            contract_state: TableState::default(),
        }
    }

    /// Search on every edit, like a live text box
    fn refresh_search(&mut self) {
        self.session.search(&self.engine, &self.input);
        self.candidate_state.select(if self.session.candidates().is_empty() {
            None
        } else {
            Some(0)
        });
        self.refresh_view();
    }

    fn refresh_view(&mut self) {
        self.view = self.session.view(&self.engine);
        let has_rows = matches!(&self.view.contracts, Some(ContractsOutcome::Found(_)));
        self.contract_state.select(if has_rows { Some(0) } else { None });
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
        self.refresh_search();
    }

    pub fn pop_char(&mut self) {
        self.input.pop();
        self.refresh_search();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.refresh_search();
    }

    pub fn next_candidate(&mut self) {
        let len = self.session.candidates().len();
        if len == 0 {
            return;
        }
        let i = match self.candidate_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.candidate_state.select(Some(i));
    }

    pub fn previous_candidate(&mut self) {
        let len = self.session.candidates().len();
        if len == 0 {
            return;
        }
        let i = match self.candidate_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.candidate_state.select(Some(i));
    }

    /// Commit the highlighted candidate as the selection
    pub fn choose_candidate(&mut self) {
        let Some(name) = self
            .candidate_state
            .selected()
            .and_then(|i| self.session.candidates().get(i))
            .cloned()
        else {
            return;
        };

        if self.session.select(&name).is_ok() {
            self.refresh_view();
        }
    }

    fn contract_count(&self) -> usize {
        match &self.view.contracts {
            Some(ContractsOutcome::Found(summary)) => summary.lines.len(),
            _ => 0,
        }
    }

    pub fn scroll_contracts(&mut self, delta: isize) {
        let len = self.contract_count();
        if len == 0 {
            return;
        }
        let current = self.contract_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.contract_state.select(Some(next as usize));
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

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.clear_input(),
                KeyCode::Char(c) => app.push_char(c),
                KeyCode::Backspace => app.pop_char(),
                KeyCode::Down => app.next_candidate(),
                KeyCode::Up => app.previous_candidate(),
                KeyCode::Enter => app.choose_candidate(),
                KeyCode::PageDown => app.scroll_contracts(10),
                KeyCode::PageUp => app.scroll_contracts(-10),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search box
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_search_box(f, chunks[0], app);

    // Candidate list stays visible while the search is ambiguous
    let content = if app.view.status == SearchStatus::MultipleCandidates {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(chunks[1]);
        render_candidates(f, content_chunks[0], app);
        content_chunks[1]
    } else {
        chunks[1]
    };

    match app.view.profile.clone() {
        Some(profile) => {
            let detail_chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(12), Constraint::Min(0)])
                .split(content);
            render_profile(f, detail_chunks[0], &profile);
            render_contracts(f, detail_chunks[1], app);
        }
        None => render_placeholder(f, content, app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_search_box(f: &mut Frame, area: Rect, app: &App) {
    let line = Line::from(vec![
        Span::styled(" Name or address: ", Style::default().fg(Color::Cyan)),
        Span::styled(
            app.input.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled("█", Style::default().fg(Color::DarkGray)),
    ]);

    let search = Paragraph::new(vec![line]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Contractor Profile Lookup "),
    );

    f.render_widget(search, area);
}

fn render_candidates(f: &mut Frame, area: Rect, app: &mut App) {
    let selected = app.session.selected().map(str::to_string);
    let items: Vec<ListItem> = app
        .session
        .candidates()
        .iter()
        .map(|name| {
            let style = if Some(name) == selected.as_ref() {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(truncate(name, area.width.saturating_sub(6) as usize)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Multiple businesses found "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(list, area, &mut app.candidate_state);
}

fn field_line<'a>(label: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(value),
    ])
}

fn render_profile(f: &mut Frame, area: Rect, profile: &BusinessProfile) {
    let violation_style = if profile.has_violations() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };

    let content = vec![
        field_line("  Business Name: ", profile.business_name.clone()),
        field_line("  Address: ", profile.address.clone()),
        field_line("  City, State, ZIP: ", profile.locality()),
        field_line("  Phone: ", profile.phone.clone()),
        field_line("  MWBE Status: ", profile.mwbe_status.clone()),
        field_line("  Debarment: ", profile.debarment.clone()),
        field_line("  Apprenticeship Program: ", profile.apprenticeship_program.clone()),
        Line::from(vec![
            Span::styled("  Violations: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::styled(profile.violation_summary.clone(), violation_style),
        ]),
    ];

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(format!(" Business Profile for {} ", profile.business_name)),
    );

    f.render_widget(panel, area);
}

fn render_contracts(f: &mut Frame, area: Rect, app: &mut App) {
    if let Some(err) = &app.view.error {
        let error = Paragraph::new(format!("  {}", err))
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title(" Associated Contracts "));
        f.render_widget(error, area);
        return;
    }

    let summary = match &app.view.contracts {
        Some(ContractsOutcome::Found(summary)) => summary.clone(),
        _ => {
            let warning = Paragraph::new("  No contracts found for this contractor.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL).title(" Associated Contracts "));
            f.render_widget(warning, area);
            return;
        }
    };

    let header_cells = ["Contract ID", "Amount", "Start", "End", "Agency"]
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

    let rows = summary.lines.iter().map(|line| {
        let amount = line
            .amount
            .map(format_currency)
            .unwrap_or_else(|| "N/A".to_string());

        Row::new(vec![
            Cell::from(line.contract_id.clone()),
            Cell::from(amount).style(Style::default().fg(Color::Green)),
            Cell::from(line.start_date.clone()),
            Cell::from(line.end_date.clone()),
            Cell::from(truncate(&line.agency, 40)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(16),
            Constraint::Length(18),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(
                " Associated Contracts - Total {} ",
                summary.total_display()
            )),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.contract_state);
}

fn render_placeholder(f: &mut Frame, area: Rect, app: &App) {
    let (message, color) = match app.view.status {
        SearchStatus::AwaitingInput => ("Please enter a business name or address.", Color::Yellow),
        SearchStatus::NoMatch => ("No registry records match this search.", Color::Yellow),
        SearchStatus::MultipleCandidates => (
            "Multiple businesses found. Please select one before continuing.",
            Color::Cyan,
        ),
        SearchStatus::Resolved => ("", Color::White),
    };

    let mut content = vec![Line::from(""), Line::from(Span::styled(format!("  {}", message), Style::default().fg(color)))];
    if let Some(err) = &app.view.error {
        content.push(Line::from(""));
        content.push(Line::from(Span::styled(format!("  {}", err), Style::default().fg(Color::Red))));
    }

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let data = app.engine.dataset();

    let status_spans = vec![
        Span::styled(
            format!(" Registry: {} ", data.registry.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("|"),
        Span::styled(
            format!(" Contracts: {} ", data.contracts.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("| "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Candidate | "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Select | "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" Contracts | "),
        Span::styled("Ctrl-U", Style::default().fg(Color::Yellow)),
        Span::raw(" Clear | "),
        Span::styled("Esc", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
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
    use contractor_lookup::{ContractRow, Dataset, RegistryRow};

    fn create_test_app() -> App {
        let row = |name: &str| RegistryRow {
            business_name: Some(name.to_string()),
            address: Some("1 Main St".to_string()),
            ..Default::default()
        };
        let registry = vec![row("ACME ROOFING"), row("ACME PAVING")];
        let contracts = vec![ContractRow {
            prime_vendor: Some("ACME PAVING".to_string()),
            contract_id: Some("C-1".to_string()),
            amount: Some("2,500".to_string()),
            ..Default::default()
        }];

        App::new(LookupEngine::new(Dataset::from_rows(registry, contracts)))
    }

    #[test]
    fn test_typing_searches_and_enter_selects() {
        let mut app = create_test_app();
        assert_eq!(app.view.status, SearchStatus::AwaitingInput);

        for c in "acme".chars() {
            app.push_char(c);
        }
        assert_eq!(app.view.status, SearchStatus::MultipleCandidates);
        assert!(app.view.profile.is_none());

        app.next_candidate();
        app.choose_candidate();

        let profile = app.view.profile.clone().unwrap();
        assert_eq!(profile.business_name, "ACME PAVING");
        assert_eq!(app.contract_count(), 1);
    }

    #[test]
    fn test_candidate_navigation_wraps() {
        let mut app = create_test_app();
        for c in "acme".chars() {
            app.push_char(c);
        }

        app.previous_candidate();
        assert_eq!(app.candidate_state.selected(), Some(1));
        app.next_candidate();
        assert_eq!(app.candidate_state.selected(), Some(0));
    }

    #[test]
    fn test_clear_input_resets_view() {
        let mut app = create_test_app();
        for c in "roofing".chars() {
            app.push_char(c);
        }
        assert!(app.view.profile.is_some());

        app.clear_input();
        assert_eq!(app.view.status, SearchStatus::AwaitingInput);
        assert!(app.view.profile.is_none());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long agency name", 10), "a very ...");
    }
}
