use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use webcompare_client::ComparisonResult;
use webcompare_core::cache::ResultCache;
use webcompare_core::report::EMPTY_MESSAGE;
use webcompare_core::session::SessionId;
use webcompare_core::source::{ViewData, ViewSources, compose};
use webcompare_core::text::{TEXT_SECTIONS, TextBreakdown};
use webcompare_core::views::{ScoreBand, Section, SectionTable, Summary, display_score, summary};
use webcompare_core::vision::{Severity, VisionBrowser, VisionWebsite};

/// Updates pushed into the browser from outside the UI loop
#[derive(Debug, Clone)]
pub enum BrowserMessage {
    /// The session's entry changed in another context; `None` once it is gone
    Updated(Option<ComparisonResult>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Summary,
    Text,
    Vision,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Summary, Tab::Text, Tab::Vision];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Summary => "Summary",
            Tab::Text => "Text Analysis",
            Tab::Vision => "Vision Improvements",
        }
    }

    fn index(&self) -> usize {
        match self {
            Tab::Summary => 0,
            Tab::Text => 1,
            Tab::Vision => 2,
        }
    }

    fn next(self) -> Self {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn previous(self) -> Self {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// What the loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserAction {
    None,
    Quit,
    ClearCache,
}

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub asset_base: String,
    pub diagnostics: bool,
}

/// Browser state. Projections are rebuilt whenever new data is applied.
pub struct ResultBrowser {
    data: ViewData,
    summary: Option<Summary>,
    text: Option<TextBreakdown>,
    vision: Option<VisionBrowser>,
    tab: Tab,
    section: Section,
    selected_website: usize,
    status: Option<String>,
    options: BrowserOptions,
    rx: mpsc::UnboundedReceiver<BrowserMessage>,
}

impl ResultBrowser {
    pub fn new(
        data: ViewData,
        options: BrowserOptions,
        rx: mpsc::UnboundedReceiver<BrowserMessage>,
    ) -> Self {
        let mut browser = Self {
            data: ViewData::Empty,
            summary: None,
            text: None,
            vision: None,
            tab: Tab::Summary,
            section: Section::Full,
            selected_website: 0,
            status: None,
            options,
            rx,
        };
        browser.apply(data);
        browser
    }

    pub fn data(&self) -> &ViewData {
        &self.data
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn selected_website(&self) -> Option<&str> {
        self.website_names()
            .get(self.selected_website)
            .map(String::as_str)
    }

    /// Replaces the displayed data, keeping tab and section
    pub fn apply(&mut self, data: ViewData) {
        match data.result() {
            Some(result) => {
                self.summary = Some(summary(result));
                self.text = Some(TextBreakdown::build(result));
                self.vision = Some(VisionBrowser::build(result, &self.options.asset_base));
            }
            None => {
                self.summary = None;
                self.text = None;
                self.vision = None;
            }
        }
        self.data = data;

        let count = self.website_names().len();
        self.selected_website = self.selected_website.min(count.saturating_sub(1));
    }

    /// Drains pushed updates without blocking
    pub fn process_messages(&mut self, sources: &ViewSources) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                BrowserMessage::Updated(fresh) => {
                    let status = if fresh.is_some() {
                        "Results updated in another window"
                    } else {
                        "Results cleared in another window"
                    };
                    self.apply(sources.resolve(fresh));
                    self.set_status(status);
                }
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> BrowserAction {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return BrowserAction::Quit;
            }
            KeyCode::Char('q') | KeyCode::Esc => return BrowserAction::Quit,
            KeyCode::Char('c') if self.options.diagnostics => return BrowserAction::ClearCache,
            KeyCode::Tab | KeyCode::Right => self.tab = self.tab.next(),
            KeyCode::BackTab | KeyCode::Left => self.tab = self.tab.previous(),
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                self.section = Section::ALL[index];
            }
            KeyCode::Up => {
                self.selected_website = self.selected_website.saturating_sub(1);
            }
            KeyCode::Down => {
                let last = self.website_names().len().saturating_sub(1);
                self.selected_website = (self.selected_website + 1).min(last);
            }
            _ => {}
        }
        BrowserAction::None
    }

    fn website_names(&self) -> &[String] {
        self.summary
            .as_ref()
            .map(|s| s.websites.as_slice())
            .unwrap_or(&[])
    }

    pub fn render(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(1),
            ])
            .split(f.area());

        self.render_tabs(f, chunks[0]);
        match self.data {
            ViewData::Empty => self.render_empty(f, chunks[1]),
            _ => match self.tab {
                Tab::Summary => self.render_summary(f, chunks[1]),
                Tab::Text => self.render_text(f, chunks[1]),
                Tab::Vision => self.render_vision(f, chunks[1]),
            },
        }
        self.render_hints(f, chunks[2]);
    }

    fn render_tabs(&self, f: &mut Frame, area: Rect) {
        let title = if self.data.is_fixture() {
            " webcompare [sample data] "
        } else {
            " webcompare "
        };
        let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .select(self.tab.index())
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_widget(tabs, area);
    }

    fn render_empty(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" No Results ")
            .border_style(Style::default().fg(Color::Cyan));
        let text = vec![
            Line::from(Span::styled(
                EMPTY_MESSAGE,
                Style::default().fg(Color::Yellow),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Fill in the form with `webcompare form set`, then run `webcompare form submit`.",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_summary(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);

        let table = self
            .summary
            .as_ref()
            .and_then(|s| s.sections.iter().find(|t| t.section == self.section));

        self.render_table(f, chunks[0], table);
        self.render_top_performer(f, chunks[1], table);
    }

    fn render_table(&self, f: &mut Frame, area: Rect, table: Option<&SectionTable>) {
        let position = Section::ALL
            .iter()
            .position(|s| *s == self.section)
            .unwrap_or(0);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ({}/4) ", self.section.title(), position + 1))
            .border_style(Style::default().fg(Color::Cyan));

        let Some(table) = table.filter(|t| !t.is_empty()) else {
            let empty_msg = Paragraph::new(self.section.empty_message())
                .style(Style::default().fg(Color::DarkGray))
                .block(block)
                .wrap(Wrap { trim: true });
            f.render_widget(empty_msg, area);
            return;
        };

        let mut header = vec![Cell::from("Website"), Cell::from("Score")];
        header.extend(table.criteria.iter().map(|c| Cell::from(c.clone())));
        let header = Row::new(header).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = table
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![
                    Cell::from(row.name.clone()),
                    Cell::from(display_score(row.score)).style(band_style(ScoreBand::of(row.score))),
                ];
                cells.extend(row.criteria.iter().map(|value| match value {
                    Some(v) => Cell::from(display_score(*v)).style(band_style(ScoreBand::of(*v))),
                    None => Cell::from("-").style(Style::default().fg(Color::DarkGray)),
                }));
                Row::new(cells)
            })
            .collect();

        let mut widths = vec![Constraint::Min(16), Constraint::Length(8)];
        widths.extend(table.criteria.iter().map(|_| Constraint::Length(12)));

        let widget = Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(1);
        f.render_widget(widget, area);
    }

    fn render_top_performer(&self, f: &mut Frame, area: Rect, table: Option<&SectionTable>) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Top Performer ")
            .border_style(Style::default().fg(Color::Green));

        let Some(top) = table.and_then(|t| t.top.as_ref()) else {
            let empty_msg = Paragraph::new("No top performer")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            f.render_widget(empty_msg, area);
            return;
        };

        let mut lines = vec![
            Line::from(Span::styled(
                top.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::raw("Score: "),
                Span::styled(display_score(top.score), band_style(ScoreBand::of(top.score))),
            ]),
            Line::from(""),
        ];
        for (criterion, value) in &top.criteria {
            let band = ScoreBand::of(*value);
            lines.push(Line::from(vec![
                Span::raw(format!("{criterion}: ")),
                Span::styled(display_score(*value), band_style(band)),
                Span::styled(
                    format!(" ({})", band.as_str()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_websites(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Websites ")
            .border_style(Style::default().fg(Color::Cyan));

        let items: Vec<ListItem> = self
            .website_names()
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let style = if idx == self.selected_website {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(Span::styled(name.clone(), style)))
            })
            .collect();

        f.render_widget(List::new(items).block(block), area);
    }

    fn render_text(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
            .split(area);
        self.render_websites(f, chunks[0]);

        let name = self.selected_website().unwrap_or_default();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {name} "))
            .border_style(Style::default().fg(Color::Cyan));

        // Full page has no text of its own, so it shows every text section
        let sections: Vec<Section> = if self.section == Section::Full {
            TEXT_SECTIONS.to_vec()
        } else {
            vec![self.section]
        };

        let mut lines = Vec::new();
        for section in sections {
            let entry = self
                .text
                .as_ref()
                .and_then(|t| t.section(section))
                .and_then(|s| s.entries.iter().find(|e| e.name == name));

            lines.push(Line::from(Span::styled(
                section.title().to_uppercase(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )));
            match entry {
                Some(entry) => {
                    lines.push(Line::from(vec![
                        Span::raw("Score: "),
                        Span::styled(display_score(entry.score), band_style(entry.band)),
                    ]));
                    if !entry.has_text() {
                        lines.push(Line::from(Span::styled(
                            "No written feedback",
                            Style::default().fg(Color::DarkGray),
                        )));
                    }
                    push_list(&mut lines, "Strengths", &entry.strengths, Color::Green);
                    push_list(&mut lines, "Weaknesses", &entry.weaknesses, Color::Red);
                    push_list(
                        &mut lines,
                        "Recommendations",
                        &entry.recommendations,
                        Color::Yellow,
                    );
                }
                None => lines.push(Line::from(Span::styled(
                    section.empty_message(),
                    Style::default().fg(Color::DarkGray),
                ))),
            }
            lines.push(Line::from(""));
        }

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
        f.render_widget(paragraph, chunks[1]);
    }

    fn render_vision(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
            .split(area);
        self.render_websites(f, chunks[0]);

        let website = self
            .selected_website()
            .and_then(|name| self.vision.as_ref().and_then(|v| v.find(name)));

        let Some(website) = website else {
            let block = Block::default()
                .borders(Borders::ALL)
                .title(" Vision ")
                .border_style(Style::default().fg(Color::Cyan));
            let empty_msg = Paragraph::new("No vision data for this website")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            f.render_widget(empty_msg, chunks[1]);
            return;
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", website.name))
            .border_style(Style::default().fg(Color::Cyan));
        let paragraph = Paragraph::new(vision_lines(website))
            .block(block)
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, chunks[1]);
    }

    fn render_hints(&self, f: &mut Frame, area: Rect) {
        let key_style = Style::default().fg(Color::Black).bg(Color::Gray);
        let mut hints = vec![
            Span::styled(" q ", key_style),
            Span::raw(" Quit  "),
            Span::styled(" Tab ", key_style),
            Span::raw(" View  "),
            Span::styled(" 1-4 ", key_style),
            Span::raw(" Section  "),
            Span::styled(" ↑↓ ", key_style),
            Span::raw(" Website  "),
        ];
        if self.options.diagnostics {
            hints.push(Span::styled(" c ", key_style));
            hints.push(Span::raw(" Clear cache  "));
        }
        if let Some(status) = &self.status {
            hints.push(Span::styled(
                status.clone(),
                Style::default().fg(Color::Yellow),
            ));
        }

        let paragraph = Paragraph::new(Line::from(hints))
            .style(Style::default().bg(Color::Black).fg(Color::Gray));
        f.render_widget(paragraph, area);
    }
}

fn band_style(band: ScoreBand) -> Style {
    match band {
        ScoreBand::Strong => Style::default().fg(Color::Green),
        ScoreBand::Fair => Style::default().fg(Color::Yellow),
        ScoreBand::Weak => Style::default().fg(Color::Red),
    }
}

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::High => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Severity::Medium => Style::default().fg(Color::Yellow),
        Severity::Low => Style::default().fg(Color::Green),
    }
}

fn push_list(lines: &mut Vec<Line<'static>>, label: &str, items: &[String], color: Color) {
    if items.is_empty() {
        return;
    }
    lines.push(Line::from(Span::styled(
        format!("{label}:"),
        Style::default().fg(color),
    )));
    for item in items {
        lines.push(Line::from(format!("  • {item}")));
    }
}

fn vision_lines(website: &VisionWebsite) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(score) = website.overall_score {
        lines.push(Line::from(format!("Overall Score: {score:.1}/10")));
    }
    if let Some(url) = &website.screenshot_url {
        lines.push(Line::from(Span::styled(
            format!("Screenshot: {url}"),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(Line::from(vec![
        Span::styled(format!("{} high", website.counts.high), severity_style(Severity::High)),
        Span::raw("  "),
        Span::styled(
            format!("{} medium", website.counts.medium),
            severity_style(Severity::Medium),
        ),
        Span::raw("  "),
        Span::styled(format!("{} low", website.counts.low), severity_style(Severity::Low)),
    ]));
    lines.push(Line::from(""));

    for improvement in &website.improvements {
        lines.push(Line::from(vec![
            Span::styled(
                format!("[{}] ", improvement.severity.as_str().to_uppercase()),
                severity_style(improvement.severity),
            ),
            Span::styled(
                improvement.category.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]));
        lines.push(Line::from(format!("  {}", improvement.description)));
        if improvement.recommendations.len() > 1 {
            for rec in &improvement.recommendations {
                lines.push(Line::from(Span::styled(
                    format!("    • {rec}"),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        lines.push(Line::from(""));
    }
    lines
}

/// Run the result browser until the user quits (blocking)
pub fn run_browser(cache: &ResultCache, session: &SessionId, options: BrowserOptions) -> Result<()> {
    let sources = compose(cache, session.clone(), options.diagnostics);
    let (tx, rx) = create_browser_channel();

    // Without a watcher the browser still works, it just won't refresh
    let _subscription = match cache.on_external_write(session, move |fresh| {
        let _ = tx.send(BrowserMessage::Updated(fresh));
    }) {
        Ok(subscription) => Some(subscription),
        Err(e) => {
            warn!("Live refresh unavailable: {}", e);
            None
        }
    };

    let mut browser = ResultBrowser::new(sources.load(), options, rx);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut browser, cache, &sources);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    browser: &mut ResultBrowser,
    cache: &ResultCache,
    sources: &ViewSources,
) -> Result<()> {
    loop {
        browser.process_messages(sources);
        terminal.draw(|f| browser.render(f))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match browser.handle_key(key) {
                BrowserAction::Quit => break,
                BrowserAction::ClearCache => match cache.clear() {
                    Ok(()) => {
                        info!("Cache cleared from the browser");
                        browser.apply(sources.resolve(None));
                        browser.set_status("Cache cleared");
                    }
                    Err(e) => browser.set_status(format!("Failed to clear cache: {e}")),
                },
                BrowserAction::None => {}
            }
        }
    }
    Ok(())
}

/// Create a channel pair for pushing updates into the browser
pub fn create_browser_channel() -> (
    mpsc::UnboundedSender<BrowserMessage>,
    mpsc::UnboundedReceiver<BrowserMessage>,
) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use webcompare_core::source::FixtureSource;

    fn options(diagnostics: bool) -> BrowserOptions {
        BrowserOptions {
            asset_base: "http://localhost:5000".to_string(),
            diagnostics,
        }
    }

    fn sample_browser(
        diagnostics: bool,
    ) -> (mpsc::UnboundedSender<BrowserMessage>, ResultBrowser) {
        let (tx, rx) = create_browser_channel();
        let data = ViewData::Fixture(FixtureSource::sample().unwrap());
        (tx, ResultBrowser::new(data, options(diagnostics), rx))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn two_sites() -> ComparisonResult {
        serde_json::from_value(serde_json::json!({
            "full": [
                {"name": "A", "score": 0.9, "criteria": {"Clarity": 0.9}},
                {"name": "B", "score": 0.6, "criteria": {"Clarity": 0.6}}
            ]
        }))
        .unwrap()
    }

    fn rendered(browser: &ResultBrowser) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| browser.render(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_tabs_cycle_both_ways() {
        let (_tx, mut browser) = sample_browser(false);
        assert_eq!(browser.tab(), Tab::Summary);

        browser.handle_key(key(KeyCode::Tab));
        assert_eq!(browser.tab(), Tab::Text);
        browser.handle_key(key(KeyCode::Right));
        assert_eq!(browser.tab(), Tab::Vision);
        browser.handle_key(key(KeyCode::Tab));
        assert_eq!(browser.tab(), Tab::Summary);

        browser.handle_key(key(KeyCode::BackTab));
        assert_eq!(browser.tab(), Tab::Vision);
    }

    #[test]
    fn test_number_keys_pick_section() {
        let (_tx, mut browser) = sample_browser(false);

        browser.handle_key(key(KeyCode::Char('3')));
        assert_eq!(browser.section(), Section::Main);
        browser.handle_key(key(KeyCode::Char('9')));
        assert_eq!(browser.section(), Section::Main);
        browser.handle_key(key(KeyCode::Char('1')));
        assert_eq!(browser.section(), Section::Full);
    }

    #[test]
    fn test_website_selection_is_clamped() {
        let (_tx, mut browser) = sample_browser(false);
        assert_eq!(browser.selected_website(), Some("Website 1"));

        for _ in 0..5 {
            browser.handle_key(key(KeyCode::Down));
        }
        assert_eq!(browser.selected_website(), Some("Website 3"));

        for _ in 0..5 {
            browser.handle_key(key(KeyCode::Up));
        }
        assert_eq!(browser.selected_website(), Some("Website 1"));
    }

    #[test]
    fn test_quit_keys() {
        let (_tx, mut browser) = sample_browser(false);
        assert_eq!(browser.handle_key(key(KeyCode::Char('q'))), BrowserAction::Quit);
        assert_eq!(browser.handle_key(key(KeyCode::Esc)), BrowserAction::Quit);
        assert_eq!(
            browser.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            BrowserAction::Quit
        );
    }

    #[test]
    fn test_clear_key_needs_diagnostics() {
        let (_tx, mut browser) = sample_browser(false);
        assert_eq!(browser.handle_key(key(KeyCode::Char('c'))), BrowserAction::None);

        let (_tx, mut browser) = sample_browser(true);
        assert_eq!(
            browser.handle_key(key(KeyCode::Char('c'))),
            BrowserAction::ClearCache
        );
    }

    #[test]
    fn test_pushed_update_replaces_data() {
        let (tx, mut browser) = sample_browser(false);
        let sources = ViewSources::new(Box::new(FixtureSource), None);

        tx.send(BrowserMessage::Updated(Some(two_sites()))).unwrap();
        browser.process_messages(&sources);

        assert_eq!(browser.data(), &ViewData::Live(two_sites()));
        assert_eq!(browser.status(), Some("Results updated in another window"));
    }

    #[test]
    fn test_pushed_removal_uses_fallback() {
        let (tx, mut browser) = sample_browser(false);

        tx.send(BrowserMessage::Updated(None)).unwrap();
        browser.process_messages(&ViewSources::new(Box::new(FixtureSource), None));
        assert_eq!(browser.data(), &ViewData::Empty);
        assert_eq!(browser.selected_website(), None);

        tx.send(BrowserMessage::Updated(None)).unwrap();
        browser.process_messages(&ViewSources::new(
            Box::new(FixtureSource),
            Some(Box::new(FixtureSource)),
        ));
        assert!(browser.data().is_fixture());
    }

    #[test]
    fn test_apply_keeps_selection_in_range() {
        let (_tx, mut browser) = sample_browser(false);
        browser.handle_key(key(KeyCode::Down));
        browser.handle_key(key(KeyCode::Down));
        assert_eq!(browser.selected_website(), Some("Website 3"));

        browser.apply(ViewData::Live(two_sites()));
        assert_eq!(browser.selected_website(), Some("B"));
    }

    #[test]
    fn test_render_summary_and_empty_states() {
        let (_tx, mut browser) = sample_browser(false);
        let screen = rendered(&browser);
        assert!(screen.contains("Top Performer"));
        assert!(screen.contains("Website 2"));
        assert!(screen.contains("sample data"));

        browser.apply(ViewData::Live(two_sites()));
        browser.handle_key(key(KeyCode::Char('4')));
        let screen = rendered(&browser);
        assert!(screen.contains("No data available for footer section"));

        browser.apply(ViewData::Empty);
        let screen = rendered(&browser);
        assert!(screen.contains(EMPTY_MESSAGE));
    }

    #[test]
    fn test_render_vision_tab() {
        let (_tx, mut browser) = sample_browser(false);
        browser.handle_key(key(KeyCode::BackTab));
        browser.handle_key(key(KeyCode::Down));
        browser.handle_key(key(KeyCode::Down));

        let screen = rendered(&browser);
        assert!(screen.contains("[HIGH] Navigation"));
        assert!(screen.contains("Overall Score: 6.4/10"));
    }
}
