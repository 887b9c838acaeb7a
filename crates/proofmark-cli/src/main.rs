mod view;

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use proofmark_config::Config;
use proofmark_engine::{HoverInfo, PointerEvent, Session, format_decorations};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::{
    env, fs,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

struct App {
    path: PathBuf,
    session: Session,
    hover: Option<HoverInfo>,
    status: String,
    show_decorations: bool,
    /// First visible line of the document
    scroll: usize,
    /// Inner area the document was last drawn in, for mouse hit-testing
    text_area: Rect,
}

impl App {
    fn new(path: PathBuf, session: Session) -> Self {
        let status = format!(
            "{} finding(s) in {}",
            session.annotations().len(),
            path.display()
        );
        Self {
            path,
            session,
            hover: None,
            status,
            show_decorations: false,
            scroll: 0,
            text_area: Rect::default(),
        }
    }

    fn text(&self) -> String {
        self.session.document().text()
    }

    fn caret(&self) -> usize {
        self.session.caret()
    }

    fn move_caret(&mut self, offset: usize) {
        self.session.set_selection(offset..offset);
        self.hover_at(self.caret());
    }

    /// Show the finding under `offset`, or the one just before it
    fn hover_at(&mut self, offset: usize) {
        self.hover = self.session.on_hover(&PointerEvent::Text { offset });
        if self.hover.is_none() && offset > 0 {
            self.hover = self
                .session
                .on_hover(&PointerEvent::Text { offset: offset - 1 });
        }
    }

    fn insert(&mut self, text: &str) {
        let caret = self.caret();
        self.replace(caret..caret, text);
    }

    fn replace(&mut self, range: std::ops::Range<usize>, text: &str) {
        match self.session.apply_edit(range, text) {
            Ok(patch) => {
                if !patch.dropped.is_empty() {
                    log::debug!("edit dropped {} finding(s)", patch.dropped.len());
                }
                self.hover_at(self.caret());
            }
            Err(e) => self.status = format!("Edit rejected: {e}"),
        }
    }

    fn backspace(&mut self) {
        let caret = self.caret();
        if let Some(previous) = view::previous_boundary(&self.text(), caret) {
            self.replace(previous..caret, "");
        }
    }

    fn delete(&mut self) {
        let caret = self.caret();
        if let Some(next) = view::next_boundary(&self.text(), caret) {
            self.replace(caret..next, "");
        }
    }

    fn move_horizontal(&mut self, forward: bool) {
        let text = self.text();
        let caret = self.caret();
        let target = if forward {
            view::next_boundary(&text, caret)
        } else {
            view::previous_boundary(&text, caret)
        };
        if let Some(target) = target {
            self.move_caret(target);
        }
    }

    fn move_vertical(&mut self, down: bool) {
        let text = self.text();
        let (line, col) = view::line_col(&text, self.caret());
        let line = if down {
            line + 1
        } else if line == 0 {
            return;
        } else {
            line - 1
        };
        self.move_caret(view::offset_at(&text, line, col));
    }

    fn move_to_line_edge(&mut self, end: bool) {
        let text = self.text();
        let (line, _) = view::line_col(&text, self.caret());
        let col = if end { usize::MAX } else { 0 };
        self.move_caret(view::offset_at(&text, line, col));
    }

    fn accept(&mut self) {
        let Some(hover) = self.hover.take() else {
            self.status = "Nothing to accept here".to_string();
            return;
        };
        match self.session.accept_suggestion(&hover.id) {
            Ok(patch) => {
                self.status = format!(
                    "Replaced {:?} with {:?} (version {})",
                    hover.matched_text, hover.suggestion, patch.version
                );
                self.hover_at(self.caret());
            }
            Err(e) => self.status = format!("Could not accept: {e}"),
        }
    }

    fn ignore(&mut self) {
        if let Some(hover) = self.hover.take() {
            self.status = match self.session.ignore_suggestion(&hover.id) {
                Ok(()) => format!("Ignoring {:?} from now on", hover.matched_text),
                Err(e) => format!("Could not ignore: {e}"),
            };
        }
    }

    fn dismiss(&mut self) {
        if let Some(hover) = self.hover.take() {
            self.status = match self.session.dismiss(&hover.id) {
                Ok(()) => format!("Dismissed {:?}", hover.matched_text),
                Err(e) => format!("Could not dismiss: {e}"),
            };
        }
    }

    fn toggle_streaming(&mut self) {
        let streaming = !self.session.is_streaming();
        self.session.set_streaming(streaming);
        self.status = if streaming {
            "AI cursor on".to_string()
        } else {
            "AI cursor off".to_string()
        };
    }

    fn save(&mut self) {
        self.status = match fs::write(&self.path, self.text()) {
            Ok(()) => format!("Saved {}", self.path.display()),
            Err(e) => format!("Failed to save {}: {e}", self.path.display()),
        };
    }

    /// Map a terminal cell to a document offset
    fn offset_at_cell(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.text_area;
        if column < area.x || row < area.y || column >= area.right() || row >= area.bottom() {
            return None;
        }
        let line = self.scroll + usize::from(row - area.y);
        let col = usize::from(column - area.x);
        Some(view::offset_at(&self.text(), line, col))
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        let offset = self.offset_at_cell(mouse.column, mouse.row);
        match (mouse.kind, offset) {
            (MouseEventKind::Down(MouseButton::Left), Some(offset)) => self.move_caret(offset),
            (MouseEventKind::Moved, Some(offset)) => {
                self.hover = self.session.on_hover(&PointerEvent::Text { offset });
            }
            (MouseEventKind::Moved, None) => {
                self.session.clear_hover();
                self.hover = None;
            }
            _ => {}
        }
    }

    /// Returns false when the app should quit
    fn on_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('s') if ctrl => self.save(),
            KeyCode::Char('t') if ctrl => self.toggle_streaming(),
            KeyCode::Char('x') if ctrl => self.ignore(),
            KeyCode::Char('d') if ctrl => self.dismiss(),
            KeyCode::Char('r') if ctrl => {
                self.session.rescan();
                self.status = format!("{} finding(s)", self.session.annotations().len());
            }
            KeyCode::Tab => self.accept(),
            KeyCode::F(12) => self.show_decorations = !self.show_decorations,
            KeyCode::Char(c) if !ctrl => self.insert(c.encode_utf8(&mut [0; 4])),
            KeyCode::Enter => self.insert("\n"),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_horizontal(false),
            KeyCode::Right => self.move_horizontal(true),
            KeyCode::Up => self.move_vertical(false),
            KeyCode::Down => self.move_vertical(true),
            KeyCode::Home => self.move_to_line_edge(false),
            KeyCode::End => self.move_to_line_edge(true),
            _ => {}
        }
        true
    }
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(fs::File::create(
            env::temp_dir().join("proofmark.log"),
        )?)))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <text-file>", args[0]);
        process::exit(1);
    }
    let path = PathBuf::from(&args[1]);

    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(Some(config)) => {
            log::info!("Loaded config from {}", config_path.display());
            config
        }
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: Cannot read '{}': {e}", path.display());
            process::exit(1);
        }
    };
    let session = Session::new(&text, config.session_config());
    for failure in session.scan_failures() {
        log::warn!("pattern {:?} skipped: {}", failure.source, failure.error);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(path, session);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if !app.on_key(key) {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => app.on_mouse(mouse),
            _ => {}
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(5), Constraint::Length(1)])
        .split(f.area());

    let (document_area, debug_area) = if app.show_decorations {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(rows[0]);
        (columns[0], Some(columns[1]))
    } else {
        (rows[0], None)
    };

    let text = app.text();
    let document_block = Block::default().borders(Borders::ALL).title(format!(
        "{} (v{})",
        app.path.display(),
        app.session.version()
    ));
    app.text_area = document_block.inner(document_area);

    // Keep the caret line on screen
    let (caret_line, caret_col) = view::line_col(&text, app.caret());
    let height = usize::from(app.text_area.height.max(1));
    if caret_line < app.scroll {
        app.scroll = caret_line;
    } else if caret_line >= app.scroll + height {
        app.scroll = caret_line + 1 - height;
    }

    let document = Paragraph::new(view::styled_lines(&text, app.session.decorations()))
        .block(document_block)
        .scroll((u16::try_from(app.scroll).unwrap_or(u16::MAX), 0));
    f.render_widget(document, document_area);

    if !app.session.is_streaming() {
        let x = app.text_area.x.saturating_add(u16::try_from(caret_col).unwrap_or(u16::MAX));
        let y = app
            .text_area
            .y
            .saturating_add(u16::try_from(caret_line - app.scroll).unwrap_or(u16::MAX));
        if x < app.text_area.right() && y < app.text_area.bottom() {
            f.set_cursor_position((x, y));
        }
    }

    if let Some(area) = debug_area {
        let dump = format_decorations(app.session.decorations(), &text);
        let debug = Paragraph::new(dump)
            .block(Block::default().borders(Borders::ALL).title("Decorations"))
            .wrap(Wrap { trim: false });
        f.render_widget(debug, area);
    }

    let finding = match &app.hover {
        Some(hover) => vec![
            Line::from(vec![
                Span::styled(
                    format!("{}: ", hover.kind),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(hover.matched_text.clone(), Style::default().fg(Color::Red)),
                Span::raw(" → "),
                Span::styled(hover.suggestion.clone(), Style::default().fg(Color::Green)),
            ]),
            Line::from(hover.explanation.clone()),
            Line::from(Span::styled(
                hover.context_snippet.clone(),
                Style::default().fg(Color::DarkGray),
            )),
        ],
        None => vec![Line::from("Move the caret or mouse onto an underlined word")],
    };
    let finding = Paragraph::new(finding)
        .block(Block::default().borders(Borders::ALL).title("Finding"))
        .wrap(Wrap { trim: true });
    f.render_widget(finding, rows[1]);

    let help = Line::from(vec![
        Span::raw(app.status.clone()),
        Span::styled(
            "  | Tab: Accept | ^X: Ignore | ^D: Dismiss | ^T: AI cursor | ^R: Rescan | ^S: Save | F12: Decorations | Esc: Quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(help), rows[2]);
}
