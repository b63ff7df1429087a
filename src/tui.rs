use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use crate::cli::{self, Commands, HELP_LINES};
use crate::core::controller::{JobController, Notice};
use crate::core::error::FlowError;
use crate::core::event::StreamKind;
use crate::core::formatter::{failure_message, format_progress_detail, info_text, log_lines};
use crate::core::job::{parse_thread_count, JobPhase, ProcessOutcome};
use crate::core::pages::parse_page_range;
use crate::core::service::{Service, SERVICES};
use crate::form::JobForm;

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self, FlowError> {
        enable_raw_mode().map_err(FlowError::terminal)?;
        let mut stdout = io::stdout();
        stdout
            .execute(EnterAlternateScreen)
            .map_err(FlowError::terminal)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = stdout.execute(LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModalKind {
    Info,
    Error,
}

#[derive(Debug, Clone)]
struct Modal {
    kind: ModalKind,
    title: String,
    body: String,
}

struct AppState {
    input: String,
    history: Vec<String>,
    form: JobForm,
    controller: JobController,
    modal: Option<Modal>,
    should_quit: bool,
    quit_armed: bool,
    scroll_offset: usize,
    view_lines: usize,
    last_file_index: usize,
}

const DIVIDER_MARKER: &str = "<divider>";

impl AppState {
    fn new(controller: JobController, form: JobForm) -> Self {
        let mut history = Vec::new();
        history.push("Welcome to pdfflow. Type 'help' for commands.".to_string());
        history.push(format!(
            "Translator: {} | preferences: {}",
            controller.tool(),
            controller.store().path().display()
        ));
        Self {
            input: String::new(),
            history,
            form,
            controller,
            modal: None,
            should_quit: false,
            quit_armed: false,
            scroll_offset: 0,
            view_lines: 1,
            last_file_index: 0,
        }
    }

    fn push_history(&mut self, line: impl Into<String>) {
        const MAX_LINES: usize = 500;
        if self.history.len() >= MAX_LINES {
            let drain_count = self.history.len().saturating_sub(MAX_LINES - 1);
            self.history.drain(0..drain_count);
        }
        self.history.push(line.into());
        self.clamp_scroll();
    }

    fn show_modal(&mut self, kind: ModalKind, title: impl Into<String>, body: impl Into<String>) {
        self.modal = Some(Modal {
            kind,
            title: title.into(),
            body: body.into(),
        });
    }

    fn set_view_lines(&mut self, lines: usize) {
        self.view_lines = lines.max(1);
        self.clamp_scroll();
    }

    fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.max_scroll();
        self.scroll_offset = (self.scroll_offset + lines).min(max_scroll);
    }

    fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    fn scroll_top(&mut self) {
        self.scroll_offset = self.max_scroll();
    }

    fn scroll_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    fn max_scroll(&self) -> usize {
        self.history.len().saturating_sub(self.view_lines)
    }

    fn clamp_scroll(&mut self) {
        let max_scroll = self.max_scroll();
        if self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }
    }
}

pub fn run(controller: JobController, form: JobForm) -> Result<(), FlowError> {
    let _guard = TerminalGuard::enter()?;
    let stdout = io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(FlowError::terminal)?;

    let mut app = AppState::new(controller, form);

    loop {
        for notice in app.controller.pump() {
            handle_notice(&mut app, notice);
        }

        let size = terminal.size().map_err(FlowError::terminal)?;
        let history_height = size.height.saturating_sub(9).max(3) as usize;
        let view_lines = history_height.saturating_sub(2).max(1);
        app.set_view_lines(view_lines);

        terminal.draw(|frame| draw(frame, &app)).map_err(FlowError::terminal)?;

        if event::poll(Duration::from_millis(50)).map_err(FlowError::terminal)? {
            if let Event::Key(key) = event::read().map_err(FlowError::terminal)? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    request_quit(&mut app);
                } else if app.modal.is_some() {
                    if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                        close_modal(&mut app);
                    }
                } else {
                    match key.code {
                        KeyCode::Char(ch) => {
                            app.input.push(ch);
                        }
                        KeyCode::Backspace => {
                            app.input.pop();
                        }
                        KeyCode::Enter => {
                            let line = app.input.trim().to_string();
                            app.input.clear();
                            if !line.is_empty() {
                                handle_line(&mut app, line);
                            }
                        }
                        KeyCode::PageUp => {
                            let step = app.view_lines.saturating_sub(1).max(1);
                            app.scroll_up(step);
                        }
                        KeyCode::PageDown => {
                            let step = app.view_lines.saturating_sub(1).max(1);
                            app.scroll_down(step);
                        }
                        KeyCode::Up => {
                            app.scroll_up(1);
                        }
                        KeyCode::Down => {
                            app.scroll_down(1);
                        }
                        KeyCode::Home => {
                            app.scroll_top();
                        }
                        KeyCode::End => {
                            app.scroll_bottom();
                        }
                        KeyCode::Esc => {
                            request_quit(&mut app);
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

// The finished job's bars stay up behind its outcome dialog.
fn close_modal(app: &mut AppState) {
    app.modal = None;
    app.controller.dismiss();
}

// Quitting ends the translator's supervision; ask twice while a job runs.
fn request_quit(app: &mut AppState) {
    if app.controller.is_active() && !app.quit_armed {
        app.quit_armed = true;
        app.push_history("A translation is still running. Press Esc again to quit anyway.");
        return;
    }
    app.should_quit = true;
}

fn handle_notice(app: &mut AppState, notice: Notice) {
    match notice {
        Notice::Output { stream, text } => {
            for line in log_lines(&text) {
                match stream {
                    StreamKind::Stdout => app.push_history(line.to_string()),
                    StreamKind::Stderr => app.push_history(format!("! {line}")),
                }
            }
        }
        Notice::ProgressChanged => {
            let progress = app.controller.progress();
            let (index, total) = (progress.file_index, progress.total_files);
            if index > app.last_file_index {
                app.last_file_index = index;
                app.push_history(format!("File {index}/{total} translated."));
            }
        }
        Notice::Completed {
            total_files,
            save_path,
        } => {
            app.quit_armed = false;
            app.push_history(format!(
                "Translation complete: {total_files} file(s) saved to {}",
                save_path.display()
            ));
            app.show_modal(ModalKind::Info, "Complete", "The translation task has finished.");
        }
        Notice::Failed { exit_code } => {
            app.quit_armed = false;
            let message = failure_message(exit_code);
            for line in message.lines() {
                app.push_history(line.to_string());
            }
            app.show_modal(ModalKind::Error, "Error", message);
        }
        Notice::SpawnFailed(err) => {
            app.quit_armed = false;
            let message = format!("Failed to start the translation process: {err}");
            app.push_history(message.clone());
            app.show_modal(ModalKind::Error, "Error", message);
        }
    }
}

fn handle_line(app: &mut AppState, line: String) {
    let trimmed = line.trim();
    if !app.history.is_empty() {
        app.push_history(DIVIDER_MARKER);
    }
    app.push_history(format!(">> {trimmed}"));

    if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
        request_quit(app);
        return;
    }

    if trimmed.eq_ignore_ascii_case("clear") {
        app.history.clear();
        app.scroll_bottom();
        return;
    }

    if trimmed.eq_ignore_ascii_case("help") {
        for line in HELP_LINES {
            app.push_history(line);
        }
        return;
    }

    match cli::parse_line(trimmed) {
        Ok(Commands::Open { files }) => {
            app.form.open_files(files);
            push_selection(app);
        }
        Ok(Commands::Add { files }) => {
            app.form.add_files(files);
            push_selection(app);
        }
        Ok(Commands::Save { dir }) => {
            app.push_history(format!("Save location: {}", dir.display()));
            app.form.save_path = Some(dir);
        }
        Ok(Commands::Service { name }) => match name.parse::<Service>() {
            Ok(service) => {
                app.form.service = service;
                app.push_history(format!("Service: {service}"));
                if let Some(hint) = service.model_hint() {
                    app.push_history(format!("{service} takes a model, e.g. 'model {hint}'"));
                }
            }
            Err(err) => app.push_history(format!("error: {err}")),
        },
        Ok(Commands::Model { name }) => {
            app.form.model = name.unwrap_or_default();
            if !app.form.service.requires_model() && !app.form.model.is_empty() {
                app.push_history(format!(
                    "note: {} ignores the model name",
                    app.form.service
                ));
            }
            app.push_history(format!("Model: {}", display_value(&app.form.model)));
        }
        Ok(Commands::Thread { count }) => match count {
            Some(count) => match parse_thread_count(&count) {
                Ok(parsed) => {
                    app.form.thread = parsed.to_string();
                    app.push_history(format!("Threads: {parsed}"));
                }
                Err(err) => app.push_history(format!("error: {err}")),
            },
            None => {
                app.form.thread.clear();
                app.push_history("Threads: (default)");
            }
        },
        Ok(Commands::Pages { range }) => match range {
            Some(range) => match parse_page_range(&range) {
                Ok(_) => {
                    app.push_history(format!("Pages: {range}"));
                    app.form.pages = range;
                }
                Err(err) => app.push_history(format!("error: {err}")),
            },
            None => {
                app.form.pages.clear();
                app.push_history("Pages: (all)");
            }
        },
        Ok(Commands::LangIn { code }) => {
            app.form.lang_in = code.unwrap_or_default();
            app.push_history(format!("Source language: {}", display_value(&app.form.lang_in)));
        }
        Ok(Commands::LangOut { code }) => {
            app.form.lang_out = code.unwrap_or_default();
            app.push_history(format!("Target language: {}", display_value(&app.form.lang_out)));
        }
        Ok(Commands::Show) => {
            for line in app.form.summary_lines() {
                app.push_history(line);
            }
        }
        Ok(Commands::Services) => {
            for service in SERVICES {
                let model = service
                    .model_hint()
                    .map(|hint| format!(" (model, e.g. {hint})"))
                    .unwrap_or_default();
                let vars = service.env_vars();
                let env = if vars.is_empty() {
                    String::new()
                } else {
                    format!(" env: {}", vars.join(", "))
                };
                app.push_history(format!("  {service}{model}{env}"));
            }
        }
        Ok(Commands::Info) => {
            app.show_modal(ModalKind::Info, "Operation tips", info_text());
        }
        Ok(Commands::Start) => start_job(app),
        Err(err) => {
            for line in err.lines().filter(|line| !line.trim().is_empty()) {
                app.push_history(format!("error: {line}"));
            }
        }
    }
}

fn start_job(app: &mut AppState) {
    if !app.controller.can_start() {
        app.push_history("A translation is already running. Please wait for it to finish.");
        return;
    }

    let result = app
        .form
        .to_job()
        .and_then(|job| app.controller.start(&job));

    match result {
        Ok(command) => {
            app.last_file_index = 0;
            app.quit_armed = false;
            app.push_history(format!("exec: {command}"));
        }
        Err(FlowError::InvalidJob { message }) => {
            app.push_history(format!("error: {message}"));
            app.show_modal(ModalKind::Error, "Error", capitalize(&message));
        }
        Err(err) => {
            app.push_history(format!("error: {err}"));
        }
    }
}

fn push_selection(app: &mut AppState) {
    let files = app
        .form
        .files
        .iter()
        .map(|file| file.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    app.push_history(format!("Selected PDF files: {files}"));
    if let Some(save) = &app.form.save_path {
        let line = format!("Save location: {}", save.display());
        app.push_history(line);
    }
}

fn display_value(value: &str) -> &str {
    if value.is_empty() {
        "(unset)"
    } else {
        value
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn draw(frame: &mut Frame, app: &AppState) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(frame.size());

    render_header(frame, app, layout[0]);

    let history = render_history(app, layout[1].height as usize, layout[1].width as usize);
    frame.render_widget(history, layout[1]);

    let title = if app.controller.can_start() {
        "Input"
    } else {
        "Input (start disabled while translating)"
    };
    let input = Paragraph::new(app.input.as_str())
        .block(Block::default().title(title).borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(input, layout[2]);

    if let Some(modal) = &app.modal {
        render_modal(frame, modal);
    } else {
        frame.set_cursor(layout[2].x + 1 + app.input.chars().count() as u16, layout[2].y + 1);
    }
}

fn render_header(frame: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().title("pdfflow").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let status = match app.controller.phase() {
        JobPhase::Idle => "Idle".to_string(),
        JobPhase::Starting => "Starting".to_string(),
        JobPhase::Running => "Running".to_string(),
        JobPhase::Finished(ProcessOutcome::Success) => "Finished".to_string(),
        JobPhase::Finished(ProcessOutcome::Failure(code)) => match code {
            Some(code) => format!("Failed (exit code {code})"),
            None => "Failed".to_string(),
        },
    };
    let save = app
        .form
        .save_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    let status_line = Line::from(vec![
        Span::raw("Status: "),
        Span::raw(status),
        Span::raw(format!(
            " | Service: {} | Files: {} | Save: {save}",
            app.form.service,
            app.form.files.len()
        )),
    ]);
    frame.render_widget(Paragraph::new(status_line), rows[0]);

    let progress = app.controller.progress();
    if !progress.visible {
        frame.render_widget(
            Paragraph::new("Type 'help' for commands, 'start' to translate."),
            rows[1],
        );
        return;
    }

    let overall = Gauge::default()
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(progress.overall_ratio())
        .label(format!(
            "Overall  {}/{}",
            progress.overall(),
            progress.total_files
        ));
    frame.render_widget(overall, rows[1]);

    let current = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent(u16::from(progress.file_percent.min(100)))
        .label(format!("Current file  {}%", progress.file_percent));
    frame.render_widget(current, rows[2]);

    frame.render_widget(Paragraph::new(format_progress_detail(progress)), rows[3]);
}

fn render_history(app: &AppState, height: usize, width: usize) -> Paragraph<'static> {
    let max_lines = height.saturating_sub(2).max(1);
    let end = app.history.len().saturating_sub(app.scroll_offset);
    let start = end.saturating_sub(max_lines);
    let divider_width = width.saturating_sub(2).max(1);
    let divider = "─".repeat(divider_width);
    let lines: Vec<Line> = app.history[start..end]
        .iter()
        .map(|line| {
            if line == DIVIDER_MARKER {
                Line::from(Span::raw(divider.clone()))
            } else {
                Line::from(line.clone())
            }
        })
        .collect();

    Paragraph::new(lines)
        .block(Block::default().title("Session").borders(Borders::ALL))
        .wrap(Wrap { trim: false })
}

fn render_modal(frame: &mut Frame, modal: &Modal) {
    let area = centered_rect(70, 60, frame.size());
    let color = match modal.kind {
        ModalKind::Info => Color::Blue,
        ModalKind::Error => Color::Red,
    };

    let mut lines: Vec<Line> = modal
        .body
        .lines()
        .map(|line| Line::from(line.to_string()))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from("[Enter] OK"));

    let popup = Paragraph::new(lines)
        .block(
            Block::default()
                .title(modal.title.clone())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(Clear, area);
    frame.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ConfigStore, CONFIG_FILENAME};
    use crate::core::notify::testing::RecordingNotifier;

    fn app(dir: &std::path::Path) -> AppState {
        let controller = JobController::new(
            "pdfflow-no-such-translator",
            encoding_rs::UTF_8,
            ConfigStore::new(dir.join(CONFIG_FILENAME)),
            Box::new(RecordingNotifier::default()),
        );
        AppState::new(controller, JobForm::default())
    }

    #[test]
    fn commands_update_the_form() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        handle_line(&mut app, "open /papers/a.pdf /papers/b.pdf".to_string());
        handle_line(&mut app, "service openai".to_string());
        handle_line(&mut app, "model gpt-4o-mini".to_string());
        handle_line(&mut app, "thread 4".to_string());
        handle_line(&mut app, "pages 1-3,5".to_string());

        assert_eq!(app.form.files.len(), 2);
        assert_eq!(app.form.service, Service::OpenAI);
        assert_eq!(app.form.model, "gpt-4o-mini");
        assert_eq!(app.form.thread, "4");
        assert_eq!(app.form.pages, "1-3,5");
    }

    #[test]
    fn invalid_values_are_rejected_without_changing_the_form() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        handle_line(&mut app, "thread 0".to_string());
        handle_line(&mut app, "pages 9-2".to_string());
        handle_line(&mut app, "service babelfish".to_string());

        assert!(app.form.thread.is_empty());
        assert!(app.form.pages.is_empty());
        assert_eq!(app.form.service, Service::Google);
        assert!(app.history.iter().filter(|l| l.starts_with("error:")).count() >= 3);
    }

    #[test]
    fn start_without_files_shows_validation_dialog() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        handle_line(&mut app, "start".to_string());

        let modal = app.modal.clone().unwrap();
        assert_eq!(modal.kind, ModalKind::Error);
        assert!(modal.body.contains("PDF"));
        assert!(app.controller.can_start());
    }

    #[test]
    fn failure_notice_opens_error_dialog_with_code() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        handle_notice(&mut app, Notice::Failed { exit_code: Some(1) });
        let modal = app.modal.unwrap();
        assert_eq!(modal.kind, ModalKind::Error);
        assert!(modal.body.contains("exit code: 1"));
    }

    #[test]
    fn output_notice_keeps_log_lines_and_drops_progress_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let before = app.history.len();
        handle_notice(
            &mut app,
            Notice::Output {
                stream: StreamKind::Stdout,
                text: "loading model\n45%|[00:10<00:12, 3.2it/s]\r".to_string(),
            },
        );
        assert_eq!(app.history.len(), before + 1);
        assert_eq!(app.history.last().map(String::as_str), Some("loading model"));

        handle_notice(
            &mut app,
            Notice::Output {
                stream: StreamKind::Stderr,
                text: "font missing\n".to_string(),
            },
        );
        assert_eq!(app.history.last().map(String::as_str), Some("! font missing"));
    }

    #[cfg(unix)]
    #[test]
    fn completed_bars_stay_until_dialog_is_closed() {
        let dir = tempfile::tempdir().unwrap();
        let controller = JobController::new(
            "sh",
            encoding_rs::UTF_8,
            ConfigStore::new(dir.path().join(CONFIG_FILENAME)),
            Box::new(RecordingNotifier::default()),
        );
        let mut app = AppState::new(controller, JobForm::default());
        app.form.open_files(vec![
            std::path::PathBuf::from("-c"),
            std::path::PathBuf::from("printf '45%%|[00:10<00:12, 3.2it/s]\\n'"),
        ]);
        app.form.save_path = Some(dir.path().to_path_buf());
        start_job(&mut app);

        while app.controller.is_active() {
            for notice in app.controller.next_blocking() {
                handle_notice(&mut app, notice);
            }
        }

        assert_eq!(app.modal.as_ref().map(|m| m.kind), Some(ModalKind::Info));
        assert!(app.controller.progress().visible);
        assert_eq!(
            format_progress_detail(app.controller.progress()),
            "Translation complete!"
        );

        close_modal(&mut app);
        assert!(app.modal.is_none());
        assert!(!app.controller.progress().visible);
    }
}
