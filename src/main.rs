mod app;
mod cli;
mod domain;
mod infra;
mod ui;

use crate::app::{AppCommand, AppError, AppEvent, AppModel, FetchOutcome, FetchRequest};
use crate::cli::CliInvocation;
use crate::infra::{HttpSessionSource, SessionSource};
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind,
};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{ExecutableCommand, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::sync::mpsc::{Sender, channel};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Cli(#[from] crate::cli::CliRunError),
}

#[derive(Debug)]
struct FetchSignal {
    version: u64,
    outcome: FetchOutcome,
}

fn main() {
    if let Err(error) = run_main() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliInvocation::Tui { endpoint } => Ok(run_tui(endpoint)?),
        CliInvocation::Command(command) => {
            crate::cli::run(command)?;
            Ok(())
        }
    }
}

fn print_help() {
    let text = format!(
        "{name} — browse login/attach sessions from a query endpoint\n\nUSAGE:\n  {name} [--endpoint URL]            Start the TUI\n  {name} query --since TS [flags]    One-shot query, TSV on stdout\n  {name} --help | --version\n\nQUERY FLAGS:\n  --since TS     Lower bound, \"YYYY-MM-DD HH:mm:ss\" UTC (required)\n  --type NAME    Session type: enter|attach (default: enter)\n  --user NAME    Filter by user\n  --app NAME     Filter by app name\n  --limit N      Max rows to fetch (default: 100)\n  --offset N     Skip first N rows (default: 0)\n  --endpoint URL Override the query endpoint\n\nOUTPUT:\n  session_id<TAB>type<TAB>user<TAB>source_ip<TAB>app_name<TAB>proc_name<TAB>instance_no<TAB>node_ip<TAB>status<TAB>created_at<TAB>ended_at\n\nENV:\n  SESSQ_ENDPOINT  Query endpoint (fallback: {{config_dir}}/sessq/config.json)\n",
        name = env!("CARGO_PKG_NAME")
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}

fn run_tui(endpoint_flag: Option<String>) -> Result<(), AppError> {
    let endpoint = crate::infra::resolve_endpoint(endpoint_flag.as_deref())?;
    let source = Arc::new(HttpSessionSource::new(endpoint));

    let mut terminal = setup_terminal()?;
    let mut model = AppModel::new();
    let result = run(&mut terminal, &mut model, source);
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let _ = stdout.execute(EnableBracketedPaste);
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), AppError> {
    disable_raw_mode()?;
    let _ = execute!(terminal.backend_mut(), DisableBracketedPaste);
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    model: &mut AppModel,
    source: Arc<HttpSessionSource>,
) -> Result<(), AppError> {
    let (fetch_tx, fetch_rx) = channel::<FetchSignal>();

    loop {
        while let Ok(signal) = fetch_rx.try_recv() {
            model.pager.apply_fetch(signal.version, signal.outcome);
        }

        terminal.draw(|frame| ui::render(frame, model))?;

        if event::poll(Duration::from_millis(200))? {
            let app_event = match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    AppEvent::Key(key)
                }
                Event::Paste(text) => AppEvent::Paste(text),
                _ => continue,
            };

            let (next, command) = app::update(model.clone(), app_event);
            *model = next;
            match command {
                AppCommand::None => {}
                AppCommand::Quit => return Ok(()),
                AppCommand::Fetch(request) => {
                    spawn_fetch(source.clone(), request, fetch_tx.clone());
                }
            }
        }
    }
}

fn spawn_fetch(source: Arc<HttpSessionSource>, request: FetchRequest, tx: Sender<FetchSignal>) {
    std::thread::spawn(move || {
        let outcome = match source.fetch(&request.criteria, request.offset, request.limit) {
            Ok(batch) => FetchOutcome::Batch(batch),
            Err(error) => FetchOutcome::Failed(error.to_string()),
        };
        let _ = tx.send(FetchSignal {
            version: request.version,
            outcome,
        });
    });
}
