use runw::app::{AppConfig, AppState};
use runw::classify::TransportError;
use runw::cli::Cli;
use runw::controller::QueryRequest;
use runw::events::{AppEvent, EventHandler};
use runw::filter::{self, FilterToken, RunsTab};
use runw::graphql::GraphqlTransport;
use runw::input::{self, Action, InputContext};
use runw::persist::{self, FileFilterStore};
use runw::query::QUEUED_RUN_COORDINATOR;
use runw::refresh::RefreshScheduler;
use runw::traits::{FilterStore, RunsTransport};
use runw::tui;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

fn setup_verbose_logging() -> Result<()> {
    let state_dir = persist::state_dir();
    std::fs::create_dir_all(&state_dir)
        .map_err(|e| eyre!("Failed to create log directory {state_dir:?}: {e}"))?;
    let log_path = state_dir.join("debug.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| eyre!("Failed to open log file {log_path:?}: {e}"))?;
    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .init();
    tracing::info!(
        "runw v{} starting with verbose logging",
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

fn spawn_monitored(
    tx: UnboundedSender<AppEvent>,
    label: &'static str,
    fut: impl Future<Output = ()> + Send + 'static,
) {
    tokio::spawn(async move {
        let handle = tokio::spawn(fut);
        if let Err(join_err) = handle.await {
            let msg = if join_err.is_panic() {
                match join_err.into_panic().downcast::<String>() {
                    Ok(s) => *s,
                    Err(payload) => match payload.downcast::<&str>() {
                        Ok(s) => s.to_string(),
                        Err(_) => "unknown panic".to_string(),
                    },
                }
            } else {
                "task cancelled".to_string()
            };
            tracing::error!("{label} panicked: {msg}");
            if tx
                .send(AppEvent::Error(format!("{label} crashed: {msg}")))
                .is_err()
            {
                tracing::warn!("{label}: channel closed while reporting panic");
            }
        }
    });
}

/// Handles shared by everything that talks to the server or the filter store.
struct Session {
    transport: Arc<dyn RunsTransport>,
    store: Option<Arc<dyn FilterStore>>,
    tx: UnboundedSender<AppEvent>,
}

impl Session {
    fn dispatch(&self, state: &mut AppState, request: Option<QueryRequest>) {
        let Some(request) = request else {
            return;
        };
        state.note_request_sent(&request);
        let transport = self.transport.clone();
        let tx = self.tx.clone();
        spawn_monitored(self.tx.clone(), "fetch_runs", async move {
            let QueryRequest { id, query, .. } = request;
            // A panicking request must still release the in-flight guard.
            let result = tokio::spawn(async move { transport.fetch_runs(&query).await })
                .await
                .unwrap_or_else(|e| {
                    Err(TransportError::Network(format!("request task failed: {e}")))
                });
            if tx
                .send(AppEvent::RunsResult {
                    request_id: id,
                    result,
                })
                .is_err()
            {
                tracing::debug!(request_id = id, "channel closed before result");
            }
        });
    }

    fn fetch_daemon_status(&self, state: &mut AppState) {
        if !state.begin_daemon_fetch() {
            return;
        }
        let transport = self.transport.clone();
        let tx = self.tx.clone();
        spawn_monitored(self.tx.clone(), "daemon_status", async move {
            let result = tokio::spawn(async move {
                transport
                    .fetch_daemon_status(QUEUED_RUN_COORDINATOR)
                    .await
                    .map_err(|e| e.to_string())
            })
            .await
            .unwrap_or_else(|e| Err(format!("daemon status task failed: {e}")));
            if tx.send(AppEvent::DaemonStatus(result)).is_err() {
                tracing::debug!("channel closed before daemon status");
            }
        });
    }

    fn save_tokens(&self, tokens: &[FilterToken]) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(tokens) {
                tracing::warn!("failed to save filters: {e}");
            }
        }
    }
}

/// Command-line filters replace saved ones; `--tab` then rewrites the status part.
fn initial_tokens(args: &Cli, store: Option<&dyn FilterStore>) -> Vec<FilterToken> {
    let tokens = if args.filters.is_empty() {
        store.map(|s| s.load()).unwrap_or_default()
    } else {
        args.filters.clone()
    };
    match args.tab {
        Some(tab) => filter::switch_tab(&tokens, tab),
        None => tokens,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    if args.verbose {
        setup_verbose_logging()?;
    }

    let transport: Arc<dyn RunsTransport> = Arc::new(
        GraphqlTransport::new(&args.endpoint, Duration::from_secs(args.timeout))
            .map_err(|e| eyre!("Failed to create HTTP client: {e}"))?,
    );
    let store: Option<Arc<dyn FilterStore>> = if args.no_persist {
        None
    } else {
        Some(Arc::new(FileFilterStore::in_state_dir()))
    };
    let tokens = initial_tokens(&args, store.as_deref());

    let config = AppConfig {
        endpoint: args.endpoint.clone(),
        page_size: args.page_size,
        refresh_interval: args.interval,
        version_string: format!(
            "runw v{}+{}",
            env!("CARGO_PKG_VERSION"),
            env!("BUILD_NUMBER")
        ),
    };
    let mut state = AppState::new(config, tokens);

    // Setup terminal with panic hook before any data fetching
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Failed to disable raw mode during panic: {e}");
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, SetTitle("")) {
            eprintln!("Failed to leave alternate screen during panic: {e}");
        }
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        SetTitle(format!("runs @ {}", args.endpoint))
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let events = EventHandler::new(Duration::from_millis(100));
    let session = Session {
        transport,
        store,
        tx: events.sender(),
    };

    let result = run_app(&mut terminal, &mut state, events, &session).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, SetTitle(""))?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    mut events: EventHandler,
    session: &Session,
) -> Result<()> {
    let scheduler = RefreshScheduler::start(
        Duration::from_secs(state.config.refresh_interval),
        session.tx.clone(),
    );
    let mut last_tick = Instant::now();
    let mut saved_tokens = state.runs.tokens().to_vec();
    let mut last_tab = state.current_tab();

    let initial = state.runs.mount();
    session.dispatch(state, initial);
    state.note_refresh_cycle();
    if last_tab == RunsTab::Queued {
        session.fetch_daemon_status(state);
    }

    loop {
        terminal.draw(|f| tui::render::render(f, state))?;

        let Some(event) = events.next().await else {
            break;
        };
        match event {
            AppEvent::Key(key) => {
                let ctx = InputContext {
                    editing: state.is_editing(),
                    has_notice: state.notice_message().is_some(),
                };
                handle_action(input::map_key(key, &ctx), state, session, &scheduler);
            }
            AppEvent::Tick => {
                if last_tick.elapsed() >= Duration::from_millis(100) {
                    state.advance_spinner();
                    last_tick = Instant::now();
                }
                state.update_countdown();
                state.prune_notice();
            }
            AppEvent::RefreshTick => {
                state.note_refresh_cycle();
                let request = state.runs.refresh_tick();
                session.dispatch(state, request);
                if state.current_tab() == RunsTab::Queued {
                    session.fetch_daemon_status(state);
                }
            }
            AppEvent::RunsResult { request_id, result } => {
                let follow_up = state.apply_runs_result(request_id, result);
                session.dispatch(state, follow_up);
            }
            AppEvent::DaemonStatus(result) => state.apply_daemon_status(result),
            AppEvent::Error(e) => state.set_notice(e),
        }

        if state.runs.tokens() != saved_tokens.as_slice() {
            saved_tokens = state.runs.tokens().to_vec();
            session.save_tokens(&saved_tokens);
        }
        let tab = state.current_tab();
        if tab != last_tab {
            last_tab = tab;
            if tab == RunsTab::Queued {
                session.fetch_daemon_status(state);
            }
        }

        if state.should_quit {
            break;
        }
    }

    state.runs.unmount();
    drop(scheduler);
    events.stop();
    Ok(())
}

fn handle_action(
    action: Action,
    state: &mut AppState,
    session: &Session,
    scheduler: &RefreshScheduler,
) {
    let request = match action {
        Action::Quit => {
            state.should_quit = true;
            None
        }
        Action::DismissNotice => {
            state.clear_notice();
            None
        }
        Action::MoveUp => {
            state.move_selection_up();
            None
        }
        Action::MoveDown => {
            state.move_selection_down();
            None
        }
        Action::NextPage => state.runs.next_page(),
        Action::PreviousPage => state.runs.previous_page(),
        Action::NextTab => state.select_tab(state.current_tab().next()),
        Action::SelectTab(tab) => state.select_tab(tab),
        Action::BeginEdit => {
            state.begin_filter_edit();
            None
        }
        Action::RemoveLastToken => state.runs.remove_last_token(),
        Action::ClearTokens => state.runs.clear_editable_tokens(),
        Action::AddTagFilter => state.add_tag_filter_from_selection(),
        Action::AddJobFilter => state.add_job_filter_from_selection(),
        Action::Refresh => {
            scheduler.reset();
            state.note_refresh_cycle();
            state.runs.refresh_tick()
        }
        Action::InputChar(c) => {
            state.input_push(c);
            None
        }
        Action::InputBackspace => {
            state.input_pop();
            None
        }
        Action::SubmitEdit => match state.submit_filter_edit() {
            Ok(request) => request,
            Err(msg) => {
                state.set_notice(msg);
                None
            }
        },
        Action::CancelEdit => {
            state.cancel_filter_edit();
            None
        }
        Action::None => None,
    };
    session.dispatch(state, request);
}
