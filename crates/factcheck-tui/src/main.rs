use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ratatui::Terminal;
use ratatui::crossterm::event;
use ratatui::crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::CrosstermBackend;
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;

use factcheck_core::config_file;
use factcheck_core::store::reset_pending;
use factcheck_core::{
    Badge, BadgeSink, Command, Coordinator, Notification, Notifier, StateStore, ViewModel,
};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod action;
mod app;
mod input;
mod theme;
mod tui_event;
mod view;

use app::App;
use tui_event::UiEvent;

/// Fact Checker TUI - submit claims and watch verdicts arrive.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Text to pre-fill the claim field with (reads piped stdin if omitted)
    #[arg(long)]
    selection: Option<String>,

    /// Color theme: hacker (default) or modern
    #[arg(long)]
    theme: Option<String>,

    /// Fact-check service endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Path to the persistent state database
    #[arg(long, conflicts_with = "ephemeral")]
    state: Option<PathBuf>,

    /// Keep state in memory for this session only
    #[arg(long)]
    ephemeral: bool,

    /// Query the configured endpoint instead of the built-in demo service
    #[arg(long)]
    live: bool,

    /// Zero a pending count left behind by an interrupted session
    #[arg(long)]
    reset_pending: bool,
}

/// Forwards the coordinator's badge and notification output into the UI loop.
struct ChannelSink {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl BadgeSink for ChannelSink {
    fn set_badge(&self, badge: Badge) {
        let _ = self.tx.send(UiEvent::Badge(badge));
    }
}

impl Notifier for ChannelSink {
    fn notify(&self, notification: Notification) {
        let _ = self.tx.send(UiEvent::Notification(notification));
    }
}

/// Log to `<cache_dir>/factcheck/factcheck-tui.log.<date>`: the terminal is
/// busy drawing the UI.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let dir = dirs::cache_dir()?.join("factcheck");
    std::fs::create_dir_all(&dir).ok()?;
    let appender = tracing_appender::rolling::daily(dir, "factcheck-tui.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

/// Initial claim text: the `--selection` flag, or whatever was piped in.
fn read_selection(flag: Option<String>) -> io::Result<Option<String>> {
    if flag.is_some() {
        return Ok(flag);
    }
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut text = String::new();
    stdin.lock().read_to_string(&mut text)?;
    Ok(Some(text))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let _log_guard = init_logging();

    // Resolve config from CLI flags > env vars > config file > defaults
    let file = config_file::load_config();
    let mut config = file.resolve();
    if let Some(endpoint) = args
        .endpoint
        .clone()
        .or_else(|| std::env::var("FACTCHECK_ENDPOINT").ok())
    {
        config.endpoint = endpoint;
    }
    if args.live {
        config.use_dummy_api = false;
    }
    if args.ephemeral {
        config.state_path = None;
    } else if let Some(path) = args
        .state
        .clone()
        .or_else(|| std::env::var("FACTCHECK_STATE_PATH").ok().map(PathBuf::from))
    {
        config.state_path = Some(path);
    }

    let theme_name = args
        .theme
        .clone()
        .or_else(|| file.theme().map(str::to_string))
        .unwrap_or_else(|| "hacker".to_string());
    let theme = theme::Theme::by_name(&theme_name);

    let selection = read_selection(args.selection.clone())?;

    let store = factcheck_core::build_store(config.state_path.as_deref())?;
    if args.reset_pending {
        reset_pending(store.as_ref())?;
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let sink = Arc::new(ChannelSink {
        tx: event_tx.clone(),
    });
    let coordinator = Coordinator::new(
        Arc::clone(&store),
        factcheck_core::build_backend(&config)?,
        sink.clone(),
        sink,
        config.result_limit,
    );
    tracing::info!(backend = coordinator.backend_name(), "factcheck-tui starting");

    // Subscribe before the state read so nothing lands between the two.
    let mut events = coordinator.subscribe();
    let state = store.load()?;
    let badge = Badge::project(&state);
    let mut view = ViewModel::open(state);
    if let Some(selection) = &selection {
        view.seed_query(selection);
    }
    let mut app = App::new(view, theme, badge, coordinator.backend_name());

    // Forward coordinator broadcasts; a lagging receiver re-reads state.
    let forward_tx = event_tx.clone();
    let forward_store = Arc::clone(&store);
    tokio::spawn(async move {
        loop {
            let ui_event = match events.recv().await {
                Ok(event) => UiEvent::Coordinator(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "view fell behind coordinator broadcasts");
                    match forward_store.load() {
                        Ok(state) => UiEvent::Resync(state),
                        Err(e) => {
                            tracing::error!(error = %e, "failed to re-read state");
                            continue;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if forward_tx.send(ui_event).is_err() {
                break;
            }
        }
    });

    // Command listener: the UI never touches the coordinator directly
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Command>();
    app.cmd_tx = Some(cmd_tx);
    let ack_tx = event_tx;
    let command_coordinator = coordinator.clone();
    tokio::spawn(async move {
        while let Some(command) = cmd_rx.recv().await {
            let ack = command_coordinator.handle_command(command);
            if ack_tx.send(UiEvent::Ack(ack)).is_err() {
                break;
            }
        }
    });

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    // Install panic hook that restores terminal before printing panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let backend_terminal = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend_terminal)?;

    // Drain any stray input events (e.g. Enter keypress from launching the command)
    while event::poll(Duration::from_millis(50)).unwrap_or(false) {
        let _ = event::read();
    }

    let tick_rate = Duration::from_millis(100);

    loop {
        terminal.draw(|f| app.view(f))?;

        tokio::select! {
            maybe_event = event_rx.recv() => {
                if let Some(ui_event) = maybe_event {
                    app.handle_ui_event(ui_event);
                    while let Ok(evt) = event_rx.try_recv() {
                        app.handle_ui_event(evt);
                    }
                }
            }
            _ = async {
                if event::poll(tick_rate).unwrap_or(false)
                    && let Ok(evt) = event::read()
                {
                    let action = input::map_event(&evt, &app.input_mode);
                    app.update(action);
                }
            } => {}
        }

        app.update(action::Action::Tick);

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;

    // Requests still running die with the runtime; release their pending
    // count so the next session does not start stuck on the spinner.
    match coordinator.shutdown() {
        Ok(0) => {}
        Ok(released) => eprintln!("Released {} unfinished check(s)", released),
        Err(e) => {
            tracing::error!(error = %e, "failed to release unfinished checks");
            eprintln!(
                "Could not release unfinished checks ({}). Start with --reset-pending to clear the stale count.",
                e
            );
        }
    }

    Ok(())
}
