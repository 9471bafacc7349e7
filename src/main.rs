use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use mapty::{
    errors::StoreError,
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, RuntimeSettings},
    controller::Controller,
    identity::{Clock, SystemClock},
    map::StaticGeolocation,
    persistence::WorkoutStore,
    runtime::{request_position, AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    storage::{AnyStore, KeyValueStore, MemoryStore, SqliteStore},
    ui::{form::TerminalForm, list::TerminalList, map::TerminalMap},
    workout::Coords,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const TICK_RATE_MS: u64 = 250;

/// map-based workout log for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Log runs and rides by picking a spot on a world map. Workouts are kept in a local database and shown again on the next start."
)]
pub struct Cli {
    /// starting latitude, overrides the configured home position
    #[clap(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    /// starting longitude, overrides the configured home position
    #[clap(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,

    /// initial zoom level
    #[clap(short = 'z', long, value_parser = clap::value_parser!(u8).range(1..=18))]
    zoom: Option<u8>,

    /// workout database to use instead of the default state location
    #[clap(long)]
    db: Option<PathBuf>,

    /// keep workouts in memory only, nothing is written to disk
    #[clap(long, conflicts_with = "db")]
    ephemeral: bool,

    /// delete every stored workout and exit
    #[clap(long)]
    reset: bool,

    /// print the stored workouts and exit
    #[clap(long, conflicts_with = "reset")]
    list: bool,

    /// remember --lat/--lon as the home position for later runs
    #[clap(long, requires = "lat")]
    save_home: bool,
}

impl Cli {
    fn position(&self) -> Option<Coords> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coords::new(lat, lon)),
            _ => None,
        }
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_env("MAPTY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
}

/// The interactive session falls back to memory when the database is
/// unusable. `--reset` and `--list` act on the database itself, so they fail.
fn open_store(cli: &Cli) -> Result<AnyStore, StoreError> {
    if cli.ephemeral {
        return Ok(AnyStore::Memory(MemoryStore::new()));
    }
    let opened = match &cli.db {
        Some(path) => SqliteStore::open(path),
        None => SqliteStore::new(),
    };
    match opened {
        Ok(store) => Ok(AnyStore::Sqlite(store)),
        Err(e) if cli.reset || cli.list => Err(e),
        Err(e) => {
            warn!("falling back to in-memory storage: {e}");
            eprintln!("warning: workouts will not be saved ({e})");
            Ok(AnyStore::Memory(MemoryStore::new()))
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let config_store = FileConfigStore::new();
    let config = config_store.load();
    let settings = RuntimeSettings::resolve(&config, cli.position(), cli.zoom);

    if cli.save_home {
        config_store.save(&Config {
            home: settings.position,
            ..config.clone()
        })?;
        info!(path = %config_store.path().display(), "saved home position");
    }

    let mut store = WorkoutStore::new(open_store(&cli)?);

    if cli.reset {
        store.clear();
        println!("All workouts removed");
        return Ok(());
    }

    if cli.list {
        for w in store.load() {
            println!(
                "{}  {}  {}",
                w.id(),
                w.description(),
                w.details().iter().join("  ")
            );
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let controller = Controller::new(
        TerminalMap::default(),
        TerminalForm::new(settings.default_kind),
        TerminalList::default(),
        store,
        SystemClock,
        settings.zoom_level,
    );
    let mut app = App::new(controller);

    let events = CrosstermEventSource::new();
    request_position(events.sender(), StaticGeolocation::new(settings.position));
    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B, E, T, K, C>(
    terminal: &mut Terminal<B>,
    app: &mut App<K, C>,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>>
where
    B: Backend,
    E: EventSource,
    T: Ticker,
    K: KeyValueStore,
    C: Clock,
{
    terminal.draw(|f| app.draw(f))?;
    loop {
        let event = runner.step();
        if matches!(event, AppEvent::Tick) {
            continue;
        }
        if !app.handle(event) {
            return Ok(());
        }
        terminal.draw(|f| app.draw(f))?;
    }
}
