pub mod ui;

use brewtick::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    cue::{BellPlayer, CueDispatcher, CuePlayer, SilentPlayer, SoundAssets},
    metrics::BrewMetrics,
    recipe::Recipe,
    runtime::{BrewEvent, CrosstermEventSource, FixedTicker, Runner},
    store::{self, LoadReport, RecipeBook},
    timer::{SessionSnapshot, Timing, TimerSession},
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use rand::RngCore;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Mutex,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use webbrowser::Browser;

/// guided pour-over brewing timer
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    version,
    about,
    long_about = "A guided brewing timer: pick a recipe, press space, and follow the per-step countdown, water targets and audio cues."
)]
pub struct Cli {
    /// directory of recipe json files (default: ./recipes)
    #[clap(short = 'r', long = "recipes")]
    recipe_dir: Option<PathBuf>,

    /// name of the recipe to select on start
    #[clap(short = 'n', long)]
    recipe: Option<String>,

    /// seconds of get-set countdown before the first step
    #[clap(short = 'p', long)]
    prep_secs: Option<u32>,

    /// sound played five seconds before a step ends
    #[clap(long)]
    countdown_sound: Option<PathBuf>,

    /// sound played when the brew finishes
    #[clap(long)]
    finish_sound: Option<PathBuf>,

    /// disable audio cues
    #[clap(short = 'm', long)]
    mute: bool,

    /// print the available recipes with their totals and exit
    #[clap(short = 'l', long)]
    list: bool,
}

/// Config file values with command line overrides applied
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub recipe_dir: PathBuf,
    pub initial_recipe: Option<String>,
    pub timing: Timing,
    pub sounds: SoundAssets,
    pub mute: bool,
}

impl RuntimeSettings {
    pub fn resolve(cli: &Cli, config: &Config) -> Self {
        let mut timing = config.timing();
        if let Some(prep) = cli.prep_secs {
            timing.prep_secs = prep;
        }
        let mut sounds = config.sound_assets();
        if let Some(p) = &cli.countdown_sound {
            sounds.countdown = p.clone();
        }
        if let Some(p) = &cli.finish_sound {
            sounds.finish = p.clone();
        }
        Self {
            recipe_dir: cli.recipe_dir.clone().unwrap_or_else(|| config.recipe_dir()),
            initial_recipe: cli.recipe.clone().or_else(|| config.last_recipe.clone()),
            timing,
            sounds,
            mute: cli.mute || config.mute,
        }
    }
}

pub type Dispatcher = CueDispatcher<Box<dyn CuePlayer>, Box<dyn RngCore>>;

/// What the event loop should do after a key press
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    None,
    Started,
    OpenUrl(String),
    Quit,
}

pub struct App {
    pub book: RecipeBook,
    pub selected: usize,
    pub metrics: BrewMetrics,
    pub session: TimerSession,
    pub finish_message: Option<String>,
    timing: Timing,
    dispatcher: Dispatcher,
}

impl App {
    pub fn new(book: RecipeBook, settings: &RuntimeSettings, dispatcher: Dispatcher) -> Self {
        let selected = settings
            .initial_recipe
            .as_deref()
            .and_then(|name| book.position(name))
            .unwrap_or(0);
        let recipe = book.get(selected).cloned().unwrap_or_else(Recipe::placeholder);

        Self {
            metrics: BrewMetrics::for_recipe(&recipe),
            session: TimerSession::new(recipe.steps, settings.timing),
            book,
            selected,
            finish_message: None,
            timing: settings.timing,
            dispatcher,
        }
    }

    pub fn recipe(&self) -> &Recipe {
        &self.book.recipes()[self.selected]
    }

    /// Switches recipe. Only allowed while no brew is in progress.
    pub fn select(&mut self, index: usize) -> bool {
        if self.session.is_active() || index >= self.book.len() {
            return false;
        }
        self.selected = index;
        let recipe = self.recipe().clone();
        self.metrics = BrewMetrics::for_recipe(&recipe);
        self.session = TimerSession::new(recipe.steps, self.timing);
        self.finish_message = None;
        true
    }

    pub fn next_recipe(&mut self) -> bool {
        self.select((self.selected + 1) % self.book.len())
    }

    pub fn previous_recipe(&mut self) -> bool {
        let len = self.book.len();
        self.select((self.selected + len - 1) % len)
    }

    /// Start/stop toggle. Returns true when a brew was started.
    pub fn toggle(&mut self) -> bool {
        if self.session.is_active() {
            self.session.request_cancel();
            self.session.cancel_if_requested();
            self.finish_message = None;
            info!(recipe = %self.recipe().name, "brew stopped");
            false
        } else {
            info!(recipe = %self.recipe().name, "brew started");
            let event = self.session.start();
            self.handle_cues(&event.cues);
            true
        }
    }

    pub fn on_tick(&mut self) {
        let event = self.session.tick();
        self.handle_cues(&event.cues);
        if !self.session.is_active() {
            self.finish_message = None;
        }
    }

    fn handle_cues(&mut self, cues: &[brewtick::timer::Cue]) {
        if let Some(msg) = self.dispatcher.dispatch_all(cues) {
            info!(recipe = %self.recipe().name, "{msg}");
            self.finish_message = Some(msg);
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn on_key(&mut self, key: KeyEvent) -> KeyAction {
        if key.kind != KeyEventKind::Press {
            return KeyAction::None;
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => KeyAction::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                KeyAction::Quit
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if self.toggle() {
                    KeyAction::Started
                } else {
                    KeyAction::None
                }
            }
            KeyCode::Right | KeyCode::Down | KeyCode::Char('l') | KeyCode::Char('j') => {
                self.next_recipe();
                KeyAction::None
            }
            KeyCode::Left | KeyCode::Up | KeyCode::Char('h') | KeyCode::Char('k') => {
                self.previous_recipe();
                KeyAction::None
            }
            KeyCode::Char('o') => match self.recipe().url() {
                Some(url) => KeyAction::OpenUrl(url.to_string()),
                None => KeyAction::None,
            },
            _ => KeyAction::None,
        }
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn cue_player(settings: &RuntimeSettings) -> Box<dyn CuePlayer> {
    if settings.mute {
        return Box::new(SilentPlayer);
    }
    #[cfg(feature = "audio")]
    {
        match brewtick::cue::RodioPlayer::try_new() {
            Ok(player) => return Box::new(player),
            Err(e) => warn!("falling back to terminal bell: {e}"),
        }
    }
    Box::new(BellPlayer)
}

fn print_recipes<W: Write>(book: &RecipeBook, out: &mut W) -> io::Result<()> {
    for recipe in book.recipes() {
        let m = BrewMetrics::for_recipe(recipe);
        writeln!(
            out,
            "{}\twater {}\ttime {}\tratio {}\tsteps {}",
            recipe.name,
            m.total_water_label(),
            m.total_time_label(),
            m.ratio_label(),
            recipe.steps.len()
        )?;
    }
    Ok(())
}

fn report_issues(report: &LoadReport) {
    for issue in &report.issues {
        eprintln!("warning: {issue}");
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    let settings = RuntimeSettings::resolve(&cli, &config);

    let report = store::load_dir(&settings.recipe_dir);
    if cli.list {
        report_issues(&report);
        let book = RecipeBook::from(report);
        print_recipes(&book, &mut io::stdout())?;
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let load_issues = report.issues.len();
    let book = RecipeBook::from(report);
    if load_issues > 0 {
        warn!(
            "{load_issues} recipe problem(s) while loading {}",
            settings.recipe_dir.display()
        );
    }

    let dispatcher = CueDispatcher::new(
        cue_player(&settings),
        Box::new(rand::thread_rng()) as Box<dyn RngCore>,
        settings.sounds.clone(),
    );
    let mut app = App::new(book, &settings, dispatcher);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if !app.recipe().is_placeholder() {
        config.last_recipe = Some(app.recipe().name.clone());
        if let Err(e) = config_store.save(&config) {
            warn!(path = %config_store.path().display(), "could not save config: {e}");
        }
    }

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            BrewEvent::Tick => app.on_tick(),
            BrewEvent::Resize => {}
            BrewEvent::Key(key) => match app.on_key(key) {
                KeyAction::Quit => break,
                KeyAction::Started => runner.realign(),
                KeyAction::OpenUrl(url) => {
                    if Browser::is_available() {
                        if let Err(e) = webbrowser::open(&url) {
                            warn!("could not open {url}: {e}");
                        }
                    }
                }
                KeyAction::None => {}
            },
        }
    }

    Ok(())
}
