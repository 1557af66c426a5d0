use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use noita_deathmap::{
    app::{Action, App},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    logging,
    runtime::{CrosstermEventSource, Runner},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{info, warn};
use webbrowser::Browser;

const TICK_RATE_MS: u64 = 250;

/// plot where your Noita runs ended on the world map
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Reads the *stats.xml files Noita writes for every run, takes the death position from each and draws a marker for it on the world map. Runs as a terminal UI by default, or renders straight to a png with --render-only."
)]
pub struct Cli {
    /// folder with the session files (save00/stats/sessions)
    #[clap(short = 'd', long)]
    sessions_dir: Option<PathBuf>,

    /// background map image, expected at the configured map size (8417x5000 by default)
    #[clap(short = 'm', long = "map")]
    map: Option<PathBuf>,

    /// where to write the rendered png
    #[clap(short = 'o', long)]
    output: Option<PathBuf>,

    /// config file to use instead of the default location
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// also export the death positions (world and pixel coordinates) as csv
    #[clap(long)]
    csv: Option<PathBuf>,

    /// load, render, write the png and exit without starting the terminal UI
    #[clap(long)]
    render_only: bool,

    /// open the rendered png in the system viewer (with --render-only)
    #[clap(long, requires = "render_only")]
    open: bool,

    /// store the effective settings in the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Flags win over whatever the config file says
    fn apply_to(&self, config: &mut Config) {
        if let Some(dir) = &self.sessions_dir {
            config.sessions_dir = Some(dir.clone());
        }
        if let Some(map) = &self.map {
            config.background_image = Some(map.clone());
        }
        if let Some(output) = &self.output {
            config.output = Some(output.clone());
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let mut config = store.load();
    cli.apply_to(&mut config);

    if cli.render_only {
        logging::init_stderr();
        save_config_if_asked(&cli, &store, &config)?;
        return render_headless(&cli, config);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(
            ErrorKind::Io,
            "stdin must be a tty (use --render-only for a headless render)",
        )
        .exit();
    }

    if let Some(log_path) = AppDirs::log_path() {
        logging::init_file(&log_path);
    }
    save_config_if_asked(&cli, &store, &config)?;

    let mut app = App::new(config);
    app.csv_output = cli.csv.clone();
    if let Some(dir) = &cli.sessions_dir {
        app.load_folder(dir);
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn save_config_if_asked(
    cli: &Cli,
    store: &FileConfigStore,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    if cli.save_config {
        store.save(config)?;
        info!(path = %store.path().display(), "saved config");
    }
    Ok(())
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        let Some(action) = runner.next_action(app) else {
            continue;
        };
        match action {
            Action::Quit => break,
            Action::OpenViewer(path) => open_in_viewer(&path),
            Action::Redraw | Action::None => {}
        }
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }

    Ok(())
}

fn render_headless(cli: &Cli, config: Config) -> Result<(), Box<dyn Error>> {
    let Some(dir) = config.sessions_dir.clone() else {
        let mut cmd = Cli::command();
        cmd.error(
            ErrorKind::MissingRequiredArgument,
            "no sessions folder: pass --sessions-dir or set sessions_dir in the config",
        )
        .exit();
    };

    let mut app = App::new(config);
    app.csv_output = cli.csv.clone();
    app.load_folder(&dir);

    if let Some(status) = &app.status {
        println!("{status}");
    }

    let Some(saved) = app.saved.clone() else {
        let reason = if app.view.is_painted() {
            format!("could not write {}", app.output_path().display())
        } else {
            match &app.config.background_image {
                Some(path) => format!("background {} unusable", path.display()),
                None => "no background image configured, use --map".to_string(),
            }
        };
        return Err(format!("no map written ({reason})").into());
    };

    if cli.open {
        open_in_viewer(&saved);
    }
    Ok(())
}

fn open_in_viewer(path: &Path) {
    if !Browser::is_available() {
        warn!("no viewer available to open {}", path.display());
        return;
    }
    let target = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if let Err(e) = webbrowser::open(&format!("file://{}", target.display())) {
        warn!(path = %target.display(), error = %e, "could not open viewer");
    }
}
