mod app;
mod braille;
mod config;
mod export;
mod lifecycle;
mod pointer;
mod render;
mod settings;
mod simulation;
mod surface;
mod ui;

use app::{App, Focus};
use lifecycle::FrameClock;
use clap::Parser;
use config::{AppConfig, MAX_PIXELS_PER_DOT, MIN_PIXELS_PER_DOT};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use render::Palette;
use settings::{parse_theme, MAX_PARTICLES, MIN_PARTICLES};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "architectural-grid")]
#[command(about = "Animated particle grid background in the terminal")]
struct Args {
    /// Number of particles (2-500)
    #[arg(short = 'p', long)]
    particles: Option<usize>,

    /// Fixed RNG seed for a reproducible field
    #[arg(long)]
    seed: Option<u64>,

    /// Theme (light, dark, matrix); overrides the saved preference
    #[arg(long)]
    theme: Option<String>,

    /// Logical pixels per braille dot (1-8)
    #[arg(long)]
    scale: Option<u32>,

    /// Load settings from a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective config to a JSON file and exit
    #[arg(long = "export-config")]
    export_config: Option<PathBuf>,

    /// Write logs to this file (the terminal UI never logs to the screen)
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Record a GIF headlessly instead of starting the UI
    #[arg(long)]
    record: Option<PathBuf>,

    /// Frames to record
    #[arg(long, default_value = "120")]
    frames: usize,

    /// Recording width in pixels
    #[arg(long, default_value = "640")]
    width: u32,

    /// Recording height in pixels
    #[arg(long, default_value = "360")]
    height: u32,
}

/// Route tracing output: stderr for headless runs, a file (or nowhere) for the UI
fn init_logging(log_file: Option<&Path>, headless: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None if headless => builder.with_writer(io::stderr).init(),
        None => {}
    }
    Ok(())
}

/// Merge the config file, saved theme and CLI flags, in increasing priority
fn resolve_config(args: &Args) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig {
            theme: config::load_theme_preference().unwrap_or_default(),
            ..AppConfig::default()
        },
    };

    if let Some(particles) = args.particles {
        config.settings.particle_count = particles.clamp(MIN_PARTICLES, MAX_PARTICLES);
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(theme) = &args.theme {
        config.theme = parse_theme(theme);
    }
    if let Some(scale) = args.scale {
        config.pixels_per_dot = scale.clamp(MIN_PIXELS_PER_DOT, MAX_PIXELS_PER_DOT);
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref(), args.record.is_some())?;

    let config = resolve_config(&args)?;

    if let Some(path) = &args.export_config {
        config.save_to_file(path)?;
        println!("Config written to {}", path.display());
        return Ok(());
    }

    if let Some(path) = &args.record {
        let recording = export::Recording {
            settings: config.settings.clone(),
            seed: config.seed,
            width: args.width,
            height: args.height,
            frames: args.frames,
            palette: Palette::from_alternate(config.theme.is_matrix()),
            background: config.theme.background(),
        };
        let written = export::record_gif(&recording, path)?;
        println!("Recorded {} frames to {}", written, path.display());
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let mut app = App::new(&config, Rect::new(0, 0, size.width, size.height));
    app.persist_theme = true;

    let res = run_app(&mut terminal, &mut app);

    if app.is_mounted() {
        app.toggle_mount();
    }

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal loop failed");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    // Target ~60fps for smooth animation
    const FRAME_DURATION: Duration = Duration::from_millis(16);

    let mut clock = FrameClock::new(FRAME_DURATION, Instant::now());

    loop {
        // Input can wake the loop early; frames stay on the display cadence
        if clock.frame_due(Instant::now()) {
            app.tick();
            terminal.draw(|frame| ui::render(frame, app))?;
        }

        if !event::poll(clock.until_next(Instant::now()))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                // Only process Press events
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                    KeyCode::Char(' ') => app.toggle_pause(),
                    KeyCode::Char('m') | KeyCode::Char('M') => app.toggle_mount(),
                    KeyCode::Char('r') | KeyCode::Char('R') => app.remount(),
                    KeyCode::Char('t') | KeyCode::Char('T') => {
                        app.cycle_theme();
                        app.focus = Focus::Theme;
                    }
                    KeyCode::Char('v') | KeyCode::Char('V') => app.toggle_fullscreen(),
                    KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => app.toggle_help(),
                    KeyCode::Char('p') | KeyCode::Char('P') => app.save_snapshot(),
                    KeyCode::Char('+') | KeyCode::Char('=') => {
                        app.increase_particles();
                        app.focus = Focus::Particles;
                    }
                    KeyCode::Char('-') | KeyCode::Char('_') => {
                        app.decrease_particles();
                        app.focus = Focus::Particles;
                    }
                    KeyCode::Char('[') => {
                        app.adjust_scale(-1);
                        app.focus = Focus::Scale;
                    }
                    KeyCode::Char(']') => {
                        app.adjust_scale(1);
                        app.focus = Focus::Scale;
                    }

                    // Navigation
                    KeyCode::Tab => app.next_focus(),
                    KeyCode::BackTab => app.prev_focus(),
                    KeyCode::Up => {
                        if !app.show_help {
                            if app.focus.is_param() {
                                app.adjust_focused_up();
                            } else {
                                app.scroll_controls_up();
                            }
                        }
                    }
                    KeyCode::Down => {
                        if !app.show_help {
                            if app.focus.is_param() {
                                app.adjust_focused_down();
                            } else {
                                let term_size = terminal.size()?;
                                let visible = ui::get_controls_visible_lines(term_size.height);
                                app.scroll_controls_down(ui::CONTROLS_CONTENT_LINES.saturating_sub(visible));
                            }
                        }
                    }
                    KeyCode::Esc => {
                        if app.show_help {
                            app.toggle_help();
                        } else if app.focus.is_param() {
                            app.focus = Focus::Controls;
                        }
                    }
                    KeyCode::Char('j') | KeyCode::Char('J') => {
                        if app.show_help {
                            app.scroll_help_down(ui::HELP_CONTENT_LINES);
                        }
                    }
                    KeyCode::Char('k') | KeyCode::Char('K') => {
                        if app.show_help {
                            app.scroll_help_up();
                        }
                    }
                    _ => {}
                }
            }
            Event::Mouse(mouse) => {
                if matches!(mouse.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) {
                    app.pointer_moved(mouse.column, mouse.row);
                }
            }
            Event::Resize(width, height) => app.resize(width, height),
            _ => {}
        }
    }
}
