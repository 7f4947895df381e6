mod app;
mod card;
mod config;
mod conversation;
mod selection;
mod surface;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, Popup};
use card::ResponseEnvelope;
use config::AppConfig;
use conversation::Transcript;

#[derive(Parser, Debug)]
#[command(name = "dimantic")]
#[command(author = "Sean Fournier")]
#[command(version = "0.1.0")]
#[command(about = "Selection widgets and error cards for chat messages")]
struct Args {
    /// Print the error card for a response envelope ("-" reads stdin) and exit
    #[arg(long, value_name = "PATH")]
    card: Option<PathBuf>,

    /// Transcript (JSON array of {id, author, text}) to open in the viewer
    #[arg(short, long, value_name = "PATH")]
    transcript: Option<PathBuf>,

    /// Response envelope to show as the viewer's error card
    #[arg(short, long, value_name = "PATH")]
    envelope: Option<PathBuf>,

    /// Longest selection (in characters) that can still be liked
    #[arg(long, value_name = "N")]
    max_like: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load().unwrap_or_default();
    if let Some(max) = args.max_like {
        config.max_likeable_length = max;
    }

    // Handle CLI-only commands
    if let Some(path) = args.card {
        return print_card(&path, &config).await;
    }

    let transcript = match args.transcript.or_else(|| config.transcript.clone()) {
        Some(path) => Transcript::load(&path).await?,
        None => Transcript::demo(),
    };

    let envelope = match args.envelope {
        Some(path) => Some(read_envelope(&path).await?),
        None => None,
    };

    tracing::info!(
        messages = transcript.messages.len(),
        max_likeable_length = config.max_likeable_length,
        "Starting dimantic viewer"
    );

    // Run TUI
    run_tui(App::new(config, transcript, envelope)).await
}

async fn read_envelope(path: &Path) -> Result<ResponseEnvelope> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read envelope from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read envelope {}", path.display()))?
    };

    Ok(card::parse_envelope(&content)?)
}

async fn print_card(path: &Path, config: &AppConfig) -> Result<()> {
    let envelope = read_envelope(path).await?;
    let html = card::render_error_card(&envelope, &config.card_options())?;
    // Success envelopes print nothing
    if !html.is_empty() {
        println!("{}", html);
    }
    Ok(())
}

async fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        let size = terminal.size()?;
        app.resize(Rect::new(0, 0, size.width, size.height));
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                    KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                        return Ok(())
                    }
                    _ => {
                        // Handle key and catch any errors to prevent crashes
                        if let Err(e) = app.handle_key(key) {
                            app.set_status(format!("Error: {}", e));
                        }
                    }
                },
                Event::Mouse(mouse) => {
                    if let Err(e) = app.handle_mouse(mouse) {
                        tracing::warn!("Selection update failed: {}", e);
                        app.set_status(format!("Error: {}", e));
                    }
                }
                _ => {}
            }
        }

        app.tick();
    }
}
