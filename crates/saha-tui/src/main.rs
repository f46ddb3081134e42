use std::io;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;
mod block_form;
mod editor;
mod markup;
mod ui;

use api::{ApiClient, SessionStatus};
use app::{App, AppEvent, View};

/// Logs go to the file named by `SAHA_TUI_LOG`; the terminal belongs to
/// the UI, so nothing is logged when it is unset.
fn init_tracing() -> Result<()> {
    let Ok(path) = std::env::var("SAHA_TUI_LOG") else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("cannot open log file {}", path))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "saha_tui=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    if std::env::args().skip(1).any(|a| a == "--help" || a == "-h") {
        println!("Usage: saha-tui");
        println!();
        println!("Environment:");
        println!("  SAHA_SERVER_URL  Panel server (default http://localhost:3000)");
        println!("  SAHA_TUI_LOG     Write logs to this file");
        println!("  EDITOR           External editor for long texts (Ctrl+E)");
        return Ok(());
    }

    let server_url = std::env::var("SAHA_SERVER_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());

    let mut api = ApiClient::new(&server_url)?;
    let session = api.restore_session().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read stored session");
        SessionStatus::Missing
    });
    tracing::info!(server = %server_url, session = ?session, "starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = App::new(api, session);
    let res = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "terminal client failed");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<AppEvent>(100);

    // Spawn input handler
    let tx_input = tx.clone();
    tokio::spawn(async move {
        loop {
            if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                if let Ok(Event::Key(key)) = event::read() {
                    if key.kind == KeyEventKind::Press {
                        let _ = tx_input.send(AppEvent::Key(key)).await;
                    }
                }
            }
            let _ = tx_input.send(AppEvent::Tick).await;
        }
    });

    if app.view == View::VerifyingAuth {
        let tx_verify = tx.clone();
        tokio::spawn(async move {
            let _ = tx_verify.send(AppEvent::VerifyAuth).await;
        });
    }

    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        if let Some(event) = rx.recv().await {
            match event {
                AppEvent::Key(key) => {
                    if app.handle_key(key, tx.clone()).await? {
                        return Ok(());
                    }
                    // Repaint everything after an external editor ran
                    if app.needs_terminal_clear {
                        terminal.clear()?;
                        app.needs_terminal_clear = false;
                    }
                }
                AppEvent::Tick => {}
                AppEvent::VerifyAuth => {
                    app.verify_auth().await;
                }
                AppEvent::AuthSuccess => {
                    app.on_auth_success().await;
                }
                AppEvent::AuthFailed(msg) => {
                    app.on_auth_failed(msg);
                }
            }
        }
    }
}
