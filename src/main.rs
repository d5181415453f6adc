use anyhow::Result;
use clap::Parser;
use log::{error, info, warn};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

mod ui;
mod utils;

use crate::ui::{ChatUI, Intent};
use chatsync::backend::fixtures::{self, Fixture};
use chatsync::backend::{MockBackend, MockLatency};
use chatsync::chat::ChatController;
use chatsync::config::{self, Settings};

/// Command line arguments for chatsync
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "chatsync: a terminal chat client running against a simulated messaging backend.",
    long_about = "chatsync keeps a contact list and message threads in sync with a mock backend.\n\n\
    Settings are read from <config dir>/chatsync/settings.json unless --config is given;\n\
    command line options override the file."
)]
struct Args {
    /// Settings file to use instead of the per-user one
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON file with the contacts and messages the mock backend serves
    #[arg(long, value_name = "PATH")]
    fixture: Option<PathBuf>,

    /// Probability (0-1) that any backend call fails
    #[arg(long, value_name = "RATE")]
    failure_rate: Option<f64>,

    /// Answer every backend call immediately
    #[arg(long)]
    no_latency: bool,

    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// error, warn, info, debug or trace
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(path) = &self.fixture {
            settings.fixture = Some(path.clone());
        }
        if let Some(rate) = self.failure_rate {
            settings.failure_rate = rate;
        }
        if let Some(path) = &self.log_file {
            settings.log_file = Some(path.clone());
        }
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
    }
}

fn build_backend(settings: &Settings, no_latency: bool) -> Result<MockBackend> {
    let fixture = match &settings.fixture {
        Some(path) => Fixture::from_file(path)?,
        None => fixtures::seed(),
    };
    let latency = if no_latency {
        MockLatency::none()
    } else {
        settings.latency.to_latency()
    };

    let mut backend = MockBackend::new(fixture)
        .with_latency(latency)
        .with_failure_rate(settings.failure_rate);
    if let Some(timeout) = settings.timeout() {
        backend = backend.with_timeout(timeout);
    }
    Ok(backend)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.config {
        config::set_config_path_override(path.clone());
    }
    let mut settings = config::load_settings()?;
    args.apply_to(&mut settings);
    settings.validate()?;

    let log_file_path = settings
        .log_file
        .clone()
        .unwrap_or_else(|| PathBuf::from("chatsync.log"));
    utils::setup_logging(Some(&log_file_path), settings.level_filter()?)?;

    info!("chatsync starting up");
    info!("System information: {} {}", std::env::consts::OS, std::env::consts::ARCH);
    info!("Logging to file: {}", log_file_path.display());

    let backend = Arc::new(build_backend(&settings, args.no_latency)?);
    let mut controller = ChatController::new(backend);

    let mut terminal = ui::setup_terminal()?;
    let mut chat_ui = ChatUI::new();

    controller.start();

    let result = run_main_loop(&mut chat_ui, &mut terminal, &mut controller).await;

    // Restore terminal even when the loop failed
    ui::restore_terminal(terminal)?;
    if let Err(e) = &result {
        error!("Main loop failed: {}", e);
    }

    println!("Chat session ended.");
    result
}

/// Run the main event loop
async fn run_main_loop(
    chat_ui: &mut ChatUI,
    terminal: &mut ui::Terminal<ui::CrosstermBackend<io::Stdout>>,
    controller: &mut ChatController<MockBackend>,
) -> Result<()> {
    loop {
        let snapshot = controller.snapshot();
        terminal.draw(|f| chat_ui.draw(f, &snapshot))?;

        match chat_ui.handle_input(&snapshot)? {
            Some(Intent::Quit) => break,
            Some(Intent::Select(contact_id)) => {
                if let Err(e) = controller.select_contact(&contact_id) {
                    warn!("Selection failed: {}", e);
                }
            }
            Some(Intent::Send(text)) => {
                if controller.send(&text).is_none() {
                    info!("Nothing sent: no contact selected or empty text");
                }
            }
            Some(Intent::ClearError) => controller.clear_error(),
            Some(Intent::Refresh) => controller.refresh_contacts(),
            None => {}
        }

        // Apply whatever the backend finished since the last frame
        controller.poll_events();
        tokio::task::yield_now().await;
    }

    if controller.outstanding() > 0 {
        info!("Quitting with {} backend operations still in flight", controller.outstanding());
    }
    Ok(())
}
