use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use songdrill::autocomplete::AutocompleteIndex;
use songdrill::backend::{HttpService, QuizService};
use songdrill::config::Config;
use songdrill::console::{self, ConsolePlayer, ConsoleView};
use songdrill::runner::{SessionHandle, SessionRunner};
use songdrill::session::QuizSession;

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "songdrill=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!("Starting songdrill against {}", config.service_base_url);

    let service: Arc<dyn QuizService> = match HttpService::new(&config) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!("failed to build service client: {e}");
            std::process::exit(1);
        }
    };

    let catalog = match service.catalog().await {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!("failed to load title catalog: {e}");
            std::process::exit(1);
        }
    };
    let index = AutocompleteIndex::build(catalog);
    tracing::info!("autocomplete index ready ({} titles)", index.len());

    let session = QuizSession::new(index, config.play_duration_secs);
    let (handle, events_rx) = SessionHandle::channel();
    let player = ConsolePlayer::new(handle.clone(), config.assumed_media_duration_secs);
    let runner = SessionRunner::new(
        session,
        service,
        player,
        ConsoleView::default(),
        handle.clone(),
        events_rx,
        Duration::from_secs(config.schedule_poll_secs),
    );

    tokio::spawn(read_stdin(handle));

    println!("songdrill: /p starts and toggles pause, ?text previews suggestions,");
    println!("a plain line submits a guess, /n advances, /q quits.");
    runner.run().await;
}

async fn read_stdin(handle: SessionHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        console::dispatch_line(&handle, &line);
    }
    handle.shutdown();
}
