use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hearthwatch_core::config::AppConfig;
use hearthwatch_core::events::{EventSink, MatchEvent};
use hearthwatch_core::reader::read_log_file;
use hearthwatch_core::watcher::{LogWatcher, run_pipeline};
use hearthwatch_core::{TrackerSession, WatchError};

#[derive(Parser)]
#[command(version, about = "Hearthstone match tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tail the live log and print match events as they happen
    Watch {
        /// Log file to tail (defaults to the configured path)
        #[arg(short, long)]
        path: Option<PathBuf>,
        /// Print events as JSON lines instead of human-readable text
        #[arg(long)]
        json: bool,
        /// Replay the file's existing content before tailing
        #[arg(long)]
        catch_up: bool,
    },
    /// Parse an existing log file and print the matches found in it
    ParseFile {
        #[arg(short, long)]
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config,
}

/// Prints each match event to stdout.
struct PrintSink {
    json: bool,
}

impl EventSink for PrintSink {
    fn handle_event(&mut self, event: &MatchEvent) {
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(err) => tracing::error!(%err, "failed to serialize event"),
            }
            return;
        }
        match event {
            MatchEvent::MatchStart => println!("match started"),
            MatchEvent::MatchEnd {
                card_history,
                was_spectating,
            } => {
                println!(
                    "match ended ({} cards{})",
                    card_history.len(),
                    if *was_spectating { ", spectated" } else { "" }
                );
                for item in card_history {
                    println!("  turn {:>2} {:<8} {}", item.turn, item.player, item.card_id);
                }
            }
            MatchEvent::Outcome(outcome) => println!("outcome: {outcome}"),
            MatchEvent::GoingOrder(order) => println!("going: {order}"),
            MatchEvent::GameMode(mode) => println!("mode: {mode}"),
            MatchEvent::OwnClass(class) => println!("own class: {class}"),
            MatchEvent::OpponentClass(class) => println!("opponent class: {class}"),
            MatchEvent::Rank(rank) => println!("rank: {rank}"),
            MatchEvent::Legend(legend) => println!("legend: {legend}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), WatchError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().unwrap_or_default();

    match cli.command {
        Commands::Watch { path, json, catch_up } => {
            let path = path.unwrap_or_else(|| PathBuf::from(&config.log_path));
            let mut session = TrackerSession::new();
            session.add_sink(Box::new(PrintSink { json }));

            let mut offset = 0;
            if catch_up && path.exists() {
                let (tokens, consumed) = read_log_file(&path)?;
                info!(tokens = tokens.len(), consumed, "caught up on existing content");
                session.process_tokens(&tokens);
                offset = consumed;
            }

            info!(path = %path.display(), "watching log file");
            let (rx, handle) = LogWatcher::new(&path)
                .poll_interval(Duration::from_millis(config.poll_interval_ms))
                .from_offset(offset)
                .spawn();
            run_pipeline(rx, &mut session).await;
            handle.abort();
        }
        Commands::ParseFile { path, json } => {
            let (tokens, _) = read_log_file(&path)?;
            info!(tokens = tokens.len(), "parsed log file");
            let mut session = TrackerSession::new();
            session.add_sink(Box::new(PrintSink { json }));
            session.process_tokens(&tokens);
        }
        Commands::Config => {
            println!("log_path: {}", config.log_path);
            println!("poll_interval_ms: {}", config.poll_interval_ms);
        }
    }

    Ok(())
}
