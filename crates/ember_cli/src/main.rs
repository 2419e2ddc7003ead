use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use ember_core::{EmberConfig, EventKind, InteractionEvent, ALL_EVENT_KINDS};
use ember_engine::{spawn_ticker, EmotionEngine, TickerConfig};
use ember_store::{SqliteStore, StateGateway};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long, default_value = "ember.toml", env = "EMBER_CONFIG")]
    config: String,

    /// Override the state database path
    #[arg(short, long)]
    db: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
    let args = Args::parse();

    info!("Loading config from {}...", args.config);
    let mut config = EmberConfig::load_or_default(&args.config);
    if let Some(db) = args.db {
        config.engine.db_path = db;
    }

    info!("Opening state store at {}...", config.engine.db_path);
    let store = SqliteStore::new(&config.engine.db_path)
        .await
        .context("failed to open state database")?;

    let decay = ember_core::DecayEngine::from_config(&config.decay)?;
    let gateway = StateGateway::new(store.clone(), decay);
    let now = chrono::Utc::now().timestamp();
    let initial = gateway.load_or_neutral(now).await;

    let engine = Arc::new(EmotionEngine::new(&config, initial, Arc::new(store))?);
    let ticker = spawn_ticker(
        engine.clone(),
        TickerConfig::from_secs(config.engine.tick_interval_secs),
    );

    println!("Ember online. Feed it events by name, or: state, mod, describe, help, quit.");
    print!("> ");
    io::stdout().flush()?;

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }
        let trimmed = input.trim();

        match trimmed {
            "" => {}
            "quit" | "exit" => break,
            "help" => {
                println!("events:");
                for kind in ALL_EVENT_KINDS {
                    println!("  {}", kind);
                }
                println!("commands: state, mod, describe, quit");
                println!("append a magnitude to scale an event, e.g. `code_neglected 2.5`");
            }
            "state" => {
                let view = engine.snapshot().await;
                println!("{}", serde_json::to_string_pretty(&view)?);
            }
            "mod" => {
                let params = engine.current_modulation().await;
                println!("{}", serde_json::to_string_pretty(&params)?);
            }
            "describe" => {
                println!("{}", engine.describe().await);
            }
            line => match parse_event(line) {
                Some(event) => match engine.record_event(event).await {
                    Ok(state) => {
                        let now = chrono::Utc::now().timestamp();
                        println!("dominant: {} — {}", state.dominant(), state.describe(now));
                    }
                    Err(e) => println!("error: {}", e),
                },
                None => println!("unknown input '{}' — try `help`", line),
            },
        }

        print!("> ");
        io::stdout().flush()?;
    }

    ticker.abort();
    let final_state = engine.snapshot().await;
    info!(
        "Shutting down with dominant emotion: {}",
        final_state.dominant
    );
    Ok(())
}

fn parse_event(line: &str) -> Option<InteractionEvent> {
    let mut parts = line.split_whitespace();
    let kind = EventKind::parse_str(parts.next()?)?;
    let event = InteractionEvent::now(kind);
    match parts.next() {
        Some(raw) => raw.parse::<f32>().ok().map(|m| event.with_magnitude(m)),
        None => Some(event),
    }
}
