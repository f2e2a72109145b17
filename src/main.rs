// ABOUTME: Entry point for the handoff terminal widget.
// ABOUTME: Loads config, wires the HTTP and WebSocket transports into a session driver, reads stdin.

use anyhow::{Context, Result};
use clap::Parser;
use handoff::app::{dispatch, Reply};
use handoff::commands::interpret;
use handoff::presentation::stdout_sink;
use handoff_core::{Config, DriverSettings, Presentation, SessionCore, SessionDriver};
use handoff_transport::backends::{HttpChatService, WebSocketConnector};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Chat with an AI assistant and get handed off to a human agent
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (overrides HANDOFF_CONFIG_PATH)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chat service base URL
    #[arg(short, long)]
    server: Option<String>,

    /// Name shown to agents and used to recognize your own echoed messages
    #[arg(long)]
    visitor: Option<String>,

    /// Output style: terminal or jsonl
    #[arg(short, long)]
    presentation: Option<Presentation>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,handoff=debug,handoff_core=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    // Stdout belongs to the conversation
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(Some(path.as_path()))?,
        None => Config::load()?,
    };
    if let Some(server) = &cli.server {
        config.service.server_url = server.clone();
    }
    if let Some(visitor) = &cli.visitor {
        config.widget.visitor_name = visitor.clone();
    }
    if let Some(presentation) = cli.presentation {
        config.widget.presentation = presentation;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let config = load_config(&cli)?;
    tracing::info!(
        server = %config.service.server_url,
        push = %config.push_url(),
        visitor = %config.widget.visitor_name,
        presentation = ?config.widget.presentation,
        "Configuration loaded"
    );

    let service = HttpChatService::new(&config.service.server_url, config.request_timeout())
        .context("Failed to create chat service client")?;
    let push = WebSocketConnector::new(&config.push_url(), config.keepalive())
        .context("Failed to configure push channel")?;
    let sink = stdout_sink(config.widget.presentation, &config.service.server_url);
    let core = SessionCore::from_config(&config)?;

    let (handle, driver) = SessionDriver::spawn(
        core,
        Arc::new(service),
        Arc::new(push),
        sink,
        DriverSettings::from_config(&config),
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            line = lines.next_line() => line.context("Failed to read stdin")?,
        };
        // EOF
        let Some(line) = line else { break };

        let action = match interpret(&line) {
            Ok(Some(action)) => action,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match dispatch(&handle, action).await? {
            Reply::Quiet => {}
            Reply::Notice(text) => eprintln!("{}", text),
            Reply::Quit => break,
        }
    }

    handle.shutdown().await.ok();
    driver.await.context("Session driver panicked")?;
    tracing::info!("Goodbye");
    Ok(())
}
