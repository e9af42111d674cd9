mod command;
mod config;
mod error;
mod input;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use runtime::{GeminiBackend, Launcher, McpSession, Orchestrator, history};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use command::{Command, HELP};
use config::{API_KEY_ENV, Config};
use error::Result;

const CONFIG_FILE: &str = "napier.toml";
const DEFAULT_LOG_LEVEL: &str = "warn";

type App = Orchestrator<GeminiBackend, McpSession>;

#[derive(Parser)]
#[command(name = "napier")]
#[command(about = "An MCP client connecting AI models with tool servers", long_about = None)]
#[command(version)]
struct Cli {
    /// MCP server script to connect to at startup (.py or .js)
    server: Option<PathBuf>,

    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter (e.g. "debug", "runtime=trace"); overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(CONFIG_FILE)?,
    };
    init_logging(cli.log_level.as_deref(), config.log_level.as_deref());

    // Missing credentials are fatal before the loop starts.
    let api_key = config.api_key(std::env::var(API_KEY_ENV).ok())?;

    let backend = GeminiBackend::builder(api_key, &config.backend.model)
        .max_tokens(config.backend.max_tokens)
        .build();
    let launcher = Launcher::from(&config.launcher);

    println!("napier v{}", env!("CARGO_PKG_VERSION"));
    println!("Model: {backend}");
    println!("Type 'help' for commands, 'quit' or Ctrl+D to exit.\n");

    let mut app: App = Orchestrator::new(backend)
        .with_temperature(config.backend.temperature)
        .with_history_policy(history::from_limit(config.history.max_turns));

    if let Some(server) = &cli.server {
        connect(&mut app, server, &launcher).await;
    }

    let outcome = tokio::select! {
        result = chat_loop(&mut app, &launcher) => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\nKeyboard interrupt detected. Exiting...");
            Ok(())
        }
    };

    if let Some(session) = app.disconnect() {
        release(session).await;
    }
    println!("Resources cleaned up.");
    outcome
}

fn init_logging(flag: Option<&str>, configured: Option<&str>) {
    let filter = match flag {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(configured.unwrap_or(DEFAULT_LOG_LEVEL))),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn chat_loop(app: &mut App, launcher: &Launcher) -> Result<()> {
    let mut lines = input::spawn_line_reader(io::BufReader::new(io::stdin()));
    let mut stdout = io::stdout();

    loop {
        print!("{}", prompt_label(app));
        stdout.flush()?;

        let Some(line) = lines.recv().await.transpose()? else {
            // EOF
            break;
        };

        match Command::parse(&line) {
            Command::Empty => continue,
            Command::Exit => {
                println!("Exiting...");
                break;
            }
            Command::Help => println!("\n{HELP}\n"),
            Command::Connect("") => println!("Usage: connect <path_to_server>"),
            Command::Connect(path) => connect(app, Path::new(path), launcher).await,
            Command::Query(_) if !app.is_connected() => {
                println!("Not connected to any MCP server. Use 'connect <path_to_server>' first.");
            }
            Command::Query(query) => match app.process_query(query).await {
                Ok(answer) => println!("\n{}\n", answer.text),
                Err(e) => eprintln!("Error: {e}\n"),
            },
        }
    }

    Ok(())
}

fn prompt_label(app: &App) -> String {
    let server = app
        .session()
        .and_then(|session| session.script().file_name())
        .map(|name| name.to_string_lossy().into_owned());

    match server {
        Some(name) => format!("napier ({name}) > "),
        None => "napier > ".to_string(),
    }
}

/// Launch a server and swap it in, releasing any previous session.
async fn connect(app: &mut App, path: &Path, launcher: &Launcher) {
    println!("Connecting to MCP server: {}...", path.display());

    let session = match McpSession::launch(path, launcher).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error connecting to server: {e}");
            return;
        }
    };

    if let Some(previous) = app.connect(session) {
        release(previous).await;
    }

    match app.refresh_catalog().await {
        Ok(catalog) => {
            println!("Connected. Available tools:");
            for tool in catalog.tools() {
                println!("  - {}", tool.name);
            }
            println!();
        }
        Err(e) => {
            eprintln!("Error listing tools: {e}");
            if let Some(session) = app.disconnect() {
                release(session).await;
            }
        }
    }
}

async fn release(session: McpSession) {
    let script = session.script().display().to_string();
    if let Err(e) = session.shutdown().await {
        warn!(script = %script, error = %e, "failed to shut down MCP session");
    }
}
