//! Relay Console - Main entry point
//!
//! Bootstraps exactly like the original page load did: restore the
//! persisted API base, probe the server once, start the reconnecting
//! feed, then hand control to the user.

mod commands;
mod panels;

use clap::Parser;
use commands::ConsoleCtx;
use panels::{ConsolePanel, ConsoleStatus};
use relay_core::StatusSink;
use relay_networking::{spawn_feed, FeedConfig, RelayClient};
use relay_persistence::{sqlite, Database};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Console client for the local relay demo server
#[derive(Parser, Debug)]
#[command(name = "relay-console", version, about)]
struct Args {
    /// Relay server address
    #[arg(long, env = "RELAY_SERVER", default_value = "http://127.0.0.1:8000")]
    server: String,

    /// Data directory for the settings database (defaults to the
    /// platform-local data dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Run a single proxy call and exit instead of entering the console
    #[arg(long, value_name = "PATH")]
    call: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_console=info,relay_networking=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Relay Console (server: {})", args.server);

    let data_dir = args.data_dir.unwrap_or_else(|| {
        dirs_next::data_local_dir()
            .map(|p| p.join("RelayConsole"))
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let db = match Database::connect(&data_dir.join("console.db")).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("FATAL: Failed to open settings database: {}", e);
            std::process::exit(1);
        }
    };

    // Restore the persisted API base into the input field
    let saved_base = match sqlite::load_api_base(db.pool()).await {
        Ok(base) => base.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Could not load saved API base: {}", e);
            String::new()
        }
    };
    if !saved_base.is_empty() {
        println!("Restored API base: {}", saved_base);
    }

    let status = Arc::new(ConsoleStatus::new());
    let output = Arc::new(ConsolePanel::new("feed"));
    let api_output = Arc::new(ConsolePanel::new("api"));

    let ctx = ConsoleCtx {
        client: RelayClient::new(&args.server),
        db,
        status: status.clone(),
        output: output.clone(),
        api_output: api_output.clone(),
        base_input: Mutex::new(saved_base),
    };

    // One-time health probe seeds the status display
    status.set_connected(ctx.client.probe_status().await);

    // One-shot mode: no feed, just the call
    if let Some(path) = args.call {
        ctx.call(&path).await;
        return;
    }

    let feed_config = match FeedConfig::from_server_base(&args.server) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    };
    let feed = spawn_feed(feed_config, status.clone(), output.clone());

    print_help();
    run_command_loop(&ctx).await;

    feed.close();
    tracing::info!("Relay Console exiting");
}

/// Read commands line by line until quit or EOF
async fn run_command_loop(ctx: &ConsoleCtx) {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("stdin error: {}", e);
                break;
            }
        };

        let line = line.trim();
        let (cmd, rest) = match line.split_once(' ') {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };

        match cmd {
            "" => {}
            "call" => ctx.call(rest).await,
            "base" => ctx.set_base_input(rest),
            "save" => ctx.save().await,
            "reset" => ctx.reset().await,
            "clear" => ctx.clear(),
            "status" => ctx.status().await,
            "help" => print_help(),
            "quit" | "exit" => break,
            other => println!("Unknown command '{}' (try 'help')", other),
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  call <path>   proxy a call through the relay (path or absolute URL)");
    println!("  base <url>    set the API base for subsequent calls");
    println!("  save          persist the API base");
    println!("  reset         forget the persisted API base");
    println!("  clear         clear both panels");
    println!("  status        re-probe the relay server");
    println!("  quit          exit");
}
