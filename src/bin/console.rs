use anyhow::{Context, Result};
use chunkstream_console::config::{ClientConfig, DEFAULT_PUSH_PATH, DEFAULT_SERVER_URL};
use chunkstream_console::console::{
    parse_command, render_changes, render_notice, render_view, ConsoleCommand, USAGE,
};
use chunkstream_console::coordinator::ClientCoordinator;
use chunkstream_console::metrics::{start_metrics_server, MetricsConfig};
use clap::{value_parser, Arg, ArgMatches, Command};
use std::io::BufRead;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn create_command() -> Command {
    Command::new("chunkstream-console")
        .about("Terminal client for a peer-to-peer file transfer backend")
        .arg(
            Arg::new("server")
                .long("server")
                .short('s')
                .env("CHUNKSTREAM_SERVER")
                .value_name("URL")
                .default_value(DEFAULT_SERVER_URL)
                .help("Base URL of the transfer backend"),
        )
        .arg(
            Arg::new("push-path")
                .long("push-path")
                .env("CHUNKSTREAM_PUSH_PATH")
                .value_name("PATH")
                .default_value(DEFAULT_PUSH_PATH)
                .help("Path of the notification WebSocket"),
        )
        .arg(
            Arg::new("timeout-secs")
                .long("timeout-secs")
                .value_name("SECS")
                .value_parser(value_parser!(u64).range(1..))
                .default_value("30")
                .help("Timeout for each backend request"),
        )
        .arg(
            Arg::new("metrics-addr")
                .long("metrics-addr")
                .env("CHUNKSTREAM_METRICS_ADDR")
                .value_name("ADDR")
                .value_parser(value_parser!(SocketAddr))
                .help("Serve Prometheus metrics on this address"),
        )
}

fn build_config(matches: &ArgMatches) -> Result<ClientConfig> {
    let server = matches
        .get_one::<String>("server")
        .map(String::as_str)
        .unwrap_or(DEFAULT_SERVER_URL);

    let mut config = ClientConfig::with_server(server)?;
    if let Some(path) = matches.get_one::<String>("push-path") {
        config.push_path = path.clone();
    }
    if let Some(secs) = matches.get_one::<u64>("timeout-secs") {
        config.request_timeout = Duration::from_secs(*secs);
    }
    Ok(config)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chunkstream_console=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Stdin is read on a plain thread so a pending read never holds up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Reading stdin failed: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let matches = create_command().get_matches();
    let config = build_config(&matches)?;

    if let Some(addr) = matches.get_one::<SocketAddr>("metrics-addr") {
        start_metrics_server(MetricsConfig::with_addr(*addr))?;
    }

    println!("ChunkStream Console");
    println!("===================");
    println!("backend: {}", config.server_url);
    println!("{USAGE}\n");

    let (coordinator, handle, mut notices) = ClientCoordinator::new(config)?;
    let mut view = handle.subscribe();
    let mut shown = view.borrow().clone();
    let runner = tokio::spawn(coordinator.run());

    let mut input = spawn_stdin_reader();

    loop {
        tokio::select! {
            line = input.recv() => {
                let Some(line) = line else { break };

                match parse_command(&line) {
                    Ok(ConsoleCommand::Exit) => break,
                    Ok(ConsoleCommand::Help) => println!("{USAGE}"),
                    Ok(ConsoleCommand::Status) => println!("{}", render_view(&handle.view())),
                    Ok(command) => match command.into_actions(&handle.view()) {
                        Ok(actions) => {
                            for action in actions {
                                handle.dispatch(action)?;
                            }
                        }
                        Err(e) => println!("{e}"),
                    },
                    Err(e) => println!("{e}\n{USAGE}"),
                }
            }
            Some(notice) = notices.recv() => println!("{}", render_notice(&notice)),
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = view.borrow_and_update().clone();
                for line in render_changes(&shown, &next) {
                    println!("{line}");
                }
                shown = next;
            }
        }
    }

    handle.shutdown();
    runner.await.context("coordinator task failed")?;
    println!("bye");

    Ok(())
}
