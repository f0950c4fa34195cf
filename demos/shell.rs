//! Interactive shell driving a local Chord node.
//!
//! Run with: cargo run --example shell -- --port 3410

use std::io::{self, BufRead};

use clap::Parser;
use tracing::{error, info, warn, Level};

use chord::{rpc::DEFAULT_ADDRESS, Config, Session, SessionError};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on once a ring is created or joined.
    #[arg(short, long, default_value = DEFAULT_ADDRESS)]
    address: String,
    /// Override the port of `address`.
    #[arg(short, long)]
    port: Option<u16>,
    /// Log debug messages.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    let mut session = Session::new(Config {
        address: cli.address,
        ..Default::default()
    });

    if let Some(port) = cli.port {
        if let Err(error) = session.set_port(port) {
            error!(?error, "Invalid port");
        }
    }

    info!(address = session.address(), "Starting interactive shell");

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                error!(?error, "Failed to read stdin");
                std::process::exit(1);
            }
        };

        let parts: Vec<&str> = line.split_whitespace().collect();

        let Some((command, args)) = parts.split_first() else {
            continue;
        };

        let result = match (*command, args) {
            ("help", [] | [_]) => session.help(args.first().copied()).map(|commands| {
                println!("{}", commands.join(" "));
            }),
            ("port", [port]) => match port.parse() {
                Ok(port) => session.set_port(port),
                Err(_) => {
                    warn!(port, "Not a port number");
                    continue;
                }
            },
            ("create", []) => session.create(),
            ("join", [peer]) => session.join(peer),
            ("ping", [address]) => session
                .ping(address)
                .map(|_| println!("success at {address}")),
            ("put", [key, value, address]) => session
                .put(address, key, value)
                .map(|_| println!("inserted key {key} value {value} into node at {address}")),
            ("get", [key, address]) => session.get(address, key).map(|value| match value {
                Some(value) => println!("Retrieved {value}"),
                None => println!("{key} not found at {address}"),
            }),
            ("delete", [key, address]) => session
                .delete(address, key)
                .map(|_| println!("Deleted key {key} from {address}")),
            ("dump", []) => session.dump().map(|info| {
                println!("Address: {}", info.address());
                println!("Identifier: {}", info.id());
                for (i, successor) in info.successors().iter().enumerate() {
                    println!("Successor {i}: {successor}");
                }
                println!("Predecessor: {}", info.predecessor().unwrap_or("unknown"));
                for (key, value) in info.data() {
                    println!("{key}: {value}");
                }
            }),
            ("quit", []) => std::process::exit(0),
            (
                "help" | "port" | "create" | "join" | "ping" | "put" | "get" | "delete" | "dump"
                | "quit",
                _,
            ) => {
                warn!(command, "Review your command line arguments");
                continue;
            }
            _ => {
                warn!(command, "Unrecognized command, try help");
                continue;
            }
        };

        match result {
            Ok(()) => {}
            Err(SessionError::NotInitialized) => warn!("Create or join a ring first"),
            Err(error @ SessionError::Bind(_)) => {
                error!(%error, "Unable to listen");
                std::process::exit(1);
            }
            Err(error) => warn!(%error, "Command failed"),
        }
    }
}
