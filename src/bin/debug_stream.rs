use clap::Parser;
use dashsync::logger;
use dashsync::stream::{ReconnectPolicy, StreamConfig, StreamManager, WsTransport};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "debug_stream")]
#[command(about = "Debug tool for the realtime update stream", long_about = None)]
struct Args {
    /// Streaming endpoint address
    #[arg(short, long, default_value = StreamConfig::DEFAULT_ADDRESS)]
    address: String,

    /// How long to stay subscribed, in seconds
    #[arg(short, long, default_value = "120")]
    duration: u64,

    /// Keepalive cadence in seconds
    #[arg(long, default_value = "25")]
    keepalive: u64,

    /// Reconnects allowed before the subscription goes dormant
    #[arg(long, default_value = "3")]
    max_attempts: u32,

    /// Print full update payloads
    #[arg(short, long)]
    verbose: bool,

    /// Connection state machine logging
    #[arg(long)]
    debug_stream: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logger::init();

    println!("Update Stream Debug Tool\n");
    println!("{}", "=".repeat(80));
    println!("Address:  {}", args.address);
    println!("Duration: {}s", args.duration);
    if args.debug_stream {
        println!("State machine logging enabled");
    }
    println!("{}", "=".repeat(80));

    let config = StreamConfig {
        address: args.address.clone(),
        keepalive_interval: Duration::from_secs(args.keepalive.max(1)),
        reconnect: ReconnectPolicy {
            max_attempts: args.max_attempts,
            ..ReconnectPolicy::default()
        },
        ..StreamConfig::default()
    };

    let verbose = args.verbose;
    let manager = StreamManager::new(config, Arc::new(WsTransport::new()), move |payload| {
        if verbose {
            println!("[UPDATE] {}", payload);
        } else {
            let keys: Vec<String> = payload
                .as_object()
                .map(|obj| obj.keys().cloned().collect())
                .unwrap_or_default();
            println!("[UPDATE] keys: {:?}", keys);
        }
    });

    let mut status_rx = manager.watch_status();
    let status_printer = tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow_and_update().clone();
            println!("[STATUS] {}", status);
        }
    });

    if !manager.subscribe() {
        println!("Subscription refused");
        return;
    }

    tokio::time::sleep(Duration::from_secs(args.duration)).await;

    let status = manager.status();
    manager.unsubscribe();
    status_printer.abort();

    println!("\n{}", "=".repeat(80));
    println!("[SUMMARY]");
    println!("Final state:        {}", status.state);
    println!("Reconnect attempts: {}", status.reconnect_attempts);
    match status.last_update_at {
        Some(at) => println!("Last update:        {}", at.to_rfc3339()),
        None => println!("Last update:        none"),
    }
    println!("{}", "=".repeat(80));
}
