use std::time::Duration;

use clap::Parser;
use coin_client::{
    agent::Agent,
    config::SessionConfig,
    session::Session,
    strategy::StrategyKind,
    transport::HttpTransport,
};
use common::utility::create_shutdown_channel;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{error, info, Level};

/// Headless player for the coin game server.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// `host:port` or a full URL
    #[arg(long, default_value = "127.0.0.1:5000")]
    server: String,
    /// Milliseconds between two polls of the server
    #[arg(long, default_value_t = 1000)]
    poll_ms: u64,
    #[arg(long, value_enum, default_value_t = StrategyKind::Greedy)]
    strategy: StrategyKind,
    /// Matches each instance plays before exiting
    #[arg(long, default_value_t = 1)]
    matches: u32,
    /// Independent clients to run side by side
    #[arg(long, default_value_t = 1)]
    instances: u32,
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_line_number(true)
        .with_file(true)
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    let config = match SessionConfig::new(&args.server) {
        Ok(config) => config.with_poll_interval(Duration::from_millis(args.poll_ms)),
        Err(e) => {
            error!("{}", e);
            return;
        }
    };
    let (shutdown_sender, _shutdown_receiver) = create_shutdown_channel();
    let (strategy, matches) = (args.strategy, args.matches);

    let handles: Vec<JoinHandle<()>> = (0..args.instances)
        .map(|instance| {
            let config = config.clone();
            let shutdown_sender = shutdown_sender.clone();
            tokio::spawn(async move {
                run_instance(instance, config, strategy, matches, &shutdown_sender).await
            })
        })
        .collect();

    for handle in handles {
        if let Err(e) = handle.await {
            error!("Instance exited non-gracefully: {}", e);
        }
    }
}

async fn run_instance(
    instance: u32,
    config: SessionConfig,
    strategy: StrategyKind,
    matches: u32,
    shutdown_sender: &broadcast::Sender<()>,
) {
    let transport = HttpTransport::new(config.server_url.clone());
    let (mut session, mut events) = Session::new(transport, config, shutdown_sender);
    let mut agent = Agent::new(strategy.build());
    info!("Instance {} playing as {}", instance, session.id());

    let mut won = 0;
    for played in 1..=matches {
        match agent.play_match(&mut session, &mut events).await {
            Ok(true) => won += 1,
            Ok(false) => {}
            Err(e) => {
                error!("Instance {} stopped: {}", instance, e);
                return;
            }
        }
        info!(
            "Instance {}: won {} of {} matches ({} rounds in the last)",
            instance,
            won,
            played,
            agent.history().len()
        );
    }
}
