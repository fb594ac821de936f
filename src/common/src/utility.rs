use tokio::sync::broadcast;
use tracing::{error, info};

/// Broadcasts a single shutdown signal on Ctrl-C. Sessions subscribe through
/// the sender and stop polling when it fires.
pub fn create_shutdown_channel() -> (broadcast::Sender<()>, broadcast::Receiver<()>) {
    let (shutdown_sender, shutdown_receiver) = broadcast::channel::<()>(16);
    let sender = shutdown_sender.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        info!("signal received, shutting down");
        // No receivers left means nothing is running anymore
        let _ = sender.send(());
    });
    (shutdown_sender, shutdown_receiver)
}
