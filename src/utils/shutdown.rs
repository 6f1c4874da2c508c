use tokio_util::sync::CancellationToken;

/// Returns a token that is cancelled on Ctrl+C (and SIGTERM on unix).
///
/// Long-running loops poll the token between units of work, so a write that is
/// already in progress always finishes before the process winds down.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel_for_signals = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => tracing::info!("Received SIGINT (Ctrl+C), finishing current listing"),
                        _ = sigterm.recv() => tracing::info!("Received SIGTERM, finishing current listing"),
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    if let Err(e) = ctrl_c.await {
                        tracing::error!("Failed to listen for Ctrl+C: {}", e);
                        return;
                    }
                    tracing::info!("Received Ctrl+C, finishing current listing");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = ctrl_c.await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                return;
            }
            tracing::info!("Received Ctrl+C, finishing current listing");
        }

        cancel_for_signals.cancel();
    });

    token
}
