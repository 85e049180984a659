use std::{future::Future, pin::Pin, sync::Arc};

use tokio_util::sync::CancellationToken;

use crate::context::{ConfigProvider, ModuleCtxBuilder};
use crate::registry::ModuleRegistry;

/// What ends the run.
pub enum StopOn {
    /// SIGINT or SIGTERM; Ctrl+C off Unix.
    Signals,
    /// The caller cancels this token.
    Token(CancellationToken),
    /// This future completes.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

pub struct RunOptions {
    pub registry: ModuleRegistry,
    pub config: Arc<dyn ConfigProvider>,
    pub stop_on: StopOn,
}

async fn termination_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate())?;
        let mut int = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = term.recv() => {}
            _ = int.recv() => {}
        }
        Ok(())
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

/// Cancel `cancel` once `stop_on` fires.
fn arm(stop_on: StopOn, cancel: &CancellationToken) {
    let waiter: Pin<Box<dyn Future<Output = ()> + Send>> = match stop_on {
        StopOn::Token(_) => return,
        StopOn::Future(f) => f,
        StopOn::Signals => Box::pin(async {
            if let Err(e) = termination_signal().await {
                tracing::warn!(error = %e, "signal handler unavailable, waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }),
    };
    let cancel = cancel.clone();
    tokio::spawn(async move {
        waiter.await;
        tracing::info!("shutdown requested");
        cancel.cancel();
    });
}

/// Init, mount REST, start, wait for the stop condition, stop.
///
/// When a module fails to start, the ones already started are stopped before
/// the error is returned.
pub async fn run(opts: RunOptions) -> anyhow::Result<()> {
    let RunOptions {
        registry,
        config,
        stop_on,
    } = opts;

    let cancel = match &stop_on {
        StopOn::Token(t) => t.clone(),
        _ => CancellationToken::new(),
    };
    arm(stop_on, &cancel);

    let ctx = ModuleCtxBuilder::new(cancel.clone())
        .with_config_provider(config)
        .build();

    tracing::info!("Phase: init");
    registry.init(&ctx).await?;

    tracing::info!("Phase: rest");
    registry.mount_rest(&ctx, axum::Router::new())?;

    tracing::info!("Phase: start");
    if let Err(e) = registry.start(&cancel).await {
        cancel.cancel();
        registry.stop(&cancel).await;
        return Err(e.into());
    }

    cancel.cancelled().await;

    tracing::info!("Phase: stop");
    registry.stop(&cancel).await;
    Ok(())
}
