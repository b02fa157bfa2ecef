use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use calculator::config::Config;
use calculator::server::{RunError, Server};
use calculator::service::Calculator;
use calculator::telemetry;
use calculator_core::log::{Logger, TracingLogger};
use clap::Parser;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    telemetry::initialise(&config)?;

    let addr = config.addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let addr = listener.local_addr().context("failed to read local address")?;

    let logger = Arc::new(TracingLogger::new());
    let calculator = Calculator::new(Arc::clone(&logger));

    logger.info(&format!("Server is running on http://{addr}"), &[]);

    let timeout = config.shutdown_timeout();
    let res = Server::new(listener)
        .run_with_graceful_shutdown(calculator, shutdown_signal(timeout))
        .await;

    match res {
        Ok(()) => {
            tracing::info!("server stopped");
            Ok(())
        }
        Err(RunError::Listener(error, graceful)) => {
            // 监听器出错后仍然等待已有的请求处理完成
            if let Err(e) = graceful.shutdown(timeout).await {
                tracing::warn!(open = e.open, ?timeout, "connections still open after shutdown timeout");
            }
            Err(anyhow::Error::new(error).context("listener failed"))
        }
        Err(RunError::GracefulShutdownTimeout(e)) => {
            tracing::warn!(open = e.open, ?timeout, "connections still open after shutdown timeout");
            Err(RunError::GracefulShutdownTimeout(e).into())
        }
    }
}

/// 等待 ctrl + c 或 SIGTERM，返回优雅关机的等待时间。
async fn shutdown_signal(timeout: Option<Duration>) -> Option<Duration> {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl + c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!(signal = "ctrl_c", "shutting down"),
        _ = terminate => tracing::info!(signal = "SIGTERM", "shutting down"),
    }

    timeout
}
