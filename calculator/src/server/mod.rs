//! HTTP服务器。

mod graceful_shutdown;
pub use graceful_shutdown::{GracefulShutdown, ShutdownTimeout};

use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use calculator_core::log::Logger;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use tokio::net::TcpListener;

use crate::service::Calculator;

/// HTTP服务器。
///
/// 每个连接在单独的任务中处理，自动识别HTTP/1和HTTP/2。
pub struct Server {
    listener: TcpListener,
    builder: Builder<TokioExecutor>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("listener", &self.listener)
            .field("builder", &self.builder)
            .finish()
    }
}

impl Server {
    /// 使用指定的监听器创建服务器。
    pub fn new(listener: TcpListener) -> Self {
        Self {
            listener,
            builder: Builder::new(TokioExecutor::new()),
        }
    }

    /// 监听器绑定的本地地址。
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// 运行服务器。
    pub async fn run<L>(&self, calculator: Calculator<L>) -> Result<(), RunError>
    where
        L: Logger + 'static,
    {
        self.run_with_graceful_shutdown(calculator, std::future::pending())
            .await
    }

    /// 运行服务器，并设置关机信号用于启动优雅关机。
    ///
    /// 关机信号完成后不再接受新连接，并在信号返回的超时时间内等待已有的连接关闭，
    /// 超时时间为`None`时一直等待。
    pub async fn run_with_graceful_shutdown<L, G>(
        &self,
        calculator: Calculator<L>,
        signal: G,
    ) -> Result<(), RunError>
    where
        L: Logger + 'static,
        G: Future<Output = Option<Duration>> + Send + 'static,
    {
        let mut signal = std::pin::pin!(signal);

        let graceful = GracefulShutdown::new();

        let timeout = loop {
            tokio::select! {
                timeout = signal.as_mut() => {
                    break timeout;
                }
                incoming = self.listener.accept() => {
                    let (conn, remote) = match incoming {
                        Ok(value) => value,
                        Err(e) => return Err(RunError::Listener(e, graceful)),
                    };
                    tracing::debug!(%remote, "accepted connection");

                    let calculator = calculator.clone();
                    let service = hyper::service::service_fn(move |req: hyper::Request<Incoming>| {
                        let calculator = calculator.clone();
                        async move { Ok::<_, Infallible>(calculator.handle(req).await) }
                    });

                    let builder = self.builder.clone();
                    let guard = graceful.track();

                    tokio::spawn(async move {
                        let conn = builder.serve_connection(TokioIo::new(conn), service);
                        let res = guard.serve(conn, |conn| conn.graceful_shutdown()).await;
                        if let Err(e) = res {
                            tracing::debug!(%remote, error = %e, "connection closed with error");
                        }
                    });
                }
            }
        };

        tracing::debug!(open = graceful.open_connections(), "waiting for connections to close");
        graceful
            .shutdown(timeout)
            .await
            .map_err(RunError::GracefulShutdownTimeout)
    }
}

/// 服务器运行错误。
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// 优雅关机超时。
    #[error("server graceful shutdown timeout ({0})")]
    GracefulShutdownTimeout(#[source] ShutdownTimeout),
    /// 监听器发生错误，可以用携带的[`GracefulShutdown`]等待已有的连接关闭。
    #[error("the server encountered an error while running ({0})")]
    Listener(#[source] io::Error, GracefulShutdown),
}
