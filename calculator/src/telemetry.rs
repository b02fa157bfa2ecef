//! 日志订阅器的初始化。

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, LogFormat};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// 日志订阅器已安装的凭证。
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// 配置日志订阅器时发生的错误。
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// 日志过滤表达式无效。
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// 安装全局订阅器失败，通常是进程中已经安装了其他订阅器。
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[source] TryInitError),
}

/// 安装全局日志订阅器。
///
/// 只有第一次调用会安装订阅器，之后的调用直接返回新的[`TelemetryHandle`]。
///
/// # 错误
///
/// 过滤表达式无效时返回[`TelemetryError::Filter`]，此时不会记住失败，
/// 之后可以用有效的配置重试。
///
/// # 例子
///
/// ```
/// use calculator::config::Config;
/// use calculator::telemetry;
///
/// # fn main() -> Result<(), calculator::telemetry::TelemetryError> {
/// let config = Config::default();
/// telemetry::initialise(&config)?;
/// telemetry::initialise(&config)?;
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = build_filter(config.log_filter())?;

    // 两种格式的层类型不同，未选中的一个为`None`
    let (compact, json) = match config.log_format() {
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(io::stderr)
                .with_ansi(io::stderr().is_terminal());
            (Some(layer), None)
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_writer(io::stderr)
                .with_ansi(false);
            (None, Some(layer))
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(compact)
        .with(json)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

fn build_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives).map_err(|error| TelemetryError::Filter(error.to_string()))
}
