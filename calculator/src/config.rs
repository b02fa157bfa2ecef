//! 服务配置。
//!
//! 配置来自命令行参数，未指定的参数回退到环境变量，再回退到默认值。

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// 默认监听端口。
pub const DEFAULT_PORT: u16 = 3000;

/// 默认日志过滤表达式。
pub const DEFAULT_LOG_FILTER: &str = "info";

/// 默认的优雅关机等待秒数。
pub const DEFAULT_SHUTDOWN_TIMEOUT: u64 = 10;

/// 日志输出格式。
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    /// 单行的可读文本。
    #[default]
    Compact,
    /// 每个事件一个JSON对象，字段展开到顶层。
    Json,
}

/// 计算器服务的配置。
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "calculator")]
#[command(about = "Arithmetic calculator HTTP service")]
pub struct Config {
    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    pub host: IpAddr,

    /// Log filter directives, e.g. `info` or `calculator=debug`
    #[arg(long, default_value = DEFAULT_LOG_FILTER, env = "RUST_LOG")]
    pub log_filter: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, env = "LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Seconds to wait for open connections on shutdown (0 waits forever)
    #[arg(long, default_value_t = DEFAULT_SHUTDOWN_TIMEOUT, env = "SHUTDOWN_TIMEOUT")]
    pub shutdown_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: LogFormat::default(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl Config {
    /// 监听地址。
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// 日志过滤表达式。
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// 日志输出格式。
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// 优雅关机的等待时间，`None`表示一直等待。
    pub fn shutdown_timeout(&self) -> Option<Duration> {
        match self.shutdown_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
