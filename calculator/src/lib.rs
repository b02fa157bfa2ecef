//! 提供算术运算接口的HTTP服务。
//!
//! 请求主体是表单编码的字段，响应总是JSON：成功时为`{"message": ...}`，
//! 失败时为`{"error": ...}`。
//!
//! # 例子
//!
//! ```no_run
//! use calculator::server::Server;
//! use calculator::service::Calculator;
//! use calculator_core::log::TracingLogger;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
//!     let calculator = Calculator::new(TracingLogger::new());
//!
//!     Server::new(listener).run(calculator).await.unwrap();
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod extract;
pub mod response;
pub mod route;
pub mod server;
pub mod service;
pub mod telemetry;

/// 类型擦除的错误类型别名
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
