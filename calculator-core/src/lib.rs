//! `calculator`的核心类型和特征。
//!
//! 这里只有运算的校验、计算和消息格式化，不涉及任何网络或IO。

#![forbid(unsafe_code)]
#![warn(
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    unreachable_pub
)]

mod dispatch;
pub use dispatch::{Dispatcher, OperationResult};

mod error;
pub use error::OperationError;

pub mod log;

mod number;
pub use number::Number;

mod operand;
pub use operand::{coerce, Fields, Operands};

mod operation;
pub use operation::{Arity, Operation, ParseOperationError};
