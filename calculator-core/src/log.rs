//! 日志记录器。
//!
//! 日志记录器在进程启动时创建一次，然后显式地传给需要记录日志的组件。

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::field::DisplayValue;

/// 服务名称，附加在每条日志上。
pub const SERVICE_NAME: &str = "calculator-microservice";

/// 日志的结构化字段。
pub type Field<'a> = (&'a str, &'a dyn fmt::Display);

/// 日志记录器。
pub trait Logger: Send + Sync {
    /// 记录一般信息。
    fn info(&self, message: &str, fields: &[Field<'_>]);

    /// 记录警告。
    fn warn(&self, message: &str, fields: &[Field<'_>]);

    /// 记录错误。
    fn error(&self, message: &str, fields: &[Field<'_>]);
}

impl<L: Logger + ?Sized> Logger for &L {
    fn info(&self, message: &str, fields: &[Field<'_>]) {
        (**self).info(message, fields)
    }

    fn warn(&self, message: &str, fields: &[Field<'_>]) {
        (**self).warn(message, fields)
    }

    fn error(&self, message: &str, fields: &[Field<'_>]) {
        (**self).error(message, fields)
    }
}

macro_rules! forward_logger {
    ($($ty:ident),*) => {
        $(
            impl<L: Logger + ?Sized> Logger for $ty<L> {
                fn info(&self, message: &str, fields: &[Field<'_>]) {
                    (**self).info(message, fields)
                }

                fn warn(&self, message: &str, fields: &[Field<'_>]) {
                    (**self).warn(message, fields)
                }

                fn error(&self, message: &str, fields: &[Field<'_>]) {
                    (**self).error(message, fields)
                }
            }
        )*
    };
}

forward_logger!(Arc, Box);

/// 将日志转发给[`tracing`]的记录器。
///
/// 所有事件的目标为`calculator`，并带有`service`字段。`operation`、`path`和`error`
/// 作为独立的事件字段记录，其余字段合并为一个`fields`字段。
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl TracingLogger {
    /// 创建记录器。
    pub fn new() -> Self {
        TracingLogger
    }
}

const KNOWN_FIELDS: [&str; 3] = ["operation", "path", "error"];

macro_rules! emit {
    ($event:ident, $message:expr, $fields:expr) => {{
        let fields: &[Field<'_>] = $fields;
        let extra = DisplayFields(fields);
        tracing::$event!(
            target: "calculator",
            service = SERVICE_NAME,
            operation = known(fields, "operation"),
            path = known(fields, "path"),
            error = known(fields, "error"),
            fields = (!extra.is_empty()).then_some(tracing::field::display(&extra)),
            "{}",
            $message
        );
    }};
}

impl Logger for TracingLogger {
    fn info(&self, message: &str, fields: &[Field<'_>]) {
        emit!(info, message, fields);
    }

    fn warn(&self, message: &str, fields: &[Field<'_>]) {
        emit!(warn, message, fields);
    }

    fn error(&self, message: &str, fields: &[Field<'_>]) {
        emit!(error, message, fields);
    }
}

fn known<'a>(fields: &'a [Field<'a>], key: &str) -> Option<DisplayValue<&'a dyn fmt::Display>> {
    fields
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, value)| tracing::field::display(*value))
}

/// 以`key=value`的形式显示[`KNOWN_FIELDS`]以外的字段，字段之间用空格分隔。
struct DisplayFields<'a>(&'a [Field<'a>]);

impl<'a> DisplayFields<'a> {
    fn extra(&self) -> impl Iterator<Item = &Field<'a>> + '_ {
        self.0.iter().filter(|(key, _)| !KNOWN_FIELDS.contains(key))
    }

    fn is_empty(&self) -> bool {
        self.extra().next().is_none()
    }
}

impl fmt::Display for DisplayFields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.extra().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// 日志级别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// 一般信息。
    Info,
    /// 警告。
    Warn,
    /// 错误。
    Error,
}

/// 由[`MemoryLogger`]保存的一条日志。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 日志级别。
    pub level: Level,
    /// 日志消息。
    pub message: String,
    /// 结构化字段，值已转换为字符串。
    pub fields: Vec<(String, String)>,
}

impl Record {
    /// 获取指定字段的值。
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// 将日志保存在内存中的记录器，用于检查组件记录了哪些日志。
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<Record>>,
}

impl MemoryLogger {
    /// 创建记录器。
    pub fn new() -> Self {
        Default::default()
    }

    /// 返回目前为止记录的所有日志。
    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn push(&self, level: Level, message: &str, fields: &[Field<'_>]) {
        let record = Record {
            level,
            message: message.to_owned(),
            fields: fields
                .iter()
                .map(|(key, value)| ((*key).to_owned(), value.to_string()))
                .collect(),
        };
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }
}

impl Logger for MemoryLogger {
    fn info(&self, message: &str, fields: &[Field<'_>]) {
        self.push(Level::Info, message, fields);
    }

    fn warn(&self, message: &str, fields: &[Field<'_>]) {
        self.push(Level::Warn, message, fields);
    }

    fn error(&self, message: &str, fields: &[Field<'_>]) {
        self.push(Level::Error, message, fields);
    }
}
