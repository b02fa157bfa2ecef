use crate::log::Logger;
use crate::{Fields, Operands, Operation, OperationError};

/// 运算成功的结果。
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    /// 执行的运算。
    pub operation: Operation,
    /// 校验后的操作数。
    pub operands: Operands,
    /// 计算结果。
    pub value: f64,
    /// 描述运算及其结果的消息。
    pub message: String,
}

/// 运算调度器。
///
/// 对每个请求依次完成提取操作数、校验、计算和格式化消息，并通过注入的日志记录器
/// 记录一条日志：成功时记录`info`，校验失败时记录`error`。
///
/// 调度器本身不可变，可以在任意多的并发请求之间共享。
///
/// # 例子
///
/// ```
/// use calculator_core::log::MemoryLogger;
/// use calculator_core::{Dispatcher, Fields, Operation};
///
/// let dispatcher = Dispatcher::new(MemoryLogger::new());
/// let fields = Fields::from_iter([("num1", "2"), ("num2", "3")]);
///
/// let result = dispatcher.dispatch(Operation::Add, &fields).unwrap();
/// assert_eq!(result.message, "The added value of 2 and 3 is 5");
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher<L> {
    logger: L,
}

impl<L: Logger> Dispatcher<L> {
    /// 使用指定的日志记录器创建调度器。
    pub fn new(logger: L) -> Self {
        Self { logger }
    }

    /// 获取日志记录器的引用。
    pub fn logger(&self) -> &L {
        &self.logger
    }

    /// 执行指定的运算。
    ///
    /// # 错误
    ///
    /// 操作数无效时返回[`OperationError::InvalidInput`]；操作数有效时，除法和取余的
    /// 除数为零分别返回[`OperationError::DivisionByZero`]和[`OperationError::ModuloByZero`]。
    pub fn dispatch(
        &self,
        operation: Operation,
        fields: &Fields,
    ) -> Result<OperationResult, OperationError> {
        let operands = Operands::parse(operation, fields)
            .and_then(|operands| operands.check_divisor().map(|_| operands))
            .map_err(|e| {
                self.log_rejection(operation, &e);
                e
            })?;

        self.logger.info(
            &format!(
                "New {} operation requested: {}",
                operation.noun(),
                operands.expression()
            ),
            &[("operation", &operation)],
        );

        let value = operands.apply();
        Ok(OperationResult {
            operation,
            operands,
            value,
            message: operands.describe(value),
        })
    }

    fn log_rejection(&self, operation: Operation, error: &OperationError) {
        let message = match error {
            OperationError::InvalidInput { .. } => {
                format!("Invalid input received for {}", operation.noun())
            }
            OperationError::DivisionByZero => "Attempted to divide by zero".to_owned(),
            OperationError::ModuloByZero => {
                "Attempted to perform modulo with zero divisor".to_owned()
            }
        };
        self.logger
            .error(&message, &[("operation", &operation), ("error", error)]);
    }
}
