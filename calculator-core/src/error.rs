use crate::Arity;

/// 运算失败的原因。
///
/// 错误的显示文本就是返回给客户端的错误消息。
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    /// 操作数缺失或无法转换为有限的数字。
    #[error("Invalid input. Please provide {}.", expected(.arity))]
    InvalidInput {
        /// 运算需要的操作数个数，决定错误消息的措辞。
        arity: Arity,
    },
    /// 除法的除数为零。
    #[error("Cannot divide by zero.")]
    DivisionByZero,
    /// 取余的除数为零。
    #[error("Cannot perform modulo operation with zero divisor.")]
    ModuloByZero,
}

fn expected(arity: &Arity) -> &'static str {
    match arity {
        Arity::Unary => "a numeric value",
        Arity::Binary => "numeric values",
    }
}
