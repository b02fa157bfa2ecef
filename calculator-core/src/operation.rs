use std::fmt;
use std::str::FromStr;

use crate::number::Number;

/// 运算需要的操作数个数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// 单个操作数，字段名为`num`。
    Unary,
    /// 两个操作数，字段名为`num1`和`num2`。
    Binary,
}

impl Arity {
    /// 按顺序返回操作数的字段名。
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Arity::Unary => &["num"],
            Arity::Binary => &["num1", "num2"],
        }
    }
}

/// 服务支持的算术运算。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// 加法。
    Add,
    /// 减法。
    Subtract,
    /// 乘法。
    Multiply,
    /// 除法，除数不能为零。
    Divide,
    /// 幂运算。
    Exponentiate,
    /// 平方根，负数得到`NaN`。
    SquareRoot,
    /// 取余，除数不能为零，结果的符号与被除数相同。
    Modulo,
}

impl Operation {
    /// 所有运算。
    pub const ALL: [Operation; 7] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
        Operation::Exponentiate,
        Operation::SquareRoot,
        Operation::Modulo,
    ];

    /// 运算的名称，也是日志中的`operation`字段。
    pub fn name(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
            Operation::Exponentiate => "exponentiate",
            Operation::SquareRoot => "squareroot",
            Operation::Modulo => "modulo",
        }
    }

    /// 日志消息里使用的名词。
    pub fn noun(self) -> &'static str {
        match self {
            Operation::Add => "addition",
            Operation::Subtract => "subtraction",
            Operation::Multiply => "multiplication",
            Operation::Divide => "division",
            Operation::Exponentiate => "exponentiation",
            Operation::SquareRoot => "square root",
            Operation::Modulo => "modulo",
        }
    }

    /// 运算需要的操作数个数。
    pub fn arity(self) -> Arity {
        match self.binary_operator() {
            Some(_) => Arity::Binary,
            None => Arity::Unary,
        }
    }

    /// 双操作数运算对应的运算符，平方根没有。
    pub(crate) fn binary_operator(self) -> Option<BinaryOperator> {
        match self {
            Operation::Add => Some(BinaryOperator::Add),
            Operation::Subtract => Some(BinaryOperator::Subtract),
            Operation::Multiply => Some(BinaryOperator::Multiply),
            Operation::Divide => Some(BinaryOperator::Divide),
            Operation::Exponentiate => Some(BinaryOperator::Exponentiate),
            Operation::Modulo => Some(BinaryOperator::Modulo),
            Operation::SquareRoot => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ParseOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|operation| operation.name() == s)
            .ok_or_else(|| ParseOperationError(s.to_owned()))
    }
}

/// 无法识别的运算名称。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation \"{0}\"")]
pub struct ParseOperationError(String);

/// 双操作数运算的运算符。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Exponentiate,
    Modulo,
}

impl BinaryOperator {
    pub(crate) fn operation(self) -> Operation {
        match self {
            BinaryOperator::Add => Operation::Add,
            BinaryOperator::Subtract => Operation::Subtract,
            BinaryOperator::Multiply => Operation::Multiply,
            BinaryOperator::Divide => Operation::Divide,
            BinaryOperator::Exponentiate => Operation::Exponentiate,
            BinaryOperator::Modulo => Operation::Modulo,
        }
    }

    pub(crate) fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOperator::Add => a + b,
            BinaryOperator::Subtract => a - b,
            BinaryOperator::Multiply => a * b,
            BinaryOperator::Divide => a / b,
            BinaryOperator::Exponentiate => a.powf(b),
            // 截断取余，符号跟随被除数
            BinaryOperator::Modulo => a % b,
        }
    }

    pub(crate) fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Exponentiate => "^",
            BinaryOperator::Modulo => "%",
        }
    }

    pub(crate) fn describe(self, a: Number, b: Number, result: Number) -> String {
        match self {
            BinaryOperator::Add => format!("The added value of {a} and {b} is {result}"),
            BinaryOperator::Subtract => format!("The subtracted value of {a} and {b} is {result}"),
            BinaryOperator::Multiply => format!("The multiplied value of {a} and {b} is {result}"),
            BinaryOperator::Divide => format!("The divided value of {a} by {b} is {result}"),
            BinaryOperator::Exponentiate => {
                format!("The result of {a} raised to the power of {b} is {result}")
            }
            BinaryOperator::Modulo => format!("The result of {a} modulo {b} is {result}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        assert_eq!(BinaryOperator::Add.apply(2.0, 3.0), 5.0);
        assert_eq!(BinaryOperator::Subtract.apply(2.0, 3.0), -1.0);
        assert_eq!(BinaryOperator::Multiply.apply(-4.0, 2.5), -10.0);
        assert_eq!(BinaryOperator::Divide.apply(10.0, 4.0), 2.5);
        assert_eq!(BinaryOperator::Add.apply(0.1, 0.2), 0.1 + 0.2);
    }

    #[test]
    fn exponentiate() {
        let pow = BinaryOperator::Exponentiate;
        assert_eq!(pow.apply(2.0, 10.0), 1024.0);
        assert_eq!(pow.apply(2.0, -1.0), 0.5);
        assert_eq!(pow.apply(9.0, 0.5), 3.0);
        assert!(pow.apply(-8.0, 1.0 / 3.0).is_nan());
    }

    #[test]
    fn modulo_follows_dividend_sign() {
        let rem = BinaryOperator::Modulo;
        assert_eq!(rem.apply(10.0, 3.0), 1.0);
        assert_eq!(rem.apply(-10.0, 3.0), -1.0);
        assert_eq!(rem.apply(10.0, -3.0), 1.0);
        assert_eq!(rem.apply(5.5, 2.0), 1.5);
    }

    #[test]
    fn binary_operators_round_trip() {
        for operation in Operation::ALL {
            match operation.binary_operator() {
                Some(operator) => {
                    assert_eq!(operator.operation(), operation);
                    assert_eq!(operation.arity(), Arity::Binary);
                }
                None => {
                    assert_eq!(operation, Operation::SquareRoot);
                    assert_eq!(operation.arity(), Arity::Unary);
                }
            }
        }
    }

    #[test]
    fn describe() {
        let cases = [
            (BinaryOperator::Add, "The added value of 2 and 3 is 5"),
            (BinaryOperator::Subtract, "The subtracted value of 2 and 3 is 5"),
            (BinaryOperator::Multiply, "The multiplied value of 2 and 3 is 5"),
            (BinaryOperator::Divide, "The divided value of 2 by 3 is 5"),
            (
                BinaryOperator::Exponentiate,
                "The result of 2 raised to the power of 3 is 5",
            ),
            (BinaryOperator::Modulo, "The result of 2 modulo 3 is 5"),
        ];
        for (operator, expected) in cases {
            assert_eq!(
                operator.describe(Number(2.0), Number(3.0), Number(5.0)),
                expected
            );
        }
    }

    #[test]
    fn names() {
        for operation in Operation::ALL {
            assert_eq!(operation.name().parse::<Operation>(), Ok(operation));
        }
        assert_eq!(
            "division".parse::<Operation>().unwrap_err().to_string(),
            "unknown operation \"division\""
        );
        assert_eq!(Operation::Modulo.arity().fields(), ["num1", "num2"]);
    }
}
