use crate::number::Number;
use crate::operation::BinaryOperator;
use crate::{Operation, OperationError};

/// 请求中解码出来的原始字段。
///
/// 保留字段出现的顺序，同名字段可以出现多次。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(Vec<(String, String)>);

impl Fields {
    /// 创建一个空的字段集。
    pub fn new() -> Self {
        Default::default()
    }

    /// 追加一个字段。
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// 获取指定名称的第一个字段值。
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values(name).next()
    }

    /// 获取指定名称的所有字段值。
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.values(name)
    }

    /// 获取只出现一次的字段值，字段缺失或重复时返回`None`。
    pub fn get_unique(&self, name: &str) -> Option<&str> {
        let mut values = self.values(name);
        match (values.next(), values.next()) {
            (Some(value), None) => Some(value),
            _ => None,
        }
    }

    // 返回的值只借用`self`，`name`只在迭代期间被借用。
    fn values<'a, 'n>(&'a self, name: &'n str) -> Values<'a, 'n> {
        Values {
            pairs: self.0.iter(),
            name,
        }
    }

    /// 字段的数量。
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 字段集是否为空。
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

struct Values<'a, 'n> {
    pairs: std::slice::Iter<'a, (String, String)>,
    name: &'n str,
}

impl<'a> Iterator for Values<'a, '_> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let name = self.name;
        self.pairs
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl From<Vec<(String, String)>> for Fields {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Fields(pairs)
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Fields(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// 经过校验的操作数，与所属的运算绑定在一起。
///
/// 只能通过[`Operands::parse`]构造，所以操作数的个数总是与运算相符。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operands(Kind);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    SquareRoot(f64),
    Binary(BinaryOperator, f64, f64),
}

impl Operands {
    /// 按运算的要求从字段中提取并转换操作数。
    ///
    /// # 错误
    ///
    /// 任一字段缺失、重复或无法转换为有限的数字时返回[`OperationError::InvalidInput`]。
    ///
    /// # 例子
    ///
    /// ```
    /// use calculator_core::{Fields, Operands, Operation};
    ///
    /// let fields = Fields::from_iter([("num1", "2"), ("num2", " 3.5 ")]);
    /// let operands = Operands::parse(Operation::Add, &fields).unwrap();
    ///
    /// assert_eq!(operands.values(), [2.0, 3.5]);
    /// assert_eq!(operands.apply(), 5.5);
    /// ```
    pub fn parse(operation: Operation, fields: &Fields) -> Result<Self, OperationError> {
        let invalid = OperationError::InvalidInput {
            arity: operation.arity(),
        };
        let operand = |name: &str| fields.get_unique(name).and_then(coerce).ok_or(invalid);

        let kind = match operation.binary_operator() {
            Some(operator) => Kind::Binary(operator, operand("num1")?, operand("num2")?),
            None => Kind::SquareRoot(operand("num")?),
        };
        Ok(Operands(kind))
    }

    /// 操作数所属的运算。
    pub fn operation(&self) -> Operation {
        match self.0 {
            Kind::SquareRoot(_) => Operation::SquareRoot,
            Kind::Binary(operator, ..) => operator.operation(),
        }
    }

    /// 按字段顺序排列的操作数。
    pub fn values(&self) -> Vec<f64> {
        match self.0 {
            Kind::SquareRoot(num) => vec![num],
            Kind::Binary(_, a, b) => vec![a, b],
        }
    }

    /// 检查除数，只有除法和取余会拒绝为零的第二个操作数。
    ///
    /// # 错误
    ///
    /// 除数为`+0`或`-0`时分别返回[`OperationError::DivisionByZero`]和
    /// [`OperationError::ModuloByZero`]。
    pub fn check_divisor(&self) -> Result<(), OperationError> {
        match self.0 {
            Kind::Binary(BinaryOperator::Divide, _, divisor) if divisor == 0.0 => {
                Err(OperationError::DivisionByZero)
            }
            Kind::Binary(BinaryOperator::Modulo, _, divisor) if divisor == 0.0 => {
                Err(OperationError::ModuloByZero)
            }
            _ => Ok(()),
        }
    }

    /// 执行运算。
    pub fn apply(&self) -> f64 {
        match self.0 {
            Kind::SquareRoot(num) => num.sqrt(),
            Kind::Binary(operator, a, b) => operator.apply(a, b),
        }
    }

    /// 日志中的算式，例如`2 + 3`或`sqrt(16)`。
    pub fn expression(&self) -> String {
        match self.0 {
            Kind::SquareRoot(num) => format!("sqrt({})", Number(num)),
            Kind::Binary(operator, a, b) => {
                format!("{} {} {}", Number(a), operator.symbol(), Number(b))
            }
        }
    }

    /// 生成成功响应中的消息。
    pub fn describe(&self, result: f64) -> String {
        let result = Number(result);
        match self.0 {
            Kind::SquareRoot(num) => format!("The square root of {} is {result}", Number(num)),
            Kind::Binary(operator, a, b) => operator.describe(Number(a), Number(b), result),
        }
    }
}

/// 将原始字段值转换为有限的数字。
///
/// 去掉首尾空白后，接受十进制数（可带符号、小数和指数）以及无符号的
/// `0x`、`0o`、`0b`整数。空字符串、其他文本和非有限值返回`None`。
///
/// # 例子
///
/// ```
/// use calculator_core::coerce;
///
/// assert_eq!(coerce(" 42 "), Some(42.0));
/// assert_eq!(coerce("1e3"), Some(1000.0));
/// assert_eq!(coerce("0x1F"), Some(31.0));
/// assert_eq!(coerce("abc"), None);
/// assert_eq!(coerce(""), None);
/// ```
pub fn coerce(raw: &str) -> Option<f64> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let value = match radix_literal(text) {
        Some((radix, digits)) => parse_radix(digits, radix),
        None => parse_decimal(text),
    };

    value.filter(|value| value.is_finite())
}

fn radix_literal(text: &str) -> Option<(u32, &str)> {
    let prefix = text.get(..2)?;
    let radix = match prefix {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    text.get(2..).map(|digits| (radix, digits))
}

fn parse_radix(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u128::from_str_radix(digits, radix).ok().map(|n| n as f64)
}

fn parse_decimal(text: &str) -> Option<f64> {
    // `f64::from_str`还接受`inf`和`nan`这类拼写。
    if !text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    text.parse().ok()
}
