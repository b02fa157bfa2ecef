use std::fmt;

/// 以服务对外约定的格式显示的数字。
///
/// 整数不带小数部分，其余使用能往返的最短十进制表示；
/// 绝对值不小于`1e21`或小于`1e-6`时使用带符号的指数形式。
///
/// # 例子
///
/// ```
/// use calculator_core::Number;
///
/// assert_eq!(Number(5.0).to_string(), "5");
/// assert_eq!(Number(0.1 + 0.2).to_string(), "0.30000000000000004");
/// assert_eq!(Number(1e21).to_string(), "1e+21");
/// assert_eq!(Number(f64::NAN).to_string(), "NaN");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Number(pub f64);

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;

        if value.is_nan() {
            return f.write_str("NaN");
        }
        if value.is_infinite() {
            return f.write_str(if value > 0.0 { "Infinity" } else { "-Infinity" });
        }
        // 负零也显示为`0`。
        if value == 0.0 {
            return f.write_str("0");
        }

        let abs = value.abs();
        if abs >= 1e21 || abs < 1e-6 {
            let exp = format!("{value:e}");
            return match exp.split_once('e') {
                Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                    write!(f, "{mantissa}e+{exponent}")
                }
                _ => f.write_str(&exp),
            };
        }

        write!(f, "{value}")
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number(value)
    }
}
