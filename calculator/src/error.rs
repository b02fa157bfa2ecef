//! 服务错误。

use std::any::Any;

use calculator_core::OperationError;
use http::StatusCode;

use crate::response::{ErrorBody, IntoResponse, Json, JsonResponseError, Response};
use crate::BoxError;

/// 处理请求时发生的错误。
///
/// 所有错误都在请求边界被转换为只含`error`字段的JSON响应。
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// 运算被拒绝。
    #[error(transparent)]
    Operation(#[from] OperationError),
    /// 没有匹配的路由。
    #[error("Route not found")]
    RouteNotFound,
    /// 处理请求时发生了意外的故障。
    #[error("Internal Server Error")]
    Internal(#[source] BoxError),
}

impl ServiceError {
    /// 将处理请求时发生的恐慌转换为错误。
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&'static str>() {
            (*message).to_owned()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "handler panicked".to_owned()
        };
        ServiceError::Internal(message.into())
    }

    /// 错误对应的状态码。
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Operation(_) => StatusCode::BAD_REQUEST,
            ServiceError::RouteNotFound => StatusCode::NOT_FOUND,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 错误响应的主体。
    pub fn body(&self) -> ErrorBody {
        ErrorBody::new(self.to_string())
    }
}

impl IntoResponse for ServiceError {
    type Error = JsonResponseError;

    fn into_response(self) -> Result<Response, Self::Error> {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use calculator_core::Arity;

    use super::*;

    #[test]
    fn status_and_body() {
        let cases = [
            (
                ServiceError::from(OperationError::InvalidInput {
                    arity: Arity::Binary,
                }),
                StatusCode::BAD_REQUEST,
                "Invalid input. Please provide numeric values.",
            ),
            (
                ServiceError::from(OperationError::ModuloByZero),
                StatusCode::BAD_REQUEST,
                "Cannot perform modulo operation with zero divisor.",
            ),
            (
                ServiceError::RouteNotFound,
                StatusCode::NOT_FOUND,
                "Route not found",
            ),
            (
                ServiceError::Internal("disk on fire".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
            ),
        ];

        for (error, status, message) in cases {
            assert_eq!(error.status(), status);
            assert_eq!(error.body(), ErrorBody::new(message));
        }
    }

    #[test]
    fn internal_error_keeps_source() {
        let error = ServiceError::Internal("disk on fire".into());
        let source = std::error::Error::source(&error).unwrap();
        assert_eq!(source.to_string(), "disk on fire");
    }

    #[test]
    fn panic_payloads() {
        let error = ServiceError::from_panic(Box::new("static message"));
        assert_eq!(
            std::error::Error::source(&error).unwrap().to_string(),
            "static message"
        );

        let error = ServiceError::from_panic(Box::new(String::from("owned message")));
        assert_eq!(
            std::error::Error::source(&error).unwrap().to_string(),
            "owned message"
        );

        let error = ServiceError::from_panic(Box::new(42_u8));
        assert_eq!(
            std::error::Error::source(&error).unwrap().to_string(),
            "handler panicked"
        );
    }
}
