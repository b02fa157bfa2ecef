//! HTTP响应。

use std::convert::Infallible;

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::Full;
use serde::{Deserialize, Serialize};

use crate::BoxError;

/// 服务返回的HTTP响应。
pub type Response = http::Response<Full<Bytes>>;

/// 可以转换为[`Response`]的类型。
pub trait IntoResponse {
    /// 转换失败时返回的错误。
    type Error: Into<BoxError>;

    /// 转换为响应。
    fn into_response(self) -> Result<Response, Self::Error>;
}

impl<T> IntoResponse for (StatusCode, T)
where
    T: IntoResponse,
{
    type Error = T::Error;

    fn into_response(self) -> Result<Response, Self::Error> {
        let (status, inner) = self;
        let mut res = inner.into_response()?;
        *res.status_mut() = status;
        Ok(res)
    }
}

/// JSON响应。
///
/// 设置响应标头`Content-Type: application/json`。
#[derive(Debug, Clone, Copy)]
pub struct Json<T>(pub T);

impl<T> IntoResponse for Json<T>
where
    T: Serialize,
{
    type Error = JsonResponseError;

    fn into_response(self) -> Result<Response, Self::Error> {
        let data = serde_json::to_vec(&self.0)?;
        let mut res = Response::new(Full::from(data));
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(mime::APPLICATION_JSON.as_ref()),
        );
        Ok(res)
    }
}

/// JSON响应错误。
#[derive(Debug, thiserror::Error)]
pub enum JsonResponseError {
    /// 序列化失败。
    #[error("failed to serialize json ({0})")]
    FailedToSerialize(#[from] serde_json::Error),
}

/// HTML响应。
///
/// 设置响应标头`Content-Type: text/html; charset=utf-8`。
#[derive(Debug, Clone, Copy)]
pub struct Html<T>(pub T);

impl<T> IntoResponse for Html<T>
where
    T: Into<Bytes>,
{
    type Error = Infallible;

    fn into_response(self) -> Result<Response, Self::Error> {
        let mut res = Response::new(Full::new(self.0.into()));
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(mime::TEXT_HTML_UTF_8.as_ref()),
        );
        Ok(res)
    }
}

/// 成功响应的主体。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    /// 描述运算及其结果的消息。
    pub message: String,
}

/// 错误响应的主体。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// 错误消息。
    pub error: String,
}

impl ErrorBody {
    /// 使用指定的消息创建错误主体。
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// 不经过序列化直接构造的`500`响应，用于其他响应都无法生成的情况。
pub fn internal_server_error() -> Response {
    let mut res = Response::new(Full::from(r#"{"error":"Internal Server Error"}"#));
    *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(mime::APPLICATION_JSON.as_ref()),
    );
    res
}
