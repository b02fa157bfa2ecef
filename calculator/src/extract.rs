//! 从请求中提取表单字段。

use bytes::Bytes;
use calculator_core::Fields;
use http::{header, HeaderMap, Request};
use http_body::Body;
use http_body_util::{BodyExt, Limited};

use crate::BoxError;

/// 表单主体的最大字节数。
pub const BODY_LIMIT: usize = 100 * 1024;

/// 缓冲请求主体并按`application/x-www-form-urlencoded`解码为字段。
///
/// 内容类型不是表单时，主体被忽略，返回空的字段集。
///
/// # 错误
///
/// 主体读取失败或超过[`BODY_LIMIT`]时返回[`FormExtractError::FailedToBufferBody`]，
/// 主体无法解码时返回[`FormExtractError::FailedToDeserialize`]。
pub async fn extract_form<B>(req: Request<B>) -> Result<Fields, FormExtractError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    if !has_content_type(req.headers(), &mime::APPLICATION_WWW_FORM_URLENCODED) {
        return Ok(Fields::new());
    }

    let bytes = Limited::new(req.into_body(), BODY_LIMIT)
        .collect()
        .await
        .map_err(FormExtractError::FailedToBufferBody)?
        .to_bytes();

    serde_urlencoded::from_bytes::<Vec<(String, String)>>(&bytes)
        .map(Fields::from)
        .map_err(FormExtractError::FailedToDeserialize)
}

fn has_content_type(headers: &HeaderMap, expected_content_type: &mime::Mime) -> bool {
    let Some(content_type) = headers.get(header::CONTENT_TYPE) else {
        return false;
    };
    let Ok(content_type) = content_type.to_str() else {
        return false;
    };

    content_type
        .parse::<mime::Mime>()
        .is_ok_and(|mime| mime.essence_str() == expected_content_type.essence_str())
}

/// 表单提取错误。
#[derive(Debug, thiserror::Error)]
pub enum FormExtractError {
    /// 缓冲主体失败。
    #[error("failed to buffer body ({0})")]
    FailedToBufferBody(#[source] BoxError),
    /// 反序列化失败。
    #[error("failed to deserialize form ({0})")]
    FailedToDeserialize(#[source] serde_urlencoded::de::Error),
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use http_body::Frame;
    use http_body_util::Full;

    use super::*;

    fn form(body: &'static str) -> Request<Full<Bytes>> {
        Request::post("/add")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Full::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn decodes_fields() {
        let fields = extract_form(form("num1=2&num2=%203&note=a+b"))
            .await
            .unwrap();

        assert_eq!(fields.get("num1"), Some("2"));
        assert_eq!(fields.get("num2"), Some(" 3"));
        assert_eq!(fields.get("note"), Some("a b"));
    }

    #[tokio::test]
    async fn content_type_with_charset() {
        let req = Request::post("/add")
            .header(
                header::CONTENT_TYPE,
                "Application/X-WWW-Form-Urlencoded; charset=UTF-8",
            )
            .body(Full::from("num=4"))
            .unwrap();

        let fields = extract_form(req).await.unwrap();
        assert_eq!(fields.get("num"), Some("4"));
    }

    #[tokio::test]
    async fn other_content_types_are_ignored() {
        let json = Request::post("/add")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::from(r#"{"num1":2,"num2":3}"#))
            .unwrap();
        assert!(extract_form(json).await.unwrap().is_empty());

        let missing = Request::post("/add").body(Full::from("num1=2")).unwrap();
        assert!(extract_form(missing).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn content_type_must_match_exactly() {
        for content_type in [
            "application/x-www-form-urlencodedfoo",
            "application/x-www-form-urlencoded-extra; charset=utf-8",
            "application/x-www-form",
            "not a mime type",
        ] {
            let req = Request::post("/add")
                .header(header::CONTENT_TYPE, content_type)
                .body(Full::from("num1=2&num2=3"))
                .unwrap();
            assert!(
                extract_form(req).await.unwrap().is_empty(),
                "{content_type}"
            );
        }
    }

    #[tokio::test]
    async fn body_limit() {
        let body = format!("num={}", "1".repeat(BODY_LIMIT));
        let req = Request::post("/api/squareroot")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Full::from(body))
            .unwrap();

        assert!(matches!(
            extract_form(req).await,
            Err(FormExtractError::FailedToBufferBody(_))
        ));
    }

    struct BrokenBody;

    impl Body for BrokenBody {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
            Poll::Ready(Some(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            ))))
        }
    }

    #[tokio::test]
    async fn broken_body() {
        let req = Request::post("/add")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(BrokenBody)
            .unwrap();

        let err = extract_form(req).await.unwrap_err();
        assert!(matches!(err, FormExtractError::FailedToBufferBody(_)));
        assert!(err.to_string().contains("connection reset"));
    }
}
