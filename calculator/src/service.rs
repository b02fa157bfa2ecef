//! 处理请求的计算器服务。

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use calculator_core::log::Logger;
use calculator_core::{Dispatcher, Fields};
use futures_util::FutureExt;
use http::Request;
use http_body::Body;

use crate::error::ServiceError;
use crate::extract::{extract_form, FormExtractError};
use crate::response::{self, Html, IntoResponse, Json, MessageBody, Response};
use crate::route::{Endpoint, Router};
use crate::BoxError;

/// 首页。
pub const LANDING_PAGE: &str = include_str!("../static/index.html");

/// 计算器服务。
///
/// 克隆的开销很小，所有克隆共享同一个路由表和调度器。
pub struct Calculator<L> {
    inner: Arc<Inner<L>>,
}

struct Inner<L> {
    router: Router,
    dispatcher: Dispatcher<L>,
}

impl<L> Clone for Calculator<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L> std::fmt::Debug for Calculator<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calculator")
            .field("router", &self.inner.router)
            .field("logger", &std::any::type_name::<L>())
            .finish()
    }
}

impl<L: Logger> Calculator<L> {
    /// 使用[`Router::calculator`]路由表创建服务。
    pub fn new(logger: L) -> Self {
        Self::with_router(Router::calculator(), logger)
    }

    /// 使用指定的路由表创建服务。
    pub fn with_router(router: Router, logger: L) -> Self {
        Self {
            inner: Arc::new(Inner {
                router,
                dispatcher: Dispatcher::new(logger),
            }),
        }
    }

    /// 获取日志记录器的引用。
    pub fn logger(&self) -> &L {
        self.inner.dispatcher.logger()
    }

    /// 处理请求。
    ///
    /// 该函数不会失败：路由、提取和运算的错误，以及处理过程中的恐慌，
    /// 都会被记录并转换为JSON错误响应。
    pub async fn handle<B>(&self, req: Request<B>) -> Response
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let path = req.uri().path().to_owned();

        let result = AssertUnwindSafe(self.serve(req))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(ServiceError::from_panic(payload)));

        match result {
            Ok(res) => res,
            Err(e) => self.reject(&path, e),
        }
    }

    async fn serve<B>(&self, req: Request<B>) -> Result<Response, ServiceError>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let endpoint = self
            .inner
            .router
            .find(req.method(), req.uri().path())
            .ok_or(ServiceError::RouteNotFound)?;

        let operation = match endpoint {
            Endpoint::Landing => return into_response(Html(LANDING_PAGE)),
            Endpoint::Operation(operation) => operation,
        };

        let fields = match extract_form(req).await {
            Ok(fields) => fields,
            Err(FormExtractError::FailedToBufferBody(e)) => return Err(ServiceError::Internal(e)),
            Err(e @ FormExtractError::FailedToDeserialize(_)) => {
                self.logger().warn(
                    "Ignoring undecodable form body",
                    &[("operation", &operation), ("error", &e)],
                );
                Fields::new()
            }
        };

        let result = self.inner.dispatcher.dispatch(operation, &fields)?;
        into_response(Json(MessageBody {
            message: result.message,
        }))
    }

    fn reject(&self, path: &str, error: ServiceError) -> Response {
        match &error {
            ServiceError::Operation(_) => {}
            ServiceError::RouteNotFound => self.logger().warn("Route not found", &[("path", &path)]),
            ServiceError::Internal(source) => self
                .logger()
                .error("Internal Server Error", &[("path", &path), ("error", source)]),
        }

        error
            .into_response()
            .unwrap_or_else(|_| response::internal_server_error())
    }
}

fn into_response<T: IntoResponse>(value: T) -> Result<Response, ServiceError> {
    value
        .into_response()
        .map_err(|e| ServiceError::Internal(e.into()))
}
