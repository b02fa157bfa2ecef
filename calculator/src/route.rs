//! 路由表。

use std::collections::HashMap;

use calculator_core::Operation;
use http::Method;

/// 路由指向的端点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// 首页。
    Landing,
    /// 执行一种运算。
    Operation(Operation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
struct RouteId(usize);

/// 路由器。
///
/// 路径匹配忽略ASCII字母的大小写和末尾的一个`/`，`HEAD`请求由`GET`路由处理。
/// 路径存在但方法不匹配与路径不存在一样，都找不到端点。
///
/// # 例子
///
/// ```
/// use calculator::route::{Endpoint, Router};
/// use calculator_core::Operation;
/// use http::Method;
///
/// let router = Router::new()
///     .route(Method::GET, "/", Endpoint::Landing)
///     .route(Method::POST, "/add", Endpoint::Operation(Operation::Add));
///
/// assert_eq!(
///     router.find(&Method::POST, "/Add/"),
///     Some(Endpoint::Operation(Operation::Add))
/// );
/// assert_eq!(router.find(&Method::GET, "/add"), None);
/// ```
#[derive(Clone, Default)]
pub struct Router {
    inner: matchit::Router<RouteId>,
    path_to_id: HashMap<String, RouteId>,
    table: Vec<Vec<(Method, Endpoint)>>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("paths", &self.path_to_id.keys())
            .finish()
    }
}

impl Router {
    /// 创建一个空的路由器。
    pub fn new() -> Self {
        Default::default()
    }

    /// 服务的路由表。
    ///
    /// | 方法 | 路径 | 端点 |
    /// |---|---|---|
    /// | GET | `/` | 首页 |
    /// | POST | `/add` | 加法 |
    /// | POST | `/subtract` | 减法 |
    /// | POST | `/multiply` | 乘法 |
    /// | POST | `/division` | 除法 |
    /// | POST | `/api/exponentiate` | 幂运算 |
    /// | POST | `/api/squareroot` | 平方根 |
    /// | POST | `/api/modulo` | 取余 |
    pub fn calculator() -> Self {
        Router::new()
            .route(Method::GET, "/", Endpoint::Landing)
            .route(Method::POST, "/add", Endpoint::Operation(Operation::Add))
            .route(
                Method::POST,
                "/subtract",
                Endpoint::Operation(Operation::Subtract),
            )
            .route(
                Method::POST,
                "/multiply",
                Endpoint::Operation(Operation::Multiply),
            )
            .route(
                Method::POST,
                "/division",
                Endpoint::Operation(Operation::Divide),
            )
            .route(
                Method::POST,
                "/api/exponentiate",
                Endpoint::Operation(Operation::Exponentiate),
            )
            .route(
                Method::POST,
                "/api/squareroot",
                Endpoint::Operation(Operation::SquareRoot),
            )
            .route(
                Method::POST,
                "/api/modulo",
                Endpoint::Operation(Operation::Modulo),
            )
    }

    /// 将端点添加到指定的方法和路径。
    ///
    /// # 恐慌
    ///
    /// 当路由表发生冲突时会出现恐慌。
    pub fn route(self, method: Method, path: &str, endpoint: Endpoint) -> Self {
        self.try_route(method, path, endpoint)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// 尝试将端点添加到指定的方法和路径。
    ///
    /// # 错误
    ///
    /// 当路由表发生冲突或路径无效时会返回错误。
    pub fn try_route(
        mut self,
        method: Method,
        path: &str,
        endpoint: Endpoint,
    ) -> Result<Self, RouterError> {
        if !path.starts_with('/') {
            return Err(RouterError::InvalidPath {
                path: path.to_owned(),
                message: "path must start with a `/`".to_owned(),
            });
        }

        let key = normalize(path);
        let id = match self.path_to_id.get(key.as_str()) {
            Some(id) => *id,
            None => self.add_path(key)?,
        };

        let methods = &mut self.table[id.0];
        if methods.iter().any(|(m, _)| *m == method) {
            return Err(RouterError::MethodConflict {
                method,
                path: path.to_owned(),
            });
        }
        methods.push((method, endpoint));

        Ok(self)
    }

    /// 查找请求对应的端点。
    pub fn find(&self, method: &Method, path: &str) -> Option<Endpoint> {
        let path = normalize(path);
        let matched = self.inner.at(&path).ok()?;
        let methods = self.table.get(matched.value.0)?;

        let lookup = |method: &Method| {
            methods
                .iter()
                .find(|(m, _)| m == method)
                .map(|(_, endpoint)| *endpoint)
        };

        lookup(method).or_else(|| {
            if *method == Method::HEAD {
                lookup(&Method::GET)
            } else {
                None
            }
        })
    }

    fn add_path(&mut self, path: String) -> Result<RouteId, RouterError> {
        let id = RouteId(self.table.len());

        if let Err(e) = self.inner.insert(path.as_str(), id) {
            return Err(RouterError::from_matchit_insert_error(path, e));
        }

        self.path_to_id.insert(path, id);
        self.table.push(Vec::new());

        Ok(id)
    }
}

fn normalize(path: &str) -> String {
    let path = match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    };
    path.to_ascii_lowercase()
}

/// 构建路由表时发生的错误。
#[derive(Debug, Clone, thiserror::Error)]
pub enum RouterError {
    /// 路径与已注册的路径冲突。
    #[error("path conflict \"{path}\" ({message})")]
    PathConflict {
        /// 冲突的路径。
        path: String,
        /// 冲突的原因。
        message: String,
    },
    /// 路径无效。
    #[error("invalid path \"{path}\" ({message})")]
    InvalidPath {
        /// 无效的路径。
        path: String,
        /// 无效的原因。
        message: String,
    },
    /// 同一路径的同一方法被注册了两次。
    #[error("method {method} is already routed for \"{path}\"")]
    MethodConflict {
        /// 重复的方法。
        method: Method,
        /// 路径。
        path: String,
    },
}

impl RouterError {
    fn from_matchit_insert_error(path: String, error: matchit::InsertError) -> Self {
        match error {
            matchit::InsertError::Conflict { .. } => RouterError::PathConflict {
                path,
                message: "conflict with previously registered path".to_owned(),
            },
            _ => RouterError::InvalidPath {
                path,
                message: format!("{error}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculator_routes() {
        let router = Router::calculator();
        let cases = [
            ("/add", Operation::Add),
            ("/subtract", Operation::Subtract),
            ("/multiply", Operation::Multiply),
            ("/division", Operation::Divide),
            ("/api/exponentiate", Operation::Exponentiate),
            ("/api/squareroot", Operation::SquareRoot),
            ("/api/modulo", Operation::Modulo),
        ];
        for (path, operation) in cases {
            assert_eq!(
                router.find(&Method::POST, path),
                Some(Endpoint::Operation(operation)),
                "{path}"
            );
        }
        assert_eq!(router.find(&Method::GET, "/"), Some(Endpoint::Landing));
    }

    #[test]
    fn not_found() {
        let router = Router::calculator();
        assert_eq!(router.find(&Method::GET, "/unknown"), None);
        assert_eq!(router.find(&Method::POST, "/divide"), None);
        assert_eq!(router.find(&Method::POST, "/exponentiate"), None);
        assert_eq!(router.find(&Method::POST, "/add/extra"), None);
        assert_eq!(router.find(&Method::GET, "/add"), None);
        assert_eq!(router.find(&Method::POST, "/"), None);
        assert_eq!(router.find(&Method::PUT, "/add"), None);
    }

    #[test]
    fn loose_matching() {
        let router = Router::calculator();
        assert_eq!(
            router.find(&Method::POST, "/ADD"),
            Some(Endpoint::Operation(Operation::Add))
        );
        assert_eq!(
            router.find(&Method::POST, "/api/SquareRoot/"),
            Some(Endpoint::Operation(Operation::SquareRoot))
        );
        assert_eq!(router.find(&Method::POST, "/add//"), None);
        assert_eq!(router.find(&Method::HEAD, "/"), Some(Endpoint::Landing));
        assert_eq!(router.find(&Method::HEAD, "/add"), None);
    }

    #[test]
    fn conflicts() {
        let router = Router::new().route(Method::POST, "/a", Endpoint::Landing);

        let err = router
            .clone()
            .try_route(Method::POST, "/A/", Endpoint::Landing)
            .unwrap_err();
        assert!(matches!(err, RouterError::MethodConflict { .. }));

        let router = router
            .try_route(Method::GET, "/a", Endpoint::Landing)
            .unwrap();
        assert_eq!(router.find(&Method::GET, "/a"), Some(Endpoint::Landing));

        let err = Router::new()
            .try_route(Method::GET, "a", Endpoint::Landing)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid path \"a\" (path must start with a `/`)"
        );
    }

    #[test]
    #[should_panic]
    fn route_panics_on_conflict() {
        Router::new()
            .route(Method::GET, "/a", Endpoint::Landing)
            .route(Method::GET, "/a", Endpoint::Landing);
    }
}
