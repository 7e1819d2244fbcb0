/// Routing and HTTP plumbing for the label service.
///
/// This module provides:
///
/// - Method and path-pattern routing of HTTP endpoints
/// - Global and route-specific pre-middleware, plus global post-middleware
/// - `Router::dispatch`, which runs a request through the route table without a socket
/// - A bridge into axum (`Router::into_axum`) and a `run` entry point that serves it
///
use crate::settings::Settings;
use axum::Router as AxumRouter;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

/// Shared, read-only state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        AppState {
            settings: Arc::new(settings),
        }
    }
}

/// Represents the outcome of an HTTP handler.
/// The body is raw bytes so HTML, text and binary documents share one type.
#[derive(Debug)]
pub struct Response {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub headers: HashMap<String, String>,
}

impl Response {
    fn with_status(status_code: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), content_type.to_string());
        Response {
            status_code,
            body: body.into(),
            headers,
        }
    }

    /// HTTP 200 HTML page.
    pub fn html(body: impl Into<String>) -> Self {
        Self::with_status(200, "text/html; charset=utf-8", body.into())
    }

    /// Plain-text response with an arbitrary status.
    pub fn text(status_code: u16, body: impl Into<String>) -> Self {
        Self::with_status(status_code, "text/plain; charset=utf-8", body.into())
    }

    /// HTTP 200 binary body with the given content type.
    pub fn bytes(body: Vec<u8>, content_type: &str) -> Self {
        Self::with_status(200, content_type, body)
    }

    /// HTTP 200 binary body offered as a file download.
    pub fn attachment(body: Vec<u8>, content_type: &str, filename: &str) -> Self {
        let mut response = Self::bytes(body, content_type);
        response.headers.insert(
            "Content-Disposition".to_string(),
            format!("attachment; filename=\"{}\"", filename),
        );
        response
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::text(400, message)
    }

    pub fn not_found() -> Self {
        Self::text(404, "404 Not Found")
    }

    pub fn method_not_allowed() -> Self {
        Self::text(405, "405 Method Not Allowed")
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::text(422, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::text(500, message)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut builder = axum::http::Response::builder().status(status);
        for (key, value) in &self.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder
            .body(axum::body::Body::from(self.body))
            .unwrap_or_else(|e| {
                log::error!("Failed to build response: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            })
    }
}

/// Maps status codes to HTTP status text.
pub fn status_text(code: u16) -> &'static str {
    match code {
        200 => "OK",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// An incoming request, detached from the transport.
#[derive(Clone, Debug, Default)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub params: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: &str, path: &str, body: impl Into<Vec<u8>>) -> Self {
        Request {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            params: HashMap::new(),
            body: body.into(),
        }
    }
}

/// Metadata about the request in flight. Middleware can read and modify it.
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub params: HashMap<String, String>,
    pub start_time: Option<Instant>,
}

pub type HandlerFuture = BoxFuture<'static, Response>;

/// Async handler for an HTTP route.
pub type Handler = Arc<dyn Fn(Request, AppState) -> HandlerFuture + Send + Sync>;

/// Runs before the handler. Returning `Some(Response)` short-circuits the request.
pub type Middleware = Arc<dyn Fn(&mut RequestContext) -> Option<Response> + Send + Sync>;

/// Runs after the handler and may inspect or replace the response.
pub type PostMiddleware = Arc<dyn Fn(&RequestContext, Response) -> Response + Send + Sync>;

#[derive(Clone)]
pub struct Route {
    pub method: String,
    pub path_pattern: String,
    pub handler: Handler,
    pub middlewares: Vec<Middleware>,
}

#[derive(Clone, Default)]
pub struct Router {
    pub routes: Vec<Route>,
    pub middlewares: Vec<Middleware>,
    pub post_middlewares: Vec<PostMiddleware>,
    pub app_state: Option<AppState>,
}

impl Router {
    pub fn new() -> Self {
        Router::default()
    }

    /// Register a route for `method` and `path_pattern` with route-specific middleware.
    pub fn add_route(
        &mut self,
        method: &str,
        path_pattern: &str,
        handler: Handler,
        middlewares: Vec<Middleware>,
    ) {
        self.routes.push(Route {
            method: method.to_ascii_uppercase(),
            path_pattern: path_pattern.to_string(),
            handler,
            middlewares,
        });
    }

    pub fn add_middleware(&mut self, middleware: Middleware) {
        self.middlewares.push(middleware);
    }

    pub fn add_post_middleware(&mut self, middleware: PostMiddleware) {
        self.post_middlewares.push(middleware);
    }

    pub fn set_app_state(&mut self, state: AppState) {
        self.app_state = Some(state);
    }

    /// Run one request through middleware, route matching and the handler.
    pub async fn dispatch(&self, request: Request) -> Response {
        let mut ctx = RequestContext {
            method: request.method.clone(),
            path: request.path.clone(),
            params: HashMap::new(),
            start_time: Some(Instant::now()),
        };

        let mut response = self.route(&mut ctx, request).await;
        for post_middleware in &self.post_middlewares {
            response = (post_middleware)(&ctx, response);
        }
        response
    }

    async fn route(&self, ctx: &mut RequestContext, mut request: Request) -> Response {
        for middleware in &self.middlewares {
            if let Some(response) = (middleware)(&mut *ctx) {
                return response;
            }
        }

        let Some(state) = self.app_state.clone() else {
            log::error!("App state not set in Router");
            return Response::internal_error("app state not configured");
        };

        let mut path_matched = false;
        for route in &self.routes {
            let Some(params) = match_path(&route.path_pattern, &ctx.path) else {
                continue;
            };
            path_matched = true;
            if route.method != ctx.method {
                continue;
            }

            ctx.params = params;
            for middleware in &route.middlewares {
                if let Some(response) = (middleware)(&mut *ctx) {
                    return response;
                }
            }
            request.params = ctx.params.clone();
            return (route.handler)(request, state).await;
        }

        if path_matched {
            Response::method_not_allowed()
        } else {
            Response::not_found()
        }
    }

    /// Bridge the route table into an axum app: every request goes through `dispatch`.
    pub fn into_axum(self) -> AxumRouter {
        let router = Arc::new(self);
        AxumRouter::new().fallback(move |request: axum::extract::Request| {
            let router = router.clone();
            async move { router.handle_axum(request).await }
        })
    }

    async fn handle_axum(&self, request: axum::extract::Request) -> axum::response::Response {
        let (parts, body) = request.into_parts();
        // No size limit: product lists of any length are accepted.
        let body = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                log::error!("Failed to read request body: {}", e);
                return Response::bad_request("failed to read request body").into_response();
            }
        };
        let request = Request {
            method: parts.method.as_str().to_string(),
            path: parts.uri.path().to_string(),
            params: HashMap::new(),
            body,
        };
        self.dispatch(request).await.into_response()
    }

    /// Bind `host:port` from the settings and serve until Ctrl-C.
    pub async fn run(
        self,
        settings: &Settings,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = settings.bind_addr();
        let listener = TcpListener::bind(&addr).await?;
        log::info!("HTTP server running on http://{}", addr);

        axum::serve(listener, self.into_axum())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        log::info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Post-middleware that logs method, path, status and elapsed time.
pub fn access_log() -> PostMiddleware {
    Arc::new(|ctx: &RequestContext, response: Response| {
        let elapsed_ms = ctx
            .start_time
            .map(|start| start.elapsed().as_secs_f64() * 1000.0)
            .unwrap_or_default();
        log::info!(
            "{} {} -> {} {} ({:.1} ms)",
            ctx.method,
            ctx.path,
            response.status_code,
            status_text(response.status_code),
            elapsed_ms
        );
        response
    })
}

/// Registers routes from async fns taking `(Request, AppState)`.
#[macro_export]
macro_rules! route {
    ($router:expr, $( $method:ident $path:expr => { $handler:expr $(, $middleware:expr )* } ),* $(,)?) => {
        $(
            $router.add_route(
                stringify!($method),
                $path,
                ::std::sync::Arc::new(
                    move |request: $crate::router::Request,
                          state: $crate::router::AppState|
                          -> $crate::router::HandlerFuture {
                        Box::pin($handler(request, state))
                    },
                ),
                vec![$($middleware),*]
            );
        )*
    };
}

/// Matches a path pattern (e.g. `/foo/:id`) against a real path,
/// extracting parameters into a HashMap if matched, or None if not.
pub fn match_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.trim_matches('/').split('/').collect();
    let path_parts: Vec<&str> = path.trim_matches('/').split('/').collect();

    if pattern_parts.len() != path_parts.len() {
        return None;
    }

    let mut params = HashMap::new();

    for (p, a) in pattern_parts.iter().zip(path_parts.iter()) {
        if let Some(name) = p.strip_prefix(':') {
            params.insert(name.to_string(), a.to_string());
        } else if p != a {
            return None;
        }
    }

    Some(params)
}
