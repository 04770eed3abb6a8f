//! Login interception proxy and local token API.
//!
//! # Components
//!
//! - [`proxy`]: login-host relay with cookie capture, plus the static-asset relay
//! - [`session`]: per-login state machine and background exchange tracking
//! - [`exchange`]: master-token exchange behind a trait
//! - [`rewrite`]: URL, header and cookie rewriting
//! - [`bridge`]: the `window.mm` script injected into login pages
//! - [`api`]: status, token and login-status endpoints
//!
//! # Example
//!
//! ```ignore
//! use droidauth_server::{ApiServer, AppState, ServerConfig};
//!
//! let state = AppState::new(ServerConfig::new(8080), store)?;
//! ApiServer::new(state).run().await?;
//! ```

pub mod api;
pub mod bridge;
pub mod config;
pub mod error;
pub mod exchange;
pub mod pages;
pub mod proxy;
pub mod rewrite;
pub mod session;
pub mod state;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use exchange::{GoogleMasterExchange, MasterTokenExchange, SharedExchange};
pub use session::{LoginOutcome, LoginPhase, LoginSession, LoginSnapshot};
pub use state::AppState;

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{any, get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// The local proxy and API server.
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the axum router.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/", get(api::index))
            .route("/login", get(api::login))
            .route("/health", get(api::health))
            .route("/glogin", any(proxy::login_proxy))
            .route("/glogin/{*path}", any(proxy::login_proxy))
            .route("/gproxy/{*path}", any(proxy::static_proxy))
            .route("/api/status", get(api::status))
            .route("/api/apps", get(api::apps))
            .route("/api/token", get(api::token_get).post(api::token_post))
            .route("/api/proxy-extract", post(api::proxy_extract))
            .route("/api/login-status", get(api::login_status))
            .route("/api/login-reset", post(api::login_reset))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.state.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        router
    }

    /// Run the server until Ctrl-C.
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.state.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "Starting droidauth server");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                tokio::signal::ctrl_c().await.ok();
                tracing::info!("Shutting down");
            })
            .await
    }

    /// Run with graceful shutdown, returning the bound address.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<SocketAddr> {
        let listener = TcpListener::bind(self.state.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "Starting droidauth server");
        tokio::spawn(async move {
            axum::serve(listener, self.router())
                .with_graceful_shutdown(shutdown)
                .await
                .ok();
        });
        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use droidauth_config::{Config, ConfigStore};
    use droidauth_google::compression::gzip;
    use droidauth_google::{AuthClient, AuthConfig};
    use tower::ServiceExt;
    use wiremock::matchers::{body_string_contains, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::exchange::MasterTokenExchange;

    #[derive(Debug, Default)]
    struct CountingExchange {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MasterTokenExchange for CountingExchange {
        async fn exchange(&self, _oauth_token: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("user@example.com".to_string())
        }
    }

    fn logged_in() -> Config {
        let mut cfg = Config::default();
        cfg.set_registration(0xabc, 7);
        cfg.email = "user@example.com".to_string();
        cfg.master_token = "aas_et/master".to_string();
        cfg
    }

    fn server_with(cfg: Config, config: ServerConfig, auth: AuthClient) -> ApiServer {
        let store = Arc::new(ConfigStore::in_memory(cfg));
        ApiServer::new(AppState::with_auth_client(config, store, auth).unwrap())
    }

    fn server(cfg: Config) -> ApiServer {
        server_with(cfg, ServerConfig::default(), AuthClient::new())
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        send_json(router, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn send_json(router: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, body) = get_json(server(Config::default()).router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let (status, body) = get_json(server(Config::default()).router(), "/api/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["registered"], false);
        assert_eq!(body["logged_in"], false);

        let (_, body) = get_json(server(logged_in()).router(), "/api/status").await;
        assert_eq!(body["registered"], true);
        assert_eq!(body["logged_in"], true);
        assert_eq!(body["email"], "user@example.com");
        assert_eq!(body["android_id"], "abc");
    }

    #[tokio::test]
    async fn test_apps_endpoint() {
        let (status, body) = get_json(server(Config::default()).router(), "/api/apps").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["gmail"]["package"], "com.google.android.gm");
        assert_eq!(body["gms"]["scope"], "ac2dm");
    }

    #[tokio::test]
    async fn test_token_requires_login() {
        let (status, body) =
            get_json(server(Config::default()).router(), "/api/token?scope=photos").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().unwrap().contains("droidauth login"));
    }

    #[tokio::test]
    async fn test_token_requires_scope() {
        let (status, body) = get_json(server(logged_in()).router(), "/api/token").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("scope is required"));
    }

    #[tokio::test]
    async fn test_token_invalid_json() {
        let req = Request::post("/api/token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send_json(server(logged_in()).router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("invalid JSON"));
    }

    #[tokio::test]
    async fn test_token_get_and_post() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .and(header_eq("app", "com.google.android.gm"))
            .and(body_string_contains("Token=aas_et%2Fmaster"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("Auth=ya29.service\ngrantedScopes=https://mail.google.com/\n"),
            )
            .expect(2)
            .mount(&mock)
            .await;

        let auth = AuthClient::with_config(AuthConfig {
            endpoint: format!("{}/auth", mock.uri()),
            ..AuthConfig::default()
        });
        let server = server_with(logged_in(), ServerConfig::default(), auth);

        let (status, body) = get_json(server.router(), "/api/token?scope=gmail").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token"], "ya29.service");
        assert_eq!(body["token_type"], "oauth2");
        assert_eq!(body["email"], "user@example.com");
        assert_eq!(body["granted_scopes"], "https://mail.google.com/");
        assert!(body.get("error").is_none());

        let req = Request::post("/api/token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"scope":"gmail"}"#))
            .unwrap();
        let (status, body) = send_json(server.router(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token"], "ya29.service");
    }

    #[tokio::test]
    async fn test_token_post_short_app_fields() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .and(header_eq("app", "com.example.app"))
            .and(body_string_contains("client_sig=abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Auth=ya29.custom\n"))
            .expect(1)
            .mount(&mock)
            .await;

        let auth = AuthClient::with_config(AuthConfig {
            endpoint: format!("{}/auth", mock.uri()),
            ..AuthConfig::default()
        });
        let server = server_with(logged_in(), ServerConfig::default(), auth);
        let req = Request::post("/api/token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"scope":"photos","app":"com.example.app","sig":"abc123"}"#,
            ))
            .unwrap();
        let (status, body) = send_json(server.router(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token"], "ya29.custom");
    }

    #[tokio::test]
    async fn test_token_upstream_failure() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Error=BadAuthentication\n"))
            .mount(&mock)
            .await;

        let auth = AuthClient::with_config(AuthConfig {
            endpoint: format!("{}/auth", mock.uri()),
            ..AuthConfig::default()
        });
        let server = server_with(logged_in(), ServerConfig::default(), auth);

        let (status, body) = get_json(server.router(), "/api/token?scope=photos").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("BadAuthentication"));
    }

    #[tokio::test]
    async fn test_static_proxy_rejects_unknown_domain() {
        let response = server(Config::default())
            .router()
            .oneshot(
                Request::get("/gproxy/evil.example.com/x.js")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"domain not allowed: evil.example.com");
    }

    #[tokio::test]
    async fn test_static_proxy_bad_path() {
        let response = server(Config::default())
            .router()
            .oneshot(Request::get("/gproxy/ssl.gstatic.com").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_proxy_upstream_unreachable() {
        let config = ServerConfig::default().with_login_origin("http://127.0.0.1:9");
        let server = server_with(Config::default(), config, AuthClient::new());
        let response = server
            .router()
            .oneshot(Request::get("/glogin/EmbeddedSetup").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_login_proxy_captures_and_rewrites() {
        let mock = MockServer::start().await;
        let html = concat!(
            "<html><head><title>Sign in</title></head><body>",
            r#"<a href="https://accounts.google.com/next">n</a>"#,
            r#"<link href="https://ssl.gstatic.com/a.css">"#,
            "</body></html>"
        );
        Mock::given(method("GET"))
            .and(path("/EmbeddedSetup"))
            .and(header_eq("accept-encoding", "gzip"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .insert_header("content-encoding", "gzip")
                    .insert_header("content-security-policy", "default-src 'self'")
                    .insert_header("x-frame-options", "DENY")
                    .append_header(
                        "set-cookie",
                        "oauth_token=oauth2_4/once; Domain=.google.com; Path=/; Secure; HttpOnly; SameSite=None",
                    )
                    .append_header("set-cookie", "NID=1; Domain=.google.com; Secure")
                    .set_body_bytes(gzip(html.as_bytes()).unwrap()),
            )
            .expect(1)
            .mount(&mock)
            .await;

        let exchange = Arc::new(CountingExchange::default());
        let config = ServerConfig::default().with_login_origin(mock.uri());
        let server = server_with(logged_in(), config, AuthClient::new());
        let state = server.state().clone().with_exchange(exchange.clone());
        let router = ApiServer::new(state.clone()).router();

        let response = router
            .oneshot(
                Request::get("/glogin/EmbeddedSetup?source=android")
                    .header(header::ACCEPT_ENCODING, "br")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers().clone();
        assert!(headers.get("content-security-policy").is_none());
        assert!(headers.get("x-frame-options").is_none());
        assert!(headers.get(header::CONTENT_ENCODING).is_none());
        let cookies: Vec<_> = headers
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            cookies,
            vec![
                "oauth_token=oauth2_4/once; Path=/; HttpOnly".to_string(),
                "NID=1".to_string()
            ]
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains(r#"href="http://localhost:8080/glogin/next""#));
        assert!(body.contains(r#"href="http://localhost:8080/gproxy/ssl.gstatic.com/a.css""#));
        assert!(body.contains("<title>Sign in</title><script>"));
        assert!(body.contains("window.mm"));

        let session = state.session();
        session.drain().await;
        assert_eq!(exchange.calls.load(Ordering::SeqCst), 1);
        let snap = session.snapshot();
        assert_eq!(snap.phase, LoginPhase::Resolved);
        assert_eq!(snap.email, "user@example.com");

        let (_, extract) = send_json(
            ApiServer::new(state).router(),
            Request::post("/api/proxy-extract").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(extract["success"], true);
        assert_eq!(extract["email"], "user@example.com");
    }

    #[tokio::test]
    async fn test_login_proxy_relays_redirects() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signin/continue"))
            .and(header_eq("origin", mock.uri().as_str()))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", "https://accounts.google.com/done?x=1"),
            )
            .mount(&mock)
            .await;

        let config = ServerConfig::default().with_login_origin(mock.uri());
        let server = server_with(Config::default(), config, AuthClient::new());
        let response = server
            .router()
            .oneshot(
                Request::post("/glogin/signin/continue")
                    .header(header::ORIGIN, "http://localhost:8080")
                    .body(Body::from("a=b"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "http://localhost:8080/glogin/done?x=1"
        );
    }

    #[tokio::test]
    async fn test_login_proxy_relays_empty_gzip_not_modified() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/EmbeddedSetup"))
            .respond_with(
                ResponseTemplate::new(304)
                    .insert_header("content-type", "text/html")
                    .insert_header("content-encoding", "gzip")
                    .insert_header("etag", "\"v1\""),
            )
            .mount(&mock)
            .await;

        let config = ServerConfig::default().with_login_origin(mock.uri());
        let server = server_with(Config::default(), config, AuthClient::new());
        let response = server
            .router()
            .oneshot(
                Request::get("/glogin/EmbeddedSetup")
                    .header(header::IF_NONE_MATCH, "\"v1\"")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(response.headers()[header::ETAG], "\"v1\"");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_login_proxy_streams_binary_unchanged() {
        let mock = MockServer::start().await;
        let png: Vec<u8> = vec![0x89, b'P', b'N', b'G', 0x00, 0xff, 0x10, 0x80];
        Mock::given(method("GET"))
            .and(path("/images/logo.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(png.clone()),
            )
            .mount(&mock)
            .await;

        let config = ServerConfig::default().with_login_origin(mock.uri());
        let server = server_with(Config::default(), config, AuthClient::new());
        let response = server
            .router()
            .oneshot(
                Request::get("/glogin/images/logo.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.to_vec(), png);
    }

    #[tokio::test]
    async fn test_login_proxy_rewrites_referer() {
        let mock = MockServer::start().await;
        let upstream_referer = format!("{}/signin/identifier?flow=1", mock.uri());
        Mock::given(method("GET"))
            .and(path("/signin/challenge"))
            .and(header_eq("referer", upstream_referer.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&mock)
            .await;

        let config = ServerConfig::default().with_login_origin(mock.uri());
        let server = server_with(Config::default(), config, AuthClient::new());
        let response = server
            .router()
            .oneshot(
                Request::get("/glogin/signin/challenge")
                    .header(
                        header::REFERER,
                        "http://localhost:8080/glogin/signin/identifier?flow=1",
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_static_proxy_relays_asset() {
        let mock = MockServer::start().await;
        let font: Vec<u8> = vec![0x00, 0x01, 0x00, 0x00, 0xde, 0xad, 0xbe, 0xef];
        Mock::given(method("GET"))
            .and(path("/fonts/roboto.woff2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "font/woff2")
                    .insert_header("content-security-policy", "default-src 'none'")
                    .insert_header("x-frame-options", "DENY")
                    .insert_header("strict-transport-security", "max-age=31536000")
                    .insert_header("cache-control", "public, max-age=86400")
                    .set_body_bytes(font.clone()),
            )
            .expect(1)
            .mount(&mock)
            .await;

        let upstream = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .resolve("ssl.gstatic.com", *mock.address())
            .build()
            .unwrap();
        let config = ServerConfig {
            static_scheme: "http".to_string(),
            ..ServerConfig::default()
        };
        let store = Arc::new(ConfigStore::in_memory(Config::default()));
        let state = AppState::new(config, store).unwrap().with_upstream(upstream);

        let response = ApiServer::new(state)
            .router()
            .oneshot(
                Request::get("/gproxy/ssl.gstatic.com/fonts/roboto.woff2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers().clone();
        assert!(headers.get("content-security-policy").is_none());
        assert!(headers.get("x-frame-options").is_none());
        assert!(headers.get("strict-transport-security").is_none());
        assert_eq!(headers["cache-control"], "public, max-age=86400");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.to_vec(), font);
    }

    #[tokio::test]
    async fn test_login_status_and_reset() {
        let server = server(Config::default());
        let (_, before) = get_json(server.router(), "/api/login-status").await;
        assert_eq!(before["phase"], "idle");
        assert_eq!(before["captured"], false);

        let (status, after) = send_json(
            server.router(),
            Request::post("/api/login-reset").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(before["id"], after["id"]);

        let (_, extract) = send_json(
            server.router(),
            Request::post("/api/proxy-extract").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(extract["success"], false);
    }

    #[tokio::test]
    async fn test_pages_served() {
        let router = server(Config::default()).router();
        let response = router
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );

        let response = router
            .oneshot(Request::get("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("/glogin/EmbeddedSetup"));
    }
}
