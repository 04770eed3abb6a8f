//! Server configuration.

use std::net::SocketAddr;

use droidauth_config::DEFAULT_SERVER_PORT;

/// Origin of the login host.
pub const LOGIN_ORIGIN: &str = "https://accounts.google.com";

/// Configuration for the local server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: SocketAddr,

    /// Port the browser uses to reach the server; the proxy rewrites page
    /// URLs to `http://localhost:{public_port}`.
    pub public_port: u16,

    /// Origin the login proxy forwards to.
    pub login_origin: String,

    /// Scheme used by the static-asset proxy.
    pub static_scheme: String,

    /// Allow cross-origin requests.
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_PORT)
    }
}

impl ServerConfig {
    /// Listen on all interfaces at `port`.
    pub fn new(port: u16) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            public_port: port,
            login_origin: LOGIN_ORIGIN.to_string(),
            static_scheme: "https".to_string(),
            enable_cors: true,
        }
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_login_origin(mut self, origin: impl Into<String>) -> Self {
        self.login_origin = origin.into();
        self
    }

    /// Base URL pages are rewritten to.
    pub fn public_base(&self) -> String {
        format!("http://localhost:{}", self.public_port)
    }
}
