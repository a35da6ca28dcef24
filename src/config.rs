//! Server configuration
//!
//! Env-var driven with security-first defaults: localhost binding, CORS
//! restricted to the dashboard's own origins, request logging on.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::paginate::DEFAULT_PAGE_SIZE;

/// TrustLock server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: 127.0.0.1)
    pub bind_addr: IpAddr,
    /// Port number (default: 8080)
    pub port: u16,
    /// JWT signing secret
    pub jwt_secret: String,
    /// Mark session cookies `Secure` (requires HTTPS)
    pub secure_cookies: bool,
    /// Enable CORS restricted to `cors_origins`
    pub cors_enabled: bool,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
    /// Enable request logging
    pub log_requests: bool,
    /// Rows per table page
    pub page_size: usize,
    /// Optional JSON file seeding the in-memory store at startup
    pub seed_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            jwt_secret: random_secret(),
            secure_cookies: false,
            cors_enabled: true,
            cors_origins: vec![
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
            log_requests: true,
            page_size: DEFAULT_PAGE_SIZE,
            seed_path: None,
        }
    }
}

/// Random development-only JWT secret, used when none is configured.
fn random_secret() -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    (0..64)
        .map(|_| {
            let idx = rand::random::<usize>() % CHARS.len();
            CHARS[idx] as char
        })
        .collect()
}

impl ServerConfig {
    /// Load configuration from `TRUSTLOCK_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("TRUSTLOCK_BIND_ADDR") {
            if let Ok(parsed) = addr.parse() {
                config.bind_addr = parsed;
            }
        }

        if let Ok(port) = std::env::var("TRUSTLOCK_PORT") {
            if let Ok(parsed) = port.parse() {
                config.port = parsed;
            }
        }

        match std::env::var("TRUSTLOCK_JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => config.jwt_secret = secret,
            _ => {
                tracing::warn!("no JWT secret configured - using a random secret (development only)");
            }
        }

        if let Ok(val) = std::env::var("TRUSTLOCK_SECURE_COOKIES") {
            config.secure_cookies = val == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("TRUSTLOCK_LOG_REQUESTS") {
            config.log_requests = val == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("TRUSTLOCK_PAGE_SIZE") {
            if let Ok(parsed) = val.parse::<usize>() {
                if parsed > 0 {
                    config.page_size = parsed;
                }
            }
        }

        if let Ok(path) = std::env::var("TRUSTLOCK_SEED") {
            if !path.is_empty() {
                config.seed_path = Some(path);
            }
        }

        if !config.is_localhost() {
            tracing::warn!(
                "binding to {} - ensure HTTPS and secure cookies are configured",
                config.bind_addr
            );
        }

        config
    }

    pub fn is_localhost(&self) -> bool {
        match self.bind_addr {
            IpAddr::V4(addr) => addr.is_loopback(),
            IpAddr::V6(addr) => addr.is_loopback(),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.bind_addr, self.port)
    }
}
