use std::net::SocketAddr;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    /// Scheme and authority used for pagination links. Falls back to the
    /// request's `Host` header when unset.
    pub public_base_url: Option<String>,
    pub default_page_limit: u64,
    pub max_page_limit: u64,
    pub regenerate_sessions_on_update: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://showtimes.db?mode=rwc".to_string());

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let default_page_limit: u64 =
            std::env::var("DEFAULT_PAGE_LIMIT").ok().and_then(|s| s.parse().ok()).unwrap_or(10);

        let max_page_limit: u64 =
            std::env::var("MAX_PAGE_LIMIT").ok().and_then(|s| s.parse().ok()).unwrap_or(100);

        let regenerate_sessions_on_update = match std::env::var("REGENERATE_SESSIONS_ON_UPDATE") {
            Ok(v) => parse_flag(&v).context("REGENERATE_SESSIONS_ON_UPDATE")?,
            Err(_) => false,
        };

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            public_base_url,
            default_page_limit: default_page_limit.max(1),
            max_page_limit: max_page_limit.max(1),
            regenerate_sessions_on_update,
        })
    }

    /// Page size for a list request, clamped to `[1, max_page_limit]`.
    pub fn page_limit(&self, requested: Option<u64>) -> u64 {
        requested.unwrap_or(self.default_page_limit).clamp(1, self.max_page_limit)
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {other:?}"),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 0).into(),
            database_url: "sqlite::memory:".to_string(),
            public_base_url: None,
            default_page_limit: 10,
            max_page_limit: 100,
            regenerate_sessions_on_update: false,
        }
    }
}
