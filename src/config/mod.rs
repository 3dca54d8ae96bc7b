//! Configuration module for the ArtFestLive backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::scoring::{OrphanPolicy, TieBreak};

/// Default bound on optimistic transaction retries.
pub const DEFAULT_MAX_TX_RETRIES: u32 = 25;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key guarding the admin routes
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// What reconciliation does with scores for events no longer on the roster
    pub orphan_policy: OrphanPolicy,
    /// Secondary ordering for units with equal totals
    pub tie_break: TieBreak,
    /// Upper bound on compare-and-set attempts per transaction
    pub max_tx_retries: u32,
    /// Invalid optional settings that fell back to their defaults, for logging once tracing is up
    pub warnings: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("ARTFEST_API_PSK").ok().filter(|k| !k.is_empty());

        let db_path = env::var("ARTFEST_DB_PATH")
            .unwrap_or_else(|_| "./data/artfest.sqlite".to_string())
            .into();

        let index_path = env::var("ARTFEST_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let raw_bind = env::var("ARTFEST_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = raw_bind
            .parse()
            .map_err(|e| format!("Invalid ARTFEST_BIND_ADDR '{}': {}", raw_bind, e))?;

        let log_level = env::var("ARTFEST_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let mut warnings = Vec::new();
        let orphan_policy =
            parse_or_default("ARTFEST_ORPHAN_POLICY", OrphanPolicy::parse, &mut warnings);
        let tie_break = parse_or_default("ARTFEST_TIE_BREAK", TieBreak::parse, &mut warnings);
        let max_tx_retries = parse_or_default(
            "ARTFEST_MAX_TX_RETRIES",
            |s| s.parse::<u32>().ok().filter(|n| *n > 0),
            &mut warnings,
        )
        .unwrap_or(DEFAULT_MAX_TX_RETRIES);

        Ok(Self {
            api_psk,
            db_path,
            index_path,
            bind_addr,
            log_level,
            orphan_policy: orphan_policy.unwrap_or_default(),
            tie_break: tie_break.unwrap_or_default(),
            max_tx_retries,
            warnings,
        })
    }
}

/// Read an optional variable; an unparseable value is recorded in `warnings` and ignored.
fn parse_or_default<T>(
    var: &str,
    parse: impl Fn(&str) -> Option<T>,
    warnings: &mut Vec<String>,
) -> Option<T> {
    let raw = env::var(var).ok()?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        warnings.push(format!("Ignoring invalid {}={:?}, using the default", var, raw));
    }
    parsed
}
