//! Server configuration, loaded from TOML.
//!
//! ```toml
//! bind = "0.0.0.0:8080"
//! log = "info"
//! sweep_interval_secs = 60
//!
//! [session]
//! default_size = 4
//! max_sessions = 50000
//! idle_ttl_secs = 1800
//! ```
//!
//! Every key is optional.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tileforge_board::Board;
use tileforge_session::SessionConfig;

use crate::TileforgeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "defaults::bind")]
    pub bind: SocketAddr,

    /// Tracing filter used when neither `--log` nor `RUST_LOG` is set.
    #[serde(default = "defaults::log")]
    pub log: String,

    /// How often idle games are swept. 0 disables the sweeper.
    #[serde(default = "defaults::sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    #[serde(default)]
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::bind(),
            log: defaults::log(),
            sweep_interval_secs: defaults::sweep_interval_secs(),
            session: SessionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads and validates a TOML config file.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, TileforgeError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, TileforgeError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// The sweep period, or `None` if sweeping is off.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }

    /// Checks that the session limits are consistent with each other and
    /// with what the board supports.
    pub fn validate(&self) -> Result<(), TileforgeError> {
        validate_session(&self.session)
    }
}

/// Rejects session limits the store could not serve.
pub(crate) fn validate_session(s: &SessionConfig) -> Result<(), TileforgeError> {
    let invalid = |msg: String| Err(TileforgeError::InvalidConfig(msg));

    if s.min_size < 2 || s.max_size > Board::MAX_SIZE || s.min_size > s.max_size {
        return invalid(format!(
            "board sizes {}..={} must lie within 2..={}",
            s.min_size,
            s.max_size,
            Board::MAX_SIZE
        ));
    }
    if !(s.min_size..=s.max_size).contains(&s.default_size) {
        return invalid(format!(
            "default_size {} is outside {}..={}",
            s.default_size, s.min_size, s.max_size
        ));
    }
    if s.win_tile < 4 || !s.win_tile.is_power_of_two() {
        return invalid(format!(
            "win_tile {} must be a power of two of at least 4",
            s.win_tile
        ));
    }
    if s.max_sessions == 0 {
        return invalid("max_sessions must be at least 1".into());
    }
    if s.shards == 0 {
        return invalid("shards must be at least 1".into());
    }
    Ok(())
}

mod defaults {
    use std::net::{Ipv4Addr, SocketAddr};

    pub fn bind() -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, 8080))
    }
    pub fn log() -> String {
        "info".to_string()
    }
    pub fn sweep_interval_secs() -> u64 {
        60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_str_empty_uses_defaults() {
        let config = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(config.bind, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.log, "info");
        assert_eq!(config.sweep_interval(), Some(Duration::from_secs(60)));
        assert_eq!(config.session.default_size, 4);
        assert_eq!(config.session.win_tile, 2048);
        assert_eq!(config.session.rng_seed, None);
    }

    #[test]
    fn test_from_toml_str_partial_session_table_keeps_other_defaults() {
        let config = ServerConfig::from_toml_str(
            r#"
            bind = "0.0.0.0:9000"
            sweep_interval_secs = 0

            [session]
            max_size = 8
            rng_seed = 7
            continue_after_win = true
            "#,
        )
        .unwrap();

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.sweep_interval(), None);
        assert_eq!(config.session.max_size, 8);
        assert_eq!(config.session.min_size, 3);
        assert_eq!(config.session.rng_seed, Some(7));
        assert!(config.session.continue_after_win);
    }

    #[test]
    fn test_from_toml_str_bad_syntax_returns_parse_error() {
        let result = ServerConfig::from_toml_str("bind = ");
        assert!(matches!(result, Err(TileforgeError::ConfigParse(_))));
    }

    #[test]
    fn test_from_toml_str_bad_bind_returns_parse_error() {
        let result = ServerConfig::from_toml_str(r#"bind = "not an address""#);
        assert!(matches!(result, Err(TileforgeError::ConfigParse(_))));
    }

    #[test]
    fn test_validate_default_outside_range_rejected() {
        let result = ServerConfig::from_toml_str("[session]\ndefault_size = 8\n");
        assert!(matches!(result, Err(TileforgeError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_inconsistent_limits() {
        for toml in [
            "[session]\nmin_size = 1\n",
            "[session]\nmax_size = 17\ndefault_size = 4\n",
            "[session]\nmin_size = 6\nmax_size = 4\n",
            "[session]\nwin_tile = 1000\n",
            "[session]\nmax_sessions = 0\n",
            "[session]\nshards = 0\n",
        ] {
            assert!(
                matches!(
                    ServerConfig::from_toml_str(toml),
                    Err(TileforgeError::InvalidConfig(_))
                ),
                "{toml:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_toml_missing_file_returns_io_error() {
        let result = ServerConfig::from_toml("/nonexistent/tileforge.toml");
        assert!(matches!(result, Err(TileforgeError::Io(_))));
    }
}
