use crate::domain::transaction::RetryPolicy;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime configuration, read from the command line or the environment.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "HTTP endpoint debiting user balances", long_about = None)]
pub struct Config {
    /// Address the HTTP server listens on.
    #[arg(long, env = "PAYDEBIT_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "PAYDEBIT_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// JSON file of initial records, `{ "<collection>": { "<id>": { ... } } }`.
    #[arg(long, env = "PAYDEBIT_SEED")]
    pub seed: Option<PathBuf>,

    /// Attempts per debit before a conflicting transaction is given up.
    #[arg(long, env = "PAYDEBIT_MAX_ATTEMPTS", default_value_t = 5,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    /// Include the failure reason and the received payload in invalid-input responses.
    #[arg(long, env = "PAYDEBIT_ECHO_INVALID_PAYLOAD")]
    pub echo_invalid_payload: bool,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, env = "PAYDEBIT_LOG", default_value = "paydebit=info")]
    pub log_filter: String,
}

impl Config {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_max_attempts(self.max_attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["paydebit"]).unwrap();
        assert_eq!(config.bind, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.max_attempts, 5);
        assert!(!config.echo_invalid_payload);
        assert!(config.db_path.is_none());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_parse_from([
            "paydebit",
            "--bind",
            "127.0.0.1:8080",
            "--max-attempts",
            "9",
            "--echo-invalid-payload",
        ])
        .unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.retry_policy().max_attempts, 9);
        assert!(config.echo_invalid_payload);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        assert!(Config::try_parse_from(["paydebit", "--max-attempts", "0"]).is_err());
    }
}
