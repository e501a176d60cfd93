//! Process configuration, loaded once at startup via [`Config::from_env`].
//!
//! `DEV_MODE=true` relaxes which fields are required vs. defaulted, the same
//! switch the donor codebase uses.

use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub base_url: String,
    pub is_dev: bool,

    pub tls_enabled: bool,
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
    pub tls_key_passphrase: Option<String>,

    /// Bound on a single upstream fetch attempt (spec §5).
    pub fetch_timeout_ms: u64,
    /// Registry entry used when the `stream` query parameter is omitted.
    pub default_stream: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let is_dev = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let port = if is_dev {
            env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?
        } else {
            env::var("PORT")
                .map_err(|_| "PORT is required in production")?
                .parse()?
        };

        let base_url = if is_dev {
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://localhost:{port}"))
        } else {
            env::var("BASE_URL").map_err(|_| "BASE_URL is required in production")?
        };

        let tls_enabled = env::var("TLS_ENABLED")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);
        let tls_cert_path = env::var("TLS_CERT_PATH").ok();
        let tls_key_path = env::var("TLS_KEY_PATH").ok();
        let tls_key_passphrase = env::var("TLS_KEY_PASSPHRASE").ok();
        if tls_enabled && (tls_cert_path.is_none() || tls_key_path.is_none()) {
            return Err("TLS_ENABLED requires TLS_CERT_PATH and TLS_KEY_PATH".into());
        }

        let fetch_timeout_ms = env::var("FETCH_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()?;

        let default_stream =
            env::var("DEFAULT_STREAM").unwrap_or_else(|_| "bbb".to_string());

        Ok(Config {
            port,
            base_url,
            is_dev,
            tls_enabled,
            tls_cert_path,
            tls_key_path,
            tls_key_passphrase,
            fetch_timeout_ms,
            default_stream,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests mutate process-wide env vars; serialize them against each other.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            "DEV_MODE",
            "PORT",
            "BASE_URL",
            "TLS_ENABLED",
            "TLS_CERT_PATH",
            "TLS_KEY_PATH",
            "TLS_KEY_PASSPHRASE",
            "FETCH_TIMEOUT_MS",
            "DEFAULT_STREAM",
        ] {
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    fn dev_mode_defaults_port_and_base_url() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        unsafe { env::set_var("DEV_MODE", "true") };
        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.base_url.starts_with("http://localhost:"));
        assert!(!config.tls_enabled);
        clear_env();
    }

    #[test]
    fn prod_mode_requires_port_and_base_url() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        let err = Config::from_env();
        assert!(err.is_err());
        clear_env();
    }

    #[test]
    fn tls_enabled_without_cert_paths_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        unsafe { env::set_var("DEV_MODE", "true") };
        unsafe { env::set_var("TLS_ENABLED", "true") };
        let err = Config::from_env();
        assert!(err.is_err());
        clear_env();
    }

    #[test]
    fn default_stream_falls_back_to_bbb() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        unsafe { env::set_var("DEV_MODE", "true") };
        let config = Config::from_env().unwrap();
        assert_eq!(config.default_stream, "bbb");
        clear_env();
    }
}
