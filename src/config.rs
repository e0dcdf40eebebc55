use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long, env = "BIND_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Base URL of the agent backend
    #[arg(long, env = "BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Seconds between status polls
    #[arg(long, env = "POLL_INTERVAL_SECS")]
    pub poll_interval_secs: Option<u64>,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub widget: WidgetConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    /// `0` disables the timeout.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetConfig {
    pub poll_interval_secs: u64,
    pub session_idle_secs: u64,
    pub max_sessions: usize,
    #[serde(default = "default_suggestions")]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub json: bool,
}

/// Status refreshes a page may miss before its widget counts as abandoned.
/// Background tabs may throttle timers, hence more than one.
pub const MISSED_REFRESHES: u32 = 3;

fn default_suggestions() -> Vec<String> {
    vec![
        "What is the current price of Bitcoin?".to_string(),
        "Show my open futures positions".to_string(),
        "Summarize today's crypto market".to_string(),
    ]
}

impl BackendConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl WidgetConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    /// How long a widget may go untouched before it is evicted.
    ///
    /// An open page refreshes its status panel every poll interval, so a
    /// widget that missed [`MISSED_REFRESHES`] refreshes belongs to a closed
    /// tab. `session_idle_secs` caps the wait.
    #[must_use]
    pub fn abandon_after(&self) -> Duration {
        self.session_idle()
            .min(self.poll_interval().saturating_mul(MISSED_REFRESHES))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.static_dir", "static")?
            .set_default("backend.base_url", "http://127.0.0.1:8000")?
            .set_default("backend.request_timeout_secs", 120)?
            .set_default("widget.poll_interval_secs", 30)?
            .set_default("widget.session_idle_secs", 30 * 60)?
            .set_default("widget.max_sessions", 256)?
            .set_default("logging.json", false)?;

        // Explicit file must exist; ./config.* is optional.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // E.g. CHAT_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("CHAT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Priority: CLI flag > CLI env var > CHAT_ env > config file > defaults.
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(url) = cli.backend_url {
            builder = builder.set_override("backend.base_url", url)?;
        }
        if let Some(secs) = cli.poll_interval_secs {
            builder = builder.set_override(
                "widget.poll_interval_secs",
                i64::try_from(secs).unwrap_or(i64::MAX),
            )?;
        }
        if let Some(json) = cli.log_json {
            builder = builder.set_override("logging.json", json)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        url::Url::parse(&self.backend.base_url).map_err(|e| {
            config::ConfigError::Message(format!(
                "backend.base_url '{}' is not a valid URL: {e}",
                self.backend.base_url
            ))
        })?;
        if self.widget.max_sessions == 0 {
            return Err(config::ConfigError::Message(
                "widget.max_sessions must be greater than zero".to_string(),
            ));
        }
        if self.widget.poll_interval_secs == 0 {
            return Err(config::ConfigError::Message(
                "widget.poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_parse() {
        let cli = Cli::try_parse_from([
            "agent-chat-widget",
            "--port",
            "8080",
            "--backend-url",
            "http://agent:5000",
            "--log-json",
            "true",
        ])
        .unwrap();
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.backend_url.as_deref(), Some("http://agent:5000"));
        assert_eq!(cli.log_json, Some(true));
    }

    #[test]
    fn zero_timeout_disables_it() {
        let backend = BackendConfig {
            base_url: "http://x".into(),
            request_timeout_secs: 0,
        };
        assert_eq!(backend.request_timeout(), None);

        let backend = BackendConfig {
            request_timeout_secs: 5,
            ..backend
        };
        assert_eq!(backend.request_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn abandoned_after_missed_refreshes() {
        let widget = WidgetConfig {
            poll_interval_secs: 30,
            session_idle_secs: 1800,
            max_sessions: 8,
            suggestions: Vec::new(),
        };
        assert_eq!(widget.abandon_after(), Duration::from_secs(90));

        let widget = WidgetConfig {
            session_idle_secs: 60,
            ..widget
        };
        assert_eq!(widget.abandon_after(), Duration::from_secs(60));
    }
}
