//! Subscriber configuration.
//!
//! JSON lines by default so logs can be shipped as-is; `LOG_FORMAT=pretty`
//! switches to human-readable output for local runs.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,coffeeshop_auth=info,sqlx=warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    /// Unknown values fall back to JSON.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub format: LogFormat,
    /// Directive used when `RUST_LOG` is unset or invalid.
    pub default_filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = lookup("LOG_FORMAT")
            .map(|raw| LogFormat::parse(&raw))
            .unwrap_or_default();
        Self {
            format,
            ..Self::default()
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init(settings: &LogSettings) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(settings.filter())
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    match settings.format {
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .with_target(false)
            .try_init()
            .is_ok(),
        LogFormat::Pretty => builder.pretty().try_init().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_defaults_to_json() {
        let settings = LogSettings::from_lookup(|_| None);
        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(LogFormat::parse("yaml"), LogFormat::Json);
    }

    #[test]
    fn pretty_format_is_case_insensitive() {
        let settings = LogSettings::from_lookup(|var| (var == "LOG_FORMAT").then(|| "Pretty".into()));
        assert_eq!(settings.format, LogFormat::Pretty);
    }

    #[test]
    fn default_filter_targets_crates_in_the_build() {
        for directive in DEFAULT_FILTER.split(',') {
            let Some((target, _level)) = directive.split_once('=') else {
                continue;
            };
            assert!(
                target.starts_with("coffeeshop_") || target == "sqlx",
                "unexpected target {target}"
            );
        }
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn second_init_is_a_noop() {
        init(&LogSettings::default());
        assert!(!init(&LogSettings::default()));
    }
}
