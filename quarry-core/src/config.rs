use crate::{AsValue, Context, Error, Result};
use std::time::Duration;
use url::form_urlencoded;

/// Settings of a [`crate::DataContext`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContextConfig {
    /// Upper bound of every driver call (connect, prepare, execute, fetch).
    pub timeout: Duration,
    /// Fail the mapping when a declared column is missing from a row.
    pub strict: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            strict: false,
        }
    }
}

impl ContextConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Reads the `timeout` (seconds) and `strict` query parameters of `url`.
    ///
    /// Returns the configuration and the URL without those parameters, to be
    /// handed to the driver.
    pub fn from_url(url: &str) -> Result<(Self, String)> {
        let mut config = Self::default();
        let Some((base, query)) = url.split_once('?') else {
            return Ok((config, url.to_string()));
        };
        let mut rest = form_urlencoded::Serializer::new(String::new());
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "timeout" => {
                    let seconds = f64::parse(&value)
                        .ok()
                        .and_then(|v| Duration::try_from_secs_f64(v).ok())
                        .ok_or_else(|| {
                            Error::msg(format!("Invalid value `{value}` for `timeout`"))
                        })?;
                    config.timeout = seconds;
                }
                "strict" => {
                    config.strict = bool::parse(&value)
                        .with_context(|| format!("Invalid value `{value}` for `strict`"))?;
                }
                _ => {
                    rest.append_pair(&key, &value);
                }
            }
        }
        let rest = rest.finish();
        let url = if rest.is_empty() {
            base.to_string()
        } else {
            format!("{base}?{rest}")
        };
        Ok((config, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ContextConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.strict);
        let config = ContextConfig::new()
            .timeout(Duration::from_millis(10))
            .strict(true);
        assert_eq!(config.timeout, Duration::from_millis(10));
        assert!(config.strict);
    }

    #[test]
    fn from_url_strips_own_keys() {
        let (config, url) =
            ContextConfig::from_url("sqlite:///tmp/app.sqlite?timeout=5&mode=rwc&strict=true")
                .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.strict);
        assert_eq!(url, "sqlite:///tmp/app.sqlite?mode=rwc");

        let (config, url) = ContextConfig::from_url("sqlite://:memory:?timeout=0.5").unwrap();
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(url, "sqlite://:memory:");

        let (config, url) = ContextConfig::from_url("sqlite://:memory:").unwrap();
        assert_eq!(config, ContextConfig::default());
        assert_eq!(url, "sqlite://:memory:");
    }

    #[test]
    fn from_url_rejects_bad_values() {
        let error = ContextConfig::from_url("sqlite://db?timeout=soon").unwrap_err();
        assert!(error.to_string().contains("timeout"));
        let error = ContextConfig::from_url("sqlite://db?strict=maybe").unwrap_err();
        assert!(error.to_string().contains("strict"));
        assert!(ContextConfig::from_url("sqlite://db?timeout=-1").is_err());
    }
}
