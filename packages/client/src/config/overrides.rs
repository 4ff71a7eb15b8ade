//! Deriving a configuration from per-call overrides.
//!
//! Precedence is fixed: per-call overrides > session config > process
//! defaults. A session's config is itself a resolution of the defaults, so
//! resolving per-call overrides against it yields that order directly.

use serde_json::{Map, Value};

use super::{Config, Settings};
use crate::error::{self, Result};

pub(crate) const BASE_HEADERS: &str = "base_headers";

impl Config {
    /// Produce a new `Config` with `overrides` applied on top of `self`.
    ///
    /// Keys are the option names (`max_redirects`, `strict_mode`, ...).
    /// `base_headers` merges per header name; a `null` value removes the
    /// header. Unknown keys and mistyped values fail with a configuration
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error of kind [`crate::Kind::Config`] for unknown keys,
    /// mistyped values, or a result that fails [`Config::validate`].
    pub fn resolve(&self, overrides: &Map<String, Value>) -> Result<Config> {
        if overrides.is_empty() {
            return Ok(self.clone());
        }

        let mut settings = serde_json::to_value(&self.settings).map_err(error::config)?;
        let fields = settings
            .as_object_mut()
            .ok_or_else(|| error::config("settings did not serialize to an object"))?;
        let mut base_headers = self.base_headers.clone();

        for (key, value) in overrides {
            if key == BASE_HEADERS {
                merge_headers(&mut base_headers, value)?;
                continue;
            }
            match fields.get_mut(key) {
                Some(slot) => *slot = value.clone(),
                None => {
                    return Err(error::config(format!(
                        "unknown configuration key `{key}`"
                    )))
                }
            }
        }

        let settings: Settings = serde_json::from_value(settings)
            .map_err(|e| error::config(format!("invalid configuration value: {e}")))?;
        let resolved = Config {
            settings,
            base_headers,
        };
        resolved.validate()?;

        tracing::trace!(keys = overrides.len(), "resolved configuration overrides");
        Ok(resolved)
    }

    /// [`Config::resolve`] for a JSON value; `null` means no overrides.
    ///
    /// # Errors
    ///
    /// Fails when `overrides` is neither an object nor `null`, or when
    /// [`Config::resolve`] fails.
    pub fn resolve_value(&self, overrides: Value) -> Result<Config> {
        match overrides {
            Value::Null => Ok(self.clone()),
            Value::Object(map) => self.resolve(&map),
            other => Err(error::config(format!(
                "configuration overrides must be an object, got {other}"
            ))),
        }
    }

    /// The process defaults with `overrides` applied.
    ///
    /// # Errors
    ///
    /// See [`Config::resolve`].
    pub fn from_overrides(overrides: &Map<String, Value>) -> Result<Config> {
        Config::defaults().resolve(overrides)
    }
}

fn merge_headers(headers: &mut Vec<(String, String)>, value: &Value) -> Result<()> {
    let Value::Object(entries) = value else {
        return Err(error::config(format!(
            "`{BASE_HEADERS}` must be an object of header names to strings"
        )));
    };

    for (name, value) in entries {
        match value {
            Value::Null => headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name)),
            Value::String(text) => {
                match headers
                    .iter_mut()
                    .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
                {
                    Some(entry) => entry.1.clone_from(text),
                    None => headers.push((name.clone(), text.clone())),
                }
            }
            other => {
                return Err(error::config(format!(
                    "header `{name}` must be a string or null, got {other}"
                )))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn overrides(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("test overrides are objects")
    }

    #[test]
    fn resolve_applies_overrides_without_touching_base() {
        let base = Config::defaults();
        let derived = base
            .resolve(&overrides(json!({"max_retries": 2, "strict_mode": true})))
            .expect("overrides should resolve");

        assert_eq!(derived.max_retries(), 2);
        assert!(derived.strict_mode());
        assert_eq!(base.max_retries(), 0);
        assert!(!base.strict_mode());
        assert_eq!(derived.max_redirects(), base.max_redirects());
    }

    #[test]
    fn resolve_rejects_unknown_key() {
        let err = Config::defaults()
            .resolve(&overrides(json!({"max_redirect": 3})))
            .expect_err("typo should be rejected");
        assert!(err.is_config());
        assert!(err.to_string().contains("max_redirect"));
    }

    #[test]
    fn resolve_rejects_mistyped_value() {
        let err = Config::defaults()
            .resolve(&overrides(json!({"keep_alive": "yes"})))
            .expect_err("string for bool should be rejected");
        assert!(err.is_config());

        let err = Config::defaults()
            .resolve(&overrides(json!({"max_redirects": -1})))
            .expect_err("negative budget should be rejected");
        assert!(err.is_config());
    }

    #[test]
    fn resolve_merges_and_removes_base_headers() {
        let derived = Config::defaults()
            .resolve(&overrides(json!({
                "base_headers": {"accept": "application/json", "Accept-Encoding": null, "X-Trace": "1"}
            })))
            .expect("header overrides should resolve");

        let headers = derived.base_headers();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[0].0, "User-Agent");
        assert_eq!(headers[1], ("Accept".to_string(), "application/json".to_string()));
        assert_eq!(headers[2], ("X-Trace".to_string(), "1".to_string()));
    }

    #[test]
    fn resolve_runs_validation() {
        let err = Config::defaults()
            .resolve(&overrides(json!({"pool_maxsize": 0})))
            .expect_err("empty pool should be rejected");
        assert!(err.is_config());
    }

    #[test]
    fn resolve_value_accepts_null() {
        let derived = Config::defaults()
            .resolve_value(Value::Null)
            .expect("null means no overrides");
        assert_eq!(&derived, Config::defaults());

        assert!(Config::defaults().resolve_value(json!([1, 2])).is_err());
    }

    #[test]
    fn chained_resolution_keeps_precedence() {
        let session = Config::from_overrides(&overrides(json!({"max_redirects": 5, "max_retries": 1})))
            .expect("session config should resolve");
        let call = session
            .resolve(&overrides(json!({"max_redirects": 2})))
            .expect("call config should resolve");

        assert_eq!(call.max_redirects(), 2);
        assert_eq!(call.max_retries(), 1);
        assert_eq!(call.pool_maxsize(), 10);
    }
}
