//! Proxy settings from the process environment.

use std::env;
use std::fmt;

/// Source of proxy settings for `trust_env`.
pub trait Environment: Send + Sync + fmt::Debug {
    /// Value of variable `name`, if set and not empty.
    fn var(&self, name: &str) -> Option<String>;

    /// Proxy for `scheme`: `<SCHEME>_PROXY`, then `ALL_PROXY`, in upper or lower case.
    fn proxy_for(&self, scheme: &str) -> Option<String> {
        let specific = format!("{}_PROXY", scheme.to_ascii_uppercase());
        self.either_case(&specific)
            .or_else(|| self.either_case("ALL_PROXY"))
    }

    /// Whether `host` is excluded by `NO_PROXY`.
    ///
    /// Entries are comma separated; `*` matches every host, other entries
    /// match the host itself and its subdomains (a leading `.` is ignored).
    fn bypasses(&self, host: &str) -> bool {
        let Some(no_proxy) = self.either_case("NO_PROXY") else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        no_proxy
            .split(',')
            .map(|entry| entry.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|entry| !entry.is_empty())
            .any(|entry| {
                entry == "*"
                    || host == entry
                    || host
                        .strip_suffix(&entry)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            })
    }

    #[doc(hidden)]
    fn either_case(&self, name: &str) -> Option<String> {
        self.var(name)
            .or_else(|| self.var(&name.to_ascii_lowercase()))
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        env::var(name).ok().filter(|value| !value.trim().is_empty())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;

    #[derive(Debug, Default)]
    pub(crate) struct FixedEnvironment(HashMap<String, String>);

    impl FixedEnvironment {
        pub(crate) fn new(vars: &[(&str, &str)]) -> Self {
            Self(
                vars.iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
            )
        }
    }

    impl Environment for FixedEnvironment {
        fn var(&self, name: &str) -> Option<String> {
            self.0.get(name).cloned()
        }
    }

    #[test]
    fn scheme_specific_then_all() {
        let env = FixedEnvironment::new(&[("https_proxy", "secure:1"), ("ALL_PROXY", "any:2")]);
        assert_eq!(env.proxy_for("https").as_deref(), Some("secure:1"));
        assert_eq!(env.proxy_for("http").as_deref(), Some("any:2"));
    }

    #[test]
    fn no_proxy_matching() {
        let env = FixedEnvironment::new(&[("no_proxy", "localhost, .corp.example,10.0.0.1")]);
        assert!(env.bypasses("localhost"));
        assert!(env.bypasses("git.corp.example"));
        assert!(env.bypasses("corp.example"));
        assert!(!env.bypasses("notcorp.example"));
        assert!(env.bypasses("10.0.0.1"));
        assert!(!env.bypasses("example.com"));

        let everything = FixedEnvironment::new(&[("NO_PROXY", "*")]);
        assert!(everything.bypasses("anything.at.all"));
    }
}
