//! Safe mode: failures returned as error-carrying responses.

use courier_client::{Config, Response, Result, Session};
use serde_json::{Map, Value};

/// Whether a call on `session` with `overrides` runs in safe mode.
///
/// Overrides that do not resolve fall back to the session's own setting;
/// the call itself then fails with the configuration error.
pub(crate) fn enabled(session: &Session, overrides: &Map<String, Value>) -> bool {
    let resolved = session.config().resolve(overrides);
    let config: &Config = match &resolved {
        Ok(config) => config,
        Err(_) => session.config(),
    };
    config.safe_mode() && !config.danger_mode()
}

/// Turn a failed outcome into a status-less response when `safe` is set.
pub(crate) fn settle(safe: bool, outcome: Result<Response>) -> Result<Response> {
    match outcome {
        Err(err) if safe => {
            log::debug!("safe mode absorbed error: {err}");
            Ok(Response::from_error(err))
        }
        other => other,
    }
}
