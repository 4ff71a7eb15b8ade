use std::ops::Deref;

use courier_client::Session;

/// A session owned by a single call, closed however the call ends.
///
/// Closing happens in `Drop`, so it also runs when the call's future is
/// cancelled or a panic unwinds through it.
pub(crate) struct AdhocSession(Session);

impl AdhocSession {
    pub(crate) fn new() -> Self {
        log::debug!("opening ad-hoc session");
        Self(Session::new())
    }
}

impl Deref for AdhocSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.0
    }
}

impl Drop for AdhocSession {
    fn drop(&mut self) {
        log::debug!("closing ad-hoc session");
        self.0.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_closes_the_session() {
        let adhoc = AdhocSession::new();
        let session = adhoc.0.clone();
        assert!(!session.is_closed());
        drop(adhoc);
        assert!(session.is_closed());
        assert!(session.pool().is_closed());
    }
}
