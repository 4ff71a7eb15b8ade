//! Scripted in-memory transport for session tests.
//!
//! Every exchange consumes the next [`Step`] of one shared script, whatever
//! connection it runs on; connects consume a step only when it is
//! [`Step::RefuseConnect`]. Once the script runs out every request gets an
//! empty `200 OK`.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use courier_client::pool::PoolKey;
use courier_client::proxy::Environment;
use courier_client::transport::{Connection, Transport, TransportError};
use courier_client::{Config, Session};

#[derive(Debug, Clone)]
pub struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
    delay: Option<Duration>,
}

#[derive(Debug, Clone)]
pub enum Step {
    RefuseConnect,
    Respond(Reply),
    /// Connection reset before any response byte.
    Reset,
    /// Connection reset while the body was being read.
    ResetAfterResponse,
    /// Never answer.
    Stall,
}

impl Step {
    pub fn status(status: u16) -> Self {
        Step::Respond(Reply {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
            delay: None,
        })
    }

    pub fn ok(body: &'static str) -> Self {
        Step::status(200).body(body)
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Step::status(status).header("Location", location)
    }

    pub fn header(self, name: &str, value: &str) -> Self {
        self.map_reply(|reply| reply.headers.push((name.to_string(), value.to_string())))
    }

    pub fn body(self, body: &'static str) -> Self {
        self.map_reply(|reply| reply.body = Bytes::from_static(body.as_bytes()))
    }

    /// Hold the connection for `delay` before answering.
    pub fn delayed(self, delay: Duration) -> Self {
        self.map_reply(|reply| reply.delay = Some(delay))
    }

    fn map_reply(mut self, f: impl FnOnce(&mut Reply)) -> Self {
        if let Step::Respond(reply) = &mut self {
            f(reply);
        }
        self
    }
}

/// A request as the transport saw it.
#[derive(Debug, Clone)]
pub struct Sent {
    pub connection: usize,
    pub key: String,
    pub method: String,
    pub uri: String,
    pub headers: http::HeaderMap,
    pub body: Bytes,
}

impl Sent {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

#[derive(Default)]
struct State {
    script: Mutex<VecDeque<Step>>,
    sent: Mutex<Vec<Sent>>,
    keys: Mutex<Vec<String>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl State {
    fn next_step(&self) -> Option<Step> {
        self.script.lock().expect("script lock").pop_front()
    }
}

#[derive(Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<State>,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        let transport = Self::default();
        transport.push(steps);
        transport
    }

    pub fn push(&self, steps: impl IntoIterator<Item = Step>) {
        self.state.script.lock().expect("script lock").extend(steps);
    }

    /// Session over this transport that sees no proxy variables.
    pub fn session(&self, config: Config) -> Session {
        self.session_with_env(config, Vars::default())
    }

    pub fn session_with_env(&self, config: Config, vars: Vars) -> Session {
        Session::builder()
            .config(config)
            .transport(Arc::new(self.clone()))
            .environment(Arc::new(vars))
            .build()
            .expect("test session should build")
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.state.sent.lock().expect("sent lock").clone()
    }

    /// Pool keys connected to, in order, refused connects included.
    pub fn keys(&self) -> Vec<String> {
        self.state.keys.lock().expect("keys lock").clone()
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// Most exchanges that were ever running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("connects", &self.connects())
            .field("closes", &self.closes())
            .finish()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&self, key: &PoolKey) -> Result<Box<dyn Connection>, TransportError> {
        self.state.keys.lock().expect("keys lock").push(key.to_string());
        {
            let mut script = self.state.script.lock().expect("script lock");
            if matches!(script.front(), Some(Step::RefuseConnect)) {
                script.pop_front();
                return Err(TransportError::connect(key.authority(), "connection refused"));
            }
        }
        let id = self.state.connects.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Box::new(ScriptedConnection {
            id,
            key: key.to_string(),
            state: self.state.clone(),
            pending: false,
            broken: false,
            closed: false,
        }))
    }
}

struct ScriptedConnection {
    id: usize,
    key: String,
    state: Arc<State>,
    pending: bool,
    broken: bool,
    closed: bool,
}

impl fmt::Debug for ScriptedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedConnection")
            .field("id", &self.id)
            .field("key", &self.key)
            .finish()
    }
}

struct InFlight<'a>(&'a State);

impl<'a> InFlight<'a> {
    fn enter(state: &'a State) -> Self {
        let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn send(&mut self, request: http::Request<Bytes>) -> Result<(), TransportError> {
        let (parts, body) = request.into_parts();
        self.state.sent.lock().expect("sent lock").push(Sent {
            connection: self.id,
            key: self.key.clone(),
            method: parts.method.to_string(),
            uri: parts.uri.to_string(),
            headers: parts.headers,
            body,
        });
        self.pending = true;
        Ok(())
    }

    async fn recv(&mut self) -> Result<http::Response<Bytes>, TransportError> {
        let _in_flight = InFlight::enter(&self.state);
        self.pending = false;
        match self.state.next_step() {
            None => Ok(http::Response::new(Bytes::new())),
            Some(Step::Respond(reply)) => {
                if let Some(delay) = reply.delay {
                    tokio::time::sleep(delay).await;
                }
                let mut response = http::Response::builder().status(reply.status);
                for (name, value) in &reply.headers {
                    response = response.header(name.as_str(), value.as_str());
                }
                response
                    .body(reply.body)
                    .map_err(|err| TransportError::protocol(err.to_string()))
            }
            Some(Step::Reset) => {
                self.broken = true;
                Err(TransportError::reset("connection reset by peer"))
            }
            Some(Step::ResetAfterResponse) => {
                self.broken = true;
                Err(TransportError::reset_after_response("connection reset while reading body"))
            }
            Some(Step::Stall) => std::future::pending().await,
            Some(Step::RefuseConnect) => Err(TransportError::protocol("connect refusal scripted for an exchange")),
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_healthy(&self) -> bool {
        !self.closed && !self.broken && !self.pending
    }
}

/// Default configuration with `overrides` (a JSON object) applied.
pub fn config(overrides: serde_json::Value) -> Config {
    Config::defaults()
        .resolve_value(overrides)
        .expect("test config should resolve")
}

/// Fixed proxy variables standing in for the process environment.
#[derive(Debug, Default)]
pub struct Vars(Vec<(String, String)>);

impl Vars {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        )
    }
}

impl Environment for Vars {
    fn var(&self, name: &str) -> Option<String> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.clone())
    }
}
