//! Shared test helpers for driving ExtractionClient without a network.

use crate::client::ExtractionClient;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpResponse, Transport};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Base URL used by every scripted client
pub(crate) const TEST_BASE_URL: &str = "http://service.test";

/// One scripted outcome for a request
#[derive(Clone, Debug)]
pub(crate) enum Reply {
    Respond(HttpResponse),
    /// No response at all (connection refused)
    Drop,
    /// Transport fails with whatever error the host stack produced
    Fail(fn() -> Error),
}

impl Reply {
    pub(crate) fn json(status: u16, body: serde_json::Value) -> Self {
        Reply::Respond(HttpResponse::new(status, body.to_string()))
    }

    pub(crate) fn text(status: u16, body: &str) -> Self {
        Reply::Respond(HttpResponse::new(status, body))
    }
}

/// Transport that answers from per-path scripts and records every request
///
/// Each path holds a queue of replies; the last reply repeats once the queue
/// is down to one entry. Unscripted paths answer 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue replies for a path (including any query string)
    pub(crate) fn script(&self, path: &str, replies: impl IntoIterator<Item = Reply>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .extend(replies);
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests sent to `path`
    pub(crate) fn count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    /// Paths in the order they were requested
    pub(crate) fn paths(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.path.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let reply = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(&request.path) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        self.requests.lock().unwrap().push(request);

        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Drop) => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
            Some(Reply::Fail(make_error)) => Err(make_error()),
            None => Ok(HttpResponse::new(404, "Not Found")),
        }
    }
}

/// Configuration pointing at the scripted service with a short poll interval
pub(crate) fn test_config() -> Config {
    let mut config = Config::new(TEST_BASE_URL);
    config.polling.interval = Duration::from_millis(10);
    config
}

/// Client over `transport` using [`test_config`]
pub(crate) fn test_client(transport: Arc<ScriptedTransport>) -> ExtractionClient {
    test_client_with(test_config(), transport)
}

pub(crate) fn test_client_with(
    config: Config,
    transport: Arc<ScriptedTransport>,
) -> ExtractionClient {
    ExtractionClient::with_transport(config, transport).unwrap()
}

/// Upload response for job `job-1` in wallet `w-1`
pub(crate) fn accepted(wallet_version_id: Option<&str>) -> Reply {
    let mut body = serde_json::json!({"jobId": "job-1", "walletId": "w-1"});
    if let Some(v) = wallet_version_id {
        body["walletVersionId"] = serde_json::Value::String(v.to_string());
    }
    Reply::json(200, body)
}

/// Status response with the given status string
pub(crate) fn status(value: &str) -> Reply {
    Reply::json(200, serde_json::json!({"Status": value, "JobId": "job-1"}))
}
