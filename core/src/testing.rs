//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, TransportError};

/// Replays queued responses in order and records every request it sees.
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    held: Arc<watch::Sender<bool>>,
}

/// While alive, `execute` records the request but does not answer.
pub(crate) struct Gate {
    held: Arc<watch::Sender<bool>>,
}

impl Drop for Gate {
    fn drop(&mut self) {
        self.held.send_replace(false);
    }
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        let (held, _rx) = watch::channel(false);
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            held: Arc::new(held),
        }
    }

    pub(crate) fn respond(&self, status: u16, body: &str) {
        self.push(Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }));
    }

    pub(crate) fn fail(&self, message: &str) {
        self.push(Err(TransportError(message.to_string())));
    }

    pub(crate) fn hold(&self) -> Gate {
        self.held.send_replace(true);
        Gate {
            held: Arc::clone(&self.held),
        }
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn push(&self, response: Result<HttpResponse, TransportError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let mut rx = self.held.subscribe();
        loop {
            let held = *rx.borrow_and_update();
            if !held || rx.changed().await.is_err() {
                break;
            }
        }

        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("no scripted response".to_string())))
    }
}
