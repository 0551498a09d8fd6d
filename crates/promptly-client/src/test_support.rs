//! Scripted transport and a ready-wired client for unit tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use promptly_core::{ClientConfig, LoggingNavigator, MemoryKeyValueStore};

use crate::api::ApiClient;
use crate::transport::{HttpTransport, TransportRequest, TransportResponse};
use crate::{ClientError, Result};

/// Transport that replays queued responses in order and records every request
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<TransportResponse>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn push(&self, response: TransportResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a network failure
    pub(crate) fn fail_next(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(ClientError::Transport(message.to_string())));
    }

    pub(crate) fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ClientError::Transport(format!(
                    "no response scripted for {}",
                    url
                )))
            })
    }
}

pub(crate) struct Harness {
    pub api: Arc<ApiClient>,
    pub transport: Arc<ScriptedTransport>,
    pub storage: Arc<MemoryKeyValueStore>,
    pub navigator: Arc<LoggingNavigator>,
}

pub(crate) fn harness() -> Harness {
    let config = ClientConfig {
        api_base_url: "http://api.test/v1".to_string(),
        ..Default::default()
    };
    let transport = Arc::new(ScriptedTransport::default());
    let storage = Arc::new(MemoryKeyValueStore::new());
    let navigator = Arc::new(LoggingNavigator::new());
    let api = Arc::new(ApiClient::new(
        &config,
        transport.clone(),
        storage.clone(),
        navigator.clone(),
    ));

    Harness {
        api,
        transport,
        storage,
        navigator,
    }
}
