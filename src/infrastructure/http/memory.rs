//! In-memory network adapter for headless runs and tests.

use super::{NetworkRequest, NetworkResponse, NetworkService};
use crate::domain::error::{AppError, Result};
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone)]
enum Reply {
    Respond(NetworkResponse),
    Fail(String),
}

/// Answers every GET with one canned reply and records the requests it saw.
#[derive(Debug)]
pub struct MemoryNetworkService {
    reply: Mutex<Reply>,
    requests: Mutex<Vec<NetworkRequest>>,
}

impl MemoryNetworkService {
    pub fn responding(status: u16, body: impl Into<String>) -> Self {
        Self {
            reply: Mutex::new(Reply::Respond(NetworkResponse {
                status,
                body: body.into(),
            })),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Mutex::new(Reply::Fail(message.into())),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_response(&self, status: u16, body: impl Into<String>) {
        *self.reply.lock().unwrap_or_else(PoisonError::into_inner) =
            Reply::Respond(NetworkResponse {
                status,
                body: body.into(),
            });
    }

    pub fn requests(&self) -> Vec<NetworkRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl NetworkService for MemoryNetworkService {
    async fn get(&self, request: &NetworkRequest) -> Result<NetworkResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let reply = self
            .reply
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match reply {
            Reply::Respond(response) => Ok(response),
            Reply::Fail(message) => Err(AppError::NetworkError(message)),
        }
    }
}
