//! Reusable transport clients
//!
//! The dispatcher checks a client out for each attempt and returns it
//! afterwards, so concurrent requests share connection pools instead of
//! rebuilding them. The pool grows on demand and never shrinks; unbounded
//! growth under load is an accepted scaling limit.

use std::time::Duration;

use arcadia_domain::{ArcadiaError, Result};
use parking_lot::Mutex;
use reqwest::Client as ReqwestClient;

use crate::config::ClientConfig;

/// Acquire-or-create pool of transport clients.
pub struct ClientPool {
    idle: Mutex<Vec<ReqwestClient>>,
    user_agent: String,
    timeout: Duration,
}

impl ClientPool {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout,
        }
    }

    /// Check out an idle client, building a fresh one when none are idle.
    ///
    /// # Errors
    ///
    /// `Config` when the transport client cannot be constructed.
    pub fn acquire(&self) -> Result<ReqwestClient> {
        if let Some(client) = self.idle.lock().pop() {
            return Ok(client);
        }
        self.build_client()
    }

    /// Return a client to the pool. Called after every attempt, success or
    /// failure.
    pub fn release(&self, client: ReqwestClient) {
        self.idle.lock().push(client);
    }

    fn build_client(&self) -> Result<ReqwestClient> {
        ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .no_proxy()
            .build()
            .map_err(|err| {
                ArcadiaError::Config(format!("failed to build transport client: {err}"))
            })
    }

    #[cfg(test)]
    pub(crate) fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }
}
