//! Connection lifecycle for one target
//!
//! Establishes the session with a bounded number of attempts and applies
//! the post-connect settle delay, which runs at most once per successful
//! connection. Closing drops the session; the per-connection caches are
//! reset by the collector that owns them.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::{SessionError, SessionResult};
use crate::session::{Credentials, JolokiaSession};

#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub base_url: String,
    pub credentials: Credentials,
    pub request_timeout_ms: u64,
    pub num_retries: u32,
    pub settle_delay: Duration,
}

pub struct ConnectionManager {
    settings: ConnectionSettings,
    session: Option<JolokiaSession>,
}

impl ConnectionManager {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self {
            settings,
            session: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> SessionResult<&JolokiaSession> {
        self.session.as_ref().ok_or(SessionError::NotConnected)
    }

    /// Establishes a session if none is live. Returns whether a new
    /// connection (and its settle delay) happened during this call.
    ///
    /// Exhausting the attempts leaves the manager disconnected; the caller
    /// retries on its next iteration.
    pub async fn ensure_connected(&mut self) -> SessionResult<bool> {
        if self.session.is_some() {
            return Ok(false);
        }

        let attempts = 1 + self.settings.num_retries;
        let mut last_error = SessionError::NotConnected;

        for attempt in 1..=attempts {
            match JolokiaSession::connect(
                &self.settings.base_url,
                &self.settings.credentials,
                self.settings.request_timeout_ms,
            )
            .await
            {
                Ok(session) => {
                    info!(url = %self.settings.base_url, attempt, "Connected to target");

                    // Let the remote JVM's counters accumulate before the
                    // first fetch of this connection.
                    if !self.settings.settle_delay.is_zero() {
                        tokio::time::sleep(self.settings.settle_delay).await;
                    }

                    self.session = Some(session);
                    return Ok(true);
                }
                Err(err) => {
                    warn!(
                        url = %self.settings.base_url,
                        attempt,
                        attempts,
                        error = %err,
                        "Connection attempt failed"
                    );
                    last_error = err;
                }
            }
        }

        Err(last_error)
    }

    /// Drops the session. The next `ensure_connected` starts from scratch.
    pub fn close(&mut self) {
        if self.session.take().is_some() {
            info!(url = %self.settings.base_url, "Connection closed");
        }
    }
}
