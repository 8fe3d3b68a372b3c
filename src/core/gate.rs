//! Access gate - shared-code unlock persisted across restarts
//!
//! A convenience gate, not a security boundary: one shared code, no lockout, no
//! attempt counting.

use tracing::{info, warn};

use crate::error::{Result, StreamSaverError};
use crate::storage::kv::KvStore;
use crate::types::Session;

/// Key of the persisted unlock flag
pub const UNLOCK_KEY: &str = "streamSaverAuth";
const UNLOCKED: &str = "true";

#[derive(Debug, Clone)]
pub struct AccessGate {
    secret: String,
    store: KvStore,
}

impl AccessGate {
    pub fn new(secret: impl Into<String>, store: KvStore) -> Self {
        Self {
            secret: secret.into(),
            store,
        }
    }

    /// Read the persisted flag. Anything but `"true"`, including a read error, is locked.
    pub async fn restore(&self) -> Session {
        let authenticated = match self.store.get(UNLOCK_KEY).await {
            Ok(value) => value.as_deref() == Some(UNLOCKED),
            Err(e) => {
                warn!(error = %e, "could not read unlock flag, starting locked");
                false
            }
        };
        Session { authenticated }
    }

    /// Unlock iff `code` equals the secret exactly
    pub async fn submit_code(&self, session: &mut Session, code: &str) -> Result<()> {
        if code != self.secret {
            info!("access code rejected");
            return Err(StreamSaverError::AuthRejected);
        }

        self.store.set(UNLOCK_KEY, UNLOCKED).await?;
        session.authenticated = true;
        info!("session unlocked");
        Ok(())
    }

    /// Lock the session and erase the persisted flag
    pub async fn logout(&self, session: &mut Session) -> Result<()> {
        session.authenticated = false;
        self.store.remove(UNLOCK_KEY).await
    }
}
