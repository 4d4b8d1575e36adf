//! Process-wide signed-in state.
//!
//! One [`SessionHub`] owns the current [`Session`]; views that care about it
//! hold a [`SessionSubscription`] for as long as they are active and drop it
//! when they are done, which unsubscribes them.

use std::sync::Arc;

use tokio::sync::watch;

use crate::core::{
    errors::{AppError, AppResult},
    types::{Session, SessionUser},
};

/// User id for the implicit session used when no hosted auth is configured.
pub const LOCAL_USER_ID: &str = "local";

#[derive(Clone)]
pub struct SessionHub {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl SessionHub {
    pub fn new(initial: Option<Session>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// The current session, or `Unauthorized` naming what needed it.
    pub fn require(&self, action: &str) -> AppResult<Session> {
        self.current()
            .ok_or_else(|| AppError::Unauthorized(format!("{action} needs a signed-in user")))
    }

    pub fn set(&self, session: Session) {
        tracing::debug!(user = %session.user.id, "session updated");
        self.tx.send_replace(Some(session));
    }

    /// Clears the session and returns the one that was active.
    pub fn clear(&self) -> Option<Session> {
        self.tx.send_replace(None)
    }

    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

pub struct SessionSubscription {
    rx: watch::Receiver<Option<Session>>,
}

impl SessionSubscription {
    pub fn current(&self) -> Option<Session> {
        self.rx.borrow().clone()
    }

    /// Waits for the next sign-in or sign-out. `None` once the hub is gone.
    pub async fn changed(&mut self) -> Option<Option<Session>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn unsubscribe(self) {}
}

pub fn local_session() -> Session {
    Session {
        access_token: String::new(),
        refresh_token: String::new(),
        expires_at: None,
        user: SessionUser {
            id: LOCAL_USER_ID.to_string(),
            email: None,
        },
    }
}
