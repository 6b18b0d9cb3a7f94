//! Auth change notifications.
//!
//! A tokio watch channel carrying the latest auth transition. Listeners
//! such as the transition logger subscribe explicitly and hold their own
//! receiver, so a slow listener never blocks the store and late subscribers
//! see the most recent state.

use tokio::sync::watch;

/// A transition of the cached auth session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChange {
    /// Login or registration succeeded.
    LoggedIn,
    /// The user logged out.
    LoggedOut,
    /// The backend rejected the token; the session was cleared without an
    /// explicit logout.
    SessionExpired,
}

/// Latest signal on the channel. The sequence number distinguishes repeated
/// transitions of the same kind (logout after re-login after logout).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSignal {
    pub seq: u64,
    pub last: Option<AuthChange>,
}

/// Broadcast side of the auth notification channel.
#[derive(Debug, Clone)]
pub struct AuthEvents {
    sender: watch::Sender<AuthSignal>,
}

impl AuthEvents {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(AuthSignal { seq: 0, last: None });
        Self { sender }
    }

    /// Publish a transition to all subscribers.
    pub fn notify(&self, change: AuthChange) {
        self.sender.send_modify(|signal| {
            signal.seq += 1;
            signal.last = Some(change);
        });
    }

    /// Subscribe to future transitions.
    #[must_use]
    pub fn subscribe(&self) -> AuthWatcher {
        AuthWatcher {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side; one per listener.
#[derive(Debug, Clone)]
pub struct AuthWatcher {
    receiver: watch::Receiver<AuthSignal>,
}

impl AuthWatcher {
    /// Wait for the next transition after the last one seen by this watcher.
    /// Returns `None` when the store side is gone.
    pub async fn changed(&mut self) -> Option<AuthChange> {
        self.receiver.changed().await.ok()?;
        self.receiver.borrow_and_update().last
    }

    /// The most recent transition without waiting.
    #[must_use]
    pub fn latest(&self) -> AuthSignal {
        *self.receiver.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notify_reaches_subscriber() {
        let events = AuthEvents::new();
        let mut watcher = events.subscribe();
        assert_eq!(watcher.latest().last, None);

        events.notify(AuthChange::LoggedIn);
        assert_eq!(watcher.changed().await, Some(AuthChange::LoggedIn));
    }

    #[tokio::test]
    async fn test_repeated_transitions_bump_seq() {
        let events = AuthEvents::new();
        let watcher = events.subscribe();

        events.notify(AuthChange::LoggedOut);
        events.notify(AuthChange::LoggedOut);

        let signal = watcher.latest();
        assert_eq!(signal.seq, 2);
        assert_eq!(signal.last, Some(AuthChange::LoggedOut));
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_current_state() {
        let events = AuthEvents::new();
        events.notify(AuthChange::LoggedIn);

        let watcher = events.subscribe();
        assert_eq!(watcher.latest().last, Some(AuthChange::LoggedIn));
    }
}
