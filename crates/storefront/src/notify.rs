//! Toast notification queue.
//!
//! An ephemeral, timer-driven queue of at most five visible toasts. Each
//! toast carries its own independent auto-dismiss timer; removal is
//! two-phase (mark as removing, delete after the exit-animation delay) so
//! the UI can animate the exit. [`ToastCenter::wrap`] covers the common
//! "loading -> success/error" pattern around an async operation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

/// Maximum number of toasts visible at once; the oldest is evicted first.
const MAX_VISIBLE: usize = 5;

/// Default auto-dismiss duration.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(4000);

/// Delay between marking a toast as removing and deleting it, matching the
/// exit animation length.
const EXIT_ANIMATION: Duration = Duration::from_millis(300);

const DEFAULT_LOADING: &str = "Loading...";
const DEFAULT_SUCCESS: &str = "Operation completed successfully";

/// Toast identifier: epoch milliseconds plus a random suffix, unique enough
/// for a queue that never holds more than five entries.
pub type ToastId = u64;

/// Visual category of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Info,
    Success,
    Error,
    Warning,
    /// Sticky spinner for an in-flight operation; never self-dismisses.
    Loading,
}

impl ToastKind {
    /// CSS class suffix for templates.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Loading => "loading",
        }
    }
}

/// One visible notification.
#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
    /// Auto-dismiss delay in milliseconds; 0 means sticky.
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
    /// Set while the exit animation plays, before deletion.
    pub is_removing: bool,
}

/// Messages for [`ToastCenter::wrap`].
#[derive(Debug, Clone)]
pub struct WrapMessages {
    pub loading: String,
    pub success: String,
    /// Error text; when `None`, the operation's own error display is used.
    pub error: Option<String>,
}

impl WrapMessages {
    /// Messages with the given loading/success text and pass-through errors.
    #[must_use]
    pub fn new(loading: impl Into<String>, success: impl Into<String>) -> Self {
        Self {
            loading: loading.into(),
            success: success.into(),
            error: None,
        }
    }

    /// Override the error text.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl Default for WrapMessages {
    fn default() -> Self {
        Self::new(DEFAULT_LOADING, DEFAULT_SUCCESS)
    }
}

/// Shared notification queue.
///
/// Cheap to clone; timers run on the tokio runtime and are independent per
/// toast, so dismissing one never affects another.
#[derive(Debug, Clone, Default)]
pub struct ToastCenter {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl ToastCenter {
    /// Create an empty center.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a toast and start its auto-dismiss timer (unless sticky).
    ///
    /// The queue is truncated to the five most recent entries; evicted
    /// toasts disappear without an exit animation.
    pub fn push(&self, message: impl Into<String>, kind: ToastKind, duration: Duration) -> ToastId {
        let id = generate_id();
        let toast = Toast {
            id,
            message: message.into(),
            kind,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            created_at: Utc::now(),
            is_removing: false,
        };

        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.push(toast);
            let excess = toasts.len().saturating_sub(MAX_VISIBLE);
            if excess > 0 {
                toasts.drain(..excess);
            }
        }

        if !duration.is_zero() {
            let center = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                center.remove(id);
            });
        }

        id
    }

    /// Convenience: informational toast with the default duration.
    pub fn info(&self, message: impl Into<String>) -> ToastId {
        self.push(message, ToastKind::Info, DEFAULT_DURATION)
    }

    /// Convenience: success toast with the default duration.
    pub fn success(&self, message: impl Into<String>) -> ToastId {
        self.push(message, ToastKind::Success, DEFAULT_DURATION)
    }

    /// Convenience: error toast with the default duration.
    pub fn error(&self, message: impl Into<String>) -> ToastId {
        self.push(message, ToastKind::Error, DEFAULT_DURATION)
    }

    /// Convenience: warning toast with the default duration.
    pub fn warning(&self, message: impl Into<String>) -> ToastId {
        self.push(message, ToastKind::Warning, DEFAULT_DURATION)
    }

    /// Begin removing a toast: mark it so the exit animation plays, then
    /// delete it after the animation delay. Unknown IDs and toasts already
    /// on their way out are no-ops.
    pub fn remove(&self, id: ToastId) {
        {
            let Ok(mut toasts) = self.toasts.lock() else {
                return;
            };
            let Some(toast) = toasts.iter_mut().find(|t| t.id == id && !t.is_removing) else {
                return;
            };
            toast.is_removing = true;
        }

        let center = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(EXIT_ANIMATION).await;
            if let Ok(mut toasts) = center.toasts.lock() {
                toasts.retain(|t| t.id != id);
            }
        });
    }

    /// Run an operation behind a sticky loading toast, replacing it with a
    /// success or error toast when the operation settles. The result is
    /// returned unchanged so callers can still branch on failure.
    pub async fn wrap<T, E, F>(&self, messages: WrapMessages, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let loading_id = self.push(&messages.loading, ToastKind::Loading, Duration::ZERO);

        let result = operation.await;
        self.remove(loading_id);

        match &result {
            Ok(_) => {
                self.success(&messages.success);
            }
            Err(e) => {
                let text = messages.error.unwrap_or_else(|| e.to_string());
                self.error(text);
            }
        }

        result
    }

    /// Snapshot of the queue in insertion order (oldest first).
    #[must_use]
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Whether the queue currently holds no toasts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.toasts.lock().map(|t| t.is_empty()).unwrap_or(true)
    }
}

/// Per-visitor toast queues.
///
/// Toasts are feedback for one visitor, so each visitor gets an isolated
/// [`ToastCenter`] keyed by an opaque identifier held in their session.
/// Empty centers are pruned on access; a pruned entry is indistinguishable
/// from a fresh one, so nothing is lost.
#[derive(Debug, Clone, Default)]
pub struct ToastRegistry {
    centers: Arc<Mutex<HashMap<String, ToastCenter>>>,
}

impl ToastRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The visitor's own toast center, created on first access.
    #[must_use]
    pub fn for_visitor(&self, visitor: &str) -> ToastCenter {
        let Ok(mut centers) = self.centers.lock() else {
            return ToastCenter::new();
        };
        centers.retain(|key, center| key == visitor || !center.is_empty());
        centers.entry(visitor.to_owned()).or_default().clone()
    }

    /// Number of visitor queues currently held.
    #[must_use]
    pub fn tracked_visitors(&self) -> usize {
        self.centers.lock().map(|c| c.len()).unwrap_or(0)
    }
}

fn generate_id() -> ToastId {
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    millis * 10_000 + rand::rng().random_range(0..10_000)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_push_caps_at_five_oldest_evicted() {
        let center = ToastCenter::new();
        let first = center.push("one", ToastKind::Info, Duration::ZERO);
        for n in 2..=6 {
            center.push(format!("toast {n}"), ToastKind::Info, Duration::ZERO);
        }

        let toasts = center.toasts();
        assert_eq!(toasts.len(), 5);
        assert!(toasts.iter().all(|t| t.id != first));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_dismiss_after_duration() {
        let center = ToastCenter::new();
        center.push("bye", ToastKind::Info, Duration::from_millis(100));
        assert_eq!(center.toasts().len(), 1);

        // Past the duration and the exit animation.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(center.toasts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sticky_toast_never_self_dismisses() {
        let center = ToastCenter::new();
        let id = center.push("working", ToastKind::Loading, Duration::ZERO);

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(center.toasts().len(), 1);

        center.remove(id);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(center.toasts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_is_two_phase() {
        let center = ToastCenter::new();
        let id = center.push("x", ToastKind::Info, Duration::ZERO);

        center.remove(id);
        let toasts = center.toasts();
        assert_eq!(toasts.len(), 1);
        assert!(toasts[0].is_removing);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(center.toasts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_are_independent() {
        let center = ToastCenter::new();
        center.push("short", ToastKind::Info, Duration::from_millis(100));
        center.push("long", ToastKind::Info, Duration::from_millis(10_000));

        tokio::time::sleep(Duration::from_millis(1000)).await;
        let toasts = center.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].message, "long");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrap_success_replaces_loading() {
        let center = ToastCenter::new();
        let messages = WrapMessages::new("Sending...", "Sent");

        let result: Result<u32, std::io::Error> =
            center.wrap(messages, async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);

        // Let the loading toast's exit animation finish.
        tokio::time::sleep(Duration::from_millis(500)).await;
        let toasts = center.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Success);
        assert_eq!(toasts[0].message, "Sent");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrap_failure_shows_error_and_propagates() {
        let center = ToastCenter::new();
        let messages = WrapMessages::new("Sending...", "Sent").with_error("Could not send order");

        let result: Result<(), String> = center
            .wrap(messages, async { Err("boom".to_owned()) })
            .await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_millis(500)).await;
        let toasts = center.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Error);
        assert_eq!(toasts[0].message, "Could not send order");
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_isolates_visitors() {
        let registry = ToastRegistry::new();
        registry.for_visitor("visitor-a").success("Welcome back, Ana!");

        let other = registry.for_visitor("visitor-b");
        assert!(other.toasts().is_empty());

        let own = registry.for_visitor("visitor-a").toasts();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].message, "Welcome back, Ana!");
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_cap_is_per_visitor() {
        let registry = ToastRegistry::new();
        for n in 1..=MAX_VISIBLE {
            registry.for_visitor("busy").info(format!("toast {n}"));
        }
        registry.for_visitor("quiet").info("just one");

        assert_eq!(registry.for_visitor("busy").toasts().len(), MAX_VISIBLE);
        assert_eq!(registry.for_visitor("quiet").toasts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_prunes_drained_queues() {
        let registry = ToastRegistry::new();
        registry
            .for_visitor("gone")
            .push("bye", ToastKind::Info, Duration::from_millis(100));
        assert_eq!(registry.tracked_visitors(), 1);

        // Past the duration and the exit animation.
        tokio::time::sleep(Duration::from_millis(500)).await;
        registry.for_visitor("here").info("hi");
        assert_eq!(registry.tracked_visitors(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrap_uses_operation_error_when_unset() {
        let center = ToastCenter::new();

        let result: Result<(), String> = center
            .wrap(WrapMessages::default(), async { Err("backend down".to_owned()) })
            .await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_millis(500)).await;
        let toasts = center.toasts();
        assert_eq!(toasts[0].message, "backend down");
    }
}
