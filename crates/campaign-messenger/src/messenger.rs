// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: Apache-2.0
//!
//! Messenger adapter contract (§4.6). The executor consumes a single
//! capability, `send`, and never sees whatever UI automation backs it —
//! this crate only fixes the normalization, classification and timeout
//! rules every implementation must honor.

use std::time::Duration;

use async_trait::async_trait;
use campaign_core::{Attachment, CoreError};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Bounded overall timeout per message, upload included.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(120);

/// Delay after a send completes, to let the external UI commit before the
/// next action touches the same session.
pub const POST_SEND_SETTLE: Duration = Duration::from_millis(400);

/// Substrings a driver's raw error text is checked against to classify a
/// failure as a non-transient bad recipient rather than a transient fault.
const INVALID_RECIPIENT_MARKERS: &[&str] = &[
    "not a valid phone",
    "number not found",
    "not registered",
    "invalid recipient",
    "no account associated",
];

#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub sent_at: DateTime<Utc>,
}

/// The capability the executor drives a send through. Implementations own
/// whatever external UI automation sits behind `send`; this crate only
/// prescribes normalization, classification and timeout behavior.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, phone: &str, text: &str, attachments: &[Attachment]) -> Result<SendOutcome, CoreError>;
}

/// Drop everything but digits; a leading `+` is dropped along with any other
/// non-digit punctuation.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Classify a driver's raw error text into the appropriate [`CoreError`]
/// variant. Real drivers should route their failures through this so the
/// executor's retry policy (§4.2: per-entry failures never retried in-loop,
/// transient store failures retried once) sees a consistent error shape.
pub fn classify_error(raw: &str) -> CoreError {
    let lower = raw.to_lowercase();
    if INVALID_RECIPIENT_MARKERS.iter().any(|m| lower.contains(m)) {
        CoreError::RecipientInvalid(raw.to_string())
    } else {
        CoreError::MessengerTransient(raw.to_string())
    }
}

/// Run `fut` under [`DEFAULT_SEND_TIMEOUT`], mapping an elapsed deadline to
/// a transient error so the executor's single entry failure handling (not a
/// store-level retry) takes over.
pub async fn with_send_timeout<F, T>(fut: F) -> Result<T, CoreError>
where
    F: std::future::Future<Output = Result<T, CoreError>>,
{
    match tokio::time::timeout(DEFAULT_SEND_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(CoreError::MessengerTransient(format!(
            "send timed out after {:?}",
            DEFAULT_SEND_TIMEOUT
        ))),
    }
}

/// Deterministic stand-in for a browser-automation driven send, used by the
/// runtime crate's tests and by the `campaignctl` demo binary. Phones in
/// `refuse` are answered with a driver-style invalid-recipient string;
/// phones in `flaky` fail transiently for their first `flaky` attempts then
/// succeed.
pub struct MockMessenger {
    refuse: Vec<String>,
    flaky: Mutex<std::collections::HashMap<String, u32>>,
    settle: Duration,
}

impl Default for MockMessenger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMessenger {
    pub fn new() -> Self {
        Self {
            refuse: Vec::new(),
            flaky: Mutex::new(std::collections::HashMap::new()),
            settle: POST_SEND_SETTLE,
        }
    }

    pub fn with_refused(mut self, phones: impl IntoIterator<Item = String>) -> Self {
        self.refuse = phones.into_iter().collect();
        self
    }

    /// `phone` fails transiently for its first `attempts` sends, then
    /// succeeds — exercises the executor's per-entry failure path without
    /// a store-level retry.
    pub async fn make_flaky(&self, phone: &str, attempts: u32) {
        self.flaky.lock().await.insert(normalize_phone(phone), attempts);
    }

    /// Skip the settle delay — unit tests that exercise many sends
    /// shouldn't pay real wall-clock time for it.
    pub fn instant() -> Self {
        Self {
            settle: Duration::ZERO,
            ..Self::new()
        }
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send(&self, phone: &str, text: &str, attachments: &[Attachment]) -> Result<SendOutcome, CoreError> {
        let normalized = normalize_phone(phone);
        with_send_timeout(async {
            if self.refuse.iter().any(|p| normalize_phone(p) == normalized) {
                return Err(classify_error("invalid recipient: no account associated with number"));
            }
            {
                let mut flaky = self.flaky.lock().await;
                if let Some(remaining) = flaky.get_mut(&normalized) {
                    if *remaining > 0 {
                        *remaining -= 1;
                        warn!(phone = %normalized, "mock messenger: simulated transient failure");
                        return Err(CoreError::MessengerTransient("simulated transient failure".into()));
                    }
                }
            }
            debug!(phone = %normalized, chars = text.len(), attachments = attachments.len(), "mock messenger: send accepted");
            tokio::time::sleep(self.settle).await;
            Ok(SendOutcome { sent_at: Utc::now() })
        })
        .await
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_phone_drops_plus_and_punctuation() {
        assert_eq!(normalize_phone("+20 100-123-4567"), "201001234567");
    }

    #[test]
    fn classify_recognizes_known_invalid_markers() {
        assert!(matches!(
            classify_error("Error: number not found on WhatsApp"),
            CoreError::RecipientInvalid(_)
        ));
        assert!(matches!(classify_error("network reset"), CoreError::MessengerTransient(_)));
    }

    #[tokio::test]
    async fn refused_phone_is_classified_non_transient() {
        let messenger = MockMessenger::instant().with_refused(["201001234567".to_string()]);
        let err = messenger.send("+20 100 123 4567", "hi", &[]).await.unwrap_err();
        assert!(matches!(err, CoreError::RecipientInvalid(_)));
    }

    #[tokio::test]
    async fn flaky_phone_succeeds_after_configured_attempts() {
        let messenger = MockMessenger::instant();
        messenger.make_flaky("201", 2).await;
        assert!(matches!(messenger.send("201", "hi", &[]).await, Err(CoreError::MessengerTransient(_))));
        assert!(matches!(messenger.send("201", "hi", &[]).await, Err(CoreError::MessengerTransient(_))));
        assert!(messenger.send("201", "hi", &[]).await.is_ok());
    }

    #[tokio::test]
    async fn ordinary_send_succeeds() {
        let messenger = MockMessenger::instant();
        assert!(messenger.send("201", "hello", &[]).await.is_ok());
    }
}
