//! Generated content: fruit facts and break-activity suggestions.
//!
//! Lookups go through a [`ContentService`]. The engine never calls the
//! service directly - it uses [`fruit_fact_or_fallback`] and
//! [`break_activity_or_fallback`], which bound the call with a timeout and
//! substitute a fixed local answer on any failure.

pub mod gemini;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ContentError;
use crate::reward::FruitKind;

pub use gemini::GeminiClient;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Used when the fact lookup fails.
pub const FALLBACK_FACT: &str = "Great job growing this fruit!";
/// Used when the service answers with nothing.
pub const EMPTY_FACT: &str = "Fruits are nature's candy!";

/// A short activity suggested for the break after a focus session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakActivity {
    pub title: String,
    pub description: String,
    pub emoji: String,
}

impl BreakActivity {
    pub fn fallback() -> Self {
        Self {
            title: "Stretch & Wiggle!".into(),
            description: "Stand up, stretch your arms to the sky, and wiggle your toes!".into(),
            emoji: "🧘".into(),
        }
    }
}

#[async_trait]
pub trait ContentService: Send + Sync {
    /// One-sentence fun fact about `fruit`.
    async fn fruit_fact(&self, fruit: FruitKind) -> Result<String, ContentError>;

    /// A five-minute break activity for someone who just studied `subject`.
    async fn break_activity(&self, subject: &str) -> Result<BreakActivity, ContentError>;
}

/// Service that never answers. Every lookup resolves to its fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineContent;

#[async_trait]
impl ContentService for OfflineContent {
    async fn fruit_fact(&self, _fruit: FruitKind) -> Result<String, ContentError> {
        Err(ContentError::Disabled)
    }

    async fn break_activity(&self, _subject: &str) -> Result<BreakActivity, ContentError> {
        Err(ContentError::Disabled)
    }
}

pub async fn fruit_fact_or_fallback(
    service: &dyn ContentService,
    fruit: FruitKind,
    timeout: Duration,
) -> String {
    let result = match tokio::time::timeout(timeout, service.fruit_fact(fruit)).await {
        Ok(result) => result,
        Err(_) => Err(ContentError::Timeout(timeout)),
    };
    match result {
        Ok(fact) if fact.trim().is_empty() => EMPTY_FACT.to_string(),
        Ok(fact) => fact.trim().to_string(),
        Err(ContentError::EmptyResponse) => EMPTY_FACT.to_string(),
        Err(e) => {
            tracing::warn!(fruit = %fruit, error = %e, "fruit fact lookup failed, using fallback");
            FALLBACK_FACT.to_string()
        }
    }
}

pub async fn break_activity_or_fallback(
    service: &dyn ContentService,
    subject: &str,
    timeout: Duration,
) -> BreakActivity {
    let result = match tokio::time::timeout(timeout, service.break_activity(subject)).await {
        Ok(result) => result,
        Err(_) => Err(ContentError::Timeout(timeout)),
    };
    match result {
        Ok(activity) => activity,
        Err(e) => {
            tracing::warn!(subject, error = %e, "break activity lookup failed, using fallback");
            BreakActivity::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl ContentService for Fixed {
        async fn fruit_fact(&self, _fruit: FruitKind) -> Result<String, ContentError> {
            Ok(self.0.to_string())
        }

        async fn break_activity(&self, subject: &str) -> Result<BreakActivity, ContentError> {
            Ok(BreakActivity {
                title: format!("{subject} charades"),
                description: self.0.to_string(),
                emoji: "🎭".into(),
            })
        }
    }

    struct Stalled;

    #[async_trait]
    impl ContentService for Stalled {
        async fn fruit_fact(&self, _fruit: FruitKind) -> Result<String, ContentError> {
            std::future::pending().await
        }

        async fn break_activity(&self, _subject: &str) -> Result<BreakActivity, ContentError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn offline_service_falls_back() {
        let fact = fruit_fact_or_fallback(&OfflineContent, FruitKind::Apple, DEFAULT_TIMEOUT).await;
        assert_eq!(fact, FALLBACK_FACT);
        let activity = break_activity_or_fallback(&OfflineContent, "Math", DEFAULT_TIMEOUT).await;
        assert_eq!(activity, BreakActivity::fallback());
    }

    #[tokio::test]
    async fn blank_fact_uses_empty_fallback() {
        let fact = fruit_fact_or_fallback(&Fixed("   "), FruitKind::Lemon, DEFAULT_TIMEOUT).await;
        assert_eq!(fact, EMPTY_FACT);
    }

    #[tokio::test]
    async fn successful_answers_pass_through() {
        let fact = fruit_fact_or_fallback(&Fixed(" Lemons float. "), FruitKind::Lemon, DEFAULT_TIMEOUT).await;
        assert_eq!(fact, "Lemons float.");
        let activity = break_activity_or_fallback(&Fixed("Act it out"), "Science", DEFAULT_TIMEOUT).await;
        assert_eq!(activity.title, "Science charades");
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_lookups_time_out() {
        let timeout = Duration::from_secs(2);
        let fact = fruit_fact_or_fallback(&Stalled, FruitKind::Cherry, timeout).await;
        assert_eq!(fact, FALLBACK_FACT);
        let activity = break_activity_or_fallback(&Stalled, "Art", timeout).await;
        assert_eq!(activity, BreakActivity::fallback());
    }
}
