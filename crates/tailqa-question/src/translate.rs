//! Translation-backed question generation
//!
//! The translation service itself is an external collaborator; this
//! module only defines the capability boundary and an HTTP client for it,
//! plus the loop that turns English property scaffolds into localized
//! questions one call at a time.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tailqa_core::config::TranslatorConfig;
use tailqa_core::{Property, Result, TailqaError};

use crate::english_scaffolds;

// ============================================================================
// Translator Capability
// ============================================================================

/// Capability boundary for the machine-translation service
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate one text into the configured target language
    async fn translate(&self, text: &str) -> Result<String>;
}

// ============================================================================
// HTTP Translator
// ============================================================================

/// HTTP client for a translation service
pub struct HttpTranslator {
    client: Client,
    endpoint: String,
    target_lang: String,
    /// Pause between calls to stay under the service rate limit
    pause: Duration,
}

#[derive(Debug, Serialize)]
struct TranslateRequest {
    text: String,
    target_lang: String,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translation: String,
}

impl HttpTranslator {
    pub fn new(endpoint: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            target_lang: target_lang.into(),
            pause: Duration::from_millis(300),
        }
    }

    /// Create from config
    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.clone(),
            target_lang: config.target_lang.clone(),
            pause: Duration::from_millis(config.pause_ms),
        }
    }

    /// Pause applied between consecutive calls
    pub fn pause(&self) -> Duration {
        self.pause
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        let request = TranslateRequest {
            text: text.to_string(),
            target_lang: self.target_lang.clone(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| TailqaError::Translation(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TailqaError::Translation(format!(
                "Translator error: {error_text}"
            )));
        }

        let result: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TailqaError::Translation(format!("Failed to parse response: {e}")))?;

        Ok(result.translation)
    }
}

// ============================================================================
// Translated Question Generation
// ============================================================================

/// Generate the translation-based question list for a property list.
///
/// Builds one English scaffold per property from its source label,
/// translates each scaffold, and returns the localized questions in
/// property order. Calls are sequential with `pause` between them; the
/// first failed call aborts the whole list.
pub async fn translated_questions(
    properties: &[Property],
    translator: &dyn Translator,
    pause: Duration,
) -> Result<Vec<String>> {
    let scaffolds = english_scaffolds(properties);
    let mut questions = Vec::with_capacity(scaffolds.len());

    for (idx, scaffold) in scaffolds.iter().enumerate() {
        let translated = translator.translate(scaffold).await?;
        debug!(scaffold, translated, "translated question");
        questions.push(translated);
        if idx + 1 < scaffolds.len() && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
    Ok(questions)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic stand-in for the translation service
    struct FakeTranslator {
        fail_on: Option<usize>,
        calls: std::sync::atomic::AtomicUsize,
    }

    impl FakeTranslator {
        fn new() -> Self {
            Self {
                fail_on: None,
                calls: std::sync::atomic::AtomicUsize::new(0),
            }
        }

        fn failing_on(call: usize) -> Self {
            Self {
                fail_on: Some(call),
                calls: std::sync::atomic::AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Translator for FakeTranslator {
        async fn translate(&self, text: &str) -> Result<String> {
            let call = self
                .calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if self.fail_on == Some(call) {
                return Err(TailqaError::Translation("service unavailable".to_string()));
            }
            Ok(format!("DE[{text}]"))
        }
    }

    fn props() -> Vec<Property> {
        vec![
            Property::new("Geburtsort", "birthPlace"),
            Property::new("Beruf", "occupation"),
        ]
    }

    #[tokio::test]
    async fn test_translated_questions_preserve_order() {
        let translator = FakeTranslator::new();
        let questions = translated_questions(&props(), &translator, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(
            questions,
            vec![
                "DE[What is the birthPlace of __?]".to_string(),
                "DE[What is the occupation of __?]".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_call_aborts_generation() {
        let translator = FakeTranslator::failing_on(1);
        let err = translated_questions(&props(), &translator, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, TailqaError::Translation(_)));
    }
}
