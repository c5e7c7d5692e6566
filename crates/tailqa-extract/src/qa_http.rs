//! HTTP client for a hosted extractive-QA inference service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use tailqa_core::config::QaBackendConfig;
use tailqa_core::{QaAnswer, Result, TailqaError};

use crate::QaModel;

/// HTTP-backed QA model client
pub struct HttpQaModel {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct QaRequest {
    model: String,
    question: String,
    context: String,
}

#[derive(Debug, Deserialize)]
struct QaResponse {
    answer: String,
    score: f64,
}

impl HttpQaModel {
    /// Create from config
    pub fn from_config(config: &QaBackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TailqaError::QaBackend(format!("Failed to build client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl QaModel for HttpQaModel {
    async fn answer(&self, question: &str, context: &str) -> Result<QaAnswer> {
        let request = QaRequest {
            model: self.model.clone(),
            question: question.to_string(),
            context: context.to_string(),
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TailqaError::QaBackend(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TailqaError::QaBackend(format!(
                "QA service error: {error_text}"
            )));
        }

        let result: QaResponse = response
            .json()
            .await
            .map_err(|e| TailqaError::QaBackend(format!("Failed to parse response: {e}")))?;

        Ok(QaAnswer {
            answer: result.answer,
            score: result.score,
        })
    }
}
