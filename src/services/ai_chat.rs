//! Proxy verso il provider di chat AI (API compatibile OpenAI chat completions)

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::ChatMessage;

const SYSTEM_PROMPT: &str = "Sei l'assistente di SolarQuote. Aiuti i proprietari di casa a capire \
costi, risparmi e incentivi degli impianti fotovoltaici e a richiedere preventivi agli installatori. \
Rispondi in modo conciso e non inventare prezzi specifici.";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ProviderMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ProviderMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct AiChatClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl AiChatClient {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("client AI: {}", e)))?;

        Ok(Self {
            http,
            api_url,
            api_key,
            model,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.ai_api_url.clone(),
            config.ai_api_key.clone(),
            config.ai_model.clone(),
            Duration::from_secs(config.ai_timeout_secs),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Invia la conversazione al provider e ritorna la risposta dell'assistente.
    ///
    /// Nessun retry automatico: ogni errore del provider diventa `AppError::Upstream`.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ServiceUnavailable("assistente AI non configurato".to_string()))?;

        let mut provider_messages = Vec::with_capacity(messages.len() + 1);
        provider_messages.push(ProviderMessage {
            role: "system",
            content: SYSTEM_PROMPT,
        });
        provider_messages.extend(messages.iter().map(|m| ProviderMessage {
            role: m.role.as_str(),
            content: m.content.as_str(),
        }));

        let body = CompletionRequest {
            model: &self.model,
            messages: provider_messages,
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("richiesta al provider fallita: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "provider ha risposto {}: {}",
                status,
                detail.chars().take(500).collect::<String>()
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("risposta provider non valida: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::Upstream("risposta provider vuota".to_string()))
    }
}
