use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Messaggio della conversazione con l'assistente
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    /// "user" oppure "assistant"
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewsletterRequest {
    pub email: String,
}

/// Richiesta di preventivo dal calcolatore pubblico
#[derive(Debug, Deserialize, ToSchema)]
pub struct QuoteRequest {
    pub name: String,
    pub email: String,
    /// CAP a 5 cifre
    pub zip_code: String,
    /// Bolletta elettrica mensile media
    pub monthly_bill: f64,
    pub roof_type: Option<String>,
    pub message: Option<String>,
}
