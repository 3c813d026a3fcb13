use serde::Serialize;
use utoipa::ToSchema;

use super::Role;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Stato del servizio
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

/// Stato della sessione corrente
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub user_id: Option<String>,
    /// Null se la sessione manca o il ruolo non e' risolvibile
    pub role: Option<Role>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NewsletterResponse {
    pub subscribed: bool,
    pub already_subscribed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteCreatedResponse {
    pub id: String,
    pub message: String,
}

/// Descrittore di una pagina pubblica (il rendering e' fuori da questo servizio)
#[derive(Debug, Serialize, ToSchema)]
pub struct PageResponse {
    pub page: String,
}

/// Shell della dashboard, dipende dal ruolo del chiamante
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub section: String,
    pub user_id: String,
    pub role: Role,
}
