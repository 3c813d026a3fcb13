//! Controllo accessi per le route protette.
//!
//! Ogni richiesta passa da qui prima delle pagine: si classifica il path, si
//! risolve la sessione e, se serve, il ruolo (homeowner/installer), poi si
//! decide tra pass-through e redirect. Il gate non modifica mai sessione o ruolo.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use crate::config::paths;
use crate::db::{sessions, DbPool};
use crate::models::{Caller, Role, Session};
use crate::services::roles::RoleResolver;
use crate::utils::session_token;

/// Stato per il middleware del gate
#[derive(Clone)]
pub struct GateState {
    pub db: DbPool,
    pub roles: RoleResolver,
}

/// Chi puo' accedere a un'area protetta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteScope {
    Homeowner,
    Installer,
    /// Qualsiasi utente autenticato
    Authenticated,
}

/// Classificazione statica di un path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    /// Pagine di login/registrazione
    EntryPoint,
    Protected(RouteScope),
}

/// Stato del chiamante noto al gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerState {
    Anonymous,
    Authenticated(Role),
    /// Sessione valida ma lookup del ruolo fallito
    RoleUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(String),
}

const PROTECTED_PREFIXES: [(&str, RouteScope); 3] = [
    (paths::HOMEOWNER_PREFIX, RouteScope::Homeowner),
    (paths::INSTALLER_PREFIX, RouteScope::Installer),
    (paths::ADMIN_PREFIX, RouteScope::Authenticated),
];

const ENTRY_POINTS: [&str; 2] = [paths::LOGIN, paths::SIGNUP];

/// `/installer` copre `/installer` e `/installer/...`, non `/installers`
fn under_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

pub fn classify(path: &str) -> RouteClass {
    if let Some((_, scope)) = PROTECTED_PREFIXES
        .iter()
        .find(|(prefix, _)| under_prefix(path, prefix))
    {
        return RouteClass::Protected(*scope);
    }

    if ENTRY_POINTS.iter().any(|entry| under_prefix(path, entry)) {
        return RouteClass::EntryPoint;
    }

    RouteClass::Public
}

/// URL di login con la destinazione originale
pub fn login_redirect(original_path: &str) -> String {
    format!(
        "{}?{}={}",
        paths::LOGIN,
        paths::REDIRECT_PARAM,
        urlencoding::encode(original_path)
    )
}

/// Decisione del gate per un path e lo stato del chiamante
pub fn decide(path: &str, caller: &CallerState) -> GateDecision {
    match (classify(path), caller) {
        (RouteClass::Public, _) => GateDecision::Allow,

        // Utente gia' autenticato sulle pagine di ingresso: alla sua dashboard
        (RouteClass::EntryPoint, CallerState::Authenticated(role)) => {
            GateDecision::Redirect(role.home_path().to_string())
        }
        (RouteClass::EntryPoint, _) => GateDecision::Allow,

        (RouteClass::Protected(_), CallerState::Anonymous) => {
            GateDecision::Redirect(login_redirect(path))
        }
        (RouteClass::Protected(_), CallerState::RoleUnavailable) => {
            GateDecision::Redirect(paths::LANDING.to_string())
        }

        (RouteClass::Protected(RouteScope::Installer), CallerState::Authenticated(role))
            if *role != Role::Installer =>
        {
            GateDecision::Redirect(paths::HOMEOWNER_HOME.to_string())
        }
        (RouteClass::Protected(RouteScope::Homeowner), CallerState::Authenticated(Role::Installer)) => {
            GateDecision::Redirect(paths::INSTALLER_HOME.to_string())
        }
        (RouteClass::Protected(_), CallerState::Authenticated(_)) => GateDecision::Allow,
    }
}

/// Sessione valida della richiesta, se presente.
///
/// Un errore del lookup vale come "nessuna sessione".
pub async fn current_session(db: &DbPool, token: Option<String>) -> Option<Session> {
    let token = token?;
    match sessions::find_active_session(db, &token, Utc::now()).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Errore lookup sessione: {}", e);
            None
        }
    }
}

/// Middleware del gate
pub async fn access_gate(
    State(state): State<GateState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let class = classify(&path);

    if class == RouteClass::Public {
        return next.run(request).await;
    }

    let token = session_token(request.headers());
    let session = current_session(&state.db, token).await;

    let caller = match &session {
        None => CallerState::Anonymous,
        Some(session) => match state.roles.resolve(&session.user_id).await {
            Ok(role) => CallerState::Authenticated(role),
            Err(e) => {
                tracing::warn!(
                    "Ruolo non risolvibile per utente {} su {}: {}",
                    session.user_id,
                    path,
                    e
                );
                CallerState::RoleUnavailable
            }
        },
    };

    match decide(&path, &caller) {
        GateDecision::Redirect(target) => {
            tracing::debug!("Gate: {} -> {}", path, target);
            Redirect::temporary(&target).into_response()
        }
        GateDecision::Allow => {
            if let (Some(session), CallerState::Authenticated(role)) = (session, caller) {
                request.extensions_mut().insert(Caller {
                    user_id: session.user_id,
                    role,
                });
            }
            next.run(request).await
        }
    }
}
