use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::paths;

/// Ruolo derivato del chiamante.
///
/// Non e' salvato sulla sessione: e' `Installer` se esiste un record
/// installatore per l'utente, altrimenti `Homeowner`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Homeowner,
    Installer,
}

impl Role {
    pub fn from_installer_presence(is_installer: bool) -> Self {
        if is_installer {
            Role::Installer
        } else {
            Role::Homeowner
        }
    }

    /// Dashboard di riferimento per il ruolo
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Homeowner => paths::HOMEOWNER_HOME,
            Role::Installer => paths::INSTALLER_HOME,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Homeowner => write!(f, "homeowner"),
            Role::Installer => write!(f, "installer"),
        }
    }
}

/// Sessione emessa dal backend di autenticazione, letta e mai modificata dal gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Chiamante autenticato, inserito come extension dal gate sulle route protette
#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}
