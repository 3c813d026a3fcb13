use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::db::{installers, DbPool};
use crate::models::Role;

#[derive(Error, Debug)]
pub enum RoleLookupError {
    #[error("lookup ruolo oltre il timeout di {0:?}")]
    Timeout(Duration),

    #[error("lookup ruolo fallito: {0}")]
    Database(#[from] sqlx::Error),
}

/// Risolve il ruolo di un utente dalla presenza di un record installatore.
///
/// Il lookup ha un timeout; con `cache_ttl > 0` gli esiti positivi vengono
/// tenuti in cache per utente. Gli errori non vengono mai messi in cache.
#[derive(Clone)]
pub struct RoleResolver {
    db: DbPool,
    timeout: Duration,
    cache_ttl: Duration,
    cache: Arc<RwLock<HashMap<String, (Role, Instant)>>>,
}

impl RoleResolver {
    pub fn new(db: DbPool, timeout: Duration, cache_ttl: Duration) -> Self {
        Self {
            db,
            timeout,
            cache_ttl,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn resolve(&self, user_id: &str) -> Result<Role, RoleLookupError> {
        if let Some(role) = self.cached(user_id) {
            return Ok(role);
        }

        let lookup = installers::is_installer(&self.db, user_id);
        let is_installer = tokio::time::timeout(self.timeout, lookup)
            .await
            .map_err(|_| RoleLookupError::Timeout(self.timeout))??;

        let role = Role::from_installer_presence(is_installer);
        self.store(user_id, role);
        Ok(role)
    }

    fn cached(&self, user_id: &str) -> Option<Role> {
        if self.cache_ttl.is_zero() {
            return None;
        }
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache
            .get(user_id)
            .filter(|(_, stored)| stored.elapsed() < self.cache_ttl)
            .map(|(role, _)| *role)
    }

    fn store(&self, user_id: &str, role: Role) {
        if self.cache_ttl.is_zero() {
            return;
        }
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Pulisci le voci scadute
        let now = Instant::now();
        cache.retain(|_, (_, stored)| now.duration_since(*stored) < self.cache_ttl);
        cache.insert(user_id.to_string(), (role, now));
    }

    /// Dimentica il ruolo in cache di un utente (es. al logout)
    pub fn invalidate(&self, user_id: &str) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id);
    }
}
