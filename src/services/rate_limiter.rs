//! Rate limiter a finestra fissa, per identificativo client e classe di endpoint.
//!
//! Finestra fissa, non scorrevole: un client puo' inviare `max_requests`
//! richieste appena prima del reset e altrettante subito dopo, fino a 2x il
//! limite a cavallo del confine. Comportamento accettato, non va "corretto".

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Classi di endpoint con una propria policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointClass {
    Ai,
    Auth,
    Quotes,
    General,
}

impl EndpointClass {
    pub const ALL: [EndpointClass; 4] = [
        EndpointClass::Ai,
        EndpointClass::Auth,
        EndpointClass::Quotes,
        EndpointClass::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::Ai => "ai",
            EndpointClass::Auth => "auth",
            EndpointClass::Quotes => "quotes",
            EndpointClass::General => "general",
        }
    }

    /// Tabella delle policy, fissa all'avvio
    pub fn policy(&self) -> RateLimitPolicy {
        match self {
            EndpointClass::Ai => RateLimitPolicy::new(*self, Duration::from_secs(60), 10),
            EndpointClass::Auth => RateLimitPolicy::new(*self, Duration::from_secs(15 * 60), 5),
            EndpointClass::Quotes => RateLimitPolicy::new(*self, Duration::from_secs(60), 5),
            EndpointClass::General => RateLimitPolicy::new(*self, Duration::from_secs(60), 30),
        }
    }
}

impl std::fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Policy di una classe di endpoint: lunghezza finestra e massimo richieste.
///
/// I contatori sono per (classe, identificativo): due policy della stessa
/// classe condividono lo stesso contatore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub class: EndpointClass,
    pub window: Duration,
    pub max_requests: u32,
}

impl RateLimitPolicy {
    pub fn new(class: EndpointClass, window: Duration, max_requests: u32) -> Self {
        Self {
            class,
            window,
            max_requests,
        }
    }
}

/// Esito di un controllo
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Timestamp unix (secondi) per `X-RateLimit-Reset`
    pub fn reset_unix(&self) -> i64 {
        self.reset_at.timestamp()
    }

    pub fn retry_after_secs(&self) -> i64 {
        (self.reset_at - Utc::now()).num_seconds().max(1)
    }
}

#[derive(Debug, Clone)]
struct WindowEntry {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Store dei contatori, condiviso tra le richieste.
///
/// Il lock copre l'intera sequenza lettura-incremento di `check`, quindi due
/// richieste concorrenti non possono superare entrambe il limite.
#[derive(Clone, Default)]
pub struct RateLimiter {
    entries: Arc<Mutex<HashMap<(EndpointClass, String), WindowEntry>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, identifier: &str, policy: &RateLimitPolicy) -> RateLimitDecision {
        self.check_at(identifier, policy, Utc::now())
    }

    /// Come `check`, con l'istante corrente esplicito
    pub fn check_at(
        &self,
        identifier: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let key = (policy.class, identifier.to_string());
        let window = chrono::Duration::from_std(policy.window)
            .unwrap_or_else(|_| chrono::Duration::seconds(60));

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let entry = entries.entry(key).or_insert_with(|| WindowEntry {
            count: 0,
            reset_at: now + window,
        });

        // Finestra scaduta: si riparte da zero
        if now >= entry.reset_at {
            *entry = WindowEntry {
                count: 0,
                reset_at: now + window,
            };
        }

        if entry.count >= policy.max_requests {
            return RateLimitDecision {
                allowed: false,
                limit: policy.max_requests,
                remaining: 0,
                reset_at: entry.reset_at,
            };
        }

        entry.count += 1;

        RateLimitDecision {
            allowed: true,
            limit: policy.max_requests,
            remaining: policy.max_requests - entry.count,
            reset_at: entry.reset_at,
        }
    }

    /// Rimuove le finestre scadute, ritorna quante voci sono state eliminate
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| now < entry.reset_at);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Avvia il task di pulizia periodica dei contatori scaduti
pub fn spawn_sweeper(limiter: RateLimiter, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let removed = limiter.sweep();
            if removed > 0 {
                tracing::debug!(
                    "Rate limiter: rimosse {} finestre scadute, {} attive",
                    removed,
                    limiter.len()
                );
            }
        }
    })
}
