use std::net::SocketAddr;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use solarquote::config::Config;
use solarquote::db;
use solarquote::models::*;
use solarquote::routes;
use solarquote::services::ai_chat::AiChatClient;
use solarquote::services::rate_limiter::{self, EndpointClass, RateLimiter};
use solarquote::services::roles::RoleResolver;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SolarQuote API",
        version = "1.0.0",
        description = "API pubbliche del sito preventivi solari (assistente AI, newsletter, preventivi, sessione)",
        license(name = "MIT"),
    ),
    paths(
        solarquote::routes::health::health_check,
        solarquote::routes::auth::get_session,
        solarquote::routes::auth::logout,
        solarquote::routes::chat::chat,
        solarquote::routes::newsletter::subscribe,
        solarquote::routes::quotes::submit_quote,
    ),
    components(schemas(
        HealthResponse,
        ErrorResponse,
        SessionResponse,
        Role,
        ChatMessage,
        ChatRequest,
        ChatResponse,
        NewsletterRequest,
        NewsletterResponse,
        QuoteRequest,
        QuoteCreatedResponse,
    )),
    tags(
        (name = "Sistema", description = "Health check"),
        (name = "Auth", description = "Sessione corrente"),
        (name = "Assistente", description = "Chat con l'assistente AI"),
        (name = "Newsletter", description = "Iscrizione newsletter"),
        (name = "Preventivi", description = "Richieste di preventivo"),
    ),
    servers(
        (url = "http://localhost:4000", description = "Server locale"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Carica variabili da .env
    dotenvy::dotenv().ok();

    // Inizializza logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solarquote=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Carica configurazione
    let config = Config::from_env();

    tracing::info!("Connessione al database: {}", config.database_url);

    let db_pool = match db::init_db(&config.database_url).await {
        Ok(pool) => {
            tracing::info!("Database SQLite inizializzato");
            pool
        }
        Err(e) => {
            tracing::error!("Errore inizializzazione database: {}", e);
            std::process::exit(1);
        }
    };

    let ai = match AiChatClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Errore creazione client AI: {}", e);
            std::process::exit(1);
        }
    };

    // Store dei contatori rate limit, condiviso da tutte le route
    let rate_limiter = RateLimiter::new();
    rate_limiter::spawn_sweeper(rate_limiter.clone(), config.rate_limit_sweep_interval());

    let roles = RoleResolver::new(
        db_pool.clone(),
        config.role_lookup_timeout(),
        config.role_cache_ttl(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            axum::http::HeaderName::from_static("x-ratelimit-limit"),
            axum::http::HeaderName::from_static("x-ratelimit-remaining"),
            axum::http::HeaderName::from_static("x-ratelimit-reset"),
        ]);

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(routes::create_router(db_pool, rate_limiter, roles, ai.clone()))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .into_make_service_with_connect_info::<SocketAddr>();

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Indirizzo non valido {}:{}: {}", config.host, config.port, e);
            std::process::exit(1);
        }
    };

    tracing::info!("========================================");
    tracing::info!("  SolarQuote v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("========================================");
    tracing::info!("Server: http://{}", addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", addr);
    tracing::info!("----------------------------------------");
    tracing::info!("Aree protette:");
    tracing::info!("  /homeowner/*  - Solo proprietari");
    tracing::info!("  /installer/*  - Solo installatori");
    tracing::info!("  /admin/*      - Utenti autenticati");
    tracing::info!("----------------------------------------");
    tracing::info!("Endpoints API:");
    tracing::info!("  GET  /api/health          - Health check");
    tracing::info!("  GET  /api/auth/session    - Sessione corrente");
    tracing::info!("  POST /api/auth/logout     - Logout");
    tracing::info!("  POST /api/chat            - Assistente AI");
    tracing::info!("  POST /api/newsletter      - Iscrizione newsletter");
    tracing::info!("  POST /api/quotes          - Richiesta preventivo");
    tracing::info!("----------------------------------------");
    tracing::info!("Rate limit (finestra fissa):");
    for class in EndpointClass::ALL {
        let policy = class.policy();
        tracing::info!(
            "  {:<8} {} richieste / {}s",
            class.as_str(),
            policy.max_requests,
            policy.window.as_secs()
        );
    }
    tracing::info!("----------------------------------------");
    if ai.is_configured() {
        tracing::info!("Assistente AI: Configurato ({})", config.ai_model);
    } else {
        tracing::warn!("Assistente AI: NON configurato (imposta AI_API_KEY)");
    }

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Impossibile aprire {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Errore server: {}", e);
    }
}
