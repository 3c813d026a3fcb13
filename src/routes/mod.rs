pub mod auth;
pub mod chat;
pub mod health;
pub mod newsletter;
pub mod pages;
pub mod quotes;

use axum::{http::Uri, middleware, Router};

use crate::db::DbPool;
use crate::error::AppError;
use crate::middleware::access_gate::{access_gate, GateState};
use crate::services::ai_chat::AiChatClient;
use crate::services::rate_limiter::RateLimiter;
use crate::services::roles::RoleResolver;

/// Router completo: pagine, API e gate davanti a tutto (fallback compreso,
/// cosi' anche i path protetti inesistenti passano dal controllo accessi)
pub fn create_router(
    db: DbPool,
    limiter: RateLimiter,
    roles: RoleResolver,
    ai: AiChatClient,
) -> Router {
    let gate_state = GateState {
        db: db.clone(),
        roles: roles.clone(),
    };

    Router::new()
        .merge(health::router())
        .merge(pages::router())
        .merge(auth::router(db.clone(), roles, limiter.clone()))
        .merge(chat::router(ai, limiter.clone()))
        .merge(newsletter::router(db.clone(), limiter.clone()))
        .merge(quotes::router(db, limiter))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(gate_state, access_gate))
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use chrono::Duration as ChronoDuration;
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::db::{installers, sessions, test_pool};
    use crate::services::ai_chat::tests::spawn_fake_provider;

    struct TestApp {
        router: Router,
        db: DbPool,
    }

    impl TestApp {
        async fn new() -> Self {
            Self::with_ai(None, None).await
        }

        async fn with_ai(url: Option<String>, key: Option<&str>) -> Self {
            let db = test_pool().await;
            let roles = RoleResolver::new(db.clone(), Duration::from_secs(2), Duration::ZERO);
            Self::build(db, roles, url, key)
        }

        fn build(db: DbPool, roles: RoleResolver, url: Option<String>, key: Option<&str>) -> Self {
            let ai = AiChatClient::new(
                url.unwrap_or_else(|| "http://127.0.0.1:9/unused".to_string()),
                key.map(str::to_string),
                "test-model".to_string(),
                Duration::from_secs(5),
            )
            .unwrap();
            let router = create_router(db.clone(), RateLimiter::new(), roles, ai);
            Self { router, db }
        }

        async fn session_for(&self, user_id: &str) -> String {
            let (token, _) = sessions::create_session(&self.db, user_id, ChronoDuration::hours(1))
                .await
                .unwrap();
            token
        }

        async fn installer_session(&self, user_id: &str) -> String {
            installers::add_installer(&self.db, user_id, "Sole Srl")
                .await
                .unwrap();
            self.session_for(user_id).await
        }

        async fn get(&self, path: &str, token: Option<&str>) -> Response {
            let mut req = Request::builder().uri(path);
            if let Some(token) = token {
                req = req.header(header::COOKIE, format!("sq_session={}", token));
            }
            self.router
                .clone()
                .oneshot(req.body(Body::empty()).unwrap())
                .await
                .unwrap()
        }

        async fn post_json(&self, path: &str, body: Value, forwarded_for: &str) -> Response {
            let req = Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-forwarded-for", forwarded_for)
                .body(Body::from(body.to_string()))
                .unwrap();
            self.router.clone().oneshot(req).await.unwrap()
        }
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_public_pages_pass_through() {
        let app = TestApp::new().await;

        let response = app.get("/", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["page"], "landing");

        let response = app.get("/blog/incentivi", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_anonymous_redirected_to_login() {
        let app = TestApp::new().await;

        let response = app.get("/homeowner/dashboard", None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            location(&response),
            "/login?redirectTo=%2Fhomeowner%2Fdashboard"
        );

        // Anche i path protetti senza route passano dal gate
        let response = app.get("/installer/leads/7", None).await;
        assert_eq!(
            location(&response),
            "/login?redirectTo=%2Finstaller%2Fleads%2F7"
        );
    }

    #[tokio::test]
    async fn test_invalid_token_is_anonymous() {
        let app = TestApp::new().await;
        let response = app.get("/admin", Some("sq_not-a-session")).await;
        assert_eq!(location(&response), "/login?redirectTo=%2Fadmin");
    }

    #[tokio::test]
    async fn test_homeowner_dashboard() {
        let app = TestApp::new().await;
        let token = app.session_for("home-1").await;

        let response = app.get("/homeowner/dashboard", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["user_id"], "home-1");
        assert_eq!(body["role"], "homeowner");

        let response = app.get("/installer/dashboard", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/homeowner/dashboard");
    }

    #[tokio::test]
    async fn test_installer_dashboard() {
        let app = TestApp::new().await;
        let token = app.installer_session("inst-1").await;

        let response = app.get("/installer/dashboard", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["role"], "installer");

        let response = app.get("/homeowner/dashboard", Some(&token)).await;
        assert_eq!(location(&response), "/installer/dashboard");

        let response = app.get("/admin", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["section"], "admin");
    }

    #[tokio::test]
    async fn test_entry_points_redirect_authenticated_users() {
        let app = TestApp::new().await;
        let home = app.session_for("home-1").await;
        let inst = app.installer_session("inst-1").await;

        assert_eq!(location(&app.get("/login", Some(&home)).await), "/homeowner/dashboard");
        assert_eq!(location(&app.get("/signup", Some(&inst)).await), "/installer/dashboard");

        let response = app.get("/login", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["page"], "login");
    }

    #[tokio::test]
    async fn test_role_lookup_failure_goes_to_landing() {
        let app = TestApp::new().await;
        let token = app.session_for("home-1").await;
        sqlx::query("DROP TABLE installers")
            .execute(&app.db)
            .await
            .unwrap();

        let response = app.get("/homeowner/dashboard", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/");

        // Sulle pagine di ingresso si mostra la pagina
        let response = app.get("/login", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);

        // La sessione resta leggibile, il ruolo e' sconosciuto
        let response = app.get("/api/auth/session", Some(&token)).await;
        let body = json_body(response).await;
        assert_eq!(body["authenticated"], true);
        assert!(body["role"].is_null());
    }

    #[tokio::test]
    async fn test_role_lookup_timeout_goes_to_landing() {
        let db = test_pool().await;
        // Pool dei ruoli con l'unica connessione occupata: il lookup resta appeso
        let roles_db = test_pool().await;
        let held = roles_db.acquire().await.unwrap();
        let roles = RoleResolver::new(roles_db.clone(), Duration::from_millis(50), Duration::ZERO);
        let app = TestApp::build(db, roles, None, None);
        let token = app.session_for("home-1").await;

        let response = app.get("/homeowner/dashboard", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/");

        drop(held);
        let response = app.get("/homeowner/dashboard", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_session_reads_use_general_limit() {
        let app = TestApp::new().await;
        let token = app.session_for("home-1").await;

        let mut statuses = Vec::new();
        for _ in 0..8 {
            statuses.push(app.get("/api/auth/session", Some(&token)).await.status());
        }
        assert!(statuses.iter().all(|s| *s == StatusCode::OK), "{:?}", statuses);

        let response = app.get("/api/auth/session", Some(&token)).await;
        assert_eq!(response.headers()["x-ratelimit-remaining"], "21");
    }

    #[tokio::test]
    async fn test_logout_keeps_auth_limit() {
        let app = TestApp::new().await;
        let logout = || {
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .body(Body::empty())
                .unwrap()
        };

        for _ in 0..5 {
            let response = app.router.clone().oneshot(logout()).await.unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }
        let response = app.router.clone().oneshot(logout()).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        // Le letture della sessione hanno un contatore separato
        let response = app.get("/api/auth/session", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_session_endpoint_and_logout() {
        let app = TestApp::new().await;
        let token = app.installer_session("inst-1").await;

        let response = app.get("/api/auth/session", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-limit"], "30");
        let body = json_body(response).await;
        assert_eq!(body["user_id"], "inst-1");
        assert_eq!(body["role"], "installer");

        let req = Request::builder()
            .method("POST")
            .uri("/api/auth/logout")
            .header(header::COOKIE, format!("sq_session={}", token))
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["x-ratelimit-limit"], "5");

        let response = app.get("/installer/dashboard", Some(&token)).await;
        assert_eq!(
            location(&response),
            "/login?redirectTo=%2Finstaller%2Fdashboard"
        );
    }

    #[tokio::test]
    async fn test_quotes_are_rate_limited() {
        let app = TestApp::new().await;
        let quote = serde_json::json!({
            "name": "Anna",
            "email": "anna@example.com",
            "zip_code": "94110",
            "monthly_bill": 120.0
        });

        for _ in 0..5 {
            let response = app.post_json("/api/quotes", quote.clone(), "203.0.113.9").await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app.post_json("/api/quotes", quote.clone(), "203.0.113.9").await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");

        // Altro client, contatore indipendente
        let response = app.post_json("/api/quotes", quote, "203.0.113.10").await;
        assert_eq!(response.status(), StatusCode::CREATED);

        assert_eq!(crate::db::quotes::count_quotes(&app.db).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_newsletter_subscription() {
        let app = TestApp::new().await;
        let body = serde_json::json!({"email": "Mario@Example.com"});

        let response = app.post_json("/api/newsletter", body.clone(), "198.51.100.1").await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-ratelimit-limit"], "30");

        let response = app.post_json("/api/newsletter", body, "198.51.100.1").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["already_subscribed"], true);

        let response = app
            .post_json("/api/newsletter", serde_json::json!({"email": "nope"}), "198.51.100.1")
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_without_provider_key() {
        let app = TestApp::new().await;
        let body = serde_json::json!({"messages": [{"role": "user", "content": "ciao"}]});

        let response = app.post_json("/api/chat", body, "192.0.2.1").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()["x-ratelimit-limit"], "10");
    }

    #[tokio::test]
    async fn test_chat_proxies_to_provider() {
        let url = spawn_fake_provider(
            StatusCode::OK,
            serde_json::json!({"choices": [{"message": {"content": "Con 150$ al mese servono circa 7 kW."}}]}),
        )
        .await;
        let app = TestApp::with_ai(Some(url), Some("sk-test")).await;
        let body = serde_json::json!({"messages": [{"role": "user", "content": "Quanti kW?"}]});

        let response = app.post_json("/api/chat", body, "192.0.2.1").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await["reply"],
            "Con 150$ al mese servono circa 7 kW."
        );
    }

    #[tokio::test]
    async fn test_chat_upstream_failure_is_generic() {
        let url = spawn_fake_provider(
            StatusCode::UNAUTHORIZED,
            serde_json::json!({"error": {"message": "invalid api key sk-test"}}),
        )
        .await;
        let app = TestApp::with_ai(Some(url), Some("sk-test")).await;
        let body = serde_json::json!({"messages": [{"role": "user", "content": "ciao"}]});

        let response = app.post_json("/api/chat", body, "192.0.2.1").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert!(!body["error"].as_str().unwrap().contains("sk-test"));
    }
}
