//! Shell delle pagine servite dietro al gate.
//!
//! Il rendering vero e' altrove; qui restano i descrittori pubblici e le
//! dashboard che dipendono dal ruolo del chiamante.

use axum::{routing::get, Extension, Json, Router};

use crate::models::{Caller, DashboardResponse, PageResponse};

pub fn router() -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/login", get(login))
        .route("/signup", get(signup))
        .route("/homeowner/dashboard", get(homeowner_dashboard))
        .route("/installer/dashboard", get(installer_dashboard))
        .route("/admin", get(admin_dashboard))
}

fn page(name: &str) -> Json<PageResponse> {
    Json(PageResponse {
        page: name.to_string(),
    })
}

async fn landing() -> Json<PageResponse> {
    page("landing")
}

async fn login() -> Json<PageResponse> {
    page("login")
}

async fn signup() -> Json<PageResponse> {
    page("signup")
}

fn dashboard(section: &str, caller: Caller) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        section: section.to_string(),
        user_id: caller.user_id,
        role: caller.role,
    })
}

// Il gate inserisce `Caller` prima di lasciar passare qualsiasi path protetto
async fn homeowner_dashboard(Extension(caller): Extension<Caller>) -> Json<DashboardResponse> {
    dashboard("homeowner", caller)
}

async fn installer_dashboard(Extension(caller): Extension<Caller>) -> Json<DashboardResponse> {
    dashboard("installer", caller)
}

async fn admin_dashboard(Extension(caller): Extension<Caller>) -> Json<DashboardResponse> {
    dashboard("admin", caller)
}
