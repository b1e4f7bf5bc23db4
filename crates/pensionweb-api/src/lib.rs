//! HTTP portal server with HTMX support
//!
//! Routes are organized into modules:
//! - routes::dashboard: Stats cards, payments chart, recent activity, chat
//! - routes::pensioners: Pensioner list, create form, detail, record summary
//! - routes::groups: Company groups
//! - routes::members: Affiliés and allocataires
//! - routes::refunds: Deduction operations
//! - routes::statistics: Aggregates over pensioners and operations
//! - routes::analysis: Date-sliced data analysis
//! - routes::chat: Pension data assistant
//! - routes::auth: Login, logout, session debug
//! - routes::settings: Configuration display

pub mod components;
pub mod error;
pub mod routes;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use pensionweb_config::Config;
use pensionweb_core::flows::{self, GenerativeBackend};
use pensionweb_core::session::SESSION_COOKIE;
use pensionweb_core::{BackendClient, Credentials, FallbackPolicy, PortalData, SessionRegistry};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use error::PageError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub portal: PortalData,
    pub sessions: SessionRegistry,
    pub flows: Arc<dyn GenerativeBackend>,
}

impl AppState {
    /// Wire the backend client, fallback policy, sessions and flow backend from configuration
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let client = BackendClient::new(&config.backend).context("Failed to build backend client")?;
        let policy = FallbackPolicy::new(&config.fallback);
        let sessions = SessionRegistry::new(Credentials::from(&config.auth));
        let flows = flows::from_config(&config.llm);

        Ok(Self {
            portal: PortalData::new(client, policy),
            sessions,
            flows,
            config,
        })
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    // Import route handlers
    use routes::analysis::{htmx_analysis_data, htmx_analysis_run, page_analysis};
    use routes::auth::{api_session, htmx_login, logout, page_debug, page_login};
    use routes::chat::htmx_chat;
    use routes::dashboard::{api_dashboard_stats, htmx_dashboard_payments, htmx_dashboard_recent, htmx_dashboard_stats, page_dashboard};
    use routes::groups::{htmx_groups_list, page_groups};
    use routes::members::{htmx_affilies_list, htmx_allocataires_list, page_affilies, page_allocataires};
    use routes::pensioners::{htmx_pensioner_detail, htmx_pensioner_store, htmx_pensioner_summary, htmx_pensioners_list, page_pensioner_create, page_pensioner_detail, page_pensioners};
    use routes::refunds::{htmx_refunds_list, page_refunds};
    use routes::settings::{api_settings, page_settings};
    use routes::statistics::{htmx_statistics, page_statistics};

    Router::new()
        // API endpoints
        .route("/api/health", get(health_check))
        .route("/api/session", get(api_session))
        .route("/api/dashboard/stats", get(api_dashboard_stats))
        .route("/api/settings", get(api_settings))
        // Auth
        .route("/login", get(page_login).post(htmx_login))
        .route("/logout", post(logout))
        .route("/debug", get(page_debug))
        // HTMX page routes
        .route("/", get(page_dashboard))
        .route("/dashboard", get(page_dashboard))
        .route("/pensioners", get(page_pensioners))
        .route("/pensioners/new", get(page_pensioner_create).post(htmx_pensioner_store))
        .route("/pensioners/:id", get(page_pensioner_detail))
        .route("/groups", get(page_groups))
        .route("/affilies", get(page_affilies))
        .route("/allocataires", get(page_allocataires))
        .route("/refunds", get(page_refunds))
        .route("/statistics", get(page_statistics))
        .route("/analysis", get(page_analysis))
        .route("/settings", get(page_settings))
        // HTMX partial routes
        .route("/dashboard/stats", get(htmx_dashboard_stats))
        .route("/dashboard/payments", get(htmx_dashboard_payments))
        .route("/dashboard/recent", get(htmx_dashboard_recent))
        .route("/pensioners/list", get(htmx_pensioners_list))
        .route("/pensioners/:id/detail", get(htmx_pensioner_detail))
        .route("/pensioners/:id/summary", post(htmx_pensioner_summary))
        .route("/groups/list", get(htmx_groups_list))
        .route("/affilies/list", get(htmx_affilies_list))
        .route("/allocataires/list", get(htmx_allocataires_list))
        .route("/refunds/list", get(htmx_refunds_list))
        .route("/statistics/summary", get(htmx_statistics))
        .route("/analysis/data", post(htmx_analysis_data))
        .route("/analysis/run", post(htmx_analysis_run))
        .route("/chat", post(htmx_chat))
        .layer(middleware::from_fn_with_state(state.clone(), require_login))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// ==================== Session Gate ====================

/// Paths reachable without signing in
const PUBLIC_PATHS: [&str; 2] = ["/login", "/api/health"];

/// Session id from the request cookies
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying a session id; an empty id expires the cookie
pub fn session_cookie(id: &str) -> String {
    if id.is_empty() {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
    } else {
        format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
    }
}

/// Redirect that also works when the request came from HTMX
pub fn redirect_to(headers: &HeaderMap, location: &str) -> Response {
    if is_htmx_request(headers) {
        (StatusCode::OK, [("HX-Redirect", location.to_string())]).into_response()
    } else {
        Redirect::to(location).into_response()
    }
}

/// Let signed-in sessions through; pages redirect to `/login`, JSON endpoints answer 401
async fn require_login(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if PUBLIC_PATHS.contains(&path.as_str()) {
        return next.run(request).await;
    }

    let user = match session_id(request.headers()) {
        Some(id) => state.sessions.current_user(&id).await,
        None => None,
    };

    match user {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None if path.starts_with("/api/") => PageError::Unauthorized.into_response(),
        None => {
            log::debug!("Unauthenticated request to {}, redirecting to /login", path);
            redirect_to(request.headers(), "/login")
        }
    }
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Portail CIMR</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="https://cdn.tailwindcss.com"></script>
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/tailwindcss@2.2.19/dist/tailwind.min.css">
    <style>
        .htmx-indicator {{ opacity: 0; transition: opacity 0.3s; }}
        .htmx-request .htmx-indicator {{ opacity: 1; }}
        .htmx-request.htmx-indicator {{ opacity: 1; }}
    </style>
</head>
<body class="bg-gray-50 text-gray-900">
    {}
</body>
</html>"#,
        title, content
    )
}

/// Navigation sidebar
pub fn nav_sidebar(current_path: &str) -> String {
    let links = [
        ("/", "Tableau de bord", "dashboard"),
        ("/pensioners", "Pensionnaires", "pensioners"),
        ("/groups", "Groupes", "groups"),
        ("/affilies", "Affiliés", "affilies"),
        ("/allocataires", "Allocataires", "allocataires"),
        ("/refunds", "Remboursements", "refunds"),
        ("/statistics", "Statistiques", "statistics"),
        ("/analysis", "Analyse IA", "analysis"),
        ("/settings", "Paramètres", "settings"),
        ("/debug", "Session", "debug"),
    ];

    let mut nav = String::from("<div class='bg-white border-r h-screen flex flex-col'><div class='p-4 border-b'><h1 class='text-xl font-bold text-indigo-600'>Portail CIMR</h1></div><ul class='flex-1 py-2 space-y-1 px-2'>");

    for (path, label, id) in &links {
        let is_active = if *path == "/" {
            current_path == "/" || current_path == "/dashboard"
        } else {
            current_path.starts_with(path)
        };
        let active_class = if is_active { "bg-indigo-50 text-indigo-600" } else { "text-gray-600 hover:bg-gray-50" };
        let icon = match *id {
            "dashboard" => "📊",
            "pensioners" => "👥",
            "groups" => "🏢",
            "affilies" => "🪪",
            "allocataires" => "👪",
            "refunds" => "💸",
            "statistics" => "📈",
            "analysis" => "🤖",
            "settings" => "⚙️",
            "debug" => "🔑",
            _ => "📄",
        };
        nav.push_str(&format!(
            r#"<li><a href='{}' class='flex items-center gap-2 px-3 py-2 rounded-lg {}'>{}<span>{}</span></a></li>"#,
            path, active_class, icon, label
        ));
    }
    nav.push_str("</ul><form method='post' action='/logout' class='p-4 border-t'><button type='submit' class='w-full px-3 py-2 text-sm text-gray-600 rounded-lg hover:bg-gray-50 text-left'>🚪 Déconnexion</button></form></div>");
    nav
}

/// Check if request is from HTMX (partial page update)
pub fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers.get("hx-request").is_some()
}

pub fn page_response(headers: &HeaderMap, title: &str, current_path: &str, inner_content: &str) -> String {
    if is_htmx_request(headers) {
        // HTMX partial - just the content area
        format!(r#"<div class='flex flex-col h-screen'>
    <div class='flex flex-1 overflow-hidden'>
        <main class='flex-1 overflow-auto bg-gray-50 p-6'>{}</main>
    </div>
</div>"#,
            inner_content)
    } else {
        base_html(title, &format!(r#"<div class='flex flex-col h-screen'>
    <div class='flex flex-1 overflow-hidden'>
        <aside class='w-64 flex-shrink-0'>{}</aside>
        <main class='flex-1 overflow-auto bg-gray-50 p-6'>{}</main>
    </div>
</div>"#,
            nav_sidebar(current_path), inner_content))
    }
}

/// Start the HTTP server
///
/// Builds the application state from `config`, binds the configured
/// address and serves until Ctrl-C.
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let backend_url = config.backend.base_url.clone();
    let state = AppState::from_config(config)?;

    let router = create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("Starting pension portal on http://{}", addr);
    log::info!("Backend API: {}", backend_url);
    log::info!("Available routes:");
    log::info!("  - / (Dashboard)");
    log::info!("  - /pensioners (Pensioner management)");
    log::info!("  - /groups, /affilies, /allocataires (Organizations)");
    log::info!("  - /refunds, /statistics (Operations)");
    log::info!("  - /analysis (AI analysis)");
    log::info!("  - /settings, /debug (Configuration and session)");
    log::info!("  - /api/* (JSON API endpoints)");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    log::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}

// ==================== Tests ====================


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use pensionweb_config::SourceMode;

    fn state() -> AppState {
        state_for("http://127.0.0.1:9/api", SourceMode::Fallback)
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let (status, _, body) = send(create_router(state()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_pages_redirect_to_login() {
        let request = Request::builder().uri("/pensioners").body(Body::empty()).unwrap();
        let (status, headers, _) = send(create_router(state()), request).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers.get(header::LOCATION).unwrap(), "/login");
    }

    #[tokio::test]
    async fn test_htmx_requests_get_hx_redirect() {
        let request = Request::builder()
            .uri("/pensioners/list")
            .header("hx-request", "true")
            .body(Body::empty())
            .unwrap();
        let (status, headers, _) = send(create_router(state()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get("HX-Redirect").unwrap(), "/login");
    }

    #[tokio::test]
    async fn test_api_requires_session() {
        let request = Request::builder().uri("/api/session").body(Body::empty()).unwrap();
        let (status, _, _) = send(create_router(state()), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_cookie_is_rejected() {
        let request = get_with_cookie("/dashboard", "pensionweb_sid=forged");
        let (status, _, _) = send(create_router(state()), request).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_signed_in_dashboard_renders_shell() {
        let state = state();
        let cookie = admin_cookie(&state).await;
        let (status, _, body) = send(create_router(state), get_with_cookie("/", &cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<!DOCTYPE html>"));
        assert!(body.contains("Tableau de bord"));
        assert!(body.contains("hx-get='/dashboard/stats'"));
    }

    #[test]
    fn test_session_id_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "theme=dark; pensionweb_sid=abc123".parse().unwrap());
        assert_eq!(session_id(&headers).as_deref(), Some("abc123"));

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, "pensionweb_sid=".parse().unwrap());
        assert_eq!(session_id(&empty), None);
    }

    #[test]
    fn test_session_cookie_expiry() {
        assert!(session_cookie("abc").starts_with("pensionweb_sid=abc;"));
        assert!(session_cookie("").contains("Max-Age=0"));
    }

    #[test]
    fn test_nav_marks_active_link() {
        let nav = nav_sidebar("/pensioners/1001");
        assert!(nav.contains("href='/pensioners' class='flex items-center gap-2 px-3 py-2 rounded-lg bg-indigo-50 text-indigo-600'"));
        assert!(nav.contains("href='/' class='flex items-center gap-2 px-3 py-2 rounded-lg text-gray-600"));
    }
}
