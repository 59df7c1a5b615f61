//! HTTP API: search endpoint, landing page and static assets.

use crate::amazon::models::Listing;
use crate::amazon::scraper::Scraper;
use crate::config::Config;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::num::IntErrorKind;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared handler state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<Scraper>,
    pub max_pages: u32,
}

impl AppState {
    pub fn new(scraper: Scraper) -> Self {
        let max_pages = scraper.max_pages();
        Self { scraper: Arc::new(scraper), max_pages }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Scraper::from_config(config))
    }
}

/// Query string of `/api/search`. Both fields stay raw text so that bad
/// values can be handled leniently.
#[derive(Debug, Default)]
pub struct SearchParams {
    pub query: Option<String>,
    pub pages: Option<String>,
}

impl SearchParams {
    /// Picks the first value of each known key; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "query" => &mut params.query,
                "pages" => &mut params.pages,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }
}

/// Errors surfaced to API clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing 'query' parameter")]
    MissingQuery,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::MissingQuery => StatusCode::BAD_REQUEST,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Resolves the requested page count.
///
/// Absent or empty means `max`; an integer (of any magnitude) is clamped to
/// `[1, max]`; anything else, blank text included, means a single page.
pub fn resolve_page_count(raw: Option<&str>, max: u32) -> u32 {
    let max = max.max(1);
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return max;
    };

    match raw.trim().parse::<i64>() {
        Ok(n) => n.clamp(1, i64::from(max)) as u32,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => max,
        Err(_) => 1,
    }
}

/// Builds the application router.
pub fn router(state: AppState, index_path: &Path, static_dir: &Path) -> Router {
    Router::new()
        .route("/api/search", get(search_handler))
        .route_service("/", ServeFile::new(index_path))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn search_handler(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    let params = SearchParams::from_pairs(pairs);
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or(ApiError::MissingQuery)?
        .to_string();

    let pages = resolve_page_count(params.pages.as_deref(), state.max_pages);
    info!("API search: '{}' ({} pages)", query, pages);

    let listings = state.scraper.scrape(&query, pages).await;
    let total = listings.len();

    let priced: Vec<Listing> = listings.into_iter().filter(Listing::is_priced).collect();
    info!("Returning {} of {} listings with prices", priced.len(), total);

    Ok(Json(priced))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amazon::renderer::testing::{card, page, ScriptedLauncher, ScriptedPage};
    use crate::amazon::scraper::ScraperSettings;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn state(launcher: &ScriptedLauncher) -> AppState {
        AppState::new(Scraper::new(Arc::new(launcher.clone()), ScraperSettings::default()))
    }

    fn app(launcher: &ScriptedLauncher) -> Router {
        router(state(launcher), Path::new("templates/index.html"), Path::new("static"))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response =
            app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_resolve_page_count() {
        assert_eq!(resolve_page_count(None, 50), 50);
        assert_eq!(resolve_page_count(Some(""), 50), 50);
        assert_eq!(resolve_page_count(Some("   "), 50), 1);
        assert_eq!(resolve_page_count(Some("3"), 50), 3);
        assert_eq!(resolve_page_count(Some(" 7 "), 50), 7);
        assert_eq!(resolve_page_count(Some("0"), 50), 1);
        assert_eq!(resolve_page_count(Some("-4"), 50), 1);
        assert_eq!(resolve_page_count(Some("200"), 50), 50);
        assert_eq!(resolve_page_count(Some("99999999999999999999"), 50), 50);
        assert_eq!(resolve_page_count(Some("-99999999999999999999"), 50), 1);
        assert_eq!(resolve_page_count(Some("abc"), 50), 1);
        assert_eq!(resolve_page_count(Some("2.5"), 50), 1);
    }

    #[tokio::test]
    async fn test_search_returns_only_priced_listings() {
        let html = page(&[
            card(Some("Sans prix"), None, "/dp/B0NOPRICE", "(3,33 €/kg)"),
            card(Some("Lentilles vertes"), Some("9,99 €"), "/dp/B0LENTIL?th=1", "(3,33 €/kg)"),
            card(Some("Sans prix unitaire"), Some("4,00 €"), "/dp/B0NOUNIT", "Livraison"),
        ]);
        let launcher = ScriptedLauncher::new(vec![ScriptedPage::Html(html)]);

        let (status, body) = get_json(app(&launcher), "/api/search?query=lentilles&pages=1").await;

        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "Lentilles vertes");
        assert_eq!(items[0]["total_price"], 9.99);
        assert_eq!(items[0]["unit_price_kg"], 3.33);
        assert_eq!(items[0]["unit_price_raw"], "(3,33 €/kg)");
        assert_eq!(items[0]["link"], "https://www.amazon.fr/dp/B0LENTIL");
        assert!(items[0]["product_id"].as_str().unwrap().starts_with("prod_1_"));
    }

    #[tokio::test]
    async fn test_search_missing_query() {
        let launcher = ScriptedLauncher::new(Vec::new());

        let (status, body) = get_json(app(&launcher), "/api/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing 'query' parameter");

        let (status, _) = get_json(app(&launcher), "/api/search?query=%20%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(launcher.launches(), 0);
    }

    #[tokio::test]
    async fn test_search_failure_is_empty_ok() {
        let launcher = ScriptedLauncher::failing();

        let (status, body) = get_json(app(&launcher), "/api/search?query=riz").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_search_pages_parameter() {
        let launcher = ScriptedLauncher::new(Vec::new());

        get_json(app(&launcher), "/api/search?query=riz&pages=abc").await;
        assert_eq!(launcher.urls(), vec!["https://www.amazon.fr/s?k=riz"]);
    }

    #[tokio::test]
    async fn test_search_blank_pages_is_single_page() {
        let pages: Vec<ScriptedPage> = (0..3)
            .map(|_| {
                ScriptedPage::Html(page(&[card(Some("Riz"), Some("2,00 €"), "/dp/B0RIZ", "(2,00 €/kg)")]))
            })
            .collect();
        let launcher = ScriptedLauncher::new(pages);

        let (status, body) = get_json(app(&launcher), "/api/search?query=riz&pages=%20%20").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(launcher.urls(), vec!["https://www.amazon.fr/s?k=riz"]);
    }

    #[tokio::test]
    async fn test_search_repeated_keys_use_first_value() {
        let launcher = ScriptedLauncher::new(Vec::new());

        let (status, body) =
            get_json(app(&launcher), "/api/search?query=riz&query=pates&pages=1&pages=9").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
        assert_eq!(launcher.urls(), vec!["https://www.amazon.fr/s?k=riz"]);
    }

    #[test]
    fn test_search_params_from_pairs() {
        let pairs = vec![
            ("pages".to_string(), "2".to_string()),
            ("utm_source".to_string(), "x".to_string()),
            ("query".to_string(), "thé".to_string()),
            ("query".to_string(), "café".to_string()),
        ];
        let params = SearchParams::from_pairs(pairs);

        assert_eq!(params.query.as_deref(), Some("thé"));
        assert_eq!(params.pages.as_deref(), Some("2"));
        assert!(SearchParams::from_pairs(Vec::new()).query.is_none());
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let launcher = ScriptedLauncher::new(Vec::new());
        let request = Request::builder()
            .uri("/api/search?query=riz&pages=1")
            .header("Origin", "http://example.test")
            .body(Body::empty())
            .unwrap();

        let response = app(&launcher).oneshot(request).await.unwrap();
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_index_and_static_files() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("index.html");
        std::fs::write(&index, "<h1>Prix au kilo</h1>").unwrap();
        let assets = dir.path().join("static");
        std::fs::create_dir(&assets).unwrap();
        std::fs::write(assets.join("app.js"), "console.log('ok');").unwrap();

        let launcher = ScriptedLauncher::new(Vec::new());
        let app = router(state(&launcher), &index, &assets);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h1>Prix au kilo</h1>");

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/static/app.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/static/missing.css").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
