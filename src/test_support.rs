// In-process stand-in for the PriceRunner API, used by client and pipeline tests.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::config::Settings;

#[derive(Clone, Debug)]
pub enum Reply {
    Json(Value),
    Status(u16),
    Text(String),
    Delayed(Duration, Value),
}

#[derive(Clone, Default)]
pub struct Fixtures {
    search: HashMap<String, Reply>,
    detail: HashMap<String, Reply>,
    pub requests: Arc<AtomicUsize>,
}

impl Fixtures {
    pub fn search(mut self, ean: &str, reply: Reply) -> Self {
        self.search.insert(ean.to_string(), reply);
        self
    }

    pub fn detail(mut self, product_id: &str, reply: Reply) -> Self {
        self.detail.insert(product_id.to_string(), reply);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

async fn respond(reply: Reply) -> Response {
    match reply {
        Reply::Json(body) => Json(body).into_response(),
        Reply::Status(code) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        Reply::Text(body) => body.into_response(),
        Reply::Delayed(delay, body) => {
            tokio::time::sleep(delay).await;
            Json(body).into_response()
        }
    }
}

async fn search(
    State(fixtures): State<Arc<Fixtures>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    fixtures.requests.fetch_add(1, Ordering::SeqCst);
    let ean = query.get("q").cloned().unwrap_or_default();
    let reply = fixtures
        .search
        .get(&ean)
        .cloned()
        .unwrap_or_else(|| Reply::Json(json!({ "products": [] })));
    respond(reply).await
}

async fn offers(State(fixtures): State<Arc<Fixtures>>, Path(product_id): Path<String>) -> Response {
    fixtures.requests.fetch_add(1, Ordering::SeqCst);
    let reply = fixtures
        .detail
        .get(&product_id)
        .cloned()
        .unwrap_or(Reply::Status(404));
    respond(reply).await
}

/// Serves the fixtures on an ephemeral port and returns the base URL.
pub async fn spawn_mock_api(fixtures: Fixtures) -> String {
    let router = Router::new()
        .route("/search", get(search))
        .route("/offers/:id", get(offers))
        .with_state(Arc::new(fixtures));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn mock_settings(base: &str) -> Settings {
    Settings {
        search_url: format!("{}/search?q={{ean}}", base),
        detail_url: format!(
            "{}/offers/{{id}}?af_ORIGIN=NATIONAL&af_ITEM_CONDITION=NEW,UNKNOWN&sortByPreset=PRICE",
            base
        ),
        request_timeout_secs: 1,
        throttle_min_secs: 0,
        throttle_max_secs: 0,
        notify: false,
        ..Settings::default()
    }
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "pricerunner_rust-{}-{}-{}",
        name,
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
