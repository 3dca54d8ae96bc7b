//! Integration tests for the ArtFestLive backend.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::{Config, DEFAULT_MAX_TX_RETRIES};
use crate::scoring::{OrphanPolicy, TieBreak};
use crate::search::SearchIndex;
use crate::service::Festival;
use crate::store::{collections, init_database, SqliteStore};
use crate::{create_router, AppState};

const PSK: &str = "test-api-key";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    festival: Festival,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some(PSK.to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let index_path = temp_dir.path().join("index");

        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let store = Arc::new(SqliteStore::new(pool, DEFAULT_MAX_TX_RETRIES));
        let festival = Festival::new(store, OrphanPolicy::Drop, TieBreak::FetchOrder);

        let search = Arc::new(SearchIndex::open(&index_path).expect("Failed to init search"));

        let config = Config {
            api_psk: psk,
            db_path,
            index_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            orphan_policy: OrphanPolicy::Drop,
            tie_break: TieBreak::FetchOrder,
            max_tx_retries: DEFAULT_MAX_TX_RETRIES,
            warnings: Vec::new(),
        };

        let state = AppState {
            festival: festival.clone(),
            search,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            festival,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn admin(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header("x-api-key", PSK)
    }

    async fn create_event(&self, name: &str) -> Value {
        let resp = self
            .admin(reqwest::Method::POST, "/api/admin/events")
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"].clone()
    }

    async fn create_unit(&self, body: Value) -> Value {
        let resp = self
            .admin(reqwest::Method::POST, "/api/admin/units")
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"].clone()
    }

    async fn set_score(&self, unit_id: &str, event: &str, score: Value) -> reqwest::Response {
        self.admin(reqwest::Method::PUT, &format!("/api/admin/units/{}/scores", unit_id))
            .json(&json!({ "eventName": event, "score": score }))
            .send()
            .await
            .unwrap()
    }

    async fn get_json(&self, path: &str) -> Value {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), 200, "GET {}", path);
        resp.json().await.unwrap()
    }
}

fn event_names(unit: &Value) -> Vec<String> {
    unit["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_admin_routes_require_psk() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/admin/units"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = fixture
        .client
        .get(fixture.url("/api/admin/units"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = fixture
        .client
        .get(fixture.url("/api/admin/units"))
        .bearer_auth(PSK)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Public routes stay open
    let resp = fixture
        .client
        .get(fixture.url("/api/scoreboard"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_admin_routes_open_without_psk() {
    let fixture = TestFixture::with_psk(None).await;

    let resp = fixture
        .client
        .get(fixture.url("/api/admin/overview"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_event_fan_out() {
    let fixture = TestFixture::new().await;

    fixture.create_event("Painting").await;
    let unit = fixture
        .create_unit(json!({ "name": "Chromatic Weavers", "theme": "Textiles" }))
        .await;
    let unit_id = unit["id"].as_str().unwrap().to_string();
    assert_eq!(event_names(&unit), vec!["Painting"]);

    let sculpture = fixture.create_event("Sculpture").await;
    assert_eq!(sculpture["name"], "Sculpture");

    let body = fixture.get_json("/api/events").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let resp = fixture
        .admin(reqwest::Method::GET, &format!("/api/admin/units/{}", unit_id))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["data"]["events"],
        json!([{ "name": "Painting", "score": 0 }, { "name": "Sculpture", "score": 0 }])
    );

    // Name resolved from the roster when the query omits it
    let resp = fixture
        .admin(
            reqwest::Method::DELETE,
            &format!("/api/admin/events/{}", sculpture["id"].as_str().unwrap()),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .admin(reqwest::Method::GET, &format!("/api/admin/units/{}", unit_id))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(event_names(&body["data"]), vec!["Painting"]);

    let resp = fixture
        .admin(reqwest::Method::DELETE, "/api/admin/events/no-such-event")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_reads_reconcile_interrupted_fan_out() {
    let fixture = TestFixture::new().await;

    fixture.create_event("Painting").await;
    let unit = fixture.create_unit(json!({ "name": "Kinetic Creations" })).await;
    let unit_id = unit["id"].as_str().unwrap();

    // A roster entry the unit never received, and a score for an event that no longer exists
    let store = fixture.festival.store();
    store
        .push(collections::EVENTS, json!({ "name": "Digital Art" }))
        .await
        .unwrap();
    let mut record = store.get_one(collections::UNITS, unit_id).await.unwrap().unwrap();
    record["events"] = json!([
        { "name": "Painting", "score": 7 },
        { "name": "Pottery", "score": 90 }
    ]);
    store.set(collections::UNITS, unit_id, record).await.unwrap();

    let body = fixture.get_json("/api/scoreboard").await;
    let row = &body["data"][0];
    assert_eq!(
        row["events"],
        json!([{ "name": "Painting", "score": 7 }, { "name": "Digital Art", "score": 0 }])
    );
    assert_eq!(row["totalScore"], 7);
}

#[tokio::test]
async fn test_score_updates() {
    let fixture = TestFixture::new().await;

    fixture.create_event("Painting").await;
    let unit = fixture.create_unit(json!({ "name": "Street Art Syndicate" })).await;
    let unit_id = unit["id"].as_str().unwrap();

    let resp = fixture.set_score(unit_id, "Painting", json!(" 42 ")).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["events"][0]["score"], 42);

    let resp = fixture.set_score(unit_id, "Painting", json!(-5)).await;
    assert_eq!(resp.status(), 200);

    let resp = fixture.set_score(unit_id, "Painting", json!("abc")).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let resp = fixture.set_score(unit_id, "Painting", json!(1.5)).await;
    assert_eq!(resp.status(), 400);

    let resp = fixture.set_score(unit_id, "  ", json!(1)).await;
    assert_eq!(resp.status(), 400);

    let resp = fixture.set_score("no-such-unit", "Painting", json!(1)).await;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let body = fixture.get_json("/api/scoreboard").await;
    assert_eq!(body["data"][0]["totalScore"], -5);
}

#[tokio::test]
async fn test_scoreboard_ranking_and_search() {
    let fixture = TestFixture::new().await;

    fixture.create_event("Painting").await;
    fixture.create_event("Sculpture").await;

    let mut ids = Vec::new();
    for (name, painting, sculpture) in [
        ("Chromatic Weavers", 10, 5),
        ("Marble Sculptors Collective", 20, 30),
        ("Digital Canvas Crew", 40, 0),
    ] {
        let unit = fixture.create_unit(json!({ "name": name })).await;
        let id = unit["id"].as_str().unwrap().to_string();
        fixture.set_score(&id, "Painting", json!(painting)).await;
        fixture.set_score(&id, "Sculpture", json!(sculpture)).await;
        ids.push(id);
    }

    let body = fixture.get_json("/api/scoreboard").await;
    let rows = body["data"].as_array().unwrap();
    let ranked: Vec<(&str, i64, i64)> = rows
        .iter()
        .map(|r| {
            (
                r["name"].as_str().unwrap(),
                r["rank"].as_i64().unwrap(),
                r["totalScore"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("Marble Sculptors Collective", 1, 50),
            ("Digital Canvas Crew", 2, 40),
            ("Chromatic Weavers", 3, 15),
        ]
    );
    assert!(rows.iter().all(|r| r.get("credentialId").is_none()));

    let body = fixture.get_json("/api/scoreboard?q=canv").await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["unitId"], ids[2].as_str());
    assert_eq!(rows[0]["rank"], 2);

    // Matches anywhere in the name, including across words
    let body = fixture.get_json("/api/scoreboard?q=ital%20can").await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["unitId"], ids[2].as_str());
    let body = fixture.get_json("/api/scoreboard?q=eaver").await;
    assert_eq!(body["data"][0]["unitId"], ids[0].as_str());

    // Renamed units are re-indexed
    let resp = fixture
        .admin(reqwest::Method::PUT, &format!("/api/admin/units/{}", ids[0]))
        .json(&json!({ "name": "Loom Guild" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = fixture.get_json("/api/scoreboard?q=weav").await;
    assert!(body["data"].as_array().unwrap().is_empty());
    let body = fixture.get_json("/api/scoreboard?q=LOOM").await;
    assert_eq!(body["data"][0]["name"], "Loom Guild");

    // Deleted units drop out of search
    let resp = fixture
        .admin(reqwest::Method::DELETE, &format!("/api/admin/units/{}", ids[1]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = fixture.get_json("/api/scoreboard?q=marble").await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_login_and_dashboard() {
    let fixture = TestFixture::new().await;

    fixture.create_event("Painting").await;
    let unit = fixture
        .create_unit(json!({ "name": "Chromatic Weavers", "credentialId": "weavers-2024" }))
        .await;
    let unit_id = unit["id"].as_str().unwrap().to_string();
    fixture.set_score(&unit_id, "Painting", json!(12)).await;

    let resp = fixture
        .client
        .post(fixture.url("/api/login"))
        .json(&json!({ "credentialId": "weavers-2024" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"], unit_id.as_str());
    assert!(body["data"].get("credentialId").is_none());

    let resp = fixture
        .client
        .post(fixture.url("/api/login"))
        .json(&json!({ "credentialId": "guess" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = fixture
        .admin(reqwest::Method::POST, "/api/admin/gallery")
        .json(&json!({
            "src": "https://picsum.photos/seed/weave/600/400",
            "alt": "Woven tapestry",
            "unitId": unit_id,
            "aiHint": "tapestry weaving"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body = fixture.get_json(&format!("/api/dashboard/{}", unit_id)).await;
    let dashboard = &body["data"];
    assert_eq!(dashboard["rank"], 1);
    assert_eq!(dashboard["totalScore"], 12);
    assert_eq!(dashboard["unit"]["photoAccessCount"], 1);
    assert_eq!(dashboard["images"][0]["alt"], "Woven tapestry");

    let resp = fixture
        .admin(reqwest::Method::DELETE, &format!("/api/admin/units/{}", unit_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/dashboard/{}", unit_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_duplicate_credentials_rejected() {
    let fixture = TestFixture::new().await;

    fixture
        .create_unit(json!({ "name": "Kinetic Creations", "credentialId": "kinetic" }))
        .await;

    let resp = fixture
        .admin(reqwest::Method::POST, "/api/admin/units")
        .json(&json!({ "name": "Copycats", "credentialId": "kinetic" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_gallery_and_venue() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .admin(reqwest::Method::POST, "/api/admin/gallery")
        .json(&json!({ "src": "https://picsum.photos/seed/1/600/400", "alt": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .admin(reqwest::Method::POST, "/api/admin/gallery")
        .json(&json!({ "src": "https://picsum.photos/seed/1/600/400", "alt": "Light installation" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let image_id = body["data"]["id"].as_str().unwrap().to_string();

    let body = fixture.get_json("/api/gallery").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let resp = fixture
        .admin(reqwest::Method::DELETE, &format!("/api/admin/gallery/{}", image_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = fixture.get_json("/api/gallery").await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let resp = fixture
        .client
        .get(fixture.url("/api/venue/current"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .admin(reqwest::Method::POST, "/api/admin/venue")
        .json(&json!({ "roomNumber": "101", "item": "Painting Contest" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let venue_id = body["data"]["id"].as_str().unwrap().to_string();

    let resp = fixture
        .admin(reqwest::Method::PUT, &format!("/api/admin/venue/{}", venue_id))
        .json(&json!({ "roomNumber": "204", "item": "Painting Contest" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body = fixture.get_json("/api/venue").await;
    assert_eq!(body["data"][0]["roomNumber"], "204");
    assert!(body["data"][0]["timestamp"].is_string());

    let body = fixture.get_json("/api/venue/current").await;
    assert_eq!(body["data"]["id"], venue_id.as_str());

    let resp = fixture
        .admin(reqwest::Method::DELETE, &format!("/api/admin/venue/{}", venue_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .admin(reqwest::Method::PUT, &format!("/api/admin/venue/{}", venue_id))
        .json(&json!({ "roomNumber": "1", "item": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_overview() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .admin(reqwest::Method::GET, "/api/admin/overview")
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["topUnit"].is_null());

    fixture.create_event("Painting").await;
    let unit = fixture.create_unit(json!({ "name": "Chromatic Weavers" })).await;
    let unit_id = unit["id"].as_str().unwrap();
    fixture.set_score(unit_id, "Painting", json!(18)).await;
    fixture.get_json(&format!("/api/dashboard/{}", unit_id)).await;

    let resp = fixture
        .admin(reqwest::Method::GET, "/api/admin/overview")
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["data"],
        json!({
            "totalUnits": 1,
            "totalEvents": 1,
            "totalImages": 0,
            "totalPhotoAccesses": 1,
            "topUnit": {
                "unitId": unit_id,
                "name": "Chromatic Weavers",
                "totalScore": 18
            }
        })
    );
}

#[tokio::test]
async fn test_validation_errors() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .admin(reqwest::Method::POST, "/api/admin/events")
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let resp = fixture
        .admin(reqwest::Method::POST, "/api/admin/units")
        .json(&json!({ "name": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .admin(reqwest::Method::POST, "/api/admin/venue")
        .json(&json!({ "roomNumber": "101" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .admin(reqwest::Method::POST, "/api/admin/events")
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}
