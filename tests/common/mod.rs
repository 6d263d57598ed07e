// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use easycook::config::Config;
use easycook::error::AppError;
use easycook::models::{Category, Meal};
use easycook::routes::create_router;
use easycook::services::{AuthService, FavoritesStore, MealCatalog};
use easycook::storage::MemoryStore;
use easycook::AppState;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const TEST_USERNAME: &str = "emilys";
pub const TEST_PASSWORD: &str = "emilyspass";

/// Build a meal with the fields the listing filters on.
#[allow(dead_code)]
pub fn meal(id: &str, name: &str, area: &str, category: &str) -> Meal {
    let mut meal = Meal::summary(id, name);
    meal.area = Some(area.to_string());
    meal.category = Some(category.to_string());
    meal
}

/// A small catalog spread over a few letters.
#[allow(dead_code)]
pub fn sample_meals() -> Vec<Meal> {
    vec![
        meal("52772", "Teriyaki Chicken Casserole", "Japanese", "Chicken"),
        meal("52771", "Spicy Arrabiata Penne", "Italian", "Vegetarian"),
        meal("52874", "Beef and Mustard Pie", "British", "Beef"),
        meal("52959", "Baked salmon with fennel", "British", "Seafood"),
        meal("52795", "Chicken Handi", "Indian", "Chicken"),
        meal("52806", "Tandoori chicken", "Indian", "Chicken"),
    ]
}

/// `n` numbered meals, all starting with "M".
#[allow(dead_code)]
pub fn numbered_meals(n: usize) -> Vec<Meal> {
    (1..=n)
        .map(|i| meal(&i.to_string(), &format!("Meal {}", i), "British", "Beef"))
        .collect()
}

/// In-memory catalog with injectable failures and call counters.
#[derive(Default)]
pub struct StaticCatalog {
    pub meals: Vec<Meal>,
    pub categories: Vec<Category>,
    pub failing_ids: HashSet<String>,
    pub failing_letters: HashSet<char>,
    pub fail_lists: bool,
    pub delay: Option<Duration>,
    pub letter_calls: AtomicUsize,
    pub lookup_calls: AtomicUsize,
}

#[allow(dead_code)]
impl StaticCatalog {
    pub fn new(meals: Vec<Meal>) -> Self {
        Self {
            meals,
            ..Default::default()
        }
    }

    pub fn failing_id(mut self, id: &str) -> Self {
        self.failing_ids.insert(id.to_string());
        self
    }

    pub fn failing_letter(mut self, letter: char) -> Self {
        self.failing_letters.insert(letter);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of full-catalog fetches started so far.
    pub fn catalog_loads(&self) -> usize {
        self.letter_calls.load(Ordering::SeqCst) / 26
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn field_names(&self, field: impl Fn(&Meal) -> Option<&String>) -> Vec<String> {
        self.meals.iter().filter_map(field).cloned().collect()
    }
}

#[async_trait]
impl MealCatalog for StaticCatalog {
    async fn lookup_meal(&self, id: &str) -> Result<Option<Meal>, AppError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.failing_ids.contains(id) {
            return Err(AppError::CatalogApi(format!("lookup {} failed", id)));
        }
        Ok(self.meals.iter().find(|m| m.id == id).cloned())
    }

    async fn meals_by_first_letter(&self, letter: char) -> Result<Vec<Meal>, AppError> {
        self.letter_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.failing_letters.contains(&letter) {
            return Err(AppError::CatalogApi(format!("letter {} failed", letter)));
        }
        Ok(self
            .meals
            .iter()
            .filter(|m| {
                m.name_or_empty()
                    .chars()
                    .next()
                    .is_some_and(|c| c.eq_ignore_ascii_case(&letter))
            })
            .cloned()
            .collect())
    }

    async fn search_meals(&self, text: &str) -> Result<Vec<Meal>, AppError> {
        let text = text.to_lowercase();
        Ok(self
            .meals
            .iter()
            .filter(|m| m.name_or_empty().to_lowercase().contains(&text))
            .cloned()
            .collect())
    }

    async fn meals_by_category(&self, category: &str) -> Result<Vec<Meal>, AppError> {
        Ok(self
            .meals
            .iter()
            .filter(|m| m.category.as_deref() == Some(category))
            .cloned()
            .collect())
    }

    async fn meals_by_area(&self, area: &str) -> Result<Vec<Meal>, AppError> {
        Ok(self
            .meals
            .iter()
            .filter(|m| m.area.as_deref() == Some(area))
            .cloned()
            .collect())
    }

    async fn category_names(&self) -> Result<Vec<String>, AppError> {
        if self.fail_lists {
            return Err(AppError::CatalogApi("list.php failed".to_string()));
        }
        Ok(self.field_names(|m| m.category.as_ref()))
    }

    async fn area_names(&self) -> Result<Vec<String>, AppError> {
        if self.fail_lists {
            return Err(AppError::CatalogApi("list.php failed".to_string()));
        }
        Ok(self.field_names(|m| m.area.as_ref()))
    }

    async fn full_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.categories.clone())
    }

    async fn random_meal(&self) -> Result<Option<Meal>, AppError> {
        Ok(self.meals.first().cloned())
    }
}

/// Sign a token with a key nobody verifies, expiring `exp_offset_secs` from now.
#[allow(dead_code)]
pub fn test_jwt(exp_offset_secs: i64) -> String {
    #[derive(Serialize)]
    struct Claims {
        id: u64,
        username: String,
        exp: i64,
        iat: i64,
    }

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        id: 1,
        username: TEST_USERNAME.to_string(),
        exp: now + exp_offset_secs,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"upstream-secret"),
    )
    .unwrap()
}

// ─── Fake upstream server ────────────────────────────────────

/// Shared state of the fake TheMealDB / DummyJSON server.
#[derive(Default)]
pub struct Upstream {
    pub meals: Vec<Value>,
    pub categories: Vec<Value>,
    /// Letters answered with HTTP 500.
    pub failing_letters: HashSet<String>,
    /// Expiry offset of issued tokens.
    pub token_ttl_secs: i64,
    /// Use the legacy `token` field instead of `accessToken`.
    pub legacy_token_field: bool,
    /// Requests seen, as `endpoint?key=value`.
    pub requests: std::sync::Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl Upstream {
    pub fn new(meals: Vec<Value>) -> Self {
        Self {
            meals,
            token_ttl_secs: 1800,
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, endpoint: &str, query: &HashMap<String, String>) {
        let mut pairs: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        pairs.sort();
        self.requests
            .lock()
            .unwrap()
            .push(format!("{}?{}", endpoint, pairs.join("&")));
    }

    fn field<'a>(meal: &'a Value, key: &str) -> &'a str {
        meal.get(key).and_then(Value::as_str).unwrap_or("")
    }
}

/// A meal record as the real API returns it.
#[allow(dead_code)]
pub fn upstream_meal(id: &str, name: &str, area: &str, category: &str) -> Value {
    json!({
        "idMeal": id,
        "strMeal": name,
        "strArea": area,
        "strCategory": category,
        "strInstructions": "Cook.\r\nServe.",
        "strMealThumb": format!("https://img.example/{}.jpg", id),
        "strTags": "Dinner,Quick",
        "strYoutube": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "strIngredient1": "Salt",
        "strMeasure1": "1 tsp",
        "strIngredient2": "",
        "strMeasure2": " ",
    })
}

type Shared = State<Arc<Upstream>>;

fn meals_envelope(meals: Vec<Value>) -> Json<Value> {
    if meals.is_empty() {
        Json(json!({ "meals": null }))
    } else {
        Json(json!({ "meals": meals }))
    }
}

async fn lookup(State(up): Shared, Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    up.record("lookup.php", &q);
    let id = q.get("i").cloned().unwrap_or_default();
    meals_envelope(
        up.meals
            .iter()
            .filter(|m| Upstream::field(m, "idMeal") == id)
            .cloned()
            .collect(),
    )
}

async fn search(
    State(up): Shared,
    Query(q): Query<HashMap<String, String>>,
) -> axum::response::Response {
    up.record("search.php", &q);
    if let Some(letter) = q.get("f") {
        if up.failing_letters.contains(letter) {
            return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
        }
        let letter = letter.to_lowercase();
        let meals = up
            .meals
            .iter()
            .filter(|m| Upstream::field(m, "strMeal").to_lowercase().starts_with(&letter))
            .cloned()
            .collect();
        return meals_envelope(meals).into_response();
    }
    let text = q.get("s").cloned().unwrap_or_default().to_lowercase();
    let meals = up
        .meals
        .iter()
        .filter(|m| Upstream::field(m, "strMeal").to_lowercase().contains(&text))
        .cloned()
        .collect();
    meals_envelope(meals).into_response()
}

async fn filter(State(up): Shared, Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    up.record("filter.php", &q);
    let (key, wanted) = match (q.get("c"), q.get("a")) {
        (Some(c), _) => ("strCategory", c.clone()),
        (None, Some(a)) => ("strArea", a.clone()),
        _ => return meals_envelope(Vec::new()),
    };
    meals_envelope(
        up.meals
            .iter()
            .filter(|m| Upstream::field(m, key) == wanted)
            .map(|m| json!({ "idMeal": m["idMeal"], "strMeal": m["strMeal"], "strMealThumb": m["strMealThumb"] }))
            .collect(),
    )
}

async fn list(State(up): Shared, Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    up.record("list.php", &q);
    let key = if q.contains_key("c") { "strCategory" } else { "strArea" };
    let entries: Vec<Value> = up
        .meals
        .iter()
        .map(|m| json!({ key: Upstream::field(m, key) }))
        .collect();
    meals_envelope(entries)
}

async fn categories(State(up): Shared) -> Json<Value> {
    up.record("categories.php", &HashMap::new());
    Json(json!({ "categories": up.categories }))
}

async fn random(State(up): Shared) -> Json<Value> {
    up.record("random.php", &HashMap::new());
    meals_envelope(up.meals.first().cloned().into_iter().collect())
}

async fn login(State(up): Shared, Json(body): Json<Value>) -> axum::response::Response {
    let username = body["username"].as_str().unwrap_or("");
    let password = body["password"].as_str().unwrap_or("");
    up.record(
        "auth/login",
        &HashMap::from([(
            "expiresInMins".to_string(),
            body["expiresInMins"].to_string(),
        )]),
    );

    if username != TEST_USERNAME || password != TEST_PASSWORD {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response();
    }

    let token = test_jwt(up.token_ttl_secs);
    let token_field = if up.legacy_token_field { "token" } else { "accessToken" };
    Json(json!({
        "id": 1,
        "username": TEST_USERNAME,
        "email": "emily.johnson@x.dummyjson.com",
        "firstName": "Emily",
        "lastName": "Johnson",
        "gender": "female",
        "image": "https://dummyjson.com/icon/emilys/128",
        token_field: token,
        "refreshToken": "refresh",
    }))
    .into_response()
}

/// Serve `upstream` on an ephemeral port. Returns `(mealdb_base, auth_base)`.
#[allow(dead_code)]
pub async fn spawn_upstream(upstream: Arc<Upstream>) -> (String, String) {
    let mealdb = Router::new()
        .route("/lookup.php", get(lookup))
        .route("/search.php", get(search))
        .route("/filter.php", get(filter))
        .route("/list.php", get(list))
        .route("/categories.php", get(categories))
        .route("/random.php", get(random));

    let app = Router::new()
        .nest("/api/json/v1/1", mealdb)
        .route("/auth/login", post(login))
        .with_state(upstream);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (
        format!("http://{}/api/json/v1/1", addr),
        format!("http://{}", addr),
    )
}

// ─── App under test ──────────────────────────────────────────

/// Test config with a short search debounce.
#[allow(dead_code)]
pub fn test_config(mealdb_api_base: &str, auth_api_base: &str) -> Config {
    Config {
        mealdb_api_base: mealdb_api_base.to_string(),
        auth_api_base: auth_api_base.to_string(),
        search_debounce: Duration::from_millis(50),
        ..Config::default()
    }
}

/// Create a test app over `catalog` with in-memory storage and the given
/// auth API. Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(
    catalog: Arc<dyn MealCatalog>,
    auth_api_base: &str,
) -> (axum::Router, Arc<AppState>) {
    let config = test_config("http://127.0.0.1:9/api/json/v1/1", auth_api_base);
    let favorites = FavoritesStore::load(Arc::new(MemoryStore::new()));
    let auth = AuthService::new(auth_api_base, config.auth_session_minutes);

    let state = Arc::new(AppState::new(
        config,
        catalog,
        favorites,
        auth,
        CancellationToken::new(),
    ));

    (create_router(state.clone()), state)
}
