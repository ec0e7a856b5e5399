//! In-memory stand-in for the Bento for Business API.
//!
//! Serves the same paths as the real service so the client can be exercised
//! over real HTTP. Failures are reported the way Bento reports them: a JSON
//! `{"message", "error"}` envelope.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEMO_ACCESS_KEY: &str = "demo-access-key";
pub const DEMO_SECRET_KEY: &str = "demo-secret-key";

const FIRST_CARD_ID: i64 = 1001;

/// Credentials the mock accepts on `POST /sessions`.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub access_key: String,
    pub secret_key: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            access_key: DEMO_ACCESS_KEY.to_string(),
            secret_key: DEMO_SECRET_KEY.to_string(),
        }
    }
}

/// Card as stored by the mock. Fields the mock does not interpret are kept
/// in `extra` and echoed back untouched.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub card_id: i64,
    #[serde(rename = "type")]
    pub card_type: String,
    pub status: String,
    pub lifecycle_status: String,
    pub last_four: String,
    #[serde(default)]
    pub virtual_card: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Deserialize)]
pub struct NewCard {
    #[serde(rename = "type")]
    pub card_type: String,
    pub alias: Option<String>,
}

/// The subset of a `PUT /cards/{id}` body the mock applies.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardUpdate {
    pub alias: Option<String>,
    pub status: Option<String>,
    pub spending_limit: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    pub last_four: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

/// Failures rendered as Bento error envelopes.
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error("Invalid access key or secret key")]
    InvalidCredentials,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Card not found")]
    CardNotFound,
    #[error("Billing address not found")]
    AddressNotFound,
    #[error("Last four digits do not match")]
    LastFourMismatch,
}

impl MockError {
    fn status(&self) -> StatusCode {
        match self {
            MockError::InvalidCredentials | MockError::Unauthorized => StatusCode::UNAUTHORIZED,
            MockError::CardNotFound | MockError::AddressNotFound => StatusCode::NOT_FOUND,
            MockError::LastFourMismatch => StatusCode::BAD_REQUEST,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            MockError::InvalidCredentials => "INVALID_CREDENTIALS",
            MockError::Unauthorized => "UNAUTHORIZED",
            MockError::CardNotFound | MockError::AddressNotFound => "NOT_FOUND",
            MockError::LastFourMismatch => "INVALID_LAST_FOUR",
        }
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let body = json!({ "message": self.to_string(), "error": self.code() });
        (self.status(), Json(body)).into_response()
    }
}

#[derive(Default)]
struct Store {
    tokens: HashSet<String>,
    cards: BTreeMap<i64, Card>,
    addresses: HashMap<i64, Address>,
    next_card_id: i64,
    next_address_id: i64,
    issued: u32,
}

impl Store {
    fn card_mut(&mut self, id: i64) -> Result<&mut Card, MockError> {
        self.cards.get_mut(&id).ok_or(MockError::CardNotFound)
    }

    /// Deterministic last four digits for the next printed card.
    fn next_last_four(&mut self) -> String {
        self.issued += 1;
        format!("{:04}", 4000 + self.issued)
    }
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<MockConfig>,
    store: Arc<RwLock<Store>>,
}

type ApiResult<T> = Result<T, MockError>;

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        store: Arc::new(RwLock::new(Store {
            next_card_id: FIRST_CARD_ID,
            next_address_id: 1,
            ..Store::default()
        })),
    };

    let authenticated = Router::new()
        .route("/businesses/me", get(get_business))
        .route("/cards", get(list_cards).post(create_card))
        .route("/cards/{id}", get(get_card).put(update_card).delete(delete_card))
        .route("/cards/{id}/activation", post(activate_card))
        .route("/cards/{id}/reissue", post(reissue_card))
        .route("/cards/{id}/pan", get(get_pan))
        .route(
            "/cards/{id}/billingAddress",
            get(get_billing_address)
                .post(set_billing_address)
                .put(update_billing_address),
        )
        .route("/transactions", get(list_transactions))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/sessions", post(create_session))
        .merge(authenticated)
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

pub fn business() -> Value {
    json!({
        "businessId": 12345,
        "companyName": "My Company Inc",
        "nameOnCard": "My Company",
        "phone": "9998881234",
        "accountNumber": "820187766",
        "businessStructure": "LLC",
        "status": "APPROVED",
        "approvalStatus": "Approved",
        "balance": 100.99,
        "timeZone": "America/Los_Angeles",
        "addresses": [{
            "active": true,
            "addressType": "BUSINESS_ADDRESS",
            "city": "San Francisco",
            "id": 12345,
            "state": "CA",
            "street": "123 Main Street",
            "zipCode": "94123"
        }]
    })
}

async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let known = match token {
        Some(token) => state.store.read().await.tokens.contains(token),
        None => false,
    };
    if !known {
        return Err(MockError::Unauthorized);
    }
    Ok(next.run(request).await)
}

async fn create_session(
    State(state): State<AppState>,
    Json(input): Json<SessionRequest>,
) -> ApiResult<Response> {
    if input.access_key != state.config.access_key || input.secret_key != state.config.secret_key {
        tracing::info!(access_key = %input.access_key, "rejected session request");
        return Err(MockError::InvalidCredentials);
    }
    let token = Uuid::new_v4().to_string();
    state.store.write().await.tokens.insert(token.clone());

    let application = json!({
        "apiApplicationId": 1,
        "name": "Mock Application",
        "accessKey": input.access_key,
        "business": business(),
    });
    Ok(([(AUTHORIZATION, token)], Json(application)).into_response())
}

async fn get_business() -> Json<Value> {
    Json(business())
}

async fn list_cards(State(state): State<AppState>) -> Json<Vec<Card>> {
    let store = state.store.read().await;
    Json(store.cards.values().cloned().collect())
}

async fn create_card(State(state): State<AppState>, Json(input): Json<NewCard>) -> Json<Card> {
    let mut store = state.store.write().await;
    let card_id = store.next_card_id;
    store.next_card_id += 1;
    let card = Card {
        card_id,
        card_type: input.card_type,
        status: "TURNED_OFF".to_string(),
        lifecycle_status: "CREATED".to_string(),
        last_four: store.next_last_four(),
        virtual_card: false,
        alias: input.alias,
        extra: Map::new(),
    };
    store.cards.insert(card_id, card.clone());
    Json(card)
}

async fn get_card(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Card>> {
    let store = state.store.read().await;
    store.cards.get(&id).cloned().map(Json).ok_or(MockError::CardNotFound)
}

async fn update_card(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<CardUpdate>,
) -> ApiResult<Json<Card>> {
    let mut store = state.store.write().await;
    let card = store.card_mut(id)?;
    if let Some(alias) = input.alias {
        card.alias = Some(alias);
    }
    // Canceled cards keep their status no matter what is requested.
    if let Some(status) = input.status {
        if card.status != "CANCELED" {
            card.status = status;
        }
    }
    if let Some(limit) = input.spending_limit {
        card.extra.insert("spendingLimit".to_string(), limit);
    }
    Ok(Json(card.clone()))
}

async fn delete_card(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Card>> {
    let mut store = state.store.write().await;
    let card = store.card_mut(id)?;
    card.status = "CANCELED".to_string();
    card.lifecycle_status = "CANCELED".to_string();
    Ok(Json(card.clone()))
}

async fn activate_card(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<Activation>,
) -> ApiResult<Json<Card>> {
    let mut store = state.store.write().await;
    let card = store.card_mut(id)?;
    if input.last_four.as_deref() != Some(card.last_four.as_str()) {
        return Err(MockError::LastFourMismatch);
    }
    card.lifecycle_status = "ACTIVATED".to_string();
    Ok(Json(card.clone()))
}

async fn reissue_card(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Card>> {
    let mut store = state.store.write().await;
    if !store.cards.contains_key(&id) {
        return Err(MockError::CardNotFound);
    }
    let last_four = store.next_last_four();
    let card = store.card_mut(id)?;
    card.last_four = last_four;
    card.lifecycle_status = "REISSUED".to_string();
    Ok(Json(card.clone()))
}

async fn get_pan(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    let card = store.cards.get(&id).ok_or(MockError::CardNotFound)?;
    Ok(Json(json!({
        "pan": format!("411111111111{}", card.last_four),
        "cvv": "123",
    })))
}

async fn get_billing_address(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Address>> {
    let store = state.store.read().await;
    if !store.cards.contains_key(&id) {
        return Err(MockError::CardNotFound);
    }
    store.addresses.get(&id).cloned().map(Json).ok_or(MockError::AddressNotFound)
}

async fn set_billing_address(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut input): Json<Address>,
) -> ApiResult<Json<Address>> {
    let mut store = state.store.write().await;
    if !store.cards.contains_key(&id) {
        return Err(MockError::CardNotFound);
    }
    input.id = Some(store.next_address_id);
    store.next_address_id += 1;
    store.addresses.insert(id, input.clone());
    Ok(Json(input))
}

async fn update_billing_address(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut input): Json<Address>,
) -> ApiResult<Json<Address>> {
    let mut store = state.store.write().await;
    if !store.cards.contains_key(&id) {
        return Err(MockError::CardNotFound);
    }
    let existing = store.addresses.get_mut(&id).ok_or(MockError::AddressNotFound)?;
    input.id = existing.id;
    *existing = input.clone();
    Ok(Json(input))
}

async fn list_transactions(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    let transactions: Vec<Value> = store
        .cards
        .values()
        .enumerate()
        .map(|(index, card)| {
            json!({
                "cardTransactionId": 9000 + index as i64,
                "amount": 12.5,
                "currency": "USD",
                "status": "SETTLED",
                "card": card,
                "payee": { "name": "Coffee Shop", "city": "San Francisco", "country": "US" },
            })
        })
        .collect();
    let total = 12.5 * transactions.len() as f64;
    Json(json!({
        "amount": total,
        "size": transactions.len(),
        "cardTransactions": transactions,
    }))
}
