//! Integration test harness for the Handmade Market storefront.
//!
//! Each test spawns two in-process servers on `127.0.0.1:0`:
//!
//! - a fake marketplace backend speaking the `POST /rpc/{method}` JSON
//!   protocol, backed by an in-memory [`Marketplace`]
//! - the storefront router from [`handmade_market_storefront::app`]
//!
//! and drives the storefront with a `reqwest` client that keeps cookies and
//! does not follow redirects.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p handmade-market-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use handmade_market_core::{
    Category, CategoryId, CustomOrderRequest, OrderId, Price, Principal, Product, ProductId,
    Review, ReviewId, Shop, ShopId, UserProfile,
};
use handmade_market_storefront::backend::BackendHandle;
use handmade_market_storefront::config::StorefrontConfig;
use handmade_market_storefront::models::Identity;
use handmade_market_storefront::state::AppState;
use serde_json::{Value, json};
use url::Url;

/// Delegations issued by the fake identity provider look like `delegation-{principal}`.
const DELEGATION_PREFIX: &str = "delegation-";

/// Identity provider login page used in test configs.
pub const IDENTITY_PROVIDER_URL: &str = "http://identity.test/login";

// =============================================================================
// Fake backend
// =============================================================================

/// In-memory marketplace served by the fake backend.
#[derive(Debug, Clone, Default)]
pub struct Marketplace {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub shops: Vec<Shop>,
    pub reviews: Vec<Review>,
    pub wishlists: HashMap<String, Vec<ProductId>>,
    pub favorites: HashMap<String, Vec<ShopId>>,
    pub custom_orders: Vec<CustomOrderRequest>,
    pub profiles: HashMap<String, UserProfile>,
    /// Every mutation answers `success: false` with this message.
    pub mutation_failure: Option<String>,
    /// RPC methods that answer HTTP 500.
    pub broken_methods: HashSet<String>,
    /// Artificial latency before each RPC answer.
    pub latency: Duration,
    /// Per-method delay between computing an answer and sending it, so the
    /// reply reflects the marketplace as it was when the call arrived.
    pub reply_delays: HashMap<String, Duration>,
}

impl Marketplace {
    /// Two shops, two categories and three products.
    ///
    /// Product 1 is the only one tagged exactly `Ceramics`.
    #[must_use]
    pub fn sample() -> Self {
        Self {
            products: vec![
                product(1, 1, "Speckled Mug", &["Ceramics", "Kitchen"], 2800),
                product(2, 2, "Wool Scarf", &["Textiles"], 4500),
                product(3, 1, "Glazed Bowl", &["ceramics"], 3600),
            ],
            categories: vec![
                Category {
                    id: CategoryId::new(1),
                    name: "Ceramics".to_string(),
                },
                Category {
                    id: CategoryId::new(2),
                    name: "Textiles".to_string(),
                },
            ],
            shops: vec![
                shop(1, "Clay Corner", &["Kiln firing every Friday"]),
                shop(2, "Loom & Thread", &[]),
            ],
            ..Self::default()
        }
    }
}

#[must_use]
pub fn product(id: u64, shop_id: u64, name: &str, tags: &[&str], cents: u64) -> Product {
    Product {
        id: ProductId::new(id),
        shop_id: ShopId::new(shop_id),
        name: name.to_string(),
        tags: tags.iter().map(ToString::to_string).collect(),
        description: format!("Handmade {}", name.to_lowercase()),
        story: None,
        image: None,
        price: Price::from_minor_units(cents),
    }
}

#[must_use]
pub fn shop(id: u64, name: &str, announcements: &[&str]) -> Shop {
    Shop {
        id: ShopId::new(id),
        owner: principal(&format!("owner-{id}")),
        name: name.to_string(),
        description: format!("{name} makes things by hand"),
        announcements: announcements.iter().map(ToString::to_string).collect(),
    }
}

#[must_use]
pub fn review(id: u64, product_id: u64, rating: u64, comment: &str) -> Review {
    Review {
        id: ReviewId::new(id),
        user_id: principal("reviewer"),
        product_id: ProductId::new(product_id),
        comment: comment.to_string(),
        timestamp: 1_700_000_000_000_000_000,
        rating,
        photos: Vec::new(),
    }
}

#[must_use]
pub fn principal(raw: &str) -> Principal {
    Principal::parse(raw).expect("valid test principal")
}

/// Identity whose delegation the fake backend accepts for `raw`.
#[must_use]
pub fn identity(raw: &str) -> Identity {
    Identity::new(principal(raw), format!("{DELEGATION_PREFIX}{raw}"))
}

/// Handle on a running fake backend.
#[derive(Clone)]
pub struct FakeBackend {
    pub url: Url,
    market: Arc<Mutex<Marketplace>>,
    calls: Arc<Mutex<HashMap<String, usize>>>,
}

impl FakeBackend {
    /// Serve `market` on an ephemeral port.
    pub async fn spawn(market: Marketplace) -> Self {
        let backend = Self {
            url: Url::parse("http://127.0.0.1/").expect("static url"),
            market: Arc::new(Mutex::new(market)),
            calls: Arc::new(Mutex::new(HashMap::new())),
        };

        let app = Router::new()
            .route("/status", get(|| async { "ok" }))
            .route("/rpc/{method}", post(rpc))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend server");
        });

        Self {
            url: Url::parse(&format!("http://{addr}/")).expect("fake backend url"),
            ..backend
        }
    }

    /// Number of calls received for an RPC method.
    #[must_use]
    pub fn calls(&self, method: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .get(method)
            .copied()
            .unwrap_or(0)
    }

    /// Inspect or change the marketplace.
    pub fn with_market<R>(&self, f: impl FnOnce(&mut Marketplace) -> R) -> R {
        f(&mut self.market.lock().expect("market lock"))
    }
}

fn rejection(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn caller_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| token.strip_prefix(DELEGATION_PREFIX))
        .map(str::to_string)
}

fn id_arg(args: &Value, name: &str) -> u64 {
    args.get(name).and_then(Value::as_u64).unwrap_or_default()
}

fn now_nanos() -> i64 {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default()
}

async fn rpc(
    State(backend): State<FakeBackend>,
    Path(method): Path<String>,
    headers: HeaderMap,
    Json(args): Json<Value>,
) -> Response {
    *backend
        .calls
        .lock()
        .expect("calls lock")
        .entry(method.clone())
        .or_default() += 1;

    let latency = backend.with_market(|m| m.latency);
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }

    if backend.with_market(|m| m.broken_methods.contains(&method)) {
        return rejection(StatusCode::INTERNAL_SERVER_ERROR, "Internal error");
    }

    let caller = caller_of(&headers);
    let (response, reply_delay) = backend.with_market(|market| {
        let delay = market.reply_delays.get(&method).copied();
        (dispatch(market, &method, &args, caller.as_deref()), delay)
    });
    if let Some(delay) = reply_delay {
        tokio::time::sleep(delay).await;
    }
    response
}

fn dispatch(
    market: &mut Marketplace,
    method: &str,
    args: &Value,
    caller: Option<&str>,
) -> Response {
    // Public reads
    match method {
        "getProducts" => return Json(&market.products).into_response(),
        "getCategories" => return Json(&market.categories).into_response(),
        "getShops" => return Json(&market.shops).into_response(),
        "searchProducts" => {
            let text = args
                .get("searchText")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_lowercase();
            let found: Vec<&Product> = market
                .products
                .iter()
                .filter(|p| {
                    p.name.to_lowercase().contains(&text)
                        || p.description.to_lowercase().contains(&text)
                })
                .collect();
            return Json(found).into_response();
        }
        "getReviewsForProduct" => {
            let product_id = ProductId::new(id_arg(args, "productId"));
            let reviews: Vec<&Review> = market
                .reviews
                .iter()
                .filter(|r| r.product_id == product_id)
                .collect();
            return Json(reviews).into_response();
        }
        _ => {}
    }

    let Some(caller) = caller else {
        return rejection(StatusCode::UNAUTHORIZED, "Unauthorized: anonymous caller");
    };

    // Caller-scoped reads
    match method {
        "getMyWishlist" => {
            return Json(market.wishlists.get(caller).cloned().unwrap_or_default()).into_response();
        }
        "getMyFavorites" => {
            return Json(market.favorites.get(caller).cloned().unwrap_or_default()).into_response();
        }
        "getMyCustomOrders" => {
            let orders: Vec<&CustomOrderRequest> = market
                .custom_orders
                .iter()
                .filter(|o| o.user_id.as_str() == caller)
                .collect();
            return Json(orders).into_response();
        }
        "getCallerUserProfile" => return Json(market.profiles.get(caller)).into_response(),
        "saveCallerUserProfile" => {
            return match args.get("profile").cloned().map(serde_json::from_value::<UserProfile>) {
                Some(Ok(profile)) => {
                    market.profiles.insert(caller.to_string(), profile);
                    Json(Value::Null).into_response()
                }
                _ => rejection(StatusCode::BAD_REQUEST, "Invalid profile"),
            };
        }
        _ => {}
    }

    // Mutations answering an OperationResult
    if let Some(message) = &market.mutation_failure {
        return Json(json!({ "success": false, "error": message })).into_response();
    }

    match method {
        "addToWishlist" => {
            let id = ProductId::new(id_arg(args, "productId"));
            let list = market.wishlists.entry(caller.to_string()).or_default();
            if !list.contains(&id) {
                list.push(id);
            }
            Json(json!({ "success": true })).into_response()
        }
        "removeFromWishlist" => {
            let id = ProductId::new(id_arg(args, "productId"));
            if let Some(list) = market.wishlists.get_mut(caller) {
                list.retain(|p| *p != id);
            }
            Json(json!({ "success": true })).into_response()
        }
        "addToFavorites" => {
            let id = ShopId::new(id_arg(args, "shopId"));
            let list = market.favorites.entry(caller.to_string()).or_default();
            if !list.contains(&id) {
                list.push(id);
            }
            Json(json!({ "success": true })).into_response()
        }
        "removeFromFavorites" => {
            let id = ShopId::new(id_arg(args, "shopId"));
            if let Some(list) = market.favorites.get_mut(caller) {
                list.retain(|s| *s != id);
            }
            Json(json!({ "success": true })).into_response()
        }
        "addReview" => {
            let id = market.reviews.len() as u64 + 1;
            market.reviews.push(Review {
                id: ReviewId::new(id),
                user_id: principal(caller),
                product_id: ProductId::new(id_arg(args, "productId")),
                comment: args
                    .get("comment")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                timestamp: now_nanos(),
                rating: id_arg(args, "rating"),
                photos: Vec::new(),
            });
            Json(json!({ "success": true, "reviewId": id })).into_response()
        }
        "createCustomOrderRequest" => {
            let id = market.custom_orders.len() as u64 + 1;
            market.custom_orders.push(CustomOrderRequest {
                id: OrderId::new(id),
                status: "pending".to_string(),
                shop_id: ShopId::new(id_arg(args, "shopId")),
                user_id: principal(caller),
                description: args
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                timestamp: now_nanos(),
            });
            Json(json!({ "success": true, "orderId": id })).into_response()
        }
        _ => rejection(StatusCode::NOT_FOUND, "Unknown method"),
    }
}

// =============================================================================
// Storefront under test
// =============================================================================

/// A running storefront plus the fake backend behind it.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub backend: FakeBackend,
    pub state: AppState,
}

fn test_config(base_url: &str, backend_url: &str) -> StorefrontConfig {
    let vars: HashMap<&str, String> = [
        ("STOREFRONT_BASE_URL", base_url.to_string()),
        ("BACKEND_URL", backend_url.to_string()),
        ("IDENTITY_PROVIDER_URL", IDENTITY_PROVIDER_URL.to_string()),
        ("BACKEND_TIMEOUT_SECS", "5".to_string()),
    ]
    .into_iter()
    .collect();
    StorefrontConfig::from_lookup(|key| vars.get(key).cloned()).expect("test config")
}

impl TestApp {
    /// Storefront connected to a fake backend serving `market`.
    pub async fn spawn(market: Marketplace) -> Self {
        Self::start(market, true).await
    }

    /// Storefront whose backend connection has not been established.
    pub async fn spawn_disconnected(market: Marketplace) -> Self {
        Self::start(market, false).await
    }

    async fn start(market: Marketplace, connect: bool) -> Self {
        let backend = FakeBackend::spawn(market).await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind storefront");
        let addr = listener.local_addr().expect("storefront address");
        let base_url = format!("http://{addr}");

        let config = test_config(&base_url, backend.url.as_str());
        let handle = BackendHandle::new(config.backend.clone());
        if connect {
            handle.connect().await.expect("connect to fake backend");
        }

        let state = AppState::new(config, handle);
        let app = handmade_market_storefront::app(state.clone());
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("storefront server");
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("http client");

        Self {
            base_url,
            client,
            backend,
            state,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Plain browser GET.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request")
    }

    /// GET as HTMX.
    pub async fn fragment(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("HX-Request", "true")
            .send()
            .await
            .expect("fragment request")
    }

    /// Body of an HTMX GET that must succeed.
    pub async fn fragment_text(&self, path: &str) -> String {
        let response = self.fragment(path).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK, "GET {path}");
        response.text().await.expect("fragment body")
    }

    /// Form POST as HTMX.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .expect("POST request")
    }

    /// Log in through the identity provider round trip.
    pub async fn login(&self, principal: &str) {
        let response = self.get("/auth/login").await;
        assert!(response.status().is_redirection(), "login redirects");
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .expect("login location");
        let provider = Url::parse(location).expect("provider url");
        let state = provider
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .expect("state parameter");

        let mut callback = Url::parse(&self.url("/auth/callback")).expect("callback url");
        callback
            .query_pairs_mut()
            .append_pair("state", &state)
            .append_pair("principal", principal)
            .append_pair("delegation", &format!("{DELEGATION_PREFIX}{principal}"));

        let response = self
            .client
            .get(callback)
            .send()
            .await
            .expect("callback request");
        assert!(response.status().is_redirection(), "callback redirects");
    }
}

/// Decoded `HX-Trigger` header of a response.
#[must_use]
pub fn hx_trigger(response: &reqwest::Response) -> Option<Value> {
    response
        .headers()
        .get("HX-Trigger")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| serde_json::from_str(v).ok())
}
