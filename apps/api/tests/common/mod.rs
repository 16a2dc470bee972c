#![allow(dead_code)]

use axum::body::{self, Body};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use bodega_api::{build_router, ApiConfig, AppState};
use bodega_db::{Database, DbConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes_only";

/// Router over a fresh in-memory database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Tokens are optional.
    pub async fn new() -> Self {
        Self::with_config(test_config(false)).await
    }

    /// Every `/api` route requires a bearer token.
    pub async fn with_required_auth() -> Self {
        Self::with_config(test_config(true)).await
    }

    pub async fn with_config(config: ApiConfig) -> Self {
        let db = Database::new(DbConfig::in_memory())
            .await
            .expect("failed to create test database");
        let state = AppState::new(db, config);
        let router = build_router(state.clone());
        TestApp { router, state }
    }

    pub fn token_for(&self, user_id: i64) -> String {
        self.state
            .jwt
            .generate_access_token(user_id)
            .expect("encode access token")
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Response {
        self.request(Method::POST, uri, Some(body), None).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> Response {
        self.request(Method::PUT, uri, Some(body), None).await
    }

    pub async fn delete(&self, uri: &str) -> Response {
        self.request(Method::DELETE, uri, None, None).await
    }

    /// POSTs `body`, asserts 201 and returns the created entity.
    pub async fn create(&self, uri: &str, body: Value) -> Value {
        let response = self.post(uri, body).await;
        let status = response.status();
        let json = response_json(response).await;
        assert_eq!(status, StatusCode::CREATED, "create {uri} failed: {json}");
        json
    }

    // -------------------------------------------------------------------------
    // Fixtures
    // -------------------------------------------------------------------------

    pub async fn company(&self, tax_id: &str, legal_name: &str) -> i64 {
        self.create(
            "/api/companies",
            json!({
                "name": "Bodega Central",
                "tax_id": tax_id,
                "legal_name": legal_name,
                "industry": "Retail"
            }),
        )
        .await["id"]
            .as_i64()
            .expect("company id")
    }

    pub async fn user(&self, company_id: i64, tax_id: &str, email: &str) -> i64 {
        self.create("/api/users", user_body(company_id, tax_id, email))
            .await["id"]
            .as_i64()
            .expect("user id")
    }

    pub async fn supplier(&self, tax_id: &str, legal_name: &str) -> i64 {
        self.create(
            "/api/suppliers",
            json!({
                "name": "ACME",
                "tax_id": tax_id,
                "legal_name": legal_name,
                "industry": "Wholesale",
                "address": "Av. Principal 123"
            }),
        )
        .await["id"]
            .as_i64()
            .expect("supplier id")
    }

    pub async fn category(&self, name: &str) -> i64 {
        self.create("/api/categories", json!({ "name": name }))
            .await["id"]
            .as_i64()
            .expect("category id")
    }

    pub async fn product(&self, category_id: i64, sku: &str, barcode: &str) -> i64 {
        self.create("/api/products", product_body(category_id, sku, barcode))
            .await["id"]
            .as_i64()
            .expect("product id")
    }

    /// Company, user, supplier, category and a product priced at 1190.
    pub async fn graph(&self) -> Graph {
        let company_id = self.company("76.123.456-7", "Bodega Central SpA").await;
        let user_id = self.user(company_id, "12.345.678-9", "cashier@bodega.test").await;
        let supplier_id = self.supplier("11111111-1", "ACME Ltda").await;
        let category_id = self.category("Beverages").await;
        let product_id = self.product(category_id, "BEV-001", "7800000000011").await;
        Graph {
            company_id,
            user_id,
            supplier_id,
            category_id,
            product_id,
        }
    }
}

pub struct Graph {
    pub company_id: i64,
    pub user_id: i64,
    pub supplier_id: i64,
    pub category_id: i64,
    pub product_id: i64,
}

pub fn test_config(auth_required: bool) -> ApiConfig {
    let mut config = ApiConfig::default();
    config.auth.required = auth_required;
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config
}

pub fn user_body(company_id: i64, tax_id: &str, email: &str) -> Value {
    json!({
        "name": "Ana",
        "surname": "Rojas",
        "tax_id": tax_id,
        "role": "Cashier",
        "email": email,
        "password": "s3cret",
        "company_id": company_id
    })
}

pub fn product_body(category_id: i64, sku: &str, barcode: &str) -> Value {
    json!({
        "sku": sku,
        "description": "Mineral water 500ml",
        "barcode": barcode,
        "delivery_unit": "unit",
        "unit_sale_price": 1190,
        "category_id": category_id
    })
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
