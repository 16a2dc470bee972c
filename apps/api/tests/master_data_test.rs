mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{product_body, response_json, user_body, TestApp};

#[tokio::test]
async fn empty_collections_list_as_empty_arrays() {
    let app = TestApp::new().await;

    for uri in [
        "/api/companies",
        "/api/users",
        "/api/suppliers",
        "/api/categories",
        "/api/products",
        "/api/purchase-invoices",
        "/api/inventory-inflows",
        "/api/sales-documents",
        "/api/inventory-outflows",
        "/api/cash-reconciliations",
    ] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(response_json(response).await, json!([]), "{uri}");
    }
}

#[tokio::test]
async fn company_lifecycle() {
    let app = TestApp::new().await;

    let company = app
        .create(
            "/api/companies",
            json!({
                "name": "  Bodega Central ",
                "tax_id": "76.123.456-7",
                "legal_name": "Bodega Central SpA",
                "industry": "Retail"
            }),
        )
        .await;
    let id = company["id"].as_i64().expect("company id");
    assert_eq!(company["name"], "Bodega Central");

    let response = app
        .put(&format!("/api/companies/{id}"), json!({ "industry": "Groceries" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await;
    assert_eq!(updated["industry"], "Groceries");
    assert_eq!(updated["tax_id"], "76.123.456-7");

    let response = app.delete(&format!("/api/companies/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["message"], format!("Company {id} deleted"));

    let response = app.get(&format!("/api/companies/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["code"], "not_found");
}

#[tokio::test]
async fn company_tax_id_and_legal_name_are_unique() {
    let app = TestApp::new().await;
    app.company("76.123.456-7", "Bodega Central SpA").await;
    let other = app.company("77.000.000-1", "Minimarket Sur SpA").await;

    let response = app
        .post(
            "/api/companies",
            json!({
                "name": "Copy",
                "tax_id": "76.123.456-7",
                "legal_name": "Another SpA",
                "industry": "Retail"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert_eq!(body["code"], "duplicate");
    assert_eq!(body["field"], "tax_id");

    let response = app
        .put(
            &format!("/api/companies/{other}"),
            json!({ "legal_name": "Bodega Central SpA" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response_json(response).await["field"], "legal_name");
}

#[tokio::test]
async fn update_keeping_own_unique_values_is_accepted() {
    let app = TestApp::new().await;
    let id = app.company("76.123.456-7", "Bodega Central SpA").await;

    let response = app
        .put(
            &format!("/api/companies/{id}"),
            json!({ "tax_id": "76.123.456-7", "legal_name": "Bodega Central SpA" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_required_field_is_named() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/companies",
            json!({ "name": "Bodega", "tax_id": "1-9", "legal_name": "  ", "industry": "Retail" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["field"], "legal_name");
}

#[tokio::test]
async fn supplied_update_field_must_not_be_blank() {
    let app = TestApp::new().await;
    let id = app.company("76.123.456-7", "Bodega Central SpA").await;

    let response = app
        .put(&format!("/api/companies/{id}"), json!({ "name": "" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "name");
}

#[tokio::test]
async fn deleting_company_with_users_is_rejected() {
    let app = TestApp::new().await;
    let company_id = app.company("76.123.456-7", "Bodega Central SpA").await;
    let user_id = app.user(company_id, "12.345.678-9", "ana@bodega.test").await;

    let response = app.delete(&format!("/api/companies/{company_id}")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response_json(response).await["code"], "has_dependents");

    let response = app.get(&format!("/api/users/{user_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn user_requires_every_identity_field() {
    let app = TestApp::new().await;
    let company_id = app.company("76.123.456-7", "Bodega Central SpA").await;

    for field in ["name", "surname", "tax_id", "role", "email", "password"] {
        let mut body = user_body(company_id, "12.345.678-9", "ana@bodega.test");
        body[field] = json!("");
        let response = app.post("/api/users", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{field}");
        assert_eq!(response_json(response).await["field"], field);
    }

    let response = app.get("/api/users").await;
    assert_eq!(response_json(response).await, json!([]));
}

#[tokio::test]
async fn user_gets_code_and_hides_password() {
    let app = TestApp::new().await;
    let company_id = app.company("76.123.456-7", "Bodega Central SpA").await;

    let user = app
        .create("/api/users", user_body(company_id, "12.345.678-9", "ana@bodega.test"))
        .await;
    let id = user["id"].as_i64().expect("user id");
    assert_eq!(user["code"], 1000 + id);
    assert_eq!(user["active"], true);
    assert!(user.get("password_hash").is_none());
    assert!(user.get("password").is_none());
}

#[tokio::test]
async fn user_email_is_unique_and_well_formed() {
    let app = TestApp::new().await;
    let company_id = app.company("76.123.456-7", "Bodega Central SpA").await;
    app.user(company_id, "12.345.678-9", "ana@bodega.test").await;

    let response = app
        .post("/api/users", user_body(company_id, "9.876.543-2", "ana@bodega.test"))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response_json(response).await["field"], "email");

    let response = app
        .post("/api/users", user_body(company_id, "9.876.543-2", "not-an-email"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "email");
}

#[tokio::test]
async fn user_with_unknown_company_is_unprocessable() {
    let app = TestApp::new().await;

    let response = app
        .post("/api/users", user_body(999, "12.345.678-9", "ana@bodega.test"))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["code"], "reference_not_found");
    assert_eq!(body["field"], "company_id");
}

#[tokio::test]
async fn users_filter_by_company() {
    let app = TestApp::new().await;
    let first = app.company("76.123.456-7", "Bodega Central SpA").await;
    let second = app.company("77.000.000-1", "Minimarket Sur SpA").await;
    app.user(first, "12.345.678-9", "ana@bodega.test").await;
    let other = app.user(second, "9.876.543-2", "luis@bodega.test").await;

    let response = app.get(&format!("/api/users?company_id={second}")).await;
    let users = response_json(response).await;
    let users = users.as_array().expect("user list");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], other);
}

#[tokio::test]
async fn second_supplier_with_same_tax_id_is_rejected() {
    let app = TestApp::new().await;
    app.supplier("11111111-1", "ACME Ltda").await;

    let response = app
        .post(
            "/api/suppliers",
            json!({
                "name": "ACME",
                "tax_id": "11111111-1",
                "legal_name": "ACME Distribution Ltda",
                "industry": "Wholesale",
                "address": "Calle Dos 45"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert_eq!(body["code"], "duplicate");
    assert_eq!(body["field"], "tax_id");
}

#[tokio::test]
async fn supplier_bank_details_are_optional() {
    let app = TestApp::new().await;
    let id = app.supplier("11111111-1", "ACME Ltda").await;

    let response = app
        .put(
            &format!("/api/suppliers/{id}"),
            json!({ "bank_account": "000123456", "bank_name": "Banco Estado" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let supplier = response_json(response).await;
    assert_eq!(supplier["bank_name"], "Banco Estado");

    let response = app
        .put(&format!("/api/suppliers/{id}"), json!({ "bank_name": "" }))
        .await;
    assert_eq!(response_json(response).await["bank_name"], json!(null));
}

#[tokio::test]
async fn category_name_is_unique() {
    let app = TestApp::new().await;
    app.category("Beverages").await;

    let response = app.post("/api/categories", json!({ "name": "Beverages" })).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response_json(response).await["field"], "name");
}

#[tokio::test]
async fn category_with_products_cannot_be_deleted() {
    let app = TestApp::new().await;
    let category_id = app.category("Beverages").await;
    app.product(category_id, "BEV-001", "7800000000011").await;

    let response = app.delete(&format!("/api/categories/{category_id}")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn product_with_sku_in_use_lists_existing_product() {
    let app = TestApp::new().await;
    let category_id = app.category("Beverages").await;
    let existing = app.product(category_id, "BEV-001", "7800000000011").await;

    let response = app
        .post("/api/products", product_body(category_id, "BEV-001", "7800000000028"))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert_eq!(body["code"], "duplicate");
    assert_eq!(body["field"], "sku");
    assert_eq!(body["details"]["id"], existing);
    assert_eq!(body["details"]["barcode"], "7800000000011");
}

#[tokio::test]
async fn product_barcode_is_unique_on_update() {
    let app = TestApp::new().await;
    let category_id = app.category("Beverages").await;
    app.product(category_id, "BEV-001", "7800000000011").await;
    let second = app.product(category_id, "BEV-002", "7800000000028").await;

    let response = app
        .put(
            &format!("/api/products/{second}"),
            json!({ "barcode": "7800000000011" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response_json(response).await["field"], "barcode");
}

#[tokio::test]
async fn product_numeric_constraints() {
    let app = TestApp::new().await;
    let category_id = app.category("Beverages").await;

    let mut body = product_body(category_id, "BEV-001", "7800000000011");
    body["unit_sale_price"] = json!(-1);
    let response = app.post("/api/products", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "unit_sale_price");

    let mut body = product_body(category_id, "BEV-001", "7800000000011");
    body["contribution_margin"] = json!(-5.0);
    let response = app.post("/api/products", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "contribution_margin");
}

#[tokio::test]
async fn product_with_unknown_category_is_unprocessable() {
    let app = TestApp::new().await;

    let response = app
        .post("/api/products", product_body(42, "BEV-001", "7800000000011"))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response_json(response).await["field"], "category_id");
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let app = TestApp::new().await;

    let response = app.get("/api/products/abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["code"], "invalid_request");

    let response = app
        .post("/api/categories", json!({ "name": 12 }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["code"], "invalid_request");
}
