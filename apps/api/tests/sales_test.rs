mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{response_json, Graph, TestApp};

fn document_body(number: i64, outflows: Value) -> Value {
    json!({
        "document_type": "receipt",
        "document_number": number,
        "issued_at": "2020-07-27T14:30:00",
        "payment_method": "cash",
        "outflows": outflows
    })
}

fn outflow_line(ids: &Graph, quantity: f64) -> Value {
    json!({
        "user_id": ids.user_id,
        "product_id": ids.product_id,
        "quantity": quantity,
        "unit_cost": 600
    })
}

#[tokio::test]
async fn document_amounts_are_derived_from_outflows() {
    let app = TestApp::new().await;
    let ids = app.graph().await;

    let mut body = document_body(1, json!([outflow_line(&ids, 2.0)]));
    body["other_taxes_amount"] = json!(100);
    body["net_amount"] = json!(1);
    let document = app.create("/api/sales-documents", body).await;

    // 2 × 1190 VAT-inclusive at 19%
    assert_eq!(document["net_amount"], 2000);
    assert_eq!(document["vat_amount"], 380);
    assert_eq!(document["other_taxes_amount"], 100);
    assert_eq!(document["total_amount"], 2480);
    assert_eq!(document["payment_method"], "cash");

    let outflow = &document["outflows"][0];
    assert_eq!(outflow["unit_sale_price"], 1190);
    assert_eq!(outflow["total_sale_value"], 2380);
    assert_eq!(outflow["total_cost"], 1200);
}

#[tokio::test]
async fn explicit_sale_price_wins_over_product_price() {
    let app = TestApp::new().await;
    let ids = app.graph().await;

    let mut line = outflow_line(&ids, 1.0);
    line["unit_sale_price"] = json!(2380);
    let document = app
        .create("/api/sales-documents", document_body(1, json!([line])))
        .await;
    assert_eq!(document["total_amount"], 2380);
    assert_eq!(document["net_amount"], 2000);
}

#[tokio::test]
async fn outflow_without_any_price_is_rejected() {
    let app = TestApp::new().await;
    let ids = app.graph().await;
    let unpriced = app
        .create(
            "/api/products",
            json!({
                "sku": "BULK-1",
                "description": "Rice by weight",
                "barcode": "7800000000035",
                "delivery_unit": "kg",
                "category_id": ids.category_id
            }),
        )
        .await;

    let mut line = outflow_line(&ids, 1.0);
    line["product_id"] = unpriced["id"].clone();
    let response = app
        .post("/api/sales-documents", document_body(1, json!([line])))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(response).await["field"],
        "outflows[0].unit_sale_price"
    );
}

#[tokio::test]
async fn payment_method_must_be_known() {
    let app = TestApp::new().await;

    let mut body = document_body(1, json!([]));
    body["payment_method"] = json!("cheque");
    let response = app.post("/api/sales-documents", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "payment_method");

    let mut body = document_body(1, json!([]));
    body["payment_method"] = json!("Transfer");
    let document = app.create("/api/sales-documents", body).await;
    assert_eq!(document["payment_method"], "transfer");
}

#[tokio::test]
async fn standalone_outflow_writes_rederive_document() {
    let app = TestApp::new().await;
    let ids = app.graph().await;
    let document = app
        .create("/api/sales-documents", document_body(1, json!([])))
        .await;
    let document_id = document["id"].as_i64().expect("document id");
    assert_eq!(document["total_amount"], 0);

    let mut body = outflow_line(&ids, 3.0);
    body["sales_document_id"] = json!(document_id);
    let outflow = app.create("/api/inventory-outflows", body).await;
    let outflow_id = outflow["id"].as_i64().expect("outflow id");
    assert_eq!(outflow["total_sale_value"], 3570);

    let response = app.get(&format!("/api/sales-documents/{document_id}")).await;
    let fetched = response_json(response).await;
    assert_eq!(fetched["total_amount"], 3570);
    assert_eq!(fetched["net_amount"], 3000);
    assert_eq!(fetched["vat_amount"], 570);

    let response = app
        .put(
            &format!("/api/inventory-outflows/{outflow_id}"),
            json!({ "quantity": 1.0 }),
        )
        .await;
    let updated = response_json(response).await;
    assert_eq!(updated["total_cost"], 600);
    assert_eq!(updated["total_sale_value"], 1190);

    let response = app.get(&format!("/api/sales-documents/{document_id}")).await;
    assert_eq!(response_json(response).await["total_amount"], 1190);

    let response = app
        .delete(&format!("/api/inventory-outflows/{outflow_id}"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get(&format!("/api/sales-documents/{document_id}")).await;
    assert_eq!(response_json(response).await["total_amount"], 0);
}

#[tokio::test]
async fn document_update_replaces_outflows() {
    let app = TestApp::new().await;
    let ids = app.graph().await;
    let document = app
        .create(
            "/api/sales-documents",
            document_body(1, json!([outflow_line(&ids, 1.0), outflow_line(&ids, 2.0)])),
        )
        .await;
    let id = document["id"].as_i64().expect("document id");
    assert_eq!(document["total_amount"], 3570);

    let response = app
        .put(
            &format!("/api/sales-documents/{id}"),
            json!({ "outflows": [outflow_line(&ids, 4.0)] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await;
    assert_eq!(updated["outflows"].as_array().map(Vec::len), Some(1));
    assert_eq!(updated["total_amount"], 4760);

    let response = app.get(&format!("/api/sales-documents/{id}/outflows")).await;
    assert_eq!(response_json(response).await.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn deleting_document_removes_its_outflows() {
    let app = TestApp::new().await;
    let ids = app.graph().await;
    let document = app
        .create(
            "/api/sales-documents",
            document_body(1, json!([outflow_line(&ids, 1.0)])),
        )
        .await;
    let id = document["id"].as_i64().expect("document id");

    let response = app.delete(&format!("/api/sales-documents/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/api/inventory-outflows").await;
    assert_eq!(response_json(response).await, json!([]));
}

#[tokio::test]
async fn missing_document_is_not_found() {
    let app = TestApp::new().await;

    let response = app.get("/api/sales-documents/5").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/api/sales-documents/5/outflows").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cash_reconciliation_difference() {
    let app = TestApp::new().await;
    let ids = app.graph().await;
    let admin = app
        .user(ids.company_id, "9.876.543-2", "admin@bodega.test")
        .await;

    let reconciliation = app
        .create(
            "/api/cash-reconciliations",
            json!({
                "operator_id": ids.user_id,
                "administrator_id": admin,
                "opened_at": "2020-07-27T09:00:00Z",
                "closed_at": "2020-07-27T18:00:00Z",
                "opening_amount": 10000,
                "cash_amount": 5000,
                "card_amount": 3000,
                "closing_amount": 14500
            }),
        )
        .await;
    assert_eq!(reconciliation["transfer_amount"], 0);
    assert_eq!(reconciliation["cash_difference"], -500);

    let id = reconciliation["id"].as_i64().expect("reconciliation id");
    let response = app
        .put(
            &format!("/api/cash-reconciliations/{id}"),
            json!({ "closing_amount": 15200 }),
        )
        .await;
    assert_eq!(response_json(response).await["cash_difference"], 200);

    let response = app
        .get(&format!("/api/cash-reconciliations?administrator_id={admin}"))
        .await;
    assert_eq!(response_json(response).await.as_array().map(Vec::len), Some(1));

    let response = app.delete(&format!("/api/users/{admin}")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn cash_reconciliation_required_fields_and_references() {
    let app = TestApp::new().await;
    let ids = app.graph().await;

    let response = app
        .post(
            "/api/cash-reconciliations",
            json!({
                "operator_id": ids.user_id,
                "administrator_id": ids.user_id,
                "opening_amount": 10000
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "closing_amount");

    let response = app
        .post(
            "/api/cash-reconciliations",
            json!({
                "operator_id": ids.user_id,
                "administrator_id": 404,
                "opening_amount": 10000,
                "closing_amount": 10000
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response_json(response).await["field"], "administrator_id");

    let response = app
        .post(
            "/api/cash-reconciliations",
            json!({
                "operator_id": ids.user_id,
                "administrator_id": ids.user_id,
                "opening_amount": -1,
                "closing_amount": 10000
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "opening_amount");
}

#[tokio::test]
async fn document_gross_beyond_money_range_is_rejected() {
    let app = TestApp::new().await;
    let ids = app.graph().await;

    let mut line = outflow_line(&ids, 1.0);
    line["unit_sale_price"] = json!(5_000_000_000_000_000_000_i64);
    let response = app
        .post(
            "/api/sales-documents",
            document_body(1, json!([line.clone(), line.clone()])),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "total_amount");

    // One line fits; a second standalone line would push the document over
    let document = app
        .create("/api/sales-documents", document_body(2, json!([line.clone()])))
        .await;
    line["sales_document_id"] = document["id"].clone();
    let response = app.post("/api/inventory-outflows", line).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "total_amount");

    let response = app.get("/api/inventory-outflows").await;
    assert_eq!(response_json(response).await.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn outflow_line_beyond_money_range_is_rejected() {
    let app = TestApp::new().await;
    let ids = app.graph().await;

    let response = app
        .post(
            "/api/sales-documents",
            document_body(1, json!([outflow_line(&ids, 1e300)])),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "outflows[0].total_cost");
}

#[tokio::test]
async fn cash_difference_beyond_money_range_is_rejected() {
    let app = TestApp::new().await;
    let ids = app.graph().await;

    let response = app
        .post(
            "/api/cash-reconciliations",
            json!({
                "operator_id": ids.user_id,
                "administrator_id": ids.user_id,
                "opening_amount": i64::MAX,
                "cash_amount": 1,
                "closing_amount": 0
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "cash_difference");
}
