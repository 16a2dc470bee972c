mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{response_json, Graph, TestApp};

fn invoice_body(ids: &Graph, folio: i64, inflows: Value) -> Value {
    json!({
        "folio": folio,
        "issued_at": "2020-07-27",
        "received_at": "2020-07-28 09:30:00",
        "net_amount": 10000,
        "vat_amount": 1900,
        "supplier_id": ids.supplier_id,
        "inflows": inflows
    })
}

fn inflow_line(ids: &Graph, quantity: f64, unit_cost: i64) -> Value {
    json!({
        "user_id": ids.user_id,
        "product_id": ids.product_id,
        "quantity": quantity,
        "unit_cost": unit_cost
    })
}

#[tokio::test]
async fn invoice_is_created_with_its_inflows() {
    let app = TestApp::new().await;
    let ids = app.graph().await;

    let invoice = app
        .create(
            "/api/purchase-invoices",
            invoice_body(
                &ids,
                1001,
                json!([inflow_line(&ids, 3.0, 1000), inflow_line(&ids, 2.5, 400)]),
            ),
        )
        .await;

    assert_eq!(invoice["other_taxes_amount"], 0);
    assert_eq!(invoice["total_amount"], 11900);
    let inflows = invoice["inflows"].as_array().expect("inflows");
    assert_eq!(inflows.len(), 2);
    assert_eq!(inflows[0]["total_cost"], 3000);
    assert_eq!(inflows[1]["total_cost"], 1000);

    let id = invoice["id"].as_i64().expect("invoice id");
    let response = app.get(&format!("/api/purchase-invoices/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = response_json(response).await;
    assert_eq!(fetched["folio"], 1001);
    assert_eq!(fetched["inflows"].as_array().map(Vec::len), Some(2));

    let response = app.get(&format!("/api/purchase-invoices/{id}/inflows")).await;
    assert_eq!(response_json(response).await.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn invoice_total_ignores_submitted_total() {
    let app = TestApp::new().await;
    let ids = app.graph().await;

    let mut body = invoice_body(&ids, 1001, json!([]));
    body["other_taxes_amount"] = json!(250);
    body["total_amount"] = json!(1);
    let invoice = app.create("/api/purchase-invoices", body).await;
    assert_eq!(invoice["total_amount"], 12150);

    let id = invoice["id"].as_i64().expect("invoice id");
    let response = app
        .put(&format!("/api/purchase-invoices/{id}"), json!({ "vat_amount": 0 }))
        .await;
    assert_eq!(response_json(response).await["total_amount"], 10250);
}

#[tokio::test]
async fn replacing_two_inflows_with_one_leaves_exactly_one() {
    let app = TestApp::new().await;
    let ids = app.graph().await;

    let invoice = app
        .create(
            "/api/purchase-invoices",
            invoice_body(
                &ids,
                1001,
                json!([inflow_line(&ids, 3.0, 1000), inflow_line(&ids, 1.0, 500)]),
            ),
        )
        .await;
    let id = invoice["id"].as_i64().expect("invoice id");

    let response = app
        .put(
            &format!("/api/purchase-invoices/{id}"),
            json!({ "inflows": [inflow_line(&ids, 7.0, 200)] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await;
    let inflows = updated["inflows"].as_array().expect("inflows");
    assert_eq!(inflows.len(), 1);
    assert_eq!(inflows[0]["total_cost"], 1400);

    let response = app
        .get(&format!("/api/inventory-inflows?purchase_invoice_id={id}"))
        .await;
    assert_eq!(response_json(response).await.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn update_without_inflows_keeps_them() {
    let app = TestApp::new().await;
    let ids = app.graph().await;

    let invoice = app
        .create(
            "/api/purchase-invoices",
            invoice_body(&ids, 1001, json!([inflow_line(&ids, 3.0, 1000)])),
        )
        .await;
    let id = invoice["id"].as_i64().expect("invoice id");

    let response = app
        .put(&format!("/api/purchase-invoices/{id}"), json!({ "folio": 2002 }))
        .await;
    let updated = response_json(response).await;
    assert_eq!(updated["folio"], 2002);
    assert_eq!(updated["inflows"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn invalid_inflow_line_is_named_by_position() {
    let app = TestApp::new().await;
    let ids = app.graph().await;

    let response = app
        .post(
            "/api/purchase-invoices",
            invoice_body(
                &ids,
                1001,
                json!([inflow_line(&ids, 1.0, 100), inflow_line(&ids, 0.0, 100)]),
            ),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "inflows[1].quantity");

    let mut line = inflow_line(&ids, 1.0, 100);
    line["product_id"] = json!(999);
    let response = app
        .post("/api/purchase-invoices", invoice_body(&ids, 1001, json!([line])))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response_json(response).await["field"], "inflows[0].product_id");

    let response = app.get("/api/purchase-invoices").await;
    assert_eq!(response_json(response).await, json!([]));
}

#[tokio::test]
async fn invoice_header_rules() {
    let app = TestApp::new().await;
    let ids = app.graph().await;

    let mut body = invoice_body(&ids, 1001, json!([]));
    body["issued_at"] = json!("27/07/2020");
    let response = app.post("/api/purchase-invoices", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "issued_at");

    let mut body = invoice_body(&ids, 1001, json!([]));
    body["net_amount"] = json!(-10);
    let response = app.post("/api/purchase-invoices", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "net_amount");

    let mut body = invoice_body(&ids, 1001, json!([]));
    body["supplier_id"] = json!(999);
    let response = app.post("/api/purchase-invoices", body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response_json(response).await["field"], "supplier_id");
}

#[tokio::test]
async fn deleting_invoice_removes_its_inflows() {
    let app = TestApp::new().await;
    let ids = app.graph().await;

    let invoice = app
        .create(
            "/api/purchase-invoices",
            invoice_body(&ids, 1001, json!([inflow_line(&ids, 3.0, 1000)])),
        )
        .await;
    let id = invoice["id"].as_i64().expect("invoice id");
    let inflow_id = invoice["inflows"][0]["id"].as_i64().expect("inflow id");

    let response = app.delete(&format!("/api/purchase-invoices/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get(&format!("/api/inventory-inflows/{inflow_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn supplier_with_invoices_cannot_be_deleted() {
    let app = TestApp::new().await;
    let ids = app.graph().await;
    app.create("/api/purchase-invoices", invoice_body(&ids, 1001, json!([])))
        .await;

    let response = app.delete(&format!("/api/suppliers/{}", ids.supplier_id)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn standalone_inflow_total_cost_follows_updates() {
    let app = TestApp::new().await;
    let ids = app.graph().await;
    let invoice = app
        .create("/api/purchase-invoices", invoice_body(&ids, 1001, json!([])))
        .await;
    let invoice_id = invoice["id"].as_i64().expect("invoice id");

    let mut body = inflow_line(&ids, 3.0, 1000);
    body["purchase_invoice_id"] = json!(invoice_id);
    let inflow = app.create("/api/inventory-inflows", body).await;
    assert_eq!(inflow["total_cost"], 3000);
    let id = inflow["id"].as_i64().expect("inflow id");

    let response = app
        .put(&format!("/api/inventory-inflows/{id}"), json!({ "quantity": 5.0 }))
        .await;
    assert_eq!(response_json(response).await["total_cost"], 5000);

    let response = app
        .put(&format!("/api/inventory-inflows/{id}"), json!({ "unit_cost": 1250 }))
        .await;
    assert_eq!(response_json(response).await["total_cost"], 6250);

    // Supplier-stated amounts are untouched by inflow writes
    let response = app.get(&format!("/api/purchase-invoices/{invoice_id}")).await;
    assert_eq!(response_json(response).await["total_amount"], 11900);
}

#[tokio::test]
async fn inflow_numeric_constraints() {
    let app = TestApp::new().await;
    let ids = app.graph().await;
    let invoice = app
        .create("/api/purchase-invoices", invoice_body(&ids, 1001, json!([])))
        .await;

    let mut body = inflow_line(&ids, 2.0, 0);
    body["purchase_invoice_id"] = invoice["id"].clone();
    let response = app.post("/api/inventory-inflows", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "unit_cost");

    let mut body = inflow_line(&ids, -1.0, 100);
    body["purchase_invoice_id"] = invoice["id"].clone();
    let response = app.post("/api/inventory-inflows", body).await;
    assert_eq!(response_json(response).await["field"], "quantity");
}

#[tokio::test]
async fn inflow_against_missing_invoice_is_unprocessable() {
    let app = TestApp::new().await;
    let ids = app.graph().await;

    let mut body = inflow_line(&ids, 1.0, 100);
    body["purchase_invoice_id"] = json!(77);
    let response = app.post("/api/inventory-inflows", body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response_json(response).await["field"], "purchase_invoice_id");
}

#[tokio::test]
async fn product_with_movements_cannot_be_deleted() {
    let app = TestApp::new().await;
    let ids = app.graph().await;
    app.create(
        "/api/purchase-invoices",
        invoice_body(&ids, 1001, json!([inflow_line(&ids, 1.0, 100)])),
    )
    .await;

    let response = app.delete(&format!("/api/products/{}", ids.product_id)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response_json(response).await["code"], "has_dependents");
}

#[tokio::test]
async fn inflow_cost_beyond_money_range_is_rejected() {
    let app = TestApp::new().await;
    let ids = app.graph().await;

    let response = app
        .post(
            "/api/purchase-invoices",
            invoice_body(&ids, 1001, json!([inflow_line(&ids, 1e300, 1000)])),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["field"], "inflows[0].total_cost");

    let invoice = app
        .create("/api/purchase-invoices", invoice_body(&ids, 1002, json!([])))
        .await;
    let mut body = inflow_line(&ids, 3.0, 1000);
    body["purchase_invoice_id"] = invoice["id"].clone();
    let inflow = app.create("/api/inventory-inflows", body).await;
    let id = inflow["id"].as_i64().expect("inflow id");

    let response = app
        .put(&format!("/api/inventory-inflows/{id}"), json!({ "quantity": 1e300 }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "total_cost");

    let response = app.get(&format!("/api/inventory-inflows/{id}")).await;
    assert_eq!(response_json(response).await["total_cost"], 3000);
}

#[tokio::test]
async fn invoice_total_beyond_money_range_is_rejected() {
    let app = TestApp::new().await;
    let ids = app.graph().await;

    let mut body = invoice_body(&ids, 1001, json!([]));
    body["net_amount"] = json!(i64::MAX);
    body["vat_amount"] = json!(1);
    let response = app.post("/api/purchase-invoices", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "total_amount");

    let invoice = app
        .create("/api/purchase-invoices", invoice_body(&ids, 1002, json!([])))
        .await;
    let id = invoice["id"].as_i64().expect("invoice id");
    let response = app
        .put(
            &format!("/api/purchase-invoices/{id}"),
            json!({ "other_taxes_amount": i64::MAX }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["field"], "total_amount");

    let response = app.get("/api/purchase-invoices").await;
    let invoices = response_json(response).await;
    assert_eq!(invoices.as_array().map(Vec::len), Some(1));
    assert_eq!(invoices[0]["total_amount"], 11900);
}
