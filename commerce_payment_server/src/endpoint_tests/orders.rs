use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};

use super::helpers::{admin_token, customer_token, json, TestContext};

fn checkout_body() -> Value {
    json!({
        "currency": "USD",
        "shipping": 495,
        "taxes": 305,
        "billing_address_id": 1,
        "line_items": [
            { "sku": "MUG-01", "title": "Mug", "price": 1250, "quantity": 2 },
            { "sku": "TEA-07", "title": "Tea", "price": 500, "quantity": 3 }
        ]
    })
}

#[actix_web::test]
async fn create_order_for_signed_in_customer() {
    let ctx = TestContext::new().await;
    let req = TestRequest::post().uri("/orders").set_json(checkout_body());
    let (status, body) = ctx.send(Some(&customer_token("alice")), req).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order = json(&body);
    assert_eq!(order["user_id"], "alice");
    assert_eq!(order["email"], "alice@example.com");
    assert_eq!(order["subtotal"], 4000);
    assert_eq!(order["total"], 4800);
    assert_eq!(order["payment_state"], "pending");
    assert_eq!(order["line_items"].as_array().map(|a| a.len()), Some(2));
}

#[actix_web::test]
async fn create_anonymous_order() {
    let ctx = TestContext::new().await;
    let req = TestRequest::post().uri("/orders").set_json(checkout_body());
    let (status, body) = ctx.send(None, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let mut params = checkout_body();
    params["email"] = json!("guest@example.com");
    // Any owner in the body is ignored
    params["user_id"] = json!("mallory");
    let (status, body) = ctx.send(None, TestRequest::post().uri("/orders").set_json(params)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order = json(&body);
    assert_eq!(order["user_id"], "");
    assert_eq!(order["email"], "guest@example.com");
}

#[actix_web::test]
async fn create_order_validates_amounts() {
    let ctx = TestContext::new().await;
    let token = customer_token("alice");
    let mut negative_shipping = checkout_body();
    negative_shipping["shipping"] = json!(-5000);
    let overflowing = json!({
        "line_items": [{ "sku": "X", "title": "X", "price": i64::MAX / 2, "quantity": 3 }]
    });
    for params in [negative_shipping, overflowing, json!({ "line_items": [] })] {
        let (status, body) = ctx.send(Some(&token), TestRequest::post().uri("/orders").set_json(params)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(json(&body)["code"], 400);
    }
}

#[actix_web::test]
async fn fetch_order() {
    let ctx = TestContext::new().await;
    let order = ctx.create_order("alice", 5000).await;
    let uri = format!("/orders/{}", order.id);

    let (status, body) = ctx.send(Some(&customer_token("alice")), TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["id"], order.id);
    assert_eq!(json(&body)["total"], 5000);

    let (status, _) = ctx.send(Some(&admin_token()), TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx.send(Some(&customer_token("bob")), TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = ctx.send(None, TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = ctx.send(Some(&admin_token()), TestRequest::get().uri("/orders/9999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn update_unpaid_order() {
    let ctx = TestContext::new().await;
    let order = ctx.create_order("alice", 5000).await;
    let update = || {
        TestRequest::post().uri(&format!("/orders/{}", order.id)).set_json(json!({
            "currency": "EUR",
            "shipping": 500,
            "line_items": [{ "sku": "BOOK-3", "title": "Book", "price": 1000, "quantity": 2 }]
        }))
    };
    let (status, _) = ctx.send(Some(&customer_token("alice")), update()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx.send(Some(&admin_token()), update()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let updated = json(&body);
    assert_eq!(updated["currency"], "EUR");
    assert_eq!(updated["subtotal"], 2000);
    assert_eq!(updated["total"], 2500);
}

#[actix_web::test]
async fn paid_order_cannot_change() {
    let ctx = TestContext::new().await;
    let order = ctx.create_order("alice", 5000).await;
    let req = TestRequest::post()
        .uri(&format!("/orders/{}/payments", order.id))
        .set_json(json!({ "amount": 5000, "stripe_token": "tok_visa" }));
    let (status, body) = ctx.send(Some(&customer_token("alice")), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let uri = format!("/orders/{}", order.id);
    for change in [
        json!({ "currency": "EUR" }),
        json!({ "billing_address_id": 9 }),
        json!({ "line_items": [{ "sku": "X", "title": "X", "price": 1, "quantity": 1 }] }),
    ] {
        let req = TestRequest::post().uri(&uri).set_json(change);
        let (status, body) = ctx.send(Some(&admin_token()), req).await;
        assert_eq!(status, StatusCode::CONFLICT, "{body}");
        assert_eq!(json(&body)["code"], 409);
    }

    let req = TestRequest::post().uri(&uri).set_json(json!({ "fulfillment_state": "shipped" }));
    let (status, body) = ctx.send(Some(&admin_token()), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let shipped = json(&body);
    assert_eq!(shipped["fulfillment_state"], "shipped");
    assert_eq!(shipped["payment_state"], "paid");
    assert_eq!(shipped["total"], 5000);
}
