use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};

use super::helpers::{admin_token, customer_token, json, TestContext};

/// Pays a fresh order for alice and returns the charge.
async fn paid_charge(ctx: &TestContext, total: i64, wallet: bool) -> Value {
    let order = ctx.create_order("alice", total).await;
    let body = if wallet {
        json!({ "amount": total, "paypal_payment_id": "PAY-1", "paypal_user_id": "PAYER-1" })
    } else {
        json!({ "amount": total, "stripe_token": "tok_visa" })
    };
    let req = TestRequest::post().uri(&format!("/orders/{}/payments", order.id)).set_json(body);
    let (status, body) = ctx.send(Some(&customer_token("alice")), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    json(&body)
}

fn refund(charge: &Value, amount: i64) -> TestRequest {
    let id = charge["id"].as_str().expect("charge id");
    TestRequest::post().uri(&format!("/payments/{id}/refund")).set_json(json!({ "amount": amount }))
}

#[actix_web::test]
async fn partial_refunds() {
    let ctx = TestContext::new().await;
    let charge = paid_charge(&ctx, 5000, false).await;
    let admin = admin_token();

    let (status, body) = ctx.send(Some(&admin), refund(&charge, 2000)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let first = json(&body);
    assert_eq!(first["type"], "refund");
    assert_eq!(first["status"], "paid");
    assert_eq!(first["amount"], 2000);
    assert_eq!(first["currency"], "USD");
    assert_eq!(first["processor_id"], "re_ch_test");
    assert_eq!(first["order_id"], charge["order_id"]);

    let (status, body) = ctx.send(Some(&admin), refund(&charge, 3001)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    let (status, _) = ctx.send(Some(&admin), refund(&charge, 3000)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.card.refund_count(), 2);
}

#[actix_web::test]
async fn only_administrators_refund() {
    let ctx = TestContext::new().await;
    let charge = paid_charge(&ctx, 5000, false).await;
    let (status, body) = ctx.send(Some(&customer_token("alice")), refund(&charge, 1000)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["code"], 403);
    let (status, _) = ctx.send(None, refund(&charge, 1000)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.card.refund_count(), 0);
}

#[actix_web::test]
async fn wallet_refunds_are_unsupported() {
    let ctx = TestContext::new().await;
    let charge = paid_charge(&ctx, 5000, true).await;
    let (status, body) = ctx.send(Some(&admin_token()), refund(&charge, 1000)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    assert_eq!(json(&body)["code"], 422);
}

#[actix_web::test]
async fn refund_preconditions() {
    let ctx = TestContext::new().await;
    let charge = paid_charge(&ctx, 5000, false).await;
    let admin = admin_token();

    let req = TestRequest::post().uri("/payments/missing/refund").set_json(json!({ "amount": 100 }));
    let (status, _) = ctx.send(Some(&admin), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let id = charge["id"].as_str().expect("charge id");
    let req = TestRequest::post()
        .uri(&format!("/payments/{id}/refund"))
        .set_json(json!({ "amount": 100, "currency": "EUR" }));
    let (status, _) = ctx.send(Some(&admin), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx.send(Some(&admin), refund(&charge, 0)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx.send(Some(&admin), refund(&charge, 500)).await;
    assert_eq!(status, StatusCode::OK);
    let refund_tx = json(&body);
    let (status, body) = ctx.send(Some(&admin), refund(&refund_tx, 100)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap_or_default().contains("is not a charge"), "{body}");
}
