use actix_web::{http::StatusCode, test::TestRequest};
use commerce_payment_engine::{db_types::PaymentProcessor, test_utils::stub_providers::ScriptedProvider};
use serde_json::json;

use super::helpers::{admin_token, customer_token, json, TestContext};

#[actix_web::test]
async fn health() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.send(None, TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn pay_with_card() {
    let ctx = TestContext::new().await;
    let order = ctx.create_order("alice", 5000).await;
    let token = customer_token("alice");
    let req = TestRequest::post()
        .uri(&format!("/orders/{}/payments", order.id))
        .set_json(json!({ "amount": 5000, "stripe_token": "tok_visa" }));
    let (status, body) = ctx.send(Some(&token), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let tx = json(&body);
    assert_eq!(tx["status"], "paid");
    assert_eq!(tx["type"], "charge");
    assert_eq!(tx["amount"], 5000);
    assert_eq!(tx["currency"], "USD");
    assert_eq!(tx["processor_id"], "ch_test");
    assert_eq!(ctx.card.last_charge().expect("no charge was made").token, "tok_visa");

    let req = TestRequest::get().uri(&format!("/orders/{}/payments", order.id));
    let (status, body) = ctx.send(Some(&token), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body).as_array().map(|a| a.len()), Some(1));
}

#[actix_web::test]
async fn pay_with_wallet() {
    let ctx = TestContext::new().await;
    let order = ctx.create_order("alice", 5000).await;
    let req = TestRequest::post().uri(&format!("/orders/{}/payments", order.id)).set_json(json!({
        "amount": 5000,
        "currency": "USD",
        "paypal_payment_id": "PAY-1",
        "paypal_user_id": "PAYER-1"
    }));
    let (status, body) = ctx.send(Some(&customer_token("alice")), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["processor_id"], "PAY-test");
    assert_eq!(ctx.wallet.charge_count(), 1);
    assert_eq!(ctx.card.charge_count(), 0);
}

#[actix_web::test]
async fn anonymous_order_paid_anonymously() {
    let ctx = TestContext::new().await;
    let order = ctx.create_order("", 1500).await;
    let req = TestRequest::post()
        .uri(&format!("/orders/{}/payments", order.id))
        .set_json(json!({ "amount": 1500, "stripe_token": "tok_visa" }));
    let (status, body) = ctx.send(None, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["user_id"], "");
}

#[actix_web::test]
async fn paying_twice_conflicts() {
    let ctx = TestContext::new().await;
    let order = ctx.create_order("alice", 5000).await;
    let token = customer_token("alice");
    let pay = || {
        TestRequest::post()
            .uri(&format!("/orders/{}/payments", order.id))
            .set_json(json!({ "amount": 5000, "stripe_token": "tok_visa" }))
    };
    let (status, _) = ctx.send(Some(&token), pay()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = ctx.send(Some(&token), pay()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json(&body)["code"], 409);
    assert_eq!(ctx.card.charge_count(), 1);
}

#[actix_web::test]
async fn wrong_amount_is_a_server_error() {
    let ctx = TestContext::new().await;
    let order = ctx.create_order("alice", 5000).await;
    let req = TestRequest::post()
        .uri(&format!("/orders/{}/payments", order.id))
        .set_json(json!({ "amount": 4999, "stripe_token": "tok_visa" }));
    let (status, body) = ctx.send(Some(&customer_token("alice")), req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = json(&body);
    assert_eq!(body["code"], 500);
    assert!(!body["error"].as_str().unwrap_or_default().contains("4999"), "internal details leaked: {body}");
    assert_eq!(ctx.card.charge_count(), 0);
}

#[actix_web::test]
async fn currency_mismatch() {
    let ctx = TestContext::new().await;
    let order = ctx.create_order("alice", 5000).await;
    let req = TestRequest::post()
        .uri(&format!("/orders/{}/payments", order.id))
        .set_json(json!({ "amount": 5000, "currency": "EUR", "stripe_token": "tok_visa" }));
    let (status, body) = ctx.send(Some(&customer_token("alice")), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], 400);
}

#[actix_web::test]
async fn missing_credentials() {
    let ctx = TestContext::new().await;
    let order = ctx.create_order("alice", 5000).await;
    let req =
        TestRequest::post().uri(&format!("/orders/{}/payments", order.id)).set_json(json!({ "amount": 5000 }));
    let (status, _) = ctx.send(Some(&customer_token("alice")), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn someone_elses_order() {
    let ctx = TestContext::new().await;
    let order = ctx.create_order("alice", 5000).await;
    let req = TestRequest::post()
        .uri(&format!("/orders/{}/payments", order.id))
        .set_json(json!({ "amount": 5000, "stripe_token": "tok_visa" }));
    let (status, body) = ctx.send(Some(&customer_token("bob")), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["code"], 403);

    let req = TestRequest::get().uri(&format!("/orders/{}/payments", order.id));
    let (status, _) = ctx.send(Some(&customer_token("bob")), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn unknown_order() {
    let ctx = TestContext::new().await;
    let req = TestRequest::post()
        .uri("/orders/9999/payments")
        .set_json(json!({ "amount": 5000, "stripe_token": "tok_visa" }));
    let (status, body) = ctx.send(Some(&customer_token("alice")), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "Order 9999 was not found");
}

#[actix_web::test]
async fn malformed_requests() {
    let ctx = TestContext::new().await;
    let token = customer_token("alice");
    let req = TestRequest::post()
        .uri("/orders/1/payments")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"amount\": \"lots\"}");
    let (status, body) = ctx.send(Some(&token), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], 400);

    let req = TestRequest::get().uri("/orders/first/payments");
    let (status, body) = ctx.send(Some(&token), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], 400);
}

#[actix_web::test]
async fn declined_card_is_recorded() {
    let card = ScriptedProvider::failing(PaymentProcessor::Stripe, "Your card was declined");
    let ctx = TestContext::with_card(card).await;
    let order = ctx.create_order("alice", 5000).await;
    let token = customer_token("alice");
    let req = TestRequest::post()
        .uri(&format!("/orders/{}/payments", order.id))
        .set_json(json!({ "amount": 5000, "stripe_token": "tok_chargeDeclined" }));
    let (status, body) = ctx.send(Some(&token), req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["error"].as_str().unwrap_or_default().contains("Your card was declined"), "{body}");

    let req = TestRequest::get().uri(&format!("/orders/{}/payments", order.id));
    let (status, body) = ctx.send(Some(&token), req).await;
    assert_eq!(status, StatusCode::OK);
    let txs = json(&body);
    assert_eq!(txs[0]["status"], "failed");
    assert_eq!(txs[0]["failure_code"], "card_declined");
}

#[actix_web::test]
async fn payment_queries() {
    let ctx = TestContext::new().await;
    let alice = ctx.create_order("alice", 5000).await;
    let bob = ctx.create_order("bob", 700).await;
    for (order, user, amount) in [(&alice, "alice", 5000), (&bob, "bob", 700)] {
        let req = TestRequest::post()
            .uri(&format!("/orders/{}/payments", order.id))
            .set_json(json!({ "amount": amount, "stripe_token": "tok_visa" }));
        let (status, _) = ctx.send(Some(&customer_token(user)), req).await;
        assert_eq!(status, StatusCode::OK);
    }

    let alice_token = customer_token("alice");
    let admin = admin_token();
    let get = |uri: &str| TestRequest::get().uri(uri);

    let (status, body) = ctx.send(Some(&alice_token), get("/users/alice/payments")).await;
    assert_eq!(status, StatusCode::OK);
    let mine = json(&body);
    assert_eq!(mine.as_array().map(|a| a.len()), Some(1));
    let pay_id = mine[0]["id"].as_str().expect("transaction id").to_string();

    let (status, _) = ctx.send(Some(&alice_token), get("/users/bob/payments")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = ctx.send(None, get("/users/bob/payments")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.send(Some(&alice_token), get("/payments")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = ctx.send(Some(&admin), get("/payments?status=paid&type=charge")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body).as_array().map(|a| a.len()), Some(2));
    let (status, body) = ctx.send(Some(&admin), get("/payments?user_id=bob")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)[0]["amount"], 700);
    let (status, _) = ctx.send(Some(&admin), get("/payments?status=lost")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx.send(Some(&admin), get(&format!("/payments/{pay_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["order_id"], alice.id);
    let (status, _) = ctx.send(Some(&alice_token), get(&format!("/payments/{pay_id}"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = ctx.send(Some(&admin), get("/payments/no-such-payment")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
