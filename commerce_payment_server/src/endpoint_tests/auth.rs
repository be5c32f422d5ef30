use actix_web::{http::StatusCode, test::TestRequest};
use chrono::Duration;
use serde_json::json;

use super::helpers::{customer_token, issue_token, json, TestContext};

fn pay(order_id: i64) -> TestRequest {
    TestRequest::post()
        .uri(&format!("/orders/{order_id}/payments"))
        .set_json(json!({ "amount": 5000, "stripe_token": "tok_visa" }))
}

#[actix_web::test]
async fn expired_token() {
    let ctx = TestContext::new().await;
    let order = ctx.create_order("alice", 5000).await;
    let token = issue_token("alice", &[], Duration::hours(-2));
    let (status, body) = ctx.send(Some(&token), pay(order.id)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body = json(&body);
    assert_eq!(body["code"], 401);
    assert_eq!(body["error"], "Authentication Error. Access token has expired.");
    assert_eq!(ctx.card.charge_count(), 0);
}

#[actix_web::test]
async fn tampered_token() {
    let ctx = TestContext::new().await;
    let order = ctx.create_order("alice", 5000).await;
    let mut token = customer_token("alice");
    token.replace_range(token.len() - 10..token.len() - 5, "AAAAA");
    let (status, _) = ctx.send(Some(&token), pay(order.id)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn not_a_bearer_token() {
    let ctx = TestContext::new().await;
    let order = ctx.create_order("", 5000).await;
    let req = pay(order.id).insert_header(("Authorization", "Basic YWxpY2U6c2VjcmV0"));
    let (status, _) = ctx.send_raw(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // A broken header is never treated as an anonymous caller
    assert_eq!(ctx.card.charge_count(), 0);
}

#[actix_web::test]
async fn identity_required_for_order_payments() {
    let ctx = TestContext::new().await;
    let order = ctx.create_order("alice", 5000).await;
    let req = TestRequest::get().uri(&format!("/orders/{}/payments", order.id));
    let (status, body) = ctx.send(None, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body)["error"], "Authentication is required for this action");
}

#[actix_web::test]
async fn anonymous_caller_cannot_pay_an_owned_order() {
    let ctx = TestContext::new().await;
    let order = ctx.create_order("alice", 5000).await;
    let (status, _) = ctx.send(None, pay(order.id)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
