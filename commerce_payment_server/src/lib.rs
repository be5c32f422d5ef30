//! # Commerce payment server
//! The HTTP face of the commerce payment engine. It is responsible for:
//! * Reading the caller's identity from a bearer token.
//! * Translating requests into calls on the engine's payment, refund and query APIs.
//! * Turning engine errors into JSON error responses with a matching status code.
//! * Sending order emails when a payment completes.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `GET /health`: Returns a 200 OK response.
//! * `GET /orders/{order_id}/payments`: Payments for an order. Owner or administrator.
//! * `POST /orders/{order_id}/payments`: Charge an order.
//! * `GET /users/{user_id}/payments`: Payments made by a user. That user or an administrator.
//! * `GET /payments`: Search all payments. Administrator.
//! * `GET /payments/{pay_id}`: A single payment. Administrator.
//! * `POST /payments/{pay_id}/refund`: Refund a charge. Administrator.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
