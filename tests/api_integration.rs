//! End-to-end tests driving the REST router in-process.

#![allow(clippy::panic)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use hydra_dex::api;
use hydra_dex::app_state::AppState;
use hydra_dex::config::DexConfig;

const MINTER: u8 = 0xee;
const ALICE: u8 = 0xa1;
const BOB: u8 = 0xb0;

fn hex_id(b: u8) -> String {
    format!("0x{}", hex::encode([b; 32]))
}

fn build_app() -> Router {
    let Ok(state) = AppState::from_config(&DexConfig::default(), None) else {
        panic!("state");
    };
    api::build_router().with_state(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    };
    let Ok(request) = request else {
        panic!("request");
    };
    let Ok(response) = app.clone().oneshot(request).await else {
        panic!("router error");
    };
    let status = response.status();
    let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body");
    };
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Registers tokens 1..=3 and mints 10^12 of each to Alice and Bob.
async fn fund(app: &Router) {
    for token in 1..=3u8 {
        let (status, _) = send(
            app,
            "POST",
            "/api/v1/tokens",
            Some(json!({ "token": hex_id(token), "minter": hex_id(MINTER) })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        for owner in [ALICE, BOB] {
            let (status, _) = send(
                app,
                "POST",
                &format!("/api/v1/tokens/{}/mint", hex_id(token)),
                Some(json!({
                    "minter": hex_id(MINTER),
                    "to": hex_id(owner),
                    "amount": "1000000000000",
                })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }
    }
}

async fn create_pool(app: &Router, a: u8, b: u8, amount_a: &str, amount_b: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/pools",
        Some(json!({
            "creator": hex_id(ALICE),
            "token_a": hex_id(a),
            "token_b": hex_id(b),
            "amount_a": amount_a,
            "amount_b": amount_b,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let Some(pool_id) = body["pool"]["pool_id"].as_str() else {
        panic!("missing pool id in {body}");
    };
    pool_id.to_string()
}

async fn balance(app: &Router, token: u8, owner: u8) -> String {
    let (_, body) = send(
        app,
        "GET",
        &format!("/api/v1/tokens/{}/balances/{}", hex_id(token), hex_id(owner)),
        None,
    )
    .await;
    body["balance"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn health_and_default_fee() {
    let app = build_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, "GET", "/config/default-fee", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fee_bps"], 30);
}

#[tokio::test]
async fn create_quote_and_swap() {
    let app = build_app();
    fund(&app).await;
    let pool_id = create_pool(&app, 2, 1, "2000000", "1000000").await;

    let (status, body) = send(&app, "GET", &format!("/api/v1/pools/{pool_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token0"], hex_id(1));
    assert_eq!(body["reserve0"], "1000000");
    assert_eq!(body["reserve1"], "2000000");
    assert_eq!(body["fee_bps"], 30);

    let (_, body) = send(
        &app,
        "GET",
        &format!(
            "/api/v1/pool-keys?token_a={}&token_b={}",
            hex_id(1),
            hex_id(2)
        ),
        None,
    )
    .await;
    assert_eq!(body["pool_id"], pool_id);
    assert_eq!(body["exists"], true);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/pools/{pool_id}/quote"),
        Some(json!({ "token_in": hex_id(1), "amount_in": "100000" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount_out"], "181322");

    let swap = |min: &str| {
        json!({
            "sender": hex_id(BOB),
            "token_in": hex_id(1),
            "amount_in": "100000",
            "min_amount_out": min,
        })
    };
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/pools/{pool_id}/swap"),
        Some(swap("181323")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], 4005);
    assert_eq!(balance(&app, 1, BOB).await, "1000000000000");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/pools/{pool_id}/swap"),
        Some(swap("181322")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount_out"], "181322");
    assert_eq!(body["hops"].as_array().map(Vec::len), Some(1));
    assert_eq!(balance(&app, 1, BOB).await, "999999900000");
    assert_eq!(balance(&app, 2, BOB).await, "1000000181322");
}

#[tokio::test]
async fn create_errors_map_to_status_codes() {
    let app = build_app();
    fund(&app).await;
    let pool_id = create_pool(&app, 1, 2, "1000000", "1000000").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/pools",
        Some(json!({
            "creator": hex_id(BOB),
            "token_a": hex_id(2),
            "token_b": hex_id(1),
            "amount_a": "5000",
            "amount_b": "5000",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], 2002);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/pools",
        Some(json!({
            "creator": hex_id(BOB),
            "token_a": hex_id(1),
            "token_b": hex_id(3),
            "amount_a": "1000",
            "amount_b": "1000",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], 4001);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/pools",
        Some(json!({
            "creator": hex_id(BOB),
            "token_a": hex_id(1),
            "token_b": hex_id(3),
            "amount_a": "lots",
            "amount_b": "1000",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1001);

    let unknown = hex_id(0x77);
    let (status, body) = send(&app, "GET", &format!("/api/v1/pools/{unknown}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 2001);

    let (status, body) = send(&app, "GET", "/api/v1/pools", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["pools"][0]["pool"]["pool_id"], pool_id);
}

#[tokio::test]
async fn liquidity_round_trip() {
    let app = build_app();
    fund(&app).await;
    let pool_id = create_pool(&app, 1, 2, "1000000", "4000000").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/pools/{pool_id}/liquidity/add"),
        Some(json!({
            "provider": hex_id(BOB),
            "amount0_desired": "1000",
            "amount1_desired": "9000",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["amount0"], "1000");
    assert_eq!(body["amount1"], "4000");
    assert_eq!(body["lp_minted"], "2000");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/pools/{pool_id}/liquidity/remove"),
        Some(json!({ "provider": hex_id(BOB), "lp_amount": "2001" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], 4003);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/pools/{pool_id}/liquidity/remove"),
        Some(json!({ "provider": hex_id(BOB), "lp_amount": "2000" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount0"], "1000");
    assert_eq!(body["amount1"], "4000");
    assert_eq!(body["lp_balance"], "0");

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v1/pools/{pool_id}/positions/{}", hex_id(ALICE)),
        None,
    )
    .await;
    assert_eq!(body["lp_balance"], "1999000");
}

#[tokio::test]
async fn route_quote_matches_execution() {
    let app = build_app();
    fund(&app).await;
    let p12 = create_pool(&app, 1, 2, "1000000", "1000000").await;
    let p23 = create_pool(&app, 2, 3, "1000000", "1000000").await;
    let path = json!([hex_id(1), p12, hex_id(2), p23, hex_id(3)]);

    let (status, quote) = send(
        &app,
        "POST",
        "/api/v1/routes/quote",
        Some(json!({ "path": path, "amount_in": "10000" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["amount_out"], "9745");

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/routes/swap",
        Some(json!({
            "sender": hex_id(BOB),
            "path": path,
            "amount_in": "10000",
            "min_amount_out": "9745",
            "recipient": hex_id(BOB),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["amount_out"], quote["amount_out"]);
    assert_eq!(body["hops"].as_array().map(Vec::len), Some(2));
    assert_eq!(balance(&app, 3, BOB).await, "1000000009745");
    assert_eq!(balance(&app, 2, BOB).await, "1000000000000");

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/routes/swap",
        Some(json!({
            "sender": hex_id(BOB),
            "path": [hex_id(1), p12],
            "amount_in": "10000",
            "recipient": hex_id(BOB),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1006);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/routes/swap",
        Some(json!({
            "sender": hex_id(BOB),
            "path": path,
            "amount_in": "10000",
            "recipient": hex_id(0),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1004);
}

#[tokio::test]
async fn ledger_and_persistence_guards() {
    let app = build_app();
    fund(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/tokens/{}/mint", hex_id(1)),
        Some(json!({ "minter": hex_id(BOB), "to": hex_id(BOB), "amount": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], 5001);

    let pool_id = create_pool(&app, 1, 2, "1000000", "1000000").await;
    let (status, body) = send(&app, "GET", &format!("/api/v1/pools/{pool_id}/events"), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], 3002);
}
