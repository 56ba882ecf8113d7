//! Integration tests for the HTTP endpoints.
//!
//! Tests health reporting, player and game listings, and game lookups.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use royal_ur::{
    MatchConfig,
    entities::{GameId, PlayerId, PlayerName},
};
use serde_json::Value;
use tower::ServiceExt; // For `oneshot` method
use ur_server::api::{AppState, create_router};

fn create_test_server() -> (axum::Router, AppState) {
    let config = MatchConfig {
        rng_seed: Some(7),
        ..MatchConfig::default()
    };
    let state = AppState::new(config);
    (create_router(state.clone()), state)
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = create_test_server();

    let (status, json) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["players"], 0);
    assert_eq!(json["matches"], 0);
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_list_players_sorted_by_name() {
    let (app, state) = create_test_server();
    let (zoe, adam) = (PlayerId::generate(), PlayerId::generate());
    {
        let mut lobby = state.lobby.write().await;
        lobby.join(zoe, PlayerName::new("zoe")).unwrap();
        lobby.join(adam, PlayerName::new("adam")).unwrap();
    }

    let (status, json) = get_json(app, "/api/v1/players").await;

    assert_eq!(status, StatusCode::OK);
    let players = json.as_array().unwrap();
    assert_eq!(players.len(), 2);
    assert_eq!(players[0]["name"], "adam");
    assert_eq!(players[0]["id"], adam.to_string());
    assert_eq!(players[0]["game_id"], Value::Null);
    assert_eq!(players[1]["name"], "zoe");
}

#[tokio::test]
async fn test_list_games_and_get_game() {
    let (app, state) = create_test_server();
    let (p1, p2) = (PlayerId::generate(), PlayerId::generate());
    let handle = state.match_manager.create_match(p1, p2).await.unwrap();
    let game_id = handle.game_id();

    let (status, json) = get_json(app.clone(), "/api/v1/games").await;
    assert_eq!(status, StatusCode::OK);
    let games = json.as_array().unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0]["id"], game_id.to_string());
    assert_eq!(games[0]["player1"], p1.to_string());
    assert_eq!(games[0]["player2"], p2.to_string());

    let (status, json) = get_json(app, &format!("/api/v1/games/{game_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], game_id.to_string());
    assert_eq!(json["player1"]["pid"], p1.to_string());
    assert_eq!(json["state"], 1);
    assert!(json["track"].is_array());
}

#[tokio::test]
async fn test_unknown_game_is_not_found() {
    let (app, _) = create_test_server();

    let uri = format!("/api/v1/games/{}", GameId::generate());
    let (status, json) = get_json(app, &uri).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_malformed_game_id_is_bad_request() {
    let (app, _) = create_test_server();

    let (status, _) = get_json(app, "/api/v1/games/not-a-uuid").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_websocket_route_requires_upgrade() {
    let (app, _) = create_test_server();

    let response = app
        .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
