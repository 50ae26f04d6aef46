use std::net::SocketAddr;

use axum::{routing::post, Json, Router};
use futures::{SinkExt, StreamExt};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use coach_configuration::AppConfig;
use coach_setup::Application;

const TRANSCRIPT: &str = "Hi investors, we built a scheduling assistant that saves clinics ten hours weekly.";

async fn gemini_reply() -> Json<Value> {
    Json(json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{
                    "text": "```json\n{\"fillerWordCount\":1,\"wordsPerMinute\":128,\"clarityScore\":9,\"positiveFeedback\":\"Clear value\",\"negativeFeedback\":\"\",\"improvementSuggestion\":\"Name a customer\",\"youtubeSearchQuery\":\"startup pitch tips\"}\n```"
                }]
            },
            "finishReason": "STOP"
        }]
    }))
}

async fn spawn_mock_gemini() -> SocketAddr {
    let app = Router::new().route("/v1beta/models/{action}", post(gemini_reply));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock gemini");
    let addr = listener.local_addr().expect("mock addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock gemini server");
    });
    addr
}

fn config(gemini: SocketAddr, api_key: Option<&str>) -> AppConfig {
    let mut config = AppConfig::default();
    config.service.generator.api_key = api_key.map(str::to_string);
    config.service.generator.base_url = format!("http://{gemini}/v1beta");
    config.service.generator.request_timeout_ms = 2_000;
    config
}

async fn spawn_service(config: AppConfig) -> SocketAddr {
    let app = Application::new(config).await.expect("application builds");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind service");
    let addr = listener.local_addr().expect("service addr");
    tokio::spawn(async move {
        axum::serve(listener, app.router()).await.expect("service");
    });
    addr
}

#[tokio::test]
async fn analysis_runs_against_configured_gemini() -> Result<(), Box<dyn std::error::Error>> {
    let gemini = spawn_mock_gemini().await;
    let service = spawn_service(config(gemini, Some("test-key"))).await;

    let response = reqwest::Client::new()
        .post(format!("http://{service}/api/analysis"))
        .json(&json!({
            "transcript": TRANSCRIPT,
            "mode": "Business Pitch",
            "duration_seconds": 6.0
        }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["mode"], "business_pitch");
    assert_eq!(body["metrics"]["words_per_minute"], 130);
    assert_eq!(body["result"]["clarityScore"], 9);
    assert!(body["result"].get("negativeFeedback").is_none());
    assert_eq!(
        body["result"]["badges"],
        json!(["Clarity Champion", "Eloquent Speaker", "Pace Pro"])
    );
    assert!(!body["session_id"].as_str().unwrap_or_default().is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_api_key_surfaces_as_configuration_error() -> Result<(), Box<dyn std::error::Error>> {
    let gemini = spawn_mock_gemini().await;
    let service = spawn_service(config(gemini, Some("   "))).await;

    let response = reqwest::Client::new()
        .post(format!("http://{service}/api/analysis"))
        .json(&json!({ "transcript": TRANSCRIPT }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["kind"], "configuration_missing");
    Ok(())
}

#[tokio::test]
async fn streaming_route_is_mounted_when_enabled() {
    let gemini = spawn_mock_gemini().await;
    let service = spawn_service(config(gemini, Some("test-key"))).await;

    let (mut socket, _) = connect_async(format!("ws://{service}/ws"))
        .await
        .expect("connect");
    socket
        .send(Message::Text(r#"{"version":1,"type":"ping"}"#.to_string().into()))
        .await
        .expect("send ping");
    let reply = socket.next().await.expect("open").expect("frame");
    let Message::Text(raw) = reply else {
        panic!("expected a text frame");
    };
    let envelope: Value = serde_json::from_str(raw.as_str()).expect("json");
    assert_eq!(envelope["type"], "pong");
}

#[tokio::test]
async fn streaming_route_is_absent_when_disabled() -> Result<(), Box<dyn std::error::Error>> {
    let gemini = spawn_mock_gemini().await;
    let mut config = config(gemini, Some("test-key"));
    config.service.streaming.enabled = false;
    let service = spawn_service(config).await;

    let response = reqwest::get(format!("http://{service}/ws")).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let health = reqwest::get(format!("http://{service}/health")).await?;
    assert_eq!(health.status(), StatusCode::OK);
    Ok(())
}
