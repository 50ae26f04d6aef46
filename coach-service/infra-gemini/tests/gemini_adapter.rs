use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use coach_domain::{
    build_prompt, compute_metrics, DomainError, GenerationRequest, ScenarioMode, TextGenerationPort,
};
use coach_infra_gemini::GeminiTextGenerator;

#[derive(Clone, Default)]
struct Recorded {
    calls: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    reply: Value,
    recorded: Recorded,
}

async fn generate_content(
    State(state): State<MockState>,
    Path(action): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let key = headers
        .get("x-goog-api-key")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state
        .recorded
        .calls
        .lock()
        .expect("lock")
        .push((action, key, body));
    (state.status, Json(state.reply.clone()))
}

async fn spawn_mock(status: StatusCode, reply: Value) -> (SocketAddr, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/v1beta/models/{action}", post(generate_content))
        .with_state(MockState {
            status,
            reply,
            recorded: recorded.clone(),
        });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock gemini");
    let addr = listener.local_addr().expect("mock addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock gemini server");
    });
    (addr, recorded)
}

fn generator(addr: SocketAddr, api_key: Option<&str>) -> GeminiTextGenerator {
    generator_with_timeout(addr, api_key, Duration::from_secs(5))
}

fn generator_with_timeout(
    addr: SocketAddr,
    api_key: Option<&str>,
    request_timeout: Duration,
) -> GeminiTextGenerator {
    GeminiTextGenerator::new(
        api_key.map(str::to_string),
        format!("http://{addr}/v1beta"),
        Duration::from_secs(2),
        request_timeout,
    )
    .expect("client builds")
}

fn request() -> GenerationRequest {
    let transcript = "So, um, our tool basically books meetings for you.";
    let metrics = compute_metrics(transcript, None);
    GenerationRequest {
        model: "gemini-test".to_string(),
        prompt: build_prompt(transcript, ScenarioMode::BusinessPitch, &metrics),
    }
}

#[tokio::test]
async fn generate_posts_prompt_and_returns_answer_text() {
    let (addr, recorded) = spawn_mock(
        StatusCode::OK,
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "weighing the clarity score", "thought": true},
                    {"text": "{\"clarityScore\": 8}"}
                ]},
                "finishReason": "STOP"
            }]
        }),
    )
    .await;

    let output = generator(addr, Some("test-key"))
        .generate(request())
        .await
        .expect("generation succeeds");
    assert_eq!(output.text, "{\"clarityScore\": 8}");

    let calls = recorded.calls.lock().expect("lock");
    assert_eq!(calls.len(), 1);
    let (action, key, body) = &calls[0];
    assert_eq!(action, "gemini-test:generateContent");
    assert_eq!(key.as_deref(), Some("test-key"));
    assert_eq!(body["contents"][0]["role"], "user");
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text");
    assert!(prompt.contains("Business Pitch"));
    assert!(prompt.contains("youtubeSearchQuery"));
}

#[tokio::test]
async fn missing_key_fails_before_any_request() {
    let (addr, recorded) = spawn_mock(StatusCode::OK, json!({})).await;
    let generator = generator(addr, None);

    assert!(matches!(
        generator.ensure_configured(),
        Err(DomainError::ConfigurationMissing(_))
    ));
    assert!(matches!(
        generator.generate(request()).await,
        Err(DomainError::ConfigurationMissing(_))
    ));
    assert!(recorded.calls.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn error_status_is_an_external_service_error() {
    let (addr, _) = spawn_mock(
        StatusCode::SERVICE_UNAVAILABLE,
        json!({"error": {"code": 503, "message": "model overloaded", "status": "UNAVAILABLE"}}),
    )
    .await;

    let err = generator(addr, Some("test-key"))
        .generate(request())
        .await
        .expect_err("upstream failure");
    assert_eq!(
        err,
        DomainError::external_service_error("gemini", "HTTP 503: UNAVAILABLE: model overloaded")
    );
}

#[tokio::test]
async fn empty_candidates_are_malformed() {
    let (addr, _) = spawn_mock(
        StatusCode::OK,
        json!({"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}),
    )
    .await;

    let err = generator(addr, Some("test-key"))
        .generate(request())
        .await
        .expect_err("no text");
    assert_eq!(
        err,
        DomainError::MalformedResponse("gemini returned no text (SAFETY)".to_string())
    );
}

#[tokio::test]
async fn unreachable_host_is_an_external_service_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = generator(addr, Some("test-key"))
        .generate(request())
        .await
        .expect_err("connection refused");
    assert!(matches!(err, DomainError::ExternalService { ref service, .. } if service == "gemini"));
}

#[tokio::test]
async fn slow_upstream_hits_the_client_timeout() {
    async fn stall() -> Json<Value> {
        tokio::time::sleep(Duration::from_secs(3)).await;
        Json(json!({}))
    }
    let app = Router::new().route("/v1beta/models/{action}", post(stall));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind slow gemini");
    let addr = listener.local_addr().expect("slow addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("slow gemini server");
    });

    let err = generator_with_timeout(addr, Some("test-key"), Duration::from_millis(200))
        .generate(request())
        .await
        .expect_err("times out");
    assert_eq!(
        err,
        DomainError::Timeout {
            service: "gemini".to_string(),
            after_ms: 200,
        }
    );
}
