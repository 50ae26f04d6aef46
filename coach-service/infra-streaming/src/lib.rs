use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use coach_application::{AnalysisOrchestrator, CaptureEvent, CaptureSession, SubmitError};
use coach_domain::{DomainError, ScenarioMode};

pub mod protocol;

use protocol::{ClientEnvelope, ClientMessage, ServerEnvelope, ServerMessage, PROTOCOL_VERSION};

pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 256 * 1024;

#[derive(Debug, Error)]
pub enum StreamingError {
    #[error("invalid message: {0}")]
    Protocol(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Capture(#[from] DomainError),
}

impl StreamingError {
    fn to_server_message(&self) -> ServerMessage {
        let kind = match self {
            StreamingError::Protocol(_) => "protocol",
            StreamingError::Validation(_) => "validation",
            StreamingError::Capture(_) => "capture",
        };
        ServerMessage::error(kind, self.to_string())
    }
}

#[derive(Clone)]
pub struct StreamingState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub max_message_bytes: usize,
}

pub fn build_router(state: StreamingState, path: &str) -> Router {
    Router::new().route(path, get(ws_handler)).with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<StreamingState>) -> Response {
    ws.max_message_size(state.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: StreamingState) {
    let (sink, mut stream) = socket.split();
    let (outbound, outbound_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_messages(sink, outbound_rx));
    let mut connection = Connection::new(state, outbound.clone());

    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(raw)) => {
                if let Err(err) = connection.process_text_message(raw.as_str()) {
                    warn!(error = %err, "rejected client message");
                    let _ = outbound.send(err.to_server_message());
                }
            }
            Ok(Message::Binary(_)) => {
                let _ = outbound.send(ServerMessage::error(
                    "protocol",
                    "binary frames are not supported; send JSON envelopes",
                ));
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_)) => {
                let _ = outbound.send(ServerMessage::Pong);
            }
            Ok(_) => {}
            Err(err) => {
                error!("websocket transport error: {}", err);
                break;
            }
        }
    }

    info!(session_id = connection.session_id.as_deref().unwrap_or("none"), "websocket closed");
    drop(connection);
    drop(outbound);
    let _ = writer.await;
}

async fn write_messages(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::UnboundedReceiver<ServerMessage>,
) {
    while let Some(message) = outbound.recv().await {
        let payload = match serde_json::to_string(&ServerEnvelope::new(message)) {
            Ok(payload) => payload,
            Err(err) => {
                error!("serialization error: {}", err);
                continue;
            }
        };
        if let Err(err) = sink.send(Message::Text(payload.into())).await {
            warn!("send error: {}", err);
            break;
        }
    }
    let _ = sink.close().await;
}

/// Per-socket capture state. Analyses run on spawned tasks so a `retry`
/// can still be read while the model call is pending.
struct Connection {
    state: StreamingState,
    outbound: mpsc::UnboundedSender<ServerMessage>,
    capture: CaptureSession,
    session_id: Option<String>,
}

impl Connection {
    fn new(state: StreamingState, outbound: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            state,
            outbound,
            capture: CaptureSession::new(),
            session_id: None,
        }
    }

    fn process_text_message(&mut self, raw: &str) -> Result<(), StreamingError> {
        let envelope: ClientEnvelope =
            serde_json::from_str(raw).map_err(|err| StreamingError::Protocol(err.to_string()))?;
        if envelope.version != PROTOCOL_VERSION {
            return Err(StreamingError::Protocol(format!(
                "unsupported protocol version {}, expected {}",
                envelope.version, PROTOCOL_VERSION
            )));
        }

        match envelope.message {
            ClientMessage::Start { mode, session_id } => self.start(mode, session_id)?,
            ClientMessage::Transcript { text, is_final } => {
                let event = if is_final {
                    CaptureEvent::Final(text)
                } else {
                    CaptureEvent::Interim(text)
                };
                self.capture.accept(event)?;
            }
            ClientMessage::Stop { elapsed_seconds } => self.stop(elapsed_seconds)?,
            ClientMessage::Retry => {
                if self.capture.is_capturing() {
                    let _ = self.capture.stop();
                }
                self.state.orchestrator.retry();
                self.send(ServerMessage::Cleared);
            }
            ClientMessage::Ping => self.send(ServerMessage::Pong),
        }
        Ok(())
    }

    fn start(&mut self, mode: Option<String>, session_id: Option<String>) -> Result<(), StreamingError> {
        let mode = match mode.as_deref() {
            Some(raw) => raw
                .parse::<ScenarioMode>()
                .map_err(|err| StreamingError::Validation(err.to_string()))?,
            None => ScenarioMode::default(),
        };
        let mut updates = self.capture.start(mode)?;

        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        info!(session_id = %session_id, mode = %mode, "capture session started");
        self.session_id = Some(session_id.clone());
        self.send(ServerMessage::Ready { session_id });

        // Ends when the capture drops its listener on stop.
        let outbound = self.outbound.clone();
        tokio::spawn(async move {
            while let Some(text) = updates.recv().await {
                if outbound.send(ServerMessage::TranscriptUpdate { text }).is_err() {
                    break;
                }
            }
        });
        Ok(())
    }

    fn stop(&mut self, elapsed_seconds: Option<f64>) -> Result<(), StreamingError> {
        let captured = self.capture.stop()?;
        let input = captured.into_input(elapsed_seconds);
        let session_id = self.session_id.clone();
        info!(
            session_id = session_id.as_deref().unwrap_or("auto"),
            duration_seconds = input.measured_duration_seconds.unwrap_or_default(),
            "capture stopped, submitting analysis"
        );

        let orchestrator = self.state.orchestrator.clone();
        let outbound = self.outbound.clone();
        tokio::spawn(async move {
            let message = match orchestrator.submit(input, session_id).await {
                Ok(completed) => ServerMessage::Analysis(Box::new(completed.into())),
                Err(SubmitError::Superseded { request_id }) => {
                    info!(request_id, "dropping superseded analysis");
                    return;
                }
                Err(SubmitError::Busy) => {
                    ServerMessage::error("busy", "an analysis is already running")
                }
                Err(SubmitError::Analysis(error)) => error.into(),
            };
            let _ = outbound.send(message);
        });
        Ok(())
    }

    fn send(&self, message: ServerMessage) {
        let _ = self.outbound.send(message);
    }
}
