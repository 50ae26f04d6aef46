use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use coach_domain::{DomainError, ScenarioMode, TranscriptInput};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Provisional text for the utterance in progress.
    Interim(String),
    /// Recognized text that will not change anymore.
    Final(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapturedTranscript {
    pub text: String,
    pub mode: ScenarioMode,
    pub elapsed: Duration,
}

impl CapturedTranscript {
    /// Builds the analysis input, preferring `measured_seconds` over the
    /// locally timed capture.
    pub fn into_input(self, measured_seconds: Option<f64>) -> TranscriptInput {
        let seconds = measured_seconds.unwrap_or_else(|| self.elapsed.as_secs_f64());
        TranscriptInput::new(self.text, self.mode).with_measured_duration(seconds)
    }
}

enum CaptureState {
    Idle,
    Capturing {
        mode: ScenarioMode,
        committed: String,
        interim: String,
        started_at: Instant,
        listener: mpsc::UnboundedSender<String>,
    },
}

/// Recording toggle fed by a speech recognizer.
///
/// Each `start` subscribes a fresh listener; `stop` drops it so the matching
/// receiver sees the channel close.
pub struct CaptureSession {
    state: CaptureState,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            state: CaptureState::Idle,
        }
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, CaptureState::Capturing { .. })
    }

    pub fn start(&mut self, mode: ScenarioMode) -> Result<mpsc::UnboundedReceiver<String>, DomainError> {
        if self.is_capturing() {
            return Err(DomainError::capture("capture already in progress"));
        }
        let (listener, receiver) = mpsc::unbounded_channel();
        self.state = CaptureState::Capturing {
            mode,
            committed: String::new(),
            interim: String::new(),
            started_at: Instant::now(),
            listener,
        };
        tracing::debug!(mode = %mode, "capture started");
        Ok(receiver)
    }

    /// Applies a recognizer event and returns the updated live text.
    pub fn accept(&mut self, event: CaptureEvent) -> Result<String, DomainError> {
        let CaptureState::Capturing {
            committed,
            interim,
            listener,
            ..
        } = &mut self.state
        else {
            return Err(DomainError::capture("no capture in progress"));
        };

        match event {
            CaptureEvent::Final(text) => {
                append_segment(committed, &text);
                interim.clear();
            }
            CaptureEvent::Interim(text) => {
                *interim = text.trim().to_string();
            }
        }

        let live = join_live(committed, interim);
        // Receiver may already be gone; the session keeps working without it.
        let _ = listener.send(live.clone());
        Ok(live)
    }

    pub fn live_text(&self) -> String {
        match &self.state {
            CaptureState::Idle => String::new(),
            CaptureState::Capturing {
                committed, interim, ..
            } => join_live(committed, interim),
        }
    }

    pub fn stop(&mut self) -> Result<CapturedTranscript, DomainError> {
        match std::mem::replace(&mut self.state, CaptureState::Idle) {
            CaptureState::Idle => Err(DomainError::capture("no capture in progress")),
            CaptureState::Capturing {
                mode,
                committed,
                interim,
                started_at,
                listener,
            } => {
                drop(listener);
                let captured = CapturedTranscript {
                    text: join_live(&committed, &interim),
                    mode,
                    elapsed: started_at.elapsed(),
                };
                tracing::debug!(
                    chars = captured.text.len(),
                    elapsed_ms = captured.elapsed.as_millis() as u64,
                    "capture stopped"
                );
                Ok(captured)
            }
        }
    }
}

fn append_segment(committed: &mut String, segment: &str) {
    let segment = segment.trim();
    if segment.is_empty() {
        return;
    }
    if !committed.is_empty() {
        committed.push(' ');
    }
    committed.push_str(segment);
}

fn join_live(committed: &str, interim: &str) -> String {
    match (committed.is_empty(), interim.is_empty()) {
        (_, true) => committed.to_string(),
        (true, false) => interim.to_string(),
        (false, false) => format!("{committed} {interim}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_require_an_active_capture() {
        let mut session = CaptureSession::new();
        assert!(matches!(
            session.accept(CaptureEvent::Final("hello".to_string())),
            Err(DomainError::Capture(_))
        ));
        assert!(session.stop().is_err());
        assert_eq!(session.live_text(), "");
    }

    #[test]
    fn interim_text_replaces_pending_tail() {
        let mut session = CaptureSession::new();
        let _receiver = session.start(ScenarioMode::JobInterview).expect("starts");

        session
            .accept(CaptureEvent::Final("I have five years".to_string()))
            .expect("final");
        session
            .accept(CaptureEvent::Interim("of exp".to_string()))
            .expect("interim");
        assert_eq!(
            session
                .accept(CaptureEvent::Interim("of experience".to_string()))
                .expect("interim"),
            "I have five years of experience"
        );

        session
            .accept(CaptureEvent::Final("of experience in logistics".to_string()))
            .expect("final");
        assert_eq!(session.live_text(), "I have five years of experience in logistics");
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut session = CaptureSession::new();
        let _receiver = session.start(ScenarioMode::GeneralFeedback).expect("starts");
        assert!(session.start(ScenarioMode::GeneralFeedback).is_err());
    }

    #[tokio::test]
    async fn stop_closes_the_listener_and_resets() {
        let mut session = CaptureSession::new();
        let mut receiver = session.start(ScenarioMode::BusinessPitch).expect("starts");

        session
            .accept(CaptureEvent::Final("Our app saves time".to_string()))
            .expect("final");
        assert_eq!(receiver.recv().await.as_deref(), Some("Our app saves time"));

        let captured = session.stop().expect("stops");
        assert_eq!(captured.text, "Our app saves time");
        assert_eq!(captured.mode, ScenarioMode::BusinessPitch);
        assert!(!session.is_capturing());
        assert_eq!(receiver.recv().await, None);

        let input = captured.into_input(Some(2.0));
        assert_eq!(input.measured_duration_seconds, Some(2.0));

        let mut fresh = session.start(ScenarioMode::BusinessPitch).expect("restarts");
        session
            .accept(CaptureEvent::Interim("second take".to_string()))
            .expect("interim");
        assert_eq!(fresh.recv().await.as_deref(), Some("second take"));
    }
}
