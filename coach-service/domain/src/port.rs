use async_trait::async_trait;

use crate::{DomainError, PromptSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: PromptSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutput {
    pub text: String,
}

#[async_trait]
pub trait TextGenerationPort: Send + Sync {
    /// Checked before any request is issued. Implementations that need a
    /// credential report its absence here.
    fn ensure_configured(&self) -> Result<(), DomainError> {
        Ok(())
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, DomainError>;
}
