use std::sync::Arc;

use anyhow::{anyhow, Error};
use axum::Router;

use coach_application::{AnalysisOrchestrator, AnalyzeTranscriptUseCase, AnalyzeTranscriptUseCaseImpl};
use coach_configuration::{AppConfig, ServerConfig};
use coach_domain::TextGenerationPort;
use coach_http_server::{create_app_routes, serve, AppState};
use coach_infra_gemini::GeminiTextGenerator;
use coach_infra_streaming::{build_router, StreamingState, DEFAULT_MAX_MESSAGE_BYTES};

pub async fn build_and_run(config: AppConfig, server_config: ServerConfig) -> Result<(), Error> {
    let app = Application::new(config).await?;
    app.run(server_config).await
}

pub struct Application {
    pub config: AppConfig,
    pub orchestrator: Arc<AnalysisOrchestrator>,
    router: Router,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self, Error> {
        let generator_config = &config.service.generator;
        let gemini = GeminiTextGenerator::new(
            generator_config.api_key().map(str::to_string),
            generator_config.base_url.clone(),
            generator_config.connect_timeout(),
            generator_config.request_timeout(),
        )
        .map_err(|err| anyhow!("failed to build gemini client: {err}"))?;
        if gemini.ensure_configured().is_err() {
            tracing::warn!("no gemini api key configured, analyses will fail until one is set");
        }
        let generator: Arc<dyn TextGenerationPort> = Arc::new(gemini);

        let usecase: Arc<dyn AnalyzeTranscriptUseCase> = Arc::new(
            AnalyzeTranscriptUseCaseImpl::new(generator, generator_config.model.clone())
                .with_request_timeout(generator_config.request_timeout()),
        );
        let orchestrator = Arc::new(AnalysisOrchestrator::new(usecase));

        let mut router = create_app_routes(AppState::new(orchestrator.clone()));
        if config.service.streaming.enabled {
            router = router.merge(build_router(
                StreamingState {
                    orchestrator: orchestrator.clone(),
                    max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
                },
                &config.service.streaming.path,
            ));
        }

        tracing::info!(
            model = %generator_config.model,
            request_timeout_ms = generator_config.request_timeout_ms,
            streaming = config.service.streaming.enabled,
            "application assembled"
        );

        Ok(Self {
            config,
            orchestrator,
            router,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn run(self, server_config: ServerConfig) -> Result<(), Error> {
        serve(self.router, &server_config.address(), shutdown_signal())
            .await
            .map_err(|err| anyhow!("coach http server failed: {err}"))
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
