//! Multi-model generation fan-out.
//!
//! One request per candidate model, all in flight at once. Individual
//! failures are logged and skipped; a rate-limit signal from any model
//! replaces the whole batch with that model's placeholder images.

use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    config::Config,
    error::{DesignError, Result},
    gateway::Gateway,
    models::{GenerateResponse, GeneratedImage},
    selection::{AttributeSelection, CompleteSelection, RequestBuilder},
};

const DEFAULT_LIMIT_MESSAGE: &str = "Generation limit reached. Please try again later.";

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Images(Vec<GeneratedImage>),
    /// A model reported quota exhaustion; `images` holds only its placeholder(s).
    RateLimited {
        model: String,
        message: String,
        images: Vec<GeneratedImage>,
    },
}

impl GenerationOutcome {
    pub fn images(&self) -> &[GeneratedImage] {
        match self {
            GenerationOutcome::Images(images) => images,
            GenerationOutcome::RateLimited { images, .. } => images,
        }
    }
}

pub struct Generator {
    gateway: Arc<Gateway>,
    builder: RequestBuilder,
    models: Vec<String>,
    timeout: Duration,
}

impl Generator {
    pub fn new(gateway: Arc<Gateway>, config: &Config) -> Self {
        Self {
            gateway,
            builder: RequestBuilder::new(config.schema, config.image),
            models: config.models.clone(),
            timeout: config.request_timeout,
        }
    }

    /// Refuses incomplete selections before any request is built.
    pub async fn generate(&self, selection: &AttributeSelection, cancel: &CancellationToken) -> Result<GenerationOutcome> {
        let complete = selection.complete().ok_or(DesignError::IncompleteSelection)?;
        self.generate_complete(&complete, cancel).await
    }

    pub async fn generate_complete(
        &self,
        selection: &CompleteSelection,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome> {
        // A signed-out user is a blocking error, not a batch of per-model failures.
        let identity = self.gateway.identity().await?;
        info!(
            "🚀 Generating designs for user {} across {} models: {}",
            identity.uid,
            self.models.len(),
            selection.describe()
        );

        let calls = self.models.iter().map(|model| self.generate_one(selection, model));
        let settled = tokio::select! {
            _ = cancel.cancelled() => {
                warn!("🛑 Generation cancelled with requests in flight");
                return Err(DesignError::Cancelled);
            }
            settled = join_all(calls) => settled,
        };

        aggregate(&self.models, settled)
    }

    async fn generate_one(&self, selection: &CompleteSelection, model: &str) -> Result<GenerateResponse> {
        let request = self.builder.build(selection, model);
        match tokio::time::timeout(self.timeout, self.gateway.generate(&request)).await {
            Ok(result) => result,
            Err(_) => Err(DesignError::Timeout),
        }
    }
}

/// Fold settled per-model results (in candidate order) into one outcome.
pub fn aggregate(models: &[String], settled: Vec<Result<GenerateResponse>>) -> Result<GenerationOutcome> {
    let mut successes = Vec::with_capacity(settled.len());
    for (model, result) in models.iter().zip(settled) {
        match result {
            Ok(response) => {
                info!("✅ Model '{}' returned {} image(s)", model, response.image_urls.len());
                successes.push((model.as_str(), response));
            }
            Err(e) => error!("❌ Model '{}' failed, skipping: {}", model, e),
        }
    }

    if let Some((model, response)) = successes.iter().find(|(_, r)| r.limit_reached) {
        let message = response.message.clone().unwrap_or_else(|| DEFAULT_LIMIT_MESSAGE.to_string());
        warn!("⏳ Model '{}' signalled rate limit: {}", model, message);
        let images = response
            .image_urls
            .iter()
            .enumerate()
            .map(|(i, url)| GeneratedImage::new(model, i, url.clone()))
            .collect();
        return Ok(GenerationOutcome::RateLimited { model: model.to_string(), message, images });
    }

    let mut images = Vec::new();
    for (model, response) in successes {
        for url in response.image_urls {
            let position = images.len();
            images.push(GeneratedImage::new(model, position, url));
        }
    }

    if images.is_empty() {
        error!("❌ No model produced an image");
        return Err(DesignError::NoResultsProduced);
    }
    info!("🖼️ Collected {} design(s) from {} model(s)", images.len(), models.len());
    Ok(GenerationOutcome::Images(images))
}
