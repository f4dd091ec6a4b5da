use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::{
    error::{DesignError, Result},
    gateway::Gateway,
    generator::GenerationOutcome,
    models::{GeneratedImage, SaveDesignRequest, SaveState},
    selection::CompleteSelection,
};

/// One generation run's images and their save state.
///
/// Saves are optimistic: the entry flips to [`SaveState::SavePending`] before
/// the request leaves and falls back to [`SaveState::Generated`] if it fails.
/// Every mutation touches only the entry it names.
pub struct ResultSession {
    gateway: Arc<Gateway>,
    selection: CompleteSelection,
    images: Mutex<Vec<GeneratedImage>>,
    notice: Option<String>,
}

impl ResultSession {
    pub fn new(gateway: Arc<Gateway>, selection: CompleteSelection, outcome: GenerationOutcome) -> Self {
        let (images, notice) = match outcome {
            GenerationOutcome::Images(images) => (images, None),
            GenerationOutcome::RateLimited { message, images, .. } => (images, Some(message)),
        };
        Self { gateway, selection, images: Mutex::new(images), notice }
    }

    /// Seed a session with URLs generated elsewhere (e.g. handed over by a previous screen).
    pub fn from_urls(gateway: Arc<Gateway>, selection: CompleteSelection, urls: Vec<String>) -> Self {
        let images = urls
            .into_iter()
            .enumerate()
            .map(|(i, url)| GeneratedImage::new("existing", i, url))
            .collect();
        Self::new(gateway, selection, GenerationOutcome::Images(images))
    }

    /// Rate-limit message to show above the results, if the run was cut short.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn images(&self) -> Vec<GeneratedImage> {
        self.images.lock().clone()
    }

    pub fn image(&self, id: &str) -> Option<GeneratedImage> {
        self.images.lock().iter().find(|i| i.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.images.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.lock().is_empty()
    }

    /// Save one image to the signed-in user's designs. Already pending or
    /// saved images are left alone and no request is made. Not retried.
    pub async fn save(&self, id: &str) -> Result<SaveState> {
        let url = {
            let mut images = self.images.lock();
            let image = images
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| DesignError::UnknownImage(id.to_string()))?;
            if image.state != SaveState::Generated {
                debug!("Image '{}' already {:?}, ignoring save", id, image.state);
                return Ok(image.state);
            }
            image.state = SaveState::SavePending;
            image.url.clone()
        };

        let request = SaveDesignRequest { prompt: self.selection.describe(), temporary_image_url: url };
        match self.gateway.save_design(&request).await {
            Ok(_) => {
                info!("💾 Saved design '{}'", id);
                self.set_state(id, SaveState::Saved);
                Ok(SaveState::Saved)
            }
            Err(e) => {
                error!("❌ Failed to save design '{}', reverting: {}", id, e);
                self.set_state(id, SaveState::Generated);
                Err(DesignError::optimistic("save", id, e))
            }
        }
    }

    fn set_state(&self, id: &str, state: SaveState) {
        if let Some(image) = self.images.lock().iter_mut().find(|i| i.id == id) {
            image.state = state;
        }
    }
}
