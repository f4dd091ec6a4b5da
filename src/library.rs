//! The signed-in user's saved designs: load, sort, favorite, delete.
//!
//! Loading is a plain fetch with a visible [`LoadState`]. Favorite and delete
//! apply locally first and roll back the single affected entry on failure.
//! A refresh that lands while either is in flight keeps the local value.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::{error, info};

use crate::{
    error::{DesignError, Result},
    gateway::Gateway,
    models::SavedDesign,
};

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch designs. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    /// Message for the error view; [`DesignLibrary::refresh`] is the retry.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Recent,
    FavoritesFirst,
}

/// Newest first; with `FavoritesFirst`, favorites precede the rest and recency breaks ties.
pub fn sort_designs(designs: &mut [SavedDesign], order: SortOrder) {
    designs.sort_by(|a, b| match order {
        SortOrder::Recent => b.created_at.cmp(&a.created_at),
        SortOrder::FavoritesFirst => b
            .is_favorite
            .cmp(&a.is_favorite)
            .then_with(|| b.created_at.cmp(&a.created_at)),
    });
}

#[derive(Default)]
struct LibraryState {
    designs: Vec<SavedDesign>,
    load: LoadState,
    /// Ids removed locally whose delete has not settled.
    pending_deletes: HashSet<String>,
    /// Optimistic favorite values whose toggle has not settled.
    pending_toggles: HashMap<String, bool>,
}

impl LibraryState {
    /// Replace the list with a fetched one, keeping unsettled local mutations.
    fn adopt(&mut self, mut designs: Vec<SavedDesign>) {
        designs.retain(|d| !self.pending_deletes.contains(&d.id));
        for design in &mut designs {
            if let Some(&value) = self.pending_toggles.get(&design.id) {
                design.is_favorite = value;
            }
        }
        self.designs = designs;
    }

    fn settle_toggle(&mut self, id: &str, optimistic: bool) {
        if self.pending_toggles.get(id) == Some(&optimistic) {
            self.pending_toggles.remove(id);
        }
    }

    fn set_favorite(&mut self, id: &str, value: bool) {
        if let Some(design) = self.designs.iter_mut().find(|d| d.id == id) {
            design.is_favorite = value;
        }
    }
}

pub struct DesignLibrary {
    gateway: Arc<Gateway>,
    state: Mutex<LibraryState>,
}

impl DesignLibrary {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway, state: Mutex::new(LibraryState::default()) }
    }

    pub fn load_state(&self) -> LoadState {
        self.state.lock().load.clone()
    }

    /// Designs in server order.
    pub fn designs(&self) -> Vec<SavedDesign> {
        self.state.lock().designs.clone()
    }

    pub fn design(&self, id: &str) -> Option<SavedDesign> {
        self.state.lock().designs.iter().find(|d| d.id == id).cloned()
    }

    /// A sorted copy; the stored list keeps server order.
    pub fn sorted(&self, order: SortOrder) -> Vec<SavedDesign> {
        let mut designs = self.designs();
        sort_designs(&mut designs, order);
        designs
    }

    /// Fetch the list. On failure the previous list is kept and the state
    /// becomes [`LoadState::Failed`].
    pub async fn refresh(&self) -> Result<()> {
        self.state.lock().load = LoadState::Loading;
        match self.gateway.my_designs().await {
            Ok(designs) => {
                info!("📚 Loaded {} saved design(s)", designs.len());
                let mut state = self.state.lock();
                state.adopt(designs);
                state.load = LoadState::Loaded;
                Ok(())
            }
            Err(e) => {
                error!("❌ Failed to fetch designs: {}", e);
                self.state.lock().load = LoadState::Failed(FETCH_FAILED_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    /// Flip `is_favorite` locally, then on the server. Returns the new value.
    pub async fn toggle_favorite(&self, id: &str) -> Result<bool> {
        let previous = {
            let mut state = self.state.lock();
            let design = state
                .designs
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| DesignError::UnknownDesign(id.to_string()))?;
            let previous = design.is_favorite;
            design.is_favorite = !previous;
            state.pending_toggles.insert(id.to_string(), !previous);
            previous
        };

        let result = self.gateway.toggle_favorite(id).await;
        let mut state = self.state.lock();
        state.settle_toggle(id, !previous);
        match result {
            Ok(response) => {
                let value = response.is_favorite.unwrap_or(!previous);
                state.set_favorite(id, value);
                info!("⭐ Design '{}' favorite = {}", id, value);
                Ok(value)
            }
            Err(e) => {
                error!("❌ Failed to toggle favorite on '{}', reverting: {}", id, e);
                state.set_favorite(id, previous);
                Err(DesignError::optimistic("update favorite on", id, e))
            }
        }
    }

    /// First step of a delete. Nothing happens until the returned handle is confirmed.
    pub fn request_delete(&self, id: &str) -> Result<PendingDelete<'_>> {
        if self.design(id).is_none() {
            return Err(DesignError::UnknownDesign(id.to_string()));
        }
        Ok(PendingDelete { library: self, id: id.to_string() })
    }
}

/// A delete awaiting the user's confirmation. Dropping it cancels.
#[must_use = "a delete is only sent once confirmed"]
pub struct PendingDelete<'a> {
    library: &'a DesignLibrary,
    id: String,
}

impl PendingDelete<'_> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Remove locally, then on the server. The entry is restored at its old
    /// position if the server call fails.
    pub async fn confirm(self) -> Result<()> {
        let removed = {
            let mut state = self.library.state.lock();
            let index = state.designs.iter().position(|d| d.id == self.id);
            let removed = index.map(|index| (index, state.designs.remove(index)));
            if removed.is_some() {
                state.pending_deletes.insert(self.id.clone());
            }
            removed
        };
        let Some((index, design)) = removed else {
            return Err(DesignError::UnknownDesign(self.id));
        };

        let result = self.library.gateway.delete_design(&self.id).await;
        let mut state = self.library.state.lock();
        state.pending_deletes.remove(&self.id);
        match result {
            Ok(()) => {
                info!("🗑️ Deleted design '{}'", self.id);
                Ok(())
            }
            Err(e) => {
                error!("❌ Failed to delete design '{}', restoring: {}", self.id, e);
                if !state.designs.iter().any(|d| d.id == self.id) {
                    let at = index.min(state.designs.len());
                    state.designs.insert(at, design);
                }
                Err(DesignError::optimistic("delete", &self.id, e))
            }
        }
    }
}
