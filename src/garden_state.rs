use std::time::Instant;

use log::{info, warn};
use serde::Serialize;

use crate::app_response::AppResponse;
use crate::garden_config::GardenConfig;
use crate::grass::{scatter_grass, GrassPatch};
use crate::idea_model::{Idea, IdeaCandidate};
use crate::idea_store::IdeaStore;
use crate::random_source::{source_for, RandomSource};
use crate::render_order::{render_order, z_rank};
use crate::slot_storage::{LmdbSlot, SlotStorage};
use crate::spotlight::SpotlightSchedule;

/// Paint position of one flower, as handed to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSlot {
    pub id: String,
    pub z: i64,
}

/// Everything a host needs behind one handle: the store on its LMDB slot and
/// the pending spotlight timers.
pub struct GardenState {
    store: IdeaStore<LmdbSlot, Box<dyn RandomSource>>,
    spotlight: SpotlightSchedule,
}

impl GardenState {
    pub fn init(name: &str, config: GardenConfig) -> Result<Self, AppResponse> {
        config.validate()?;
        let slot = LmdbSlot::open(name)?;
        let spotlight = SpotlightSchedule::new(config.spotlight());
        let random = source_for(config.seed);

        info!("Garden '{}' ready (slot key '{}')", name, config.storage_key);
        Ok(Self {
            store: IdeaStore::new(slot, random, config),
            spotlight,
        })
    }

    pub fn load(&mut self) -> Vec<Idea> {
        self.store.load()
    }

    /// Plants `candidate` and arms its spotlight timer.
    ///
    /// Unlike [`IdeaStore::add`] this entry point faces untrusted hosts, so
    /// blank fields are rejected here.
    pub fn plant(&mut self, candidate: IdeaCandidate, now: Instant) -> Result<Idea, AppResponse> {
        if !candidate.is_complete() {
            return Err(AppResponse::ValidationError(
                "Both title and description are required".to_string(),
            ));
        }
        let idea = self.store.add(candidate);
        self.spotlight.schedule(idea.id.clone(), now);
        Ok(idea)
    }

    pub fn clear_new_flag(&mut self, id: &str) {
        self.store.clear_new_flag(id);
    }

    /// Fires spotlight timers that are due at `now`.
    pub fn tick(&mut self, now: Instant) -> Vec<String> {
        self.spotlight.fire_due(now, &mut self.store)
    }

    pub fn ideas(&self) -> &[Idea] {
        self.store.ideas()
    }

    pub fn render_order(&self) -> Vec<RenderSlot> {
        render_order(self.store.ideas())
            .into_iter()
            .map(|idea| RenderSlot { id: idea.id.clone(), z: z_rank(idea) })
            .collect()
    }

    pub fn grass(&mut self) -> Vec<GrassPatch> {
        let config = self.store.config().grass.clone();
        scatter_grass(&config, self.store.random_mut())
    }

    pub fn last_persist_error(&self) -> Option<&AppResponse> {
        self.store.last_persist_error()
    }

    /// Wipes the persisted slot and empties the garden. Ids handed out so
    /// far stay retired.
    pub fn clear_storage(&mut self) -> Result<(), AppResponse> {
        let key = self.store.config().storage_key.clone();
        self.store.storage_mut().clear(&key)?;
        self.store.load();
        warn!("Garden storage under '{}' was cleared", key);
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), AppResponse> {
        self.store.storage_mut().close()
    }
}
