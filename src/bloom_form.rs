//! Submission side of the idea panel.
//!
//! [`BloomForm`] holds the draft title and description and walks the
//! `Idle -> Planting -> Bloomed -> Idle` cycle. Like the spotlight schedule it
//! is driven by the host's clock through [`BloomForm::tick`].

use std::time::{Duration, Instant};

use log::{debug, info};

use crate::description::{describe, DescriptionGenerator};
use crate::garden_config::GardenConfig;
use crate::idea_model::{FlowerType, Idea, IdeaCandidate};
use crate::idea_store::IdeaStore;
use crate::random_source::RandomSource;
use crate::slot_storage::SlotStorage;
use crate::spotlight::SpotlightSchedule;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStatus {
    Idle,
    /// Submitted text waits here until the planting delay is over.
    Planting { until: Instant, title: String, description: String },
    Bloomed { until: Instant },
}

/// Proof that a description request was started. Only the newest ticket
/// issued since the last submit may write into the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    epoch: u64,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct BloomForm {
    title: String,
    description: String,
    status: FormStatus,
    epoch: u64,
    generating: bool,
    planting: Duration,
    bloomed: Duration,
}

impl BloomForm {
    pub fn new(config: &GardenConfig) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            status: FormStatus::Idle,
            epoch: 0,
            generating: false,
            planting: config.planting(),
            bloomed: config.bloomed(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn can_submit(&self) -> bool {
        self.status == FormStatus::Idle
            && !self.title.trim().is_empty()
            && !self.description.trim().is_empty()
    }

    /// Starts planting the current draft. Returns `false`, changing nothing,
    /// when the form is busy or a field is blank.
    ///
    /// A description request still in flight is abandoned.
    pub fn submit(&mut self, now: Instant) -> bool {
        if !self.can_submit() {
            debug!("Bloom refused: status {:?}", self.status);
            return false;
        }

        if self.generating {
            debug!("Discarding in-flight description for '{}'", self.title);
        }
        self.epoch += 1;
        self.generating = false;

        self.status = FormStatus::Planting {
            until: now + self.planting,
            title: self.title.clone(),
            description: self.description.clone(),
        };
        true
    }

    /// Advances timed transitions. Returns the idea planted on this tick, if
    /// the planting delay just ran out; its spotlight clear is armed on
    /// `spotlight` at the same instant.
    pub fn tick<S: SlotStorage, R: RandomSource>(
        &mut self,
        now: Instant,
        store: &mut IdeaStore<S, R>,
        spotlight: &mut SpotlightSchedule,
    ) -> Option<Idea> {
        match &self.status {
            FormStatus::Planting { until, title, description } if *until <= now => {
                let index = store.random_mut().pick_index(FlowerType::STOCK.len());
                let candidate =
                    IdeaCandidate::new(title.clone(), description.clone(), FlowerType::STOCK[index]);

                let idea = store.add(candidate);
                spotlight.schedule(idea.id.clone(), now);
                info!("Bloomed '{}' as {}", idea.title, idea.flower_type);

                self.title.clear();
                self.description.clear();
                self.status = FormStatus::Bloomed { until: now + self.bloomed };
                Some(idea)
            }
            FormStatus::Bloomed { until } if *until <= now => {
                self.status = FormStatus::Idle;
                None
            }
            _ => None,
        }
    }

    /// Marks a description request as started for the current title.
    pub fn begin_generation(&mut self) -> Option<GenerationTicket> {
        if self.title.trim().is_empty() {
            return None;
        }
        self.epoch += 1;
        self.generating = true;
        Some(GenerationTicket { epoch: self.epoch, title: self.title.clone() })
    }

    /// Delivers a generated description. Stale tickets are dropped and
    /// `false` is returned.
    pub fn finish_generation(&mut self, ticket: GenerationTicket, text: String) -> bool {
        if ticket.epoch != self.epoch {
            debug!("Dropping stale description for '{}'", ticket.title);
            return false;
        }
        self.generating = false;
        self.description = text;
        true
    }

    /// Runs `generator` synchronously and fills in the description.
    pub fn generate_description<G: DescriptionGenerator + ?Sized>(&mut self, generator: &G) -> bool {
        let Some(ticket) = self.begin_generation() else {
            return false;
        };
        match describe(generator, &ticket.title) {
            Some(text) => self.finish_generation(ticket, text),
            None => {
                self.generating = false;
                false
            }
        }
    }
}
