//! The authoritative, ordered collection of planted ideas.
//!
//! [`IdeaStore`] owns the in-memory sequence and mirrors it to a single
//! storage slot after every mutation. Persistence and randomness are injected
//! so the same store runs against LMDB in a host and against [`MemorySlot`]
//! with a seeded generator in tests.
//!
//! [`MemorySlot`]: crate::slot_storage::MemorySlot

use std::collections::HashSet;
use std::fmt::Write as _;

use chrono::{Local, NaiveDate};
use log::{debug, info, warn};

use crate::app_response::AppResponse;
use crate::garden_config::GardenConfig;
use crate::idea_model::{FlowerType, Idea, IdeaCandidate};
use crate::random_source::RandomSource;
use crate::slot_storage::SlotStorage;

type Today = Box<dyn Fn() -> NaiveDate>;

const ID_ATTEMPTS: usize = 64;

pub struct IdeaStore<S: SlotStorage, R: RandomSource> {
    storage: S,
    random: R,
    config: GardenConfig,
    today: Today,
    ideas: Vec<Idea>,
    issued_ids: HashSet<String>,
    last_persist_error: Option<AppResponse>,
}

impl<S: SlotStorage, R: RandomSource> IdeaStore<S, R> {
    pub fn new(storage: S, random: R, config: GardenConfig) -> Self {
        Self {
            storage,
            random,
            config,
            today: Box::new(|| Local::now().date_naive()),
            ideas: Vec::new(),
            issued_ids: HashSet::new(),
            last_persist_error: None,
        }
    }

    /// Replaces the clock used to stamp `date` on new ideas.
    pub fn with_today(mut self, today: impl Fn() -> NaiveDate + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    /// Reads the slot and replaces the in-memory garden with its contents.
    ///
    /// A missing slot, an unreadable backend or malformed JSON all yield an
    /// empty garden; the failure is logged, never returned. Every loaded idea
    /// comes back with `is_new` cleared.
    pub fn load(&mut self) -> Vec<Idea> {
        let key = self.config.storage_key.as_str();
        let loaded = match self.storage.read(key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Idea>>(&raw) {
                Ok(ideas) => ideas,
                Err(e) => {
                    warn!("Failed to load ideas from slot '{}': {}", key, e);
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!("No saved garden under '{}'", key);
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to read slot '{}': {}", key, e);
                Vec::new()
            }
        };

        self.ideas = loaded
            .into_iter()
            .map(|idea| Idea { is_new: false, ..idea })
            .collect();
        self.issued_ids.extend(self.ideas.iter().map(|idea| idea.id.clone()));

        info!("Loaded {} ideas into the garden", self.ideas.len());
        self.ideas.clone()
    }

    /// Plants a new idea and writes the whole garden back to the slot.
    ///
    /// Input is assumed valid; the bloom form guards empty fields before it
    /// gets here. An image is kept only for `FlowerType::Custom`.
    pub fn add(&mut self, candidate: IdeaCandidate) -> Idea {
        let placement = self.config.placement;
        let scale = self.config.scale;

        let id = self.fresh_id();
        let date = self.today_label();
        let x = self.random.in_span(placement.min, placement.width());
        let y = self.random.in_span(placement.min, placement.width());
        let scale = self.random.in_span(scale.min, scale.width());

        let flower_image = match candidate.flower_type {
            FlowerType::Custom => candidate.flower_image,
            _ => None,
        };

        let idea = Idea {
            id,
            title: candidate.title,
            description: candidate.description,
            date,
            x,
            y,
            flower_type: candidate.flower_type,
            flower_image,
            scale,
            is_new: true,
        };

        info!("Planted idea '{}' as {} at ({:.1}, {:.1})", idea.id, idea.flower_type, x, y);
        self.ideas.push(idea.clone());
        self.persist();
        idea
    }

    /// Ends the spotlight for `id`. Unknown ids are ignored and nothing is
    /// written.
    pub fn clear_new_flag(&mut self, id: &str) {
        match self.ideas.iter_mut().find(|idea| idea.id == id) {
            Some(idea) => {
                idea.is_new = false;
                debug!("Spotlight over for idea '{}'", id);
                self.persist();
            }
            None => debug!("clear_new_flag: no idea with id '{}'", id),
        }
    }

    pub fn ideas(&self) -> &[Idea] {
        &self.ideas
    }

    pub fn get(&self, id: &str) -> Option<&Idea> {
        self.ideas.iter().find(|idea| idea.id == id)
    }

    pub fn len(&self) -> usize {
        self.ideas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ideas.is_empty()
    }

    pub fn config(&self) -> &GardenConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn random_mut(&mut self) -> &mut R {
        &mut self.random
    }

    /// Outcome of the most recent write. Writes are fire-and-forget, so this
    /// is the only place a failure shows up.
    pub fn last_persist_error(&self) -> Option<&AppResponse> {
        self.last_persist_error.as_ref()
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.ideas)
            .map_err(AppResponse::from)
            .and_then(|json| self.storage.write(&self.config.storage_key, &json));

        match result {
            Ok(()) => self.last_persist_error = None,
            Err(e) => {
                warn!("Failed to persist garden: {}", e);
                self.last_persist_error = Some(e);
            }
        }
    }

    /// Draws ids until one is unused. After `ID_ATTEMPTS` collisions at one
    /// length the token grows by a character, so a crowded id space cannot
    /// stall `add`.
    fn fresh_id(&mut self) -> String {
        let mut length = self.config.id_length.max(1);
        loop {
            for _ in 0..ID_ATTEMPTS {
                let candidate = self.random.token(length);
                if self.issued_ids.insert(candidate.clone()) {
                    return candidate;
                }
                debug!("Id collision on '{}', drawing again", candidate);
            }
            warn!("No free id of length {} after {} draws, lengthening", length, ID_ATTEMPTS);
            length += 1;
        }
    }

    fn today_label(&self) -> String {
        let today = (self.today)();
        let mut label = String::new();
        if write!(label, "{}", today.format(&self.config.date_format)).is_err() {
            warn!("Invalid date format '{}', using ISO date", self.config.date_format);
            return today.to_string();
        }
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random_source::tests::ScriptedRandom;
    use crate::random_source::SeededRandom;
    use crate::slot_storage::MemorySlot;

    const KEY: &str = "idea_garden_save_v9";

    fn fixed_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn store_with(slot: MemorySlot, seed: u64) -> IdeaStore<MemorySlot, SeededRandom> {
        IdeaStore::new(slot, SeededRandom::new(seed), GardenConfig::default()).with_today(fixed_day)
    }

    fn cafe() -> IdeaCandidate {
        IdeaCandidate::new("Cafe", "A cozy place", FlowerType::Tulip)
    }

    #[test]
    fn test_add_scenario() {
        let slot = MemorySlot::new();
        let mut store = store_with(slot.clone(), 1);

        let idea = store.add(cafe());
        assert_eq!(idea.flower_type, FlowerType::Tulip);
        assert!(idea.is_new);
        assert!(!idea.id.is_empty());
        assert_eq!(idea.date, "3/14/2025");
        assert_eq!(store.len(), 1);

        let saved: Vec<Idea> = serde_json::from_str(&slot.raw(KEY).unwrap()).unwrap();
        assert_eq!(saved, vec![idea]);
    }

    #[test]
    fn test_n_adds_give_n_unique_ideas() {
        let mut store = store_with(MemorySlot::new(), 2);
        for i in 0..200 {
            store.add(IdeaCandidate::new(format!("idea {i}"), "desc", FlowerType::Rose));
        }
        assert_eq!(store.len(), 200);
        let ids: HashSet<&str> = store.ideas().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn test_add_respects_ranges() {
        let config = GardenConfig::default();
        let mut store = store_with(MemorySlot::new(), 3);
        for _ in 0..500 {
            let idea = store.add(cafe());
            assert!(config.placement.contains(idea.x), "x out of range: {}", idea.x);
            assert!(config.placement.contains(idea.y), "y out of range: {}", idea.y);
            assert!(config.scale.contains(idea.scale), "scale out of range: {}", idea.scale);
        }
    }

    #[test]
    fn test_add_is_deterministic_for_a_seed() {
        let a = store_with(MemorySlot::new(), 42).add(cafe());
        let b = store_with(MemorySlot::new(), 42).add(cafe());
        assert_eq!(a, b);
    }

    #[test]
    fn test_add_maps_unit_samples_onto_ranges() {
        // nine samples for the id, then x, y, scale
        let mut samples = vec![0.0; 9];
        samples.extend([0.0, 0.5, 0.999_999_999]);
        let mut store = IdeaStore::new(
            MemorySlot::new(),
            ScriptedRandom::new(&samples),
            GardenConfig::default(),
        )
        .with_today(fixed_day);

        let idea = store.add(cafe());
        assert_eq!(idea.id, "000000000");
        assert_eq!(idea.x, 22.0);
        assert!((idea.y - 50.0).abs() < 1e-9);
        assert!(idea.scale <= 1.35 && idea.scale > 1.349);
    }

    #[test]
    fn test_colliding_id_is_redrawn() {
        // the first two ids draw identical tokens, the second must move on
        let mut samples = vec![0.0; 9];
        samples.extend([0.1, 0.1, 0.1]);
        samples.extend(vec![0.0; 9]);
        samples.extend(vec![0.5; 9]);
        samples.extend([0.1, 0.1, 0.1]);
        let mut store = IdeaStore::new(
            MemorySlot::new(),
            ScriptedRandom::new(&samples),
            GardenConfig::default(),
        );

        let first = store.add(cafe());
        let second = store.add(cafe());
        assert_eq!(first.id, "000000000");
        assert_ne!(second.id, first.id);
        assert_eq!(second.id, "iiiiiiiii");
    }

    #[test]
    fn test_exhausted_id_space_grows_ids() {
        // a constant source only ever draws '0', so each add must lengthen
        let config = GardenConfig { id_length: 1, ..GardenConfig::default() };
        let mut store = IdeaStore::new(MemorySlot::new(), ScriptedRandom::new(&[0.0]), config);

        let ids: Vec<String> = (0..4).map(|_| store.add(cafe()).id).collect();
        assert_eq!(ids, vec!["0", "00", "000", "0000"]);
    }

    #[test]
    fn test_tiny_id_space_keeps_planting() {
        let config = GardenConfig { id_length: 1, ..GardenConfig::default() };
        let mut store =
            IdeaStore::new(MemorySlot::new(), SeededRandom::new(15), config).with_today(fixed_day);
        for _ in 0..60 {
            store.add(cafe());
        }
        let ids: HashSet<&str> = store.ideas().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), 60);
        assert!(store.ideas().iter().any(|i| i.id.len() > 1));
    }

    #[test]
    fn test_load_after_adds_clears_is_new() {
        let slot = MemorySlot::new();
        let mut writer = store_with(slot.clone(), 5);
        let planted: Vec<Idea> = (0..4).map(|_| writer.add(cafe())).collect();
        writer.clear_new_flag(&planted[0].id);

        let mut reader = store_with(slot, 6);
        let loaded = reader.load();
        assert_eq!(loaded.len(), planted.len());
        for (original, reloaded) in planted.iter().zip(&loaded) {
            assert!(!reloaded.is_new);
            assert_eq!(&Idea { is_new: false, ..original.clone() }, reloaded);
        }
        assert_eq!(reader.ideas(), loaded.as_slice());
    }

    #[test]
    fn test_load_forces_persisted_is_new_false() {
        let raw = r#"[{"id":"a","title":"t","description":"d","date":"1/1/2025","x":30,"y":40,"flowerType":"rose","scale":1.2,"isNew":true}]"#;
        let mut store = store_with(MemorySlot::with_value(KEY, raw), 7);
        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert!(!loaded[0].is_new);
    }

    #[test]
    fn test_load_empty_storage() {
        let mut store = store_with(MemorySlot::new(), 8);
        assert!(store.load().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_malformed_json_degrades_to_empty() {
        let mut store = store_with(MemorySlot::with_value(KEY, "[{not json"), 9);
        assert!(store.load().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_loaded_ids_are_never_reissued() {
        let raw = r#"[{"id":"000000000","title":"t","description":"d","date":"1/1/2025","x":30,"y":40,"flowerType":"rose","scale":1.2}]"#;
        let mut samples = vec![0.0; 9];
        samples.extend(vec![0.5; 12]);
        let mut store = IdeaStore::new(
            MemorySlot::with_value(KEY, raw),
            ScriptedRandom::new(&samples),
            GardenConfig::default(),
        );
        store.load();
        let idea = store.add(cafe());
        assert_ne!(idea.id, "000000000");
    }

    #[test]
    fn test_clear_new_flag_persists() {
        let slot = MemorySlot::new();
        let mut store = store_with(slot.clone(), 10);
        let idea = store.add(cafe());
        store.clear_new_flag(&idea.id);

        assert!(!store.get(&idea.id).unwrap().is_new);
        let saved: Vec<Idea> = serde_json::from_str(&slot.raw(KEY).unwrap()).unwrap();
        assert!(!saved[0].is_new);
        assert_eq!(slot.write_count(), 2);
    }

    #[test]
    fn test_clear_new_flag_unknown_id_is_noop() {
        let slot = MemorySlot::new();
        let mut store = store_with(slot.clone(), 11);
        store.add(cafe());
        let before = store.ideas().to_vec();
        let writes = slot.write_count();

        store.clear_new_flag("missing");
        assert_eq!(store.ideas(), before.as_slice());
        assert_eq!(slot.write_count(), writes);
    }

    #[test]
    fn test_image_only_kept_for_custom() {
        let mut store = store_with(MemorySlot::new(), 12);
        let mut stock = cafe();
        stock.flower_image = Some("https://example.com/a.png".to_string());
        assert_eq!(store.add(stock).flower_image, None);

        let custom = store.add(IdeaCandidate::custom("Logo", "Ours", "https://example.com/b.png"));
        assert_eq!(custom.flower_image.as_deref(), Some("https://example.com/b.png"));
    }

    #[test]
    fn test_invalid_date_format_falls_back_to_iso() {
        let config = GardenConfig { date_format: "%Q".to_string(), ..GardenConfig::default() };
        let mut store =
            IdeaStore::new(MemorySlot::new(), SeededRandom::new(13), config).with_today(fixed_day);
        assert_eq!(store.add(cafe()).date, "2025-03-14");
    }

    struct FailingSlot;

    impl SlotStorage for FailingSlot {
        fn read(&self, _key: &str) -> Result<Option<String>, AppResponse> {
            Err(AppResponse::DatabaseError("disk gone".to_string()))
        }

        fn write(&mut self, _key: &str, _value: &str) -> Result<(), AppResponse> {
            Err(AppResponse::DatabaseError("disk gone".to_string()))
        }

        fn clear(&mut self, _key: &str) -> Result<(), AppResponse> {
            Ok(())
        }
    }

    #[test]
    fn test_storage_failures_are_swallowed() {
        let mut store = IdeaStore::new(FailingSlot, SeededRandom::new(14), GardenConfig::default());
        assert!(store.load().is_empty());

        let idea = store.add(cafe());
        assert_eq!(store.len(), 1);
        assert!(idea.is_new);
        assert!(matches!(store.last_persist_error(), Some(AppResponse::DatabaseError(_))));
    }
}
