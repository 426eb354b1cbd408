//! `PoolTracker` - the character state store and the API the
//! presentation layer talks to.
//!
//! The tracker owns the one `CharacterState`, applies the resource
//! rules atomically (an operation either fully applies or leaves the
//! state untouched), and schedules a best-effort background save after
//! every transition. Storage trouble never propagates to the caller:
//! loads fall back to defaults and save failures are logged.

use crate::catalog::{self, Item, ItemKind};
use crate::persist::{self, Storage, StorageError};
use crate::rules::{self, Effect, RulesError};
use crate::state::CharacterState;
use std::sync::Arc;
use thiserror::Error;

/// Errors from tracker operations. All recoverable; the `Display`
/// strings are meant to be shown to the player as-is.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Rules(#[from] RulesError),

    #[error("unknown item: {0}")]
    UnknownItem(String),

    #[error("{name} is a {actual}, not a {expected}")]
    WrongItemType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{0} is not an activated spell")]
    SpellNotActivated(String),
}

/// Which items `list_available_items` should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemFilter {
    All,
    Abilities,
    Spells,
    Powers,
    Amplifications,
}

impl ItemFilter {
    fn matches(&self, item: &Item) -> bool {
        match self {
            ItemFilter::All => true,
            ItemFilter::Abilities => matches!(item.kind, ItemKind::Ability { .. }),
            ItemFilter::Spells => matches!(item.kind, ItemKind::Spell { .. }),
            ItemFilter::Powers => matches!(item.kind, ItemKind::Power { .. }),
            ItemFilter::Amplifications => matches!(item.kind, ItemKind::Amplification),
        }
    }
}

/// A catalog item paired with whether it can be used right now.
#[derive(Debug, Clone, Copy)]
pub struct ListedItem {
    pub item: &'static Item,
    pub available: bool,
}

/// The character state store.
pub struct PoolTracker {
    state: CharacterState,
    storage: Arc<dyn Storage>,
    show_all_levels: bool,
}

impl PoolTracker {
    /// Load the character from storage, falling back to a fresh
    /// level-1 character on any read failure.
    pub async fn load(storage: Arc<dyn Storage>) -> Self {
        let state = match storage.read_all().await {
            Ok(entries) => persist::decode_state(&entries),
            Err(err) => {
                tracing::warn!("loading character state failed, starting fresh: {err}");
                CharacterState::new()
            }
        };
        Self {
            state,
            storage,
            show_all_levels: false,
        }
    }

    /// A tracker with default state, skipping the storage read.
    pub fn with_defaults(storage: Arc<dyn Storage>) -> Self {
        Self {
            state: CharacterState::new(),
            storage,
            show_all_levels: false,
        }
    }

    /// The current observable state.
    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    /// Use an ability, spending its pool cost.
    pub fn use_ability(&mut self, item_id: &str) -> Result<Effect, TrackerError> {
        let item = self.find(item_id)?;
        let cost = match &item.kind {
            ItemKind::Ability { cost } => *cost,
            _ => return Err(wrong_type(item, "ability")),
        };
        let effect = rules::use_ability(&mut self.state, cost)?;
        self.finish_transition();
        Ok(effect)
    }

    /// Cast an activated spell, restoring pool points net of any
    /// amplification surcharge.
    pub fn cast_spell(&mut self, item_id: &str) -> Result<Effect, TrackerError> {
        let item = self.find(item_id)?;
        if !matches!(item.kind, ItemKind::Spell { .. }) {
            return Err(wrong_type(item, "spell"));
        }
        if !self.state.activated_spells.contains(item_id) {
            return Err(TrackerError::SpellNotActivated(item.name.clone()));
        }
        let effect = rules::cast_spell(&mut self.state, item)?;
        self.finish_transition();
        Ok(effect)
    }

    /// Use a power.
    pub fn use_power(&mut self, item_id: &str) -> Result<Effect, TrackerError> {
        let item = self.find(item_id)?;
        if !matches!(item.kind, ItemKind::Power { .. }) {
            return Err(wrong_type(item, "power"));
        }
        let effect = rules::use_power(&mut self.state, item)?;
        self.finish_transition();
        Ok(effect)
    }

    /// Toggle a spell in or out of the activated set.
    pub fn toggle_spell_activation(&mut self, item_id: &str) -> Result<Effect, TrackerError> {
        let item = self.find(item_id)?;
        if !matches!(item.kind, ItemKind::Spell { .. }) {
            return Err(wrong_type(item, "spell"));
        }
        let effect = rules::toggle_spell_activation(&mut self.state, item_id);
        self.finish_transition();
        Ok(effect)
    }

    /// Toggle an amplification on or off. Free regardless of pool.
    pub fn toggle_amplification(&mut self, item_id: &str) -> Result<Effect, TrackerError> {
        let item = self.find(item_id)?;
        if !matches!(item.kind, ItemKind::Amplification) {
            return Err(wrong_type(item, "amplification"));
        }
        let effect = rules::toggle_amplification(&mut self.state, item_id);
        self.finish_transition();
        Ok(effect)
    }

    /// Change the character level; the pool refills to the new capacity.
    pub fn change_level(&mut self, delta: i8) -> Effect {
        let effect = rules::change_level(&mut self.state, delta);
        self.finish_transition();
        effect
    }

    /// Refill the pool and clear active amplifications.
    pub fn restore_pool(&mut self) -> Effect {
        let effect = rules::restore_pool(&mut self.state);
        self.finish_transition();
        effect
    }

    /// View filter: when set, `list_available_items` includes items
    /// above the character's level. Not persisted.
    pub fn set_show_all_levels(&mut self, show_all: bool) {
        self.show_all_levels = show_all;
    }

    pub fn show_all_levels(&self) -> bool {
        self.show_all_levels
    }

    /// Items to present, ordered by required level then cost. Spells
    /// outside the activated set are excluded; items above the
    /// character's level are hidden unless show-all is set.
    pub fn list_available_items(&self, filter: ItemFilter) -> Vec<ListedItem> {
        let amplifications = self.state.amplification_count();
        let mut listed: Vec<ListedItem> = catalog::all_items()
            .iter()
            .filter(|item| filter.matches(item))
            .filter(|item| match &item.kind {
                ItemKind::Spell { .. } => self.state.activated_spells.contains(&item.id),
                _ => true,
            })
            .filter(|item| self.show_all_levels || item.required_level <= self.state.level)
            .map(|item| ListedItem {
                item,
                available: rules::is_available(
                    item,
                    self.state.level,
                    self.state.phrenic_pool,
                    amplifications,
                ),
            })
            .collect();
        listed.sort_by_key(|listed| (listed.item.required_level, listed.item.cost_or_zero()));
        listed
    }

    /// Write the current state to storage and wait for the result.
    /// The background saves cover normal play; this is for callers
    /// that want an explicit checkpoint.
    pub async fn save_now(&self) -> Result<(), StorageError> {
        self.storage
            .write_all(persist::encode_state(&self.state))
            .await
    }

    fn find(&self, item_id: &str) -> Result<&'static Item, TrackerError> {
        catalog::find_item(item_id).ok_or_else(|| TrackerError::UnknownItem(item_id.to_string()))
    }

    /// Every mutation funnels through here: re-check the pool invariant,
    /// then schedule a background save.
    fn finish_transition(&mut self) {
        let capacity = self.state.pool_capacity();
        if self.state.phrenic_pool > capacity {
            // The rules clamp everywhere; reaching this is a bug.
            tracing::error!(
                pool = self.state.phrenic_pool,
                capacity,
                "phrenic pool exceeded capacity after a transition, clamping"
            );
            self.state.phrenic_pool = capacity;
        }
        self.schedule_save();
    }

    /// Fire-and-forget save of the whole state. The in-memory state is
    /// already updated; a failed or skipped write costs at most this
    /// one transition.
    fn schedule_save(&self) {
        let entries = persist::encode_state(&self.state);
        let storage = Arc::clone(&self.storage);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = storage.write_all(entries).await {
                        tracing::warn!("saving character state failed: {err}");
                    }
                });
            }
            Err(_) => {
                tracing::warn!("no async runtime available, character state not saved");
            }
        }
    }
}

fn wrong_type(item: &Item, expected: &'static str) -> TrackerError {
    TrackerError::WrongItemType {
        name: item.name.clone(),
        expected,
        actual: item.kind.name(),
    }
}
