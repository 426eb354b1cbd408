//! Phrenic pool tracking engine for psychic tabletop characters.
//!
//! This crate provides:
//! - A compiled-in catalog of abilities, spells, powers, and amplifications
//! - Pure resource rules: pool capacity, availability, use/cast transitions
//! - A character state store with key/value persistence across sessions
//!
//! Rendering, input, and sound live elsewhere; a presentation layer drives
//! this engine through [`PoolTracker`] and renders what comes back.
//!
//! # Quick Start
//!
//! ```ignore
//! use phrenic_core::{FileStorage, ItemFilter, PoolTracker};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let storage = Arc::new(FileStorage::new("character.json"));
//!     let mut tracker = PoolTracker::load(storage).await;
//!
//!     tracker.change_level(2);
//!     tracker.toggle_spell_activation("spell-dream-scan")?;
//!     tracker.cast_spell("spell-dream-scan")?;
//!
//!     for listed in tracker.list_available_items(ItemFilter::All) {
//!         println!("{} (available: {})", listed.item.name, listed.available);
//!     }
//! }
//! ```

pub mod catalog;
pub mod persist;
pub mod rules;
pub mod state;
pub mod store;

// Primary public API
pub use catalog::{all_items, find_item, Item, ItemKind};
pub use persist::{FileStorage, MemoryStorage, Storage, StorageError};
pub use rules::{pool_capacity, Effect, RulesError};
pub use state::{CharacterState, MAX_LEVEL, MIN_LEVEL};
pub use store::{ItemFilter, ListedItem, PoolTracker, TrackerError};
