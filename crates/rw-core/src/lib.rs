//! Core types for Rasterwelt: tiles, areas, entities, and the spatial index.
//!
//! This crate holds the data model that the simulation drives. A [`World`]
//! owns every [`Entity`] and every [`Area`]; entity positions are mirrored
//! into each area's entity set and each tile's occupant list, and only the
//! registry methods on [`World`] may change them.

/// Areas, tiles, and terrain.
pub mod area;
/// Entity types, identifiers, and positions.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Plain-data snapshots of a world.
pub mod snapshot;
/// The entity registry and spatial index.
pub mod world;

/// Re-export grid model types.
pub use area::{Area, AreaId, AreaKind, Terrain, Tile};
/// Re-export core entity types.
pub use entity::{Entity, EntityId, EntityKind, ItemRef, PLAYER_ID, Position, chebyshev};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export snapshot types.
pub use snapshot::WorldSnapshot;
/// Re-export world model types.
pub use world::{World, WorldMeta};
