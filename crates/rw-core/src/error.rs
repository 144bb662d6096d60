use crate::area::AreaId;
use crate::entity::EntityId;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when manipulating a world.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The requested entity ID does not exist in the registry.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The requested area ID does not exist in the world.
    #[error("area not found: {0}")]
    AreaNotFound(AreaId),

    /// An area cannot be replaced while entities stand in it.
    #[error("area {0} still holds entities")]
    AreaOccupied(AreaId),

    /// A placement named coordinates outside the area's bounds.
    #[error("position ({x}, {y}) is outside area {area}")]
    OutOfBounds {
        /// The area the entity was being placed in.
        area: AreaId,
        /// The requested column.
        x: i32,
        /// The requested row.
        y: i32,
    },

    /// No entity is currently marked as acting.
    #[error("no active entity")]
    NoActiveEntity,

    /// The registry and the area/tile indexes disagree.
    #[error("spatial index mismatch: {0}")]
    IndexMismatch(String),

    /// A snapshot is structurally invalid (duplicate ids, wrong tile count).
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}
