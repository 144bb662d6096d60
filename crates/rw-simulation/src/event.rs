use rw_core::EntityId;

/// What kind of simulation event occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEventKind {
    // Registry
    /// An entity was registered through the simulation.
    Registered {
        /// The new entity.
        entity: EntityId,
    },
    /// An entity was removed through the simulation.
    Deregistered {
        /// The removed entity.
        entity: EntityId,
    },

    // Actions
    /// An entity stepped from one tile to another.
    Moved {
        /// The entity that moved.
        entity: EntityId,
        /// Tile it left.
        from: (i32, i32),
        /// Tile it entered.
        to: (i32, i32),
    },
    /// An entity ran its script.
    Acted {
        /// The acting entity.
        entity: EntityId,
        /// Head of the script that ran.
        behavior: String,
    },
    /// An entity's script failed and was cleared.
    ScriptFailed {
        /// The entity whose script failed.
        entity: EntityId,
        /// The rendered error.
        error: String,
    },

    // Triggers
    /// A non-player entity came within encounter range of the player.
    Encounter {
        /// The approaching entity.
        entity: EntityId,
        /// Who it approached.
        with: EntityId,
    },

    // Custom
    /// A user-defined event.
    Custom {
        /// A label identifying the custom event type.
        label: String,
        /// The entities involved in this custom event.
        entities: Vec<EntityId>,
    },
}

impl SimEventKind {
    /// Check whether a given entity is involved in this event.
    pub fn involves(&self, id: EntityId) -> bool {
        match self {
            Self::Registered { entity }
            | Self::Deregistered { entity }
            | Self::Moved { entity, .. }
            | Self::Acted { entity, .. }
            | Self::ScriptFailed { entity, .. } => *entity == id,
            Self::Encounter { entity, with } => *entity == id || *with == id,
            Self::Custom { entities, .. } => entities.contains(&id),
        }
    }
}

/// A record of something that happened during simulation.
#[derive(Debug, Clone)]
pub struct SimEvent {
    /// Global time when this event occurred.
    pub time: u64,
    /// The specific kind of event that occurred.
    pub kind: SimEventKind,
    /// A human-readable description of the event.
    pub description: String,
}

impl SimEvent {
    /// Create a new simulation event with the given time, kind, and description.
    pub fn new(time: u64, kind: SimEventKind, description: impl Into<String>) -> Self {
        Self {
            time,
            kind,
            description: description.into(),
        }
    }
}

/// Accumulates events during a simulation run.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
    max_events: usize,
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    /// Append an event, dropping the oldest events if the log exceeds its capacity.
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
        }
    }

    /// Return a slice of all recorded events.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Return all events stamped with the given global time.
    pub fn events_at(&self, time: u64) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.time == time).collect()
    }

    /// Return all events involving the given entity.
    pub fn events_for_entity(&self, id: EntityId) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.kind.involves(id)).collect()
    }

    /// Return the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
