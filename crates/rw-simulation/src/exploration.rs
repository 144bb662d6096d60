use rw_core::{AreaId, PLAYER_ID};
use tracing::debug;

use crate::context::SimContext;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::system::System;

/// Marks the player's area visited and discovered after every step.
#[derive(Debug, Default)]
pub struct ExplorationSystem {
    visited: Vec<AreaId>,
}

impl ExplorationSystem {
    /// A system that has seen no areas yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Areas this system marked, in the order they were first entered.
    pub fn visited(&self) -> &[AreaId] {
        &self.visited
    }
}

impl System for ExplorationSystem {
    fn name(&self) -> &str {
        "exploration"
    }

    fn post_step(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let Some(area_id) = ctx.world.current_area_id() else {
            return Ok(());
        };
        let Some(area) = ctx.world.area_mut(area_id) else {
            return Ok(());
        };
        if area.visited() {
            return Ok(());
        }
        area.mark_visited();
        let name = area.kind().name.clone();
        self.visited.push(area_id);
        debug!(%area_id, %name, "area visited");
        ctx.emit(
            SimEventKind::Custom {
                label: "area_visited".into(),
                entities: vec![PLAYER_ID],
            },
            format!("entered {name} for the first time"),
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
