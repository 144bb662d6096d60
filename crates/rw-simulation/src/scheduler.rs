use std::collections::BTreeMap;

use rw_core::{AreaId, CoreError, EntityId, EntityKind};
use tracing::{debug, trace, warn};

use crate::behavior;
use crate::context::SimContext;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::script::{Script, ScriptEngine};

/// How far an entity may catch up during one area sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchUp {
    /// Never scheduled.
    Never,
    /// At most one action per sweep.
    Once,
    /// Act repeatedly until the local clock reaches the global one.
    UntilCaughtUp,
}

/// The catch-up policy for each kind of entity.
pub fn catch_up_policy(kind: EntityKind) -> CatchUp {
    match kind {
        EntityKind::Player => CatchUp::Never,
        EntityKind::Npc => CatchUp::Once,
        EntityKind::Mob => CatchUp::UntilCaughtUp,
    }
}

/// Decides which entities act, and how often, when the global clock moves.
///
/// Scripts are stored here rather than on the entities, keyed by id. An
/// entity without a script falls back to its kind's default: NPCs wait and
/// mobs wander.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    scripts: BTreeMap<EntityId, Script>,
}

impl Scheduler {
    /// A scheduler with no stored scripts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the script an entity runs on its next action.
    pub fn set_script(&mut self, id: EntityId, script: Script) {
        self.scripts.insert(id, script);
    }

    /// The script stored for `id`.
    pub fn script(&self, id: EntityId) -> Option<&Script> {
        self.scripts.get(&id)
    }

    /// Drop the stored script of `id` and return it.
    pub fn clear_script(&mut self, id: EntityId) -> Option<Script> {
        self.scripts.remove(&id)
    }

    /// All assigned scripts in id order.
    pub fn scripts(&self) -> impl Iterator<Item = (EntityId, &Script)> {
        self.scripts.iter().map(|(id, script)| (*id, script))
    }

    /// Let every entity in `area` that owes time act, one entity at a time.
    ///
    /// Entities are visited in ascending id order. Each one is marked as the
    /// active entity for the duration of its actions. Returns the number of
    /// actions taken.
    pub fn sweep(
        &mut self,
        ctx: &mut SimContext<'_>,
        engine: &ScriptEngine,
        area: AreaId,
    ) -> SimResult<usize> {
        let ids: Vec<EntityId> = ctx
            .world
            .area(area)
            .ok_or(CoreError::AreaNotFound(area))?
            .entity_ids()
            .collect();

        let mut actions = 0;
        for id in ids {
            // Earlier actors may have removed or relocated this entity.
            let Some(entity) = ctx.world.lookup(id) else {
                continue;
            };
            if entity.area() != Some(area) || id.is_player() {
                continue;
            }
            let policy = catch_up_policy(entity.kind);
            if policy == CatchUp::Never || ctx.clock.debt(entity.local_time()) == 0 {
                continue;
            }

            ctx.world.set_active(Some(id));
            let result = self.catch_up(ctx, engine, id, policy);
            ctx.world.set_active(None);
            actions += result?;
        }

        debug!(%area, time = ctx.time(), actions, "area sweep");
        Ok(actions)
    }

    fn catch_up(
        &mut self,
        ctx: &mut SimContext<'_>,
        engine: &ScriptEngine,
        id: EntityId,
        policy: CatchUp,
    ) -> SimResult<usize> {
        let mut acted = 0;
        loop {
            self.act_once(ctx, engine, id)?;
            acted += 1;
            if policy != CatchUp::UntilCaughtUp {
                break;
            }
            match ctx.world.lookup(id) {
                Some(entity) if ctx.clock.debt(entity.local_time()) > 0 => {}
                _ => break,
            }
        }
        trace!(%id, acted, "caught up");
        Ok(acted)
    }

    /// Run one action for the active entity `id`.
    ///
    /// An action that leaves the local clock untouched is charged the
    /// configured action cost afterwards.
    fn act_once(
        &mut self,
        ctx: &mut SimContext<'_>,
        engine: &ScriptEngine,
        id: EntityId,
    ) -> SimResult<()> {
        let Some(entity) = ctx.world.lookup(id) else {
            return Ok(());
        };
        let before = entity.local_time();
        let kind = entity.kind;

        match self.scripts.get(&id).cloned() {
            Some(script) => match engine.run_value(ctx, &script) {
                Ok(next) => {
                    let behavior = script.head_name().unwrap_or("<callable>").to_string();
                    ctx.emit(
                        SimEventKind::Acted {
                            entity: id,
                            behavior: behavior.clone(),
                        },
                        format!("{id} ran {behavior}"),
                    );
                    if ctx.world.lookup(id).is_some() {
                        self.scripts.insert(id, next);
                    } else {
                        self.scripts.remove(&id);
                    }
                }
                Err(err) if !ctx.config.strict_scripts => {
                    warn!(%id, script = %script, error = %err, "script failed, clearing it");
                    ctx.emit(
                        SimEventKind::ScriptFailed {
                            entity: id,
                            error: err.to_string(),
                        },
                        format!("{id} script failed: {err}"),
                    );
                    self.scripts.remove(&id);
                }
                Err(err) => return Err(err),
            },
            None => {
                let wander = [Script::name("wander")];
                match kind {
                    EntityKind::Mob => behavior::step(ctx, &wander)?,
                    _ => behavior::wait(ctx, &[])?,
                };
            }
        }

        if let Some(entity) = ctx.world.lookup_mut(id) {
            if entity.local_time() == before {
                trace!(%id, "action spent no time, charging default cost");
                entity.spend_time(ctx.config.action_cost);
            }
        }
        Ok(())
    }
}
