use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::behavior;
use crate::context::SimContext;
use crate::error::{SimError, SimResult};

/// A behavior function. Receives the arguments after its own name and
/// returns the script to run on the entity's next action.
pub type BehaviorFn = fn(&mut SimContext<'_>, &[Script]) -> SimResult<Script>;

/// A resumable unit of behavior.
///
/// Scripts are plain data apart from [`Script::Callable`], which cannot be
/// serialized. In JSON a name is a string, an integer is a number and a
/// sequence is an array, so `["patrol", 0, 3, 4]` round-trips as written.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Script {
    /// A behavior looked up by name in the engine.
    Name(String),
    /// An integer argument. Never valid in head position.
    Int(i64),
    /// A nested script whose first element is dispatched recursively.
    Sequence(Vec<Script>),
    /// A behavior called directly.
    #[serde(skip)]
    Callable(BehaviorFn),
}

impl Script {
    /// A bare behavior name.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// A sequence of script values.
    pub fn seq(items: impl IntoIterator<Item = Script>) -> Self {
        Self::Sequence(items.into_iter().collect())
    }

    /// Build `[name, args...]`.
    pub fn call(name: &str, args: &[Script]) -> Self {
        let mut items = Vec::with_capacity(args.len() + 1);
        items.push(Self::name(name));
        items.extend_from_slice(args);
        Self::Sequence(items)
    }

    /// True for an empty sequence.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Sequence(items) if items.is_empty())
    }

    /// The behavior name this script dispatches to first, if it is known
    /// without running anything.
    pub fn head_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Sequence(items) => items.first().and_then(Self::head_name),
            Self::Int(_) | Self::Callable(_) => None,
        }
    }

    /// False if a callable appears anywhere inside.
    pub fn is_serializable(&self) -> bool {
        match self {
            Self::Name(_) | Self::Int(_) => true,
            Self::Sequence(items) => items.iter().all(Self::is_serializable),
            Self::Callable(_) => false,
        }
    }

    /// The integer value, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The name, if this is a `Name`.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            Self::Callable(_) => f.write_str("Callable(<fn>)"),
        }
    }
}

impl PartialEq for Script {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Name(a), Self::Name(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::Callable(a), Self::Callable(b)) => std::ptr::fn_addr_eq(*a, *b),
            _ => false,
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name:?}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Callable(_) => f.write_str("<callable>"),
            Self::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for Script {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Script {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<i64> for Script {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<Vec<Script>> for Script {
    fn from(items: Vec<Script>) -> Self {
        Self::Sequence(items)
    }
}

impl From<BehaviorFn> for Script {
    fn from(f: BehaviorFn) -> Self {
        Self::Callable(f)
    }
}

/// Registry of named behaviors and the dispatcher that runs scripts.
///
/// Behaviors can be added but never removed.
#[derive(Clone, Default)]
pub struct ScriptEngine {
    behaviors: BTreeMap<String, BehaviorFn>,
}

impl fmt::Debug for ScriptEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptEngine")
            .field("behaviors", &self.behaviors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ScriptEngine {
    /// An engine with no behaviors.
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine with `wait`, `move`, `goto`, `follow` and `patrol`.
    pub fn with_builtins() -> Self {
        let mut engine = Self::new();
        behavior::register_builtins(&mut engine);
        engine
    }

    /// Register a behavior, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, behavior: BehaviorFn) {
        self.behaviors.insert(name.into(), behavior);
    }

    /// Whether a behavior is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.behaviors.contains_key(name)
    }

    /// Registered behavior names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.behaviors.keys().map(String::as_str)
    }

    /// Run an argument list. The first argument decides what gets called;
    /// the rest are passed along.
    pub fn run(&self, ctx: &mut SimContext<'_>, args: &[Script]) -> SimResult<Script> {
        let Some((head, rest)) = args.split_first() else {
            return Err(SimError::EmptyScript);
        };
        match head {
            Script::Name(name) => {
                let behavior = self
                    .behaviors
                    .get(name)
                    .ok_or_else(|| SimError::BehaviorNotFound(name.clone()))?;
                trace!(behavior = %name, args = rest.len(), "dispatch");
                behavior(ctx, rest)
            }
            Script::Sequence(inner) => {
                let result = self.run(ctx, inner)?;
                if rest.is_empty() {
                    return Ok(result);
                }
                let mut next = Vec::with_capacity(rest.len() + 1);
                next.push(result);
                next.extend_from_slice(rest);
                self.run(ctx, &next)
            }
            Script::Callable(behavior) => behavior(ctx, rest),
            Script::Int(v) => Err(SimError::InvalidScript(format!(
                "{v} cannot be called"
            ))),
        }
    }

    /// Run a stored script value. A sequence is treated as the argument
    /// list; anything else as a single argument.
    pub fn run_value(&self, ctx: &mut SimContext<'_>, script: &Script) -> SimResult<Script> {
        match script {
            Script::Sequence(items) => self.run(ctx, items),
            other => self.run(ctx, std::slice::from_ref(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;

    fn echo(_ctx: &mut SimContext<'_>, args: &[Script]) -> SimResult<Script> {
        Ok(Script::seq(args.iter().cloned()))
    }

    fn count(ctx: &mut SimContext<'_>, args: &[Script]) -> SimResult<Script> {
        ctx.spend_action()?;
        let n = args.first().and_then(Script::as_int).unwrap_or(0);
        Ok(Script::call("count", &[Script::Int(n + 1)]))
    }

    fn named_echo(_ctx: &mut SimContext<'_>, _args: &[Script]) -> SimResult<Script> {
        Ok(Script::name("echo"))
    }

    fn engine() -> ScriptEngine {
        let mut engine = ScriptEngine::with_builtins();
        engine.register("echo", echo);
        engine.register("count", count);
        engine
    }

    #[test]
    fn empty_arguments_fail() {
        let mut h = Harness::new();
        let err = engine().run(&mut h.ctx(), &[]).unwrap_err();
        assert!(matches!(err, SimError::EmptyScript));
        let err = engine()
            .run_value(&mut h.ctx(), &Script::seq([]))
            .unwrap_err();
        assert!(matches!(err, SimError::EmptyScript));
    }

    #[test]
    fn unknown_name_fails() {
        let mut h = Harness::new();
        let err = engine()
            .run(&mut h.ctx(), &[Script::name("dance")])
            .unwrap_err();
        assert!(matches!(err, SimError::BehaviorNotFound(ref n) if n == "dance"));
    }

    #[test]
    fn integer_head_is_invalid() {
        let mut h = Harness::new();
        let err = engine().run(&mut h.ctx(), &[Script::Int(3)]).unwrap_err();
        assert!(matches!(err, SimError::InvalidScript(_)));
    }

    #[test]
    fn name_receives_remaining_arguments() {
        let mut h = Harness::new();
        let out = engine()
            .run(&mut h.ctx(), &["echo".into(), Script::Int(1), "x".into()])
            .unwrap();
        assert_eq!(out, Script::seq([Script::Int(1), Script::name("x")]));
    }

    #[test]
    fn nested_result_becomes_new_head() {
        let mut h = Harness::new();
        let mut engine = engine();
        engine.register("named_echo", named_echo);
        // [["named_echo"], 7] -> "echo" then ["echo", 7] -> [7]
        let out = engine
            .run(
                &mut h.ctx(),
                &[Script::seq([Script::name("named_echo")]), Script::Int(7)],
            )
            .unwrap();
        assert_eq!(out, Script::seq([Script::Int(7)]));
    }

    #[test]
    fn nested_without_rest_returns_inner_result() {
        let mut h = Harness::new();
        let script = Script::seq([Script::seq(["echo".into(), Script::Int(5)])]);
        let out = engine().run_value(&mut h.ctx(), &script).unwrap();
        assert_eq!(out, Script::seq([Script::Int(5)]));
    }

    #[test]
    fn callable_head_is_invoked() {
        let mut h = Harness::new();
        let f: BehaviorFn = echo;
        let out = engine()
            .run(&mut h.ctx(), &[Script::Callable(f), Script::Int(2)])
            .unwrap();
        assert_eq!(out, Script::seq([Script::Int(2)]));
    }

    #[test]
    fn stateful_continuation_threads_through_runs() {
        let mut h = Harness::new();
        let engine = engine();
        let mut script = Script::call("count", &[]);
        for _ in 0..3 {
            script = engine.run_value(&mut h.ctx(), &script).unwrap();
        }
        assert_eq!(script, Script::call("count", &[Script::Int(3)]));
    }

    #[test]
    fn wander_script_is_stable() {
        let mut h = Harness::with_mob_at(2, 2);
        let engine = engine();
        let script = Script::seq(["move".into(), "wander".into()]);
        let first = engine.run_value(&mut h.ctx(), &script).unwrap();
        assert_eq!(first, script);
        let second = engine.run_value(&mut h.ctx(), &first).unwrap();
        assert_eq!(second, script);
    }

    #[test]
    fn head_name_looks_through_nesting() {
        let script = Script::seq([
            Script::seq(["goto".into(), Script::Int(1)]),
            Script::Int(2),
        ]);
        assert_eq!(script.head_name(), Some("goto"));
        assert_eq!(Script::Int(1).head_name(), None);
    }

    #[test]
    fn json_shape_is_plain() {
        let script = Script::call("patrol", &[Script::Int(0), Script::Int(3), Script::Int(4)]);
        let json = serde_json::to_string(&script).unwrap();
        assert_eq!(json, r#"["patrol",0,3,4]"#);
        let back: Script = serde_json::from_str(&json).unwrap();
        assert_eq!(back, script);
    }

    #[test]
    fn callables_are_not_serializable() {
        let f: BehaviorFn = echo;
        let script = Script::seq([Script::Callable(f)]);
        assert!(!script.is_serializable());
        assert!(serde_json::to_string(&script).is_err());
        assert_eq!(script.to_string(), "[<callable>]");
    }

    #[test]
    fn display_renders_like_json() {
        let script = Script::seq(["move".into(), Script::Int(1), Script::Int(-1)]);
        assert_eq!(script.to_string(), r#"["move", 1, -1]"#);
    }
}
