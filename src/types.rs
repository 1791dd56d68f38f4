use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::Deserialize;

/// Canonical task name type used by the CLI, the config layer and the engine.
pub type TaskName = String;

/// Anything that can identify a task.
///
/// Identities are always supplied by the caller; the scheduler never mints
/// them. `Ord` is only used to make iteration-dependent output (sampling,
/// rendering) reproducible.
pub trait TaskId: Clone + Eq + Hash + Ord + fmt::Debug {}

impl<T> TaskId for T where T: Clone + Eq + Hash + Ord + fmt::Debug {}

/// How a task combines its predecessors.
///
/// - `And`: every predecessor must be completed (default).
/// - `Or`: at least one predecessor must be completed.
///
/// A task without predecessors is eligible under either kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    And,
    Or,
}

impl Default for Combinator {
    fn default() -> Self {
        Combinator::And
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::And => f.write_str("and"),
            Combinator::Or => f.write_str("or"),
        }
    }
}

impl FromStr for Combinator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "and" => Ok(Combinator::And),
            "or" => Ok(Combinator::Or),
            other => Err(format!(
                "invalid task kind: {other} (expected \"and\" or \"or\")"
            )),
        }
    }
}
