// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::Combinator;

/// Top-level recipe as read from a TOML file.
///
/// ```toml
/// [config]
/// seed = 7
/// max_parallel = 2
///
/// [default]
/// kind = "and"
///
/// [task."cook pancetta"]
/// after = ["put oil and butter in pan", "put pancetta in pan"]
///
/// [task.sauce]
/// after = ["cream", "tomatoes"]
/// kind = "or"
/// ```
///
/// This is the unvalidated shape; the rest of the crate works with
/// [`ConfigFile`], obtained through `ConfigFile::try_from`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub default: DefaultSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated recipe.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub default: DefaultSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    /// Assemble a config without validation. Only `validate` calls this.
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        default: DefaultSection,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self {
            config,
            default,
            task,
        }
    }
}

/// `[config]` section: how the schedule is executed.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Seed for the random-order driver. Unseeded runs use OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Maximum number of tasks the coordinator keeps in flight.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Upper bound, in milliseconds, of a simulated task's duration.
    #[serde(default = "default_max_task_millis")]
    pub max_task_millis: u64,
}

fn default_max_parallel() -> usize {
    4
}

fn default_max_task_millis() -> u64 {
    25
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            seed: None,
            max_parallel: default_max_parallel(),
            max_task_millis: default_max_task_millis(),
        }
    }
}

/// `[default]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultSection {
    /// Combinator for tasks that do not set `kind`.
    #[serde(default)]
    pub kind: Combinator,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    /// Predecessors of this task. Names without their own `[task.X]`
    /// section become implicit leaf tasks.
    #[serde(default)]
    pub after: Vec<String>,

    /// `"and"` or `"or"`; falls back to `[default].kind`.
    #[serde(default)]
    pub kind: Option<Combinator>,
}

impl TaskConfig {
    pub fn effective_kind(&self, default_kind: Combinator) -> Combinator {
        self.kind.unwrap_or(default_kind)
    }
}
