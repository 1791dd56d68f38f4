#![allow(dead_code)]

use std::collections::BTreeMap;

use taskdag::config::{ConfigFile, ConfigSection, DefaultSection, RawConfigFile, TaskConfig};
use taskdag::types::Combinator;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                default: DefaultSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.config.seed = Some(seed);
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.config.config.max_parallel = max_parallel;
        self
    }

    pub fn with_default_kind(mut self, kind: Combinator) -> Self {
        self.config.default.kind = kind;
        self
    }

    /// The unvalidated config, for exercising validation errors.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new() -> Self {
        Self {
            task: TaskConfig::default(),
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn kind(mut self, kind: Combinator) -> Self {
        self.task.kind = Some(kind);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

impl Default for TaskConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
