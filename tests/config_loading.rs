// tests/config_loading.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::set;

use std::io::Write;
use tempfile::NamedTempFile;

use taskdag::config::{ConfigFile, load_and_validate, load_from_path};
use taskdag::dag::{CombinatorGraph, Schedule};
use taskdag::errors::TaskdagError;
use taskdag::types::Combinator;

fn recipe(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn loads_recipe_with_implicit_tasks_and_kinds() {
    let file = recipe(
        r#"
[config]
seed = 7
max_parallel = 2

[task."cook pancetta"]
after = ["put oil and butter in pan", "put pancetta in pan"]

[task.sauce]
after = ["cream", "tomatoes"]
kind = "or"

[task.plate]
after = ["cook pancetta", "sauce"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.config.seed, Some(7));
    assert_eq!(cfg.config.max_parallel, 2);
    assert_eq!(cfg.config.max_task_millis, 25);
    assert_eq!(cfg.default.kind, Combinator::And);
    assert_eq!(cfg.task.len(), 3);

    let g = CombinatorGraph::from_config(&cfg).unwrap();
    assert_eq!(g.graph().len(), 7);
    assert_eq!(g.kind_of("sauce"), Combinator::Or);
    assert_eq!(g.kind_of("plate"), Combinator::And);
    assert_eq!(g.kind_of("cream"), Combinator::And);
    assert_eq!(
        g.available(),
        set(&["put oil and butter in pan", "put pancetta in pan", "cream", "tomatoes"])
    );
}

#[test]
fn default_kind_applies_to_tasks_without_their_own() {
    let file = recipe(
        r#"
[default]
kind = "or"

[task.dessert]
after = ["cake", "fruit"]

[task.coffee]
after = ["dessert", "milk"]
kind = "and"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let mut g = CombinatorGraph::from_config(&cfg).unwrap();

    assert_eq!(g.kind_of("dessert"), Combinator::Or);
    assert_eq!(g.kind_of("coffee"), Combinator::And);

    assert_eq!(g.complete("fruit"), set(&["dessert"]));
    assert_eq!(g.complete("dessert"), set(&[]));
    assert_eq!(g.complete("milk"), set(&["coffee"]));
}

#[test]
fn cycle_returns_structured_error() {
    let file = recipe(
        r#"
[task.A]
after = ["B"]

[task.B]
after = ["C"]

[task.C]
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(TaskdagError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('A') || msg.contains('B') || msg.contains('C'));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn cycle_through_implicit_task_cannot_exist() {
    // An implicit task has no `after`, so it can never close a cycle.
    let file = recipe(
        r#"
[task.A]
after = ["B"]
"#,
    );
    assert!(load_and_validate(file.path()).is_ok());
}

#[test]
fn self_dependency_returns_config_error() {
    let file = recipe(
        r#"
[task.A]
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(TaskdagError::ConfigError(msg)) => {
            assert!(msg.contains("cannot depend on itself"));
            assert!(msg.contains('A'));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn empty_recipe_is_rejected() {
    let file = recipe("[config]\nseed = 1\n");

    // Parses fine; only validation rejects it.
    let raw = load_from_path(file.path()).unwrap();
    assert!(raw.task.is_empty());

    match load_and_validate(file.path()) {
        Err(TaskdagError::ConfigError(msg)) => assert!(msg.contains("at least one")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn zero_max_parallel_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_task("A", TaskConfigBuilder::new().build())
        .with_max_parallel(0)
        .build_raw();

    match ConfigFile::try_from(raw) {
        Err(TaskdagError::ConfigError(msg)) => assert!(msg.contains("max_parallel")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn unknown_kind_is_a_toml_error() {
    let file = recipe(
        r#"
[task.A]
after = ["B"]
kind = "xor"
"#,
    );

    match load_and_validate(file.path()) {
        Err(TaskdagError::TomlError(_)) => {}
        other => panic!("Expected TomlError, got: {:?}", other),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.toml");

    match load_and_validate(&path) {
        Err(TaskdagError::IoError(_)) => {}
        other => panic!("Expected IoError, got: {:?}", other),
    }
}

#[test]
fn builder_config_builds_the_same_graph_as_toml() {
    let cfg = ConfigFileBuilder::new()
        .with_task(
            "sauce",
            TaskConfigBuilder::new()
                .after("cream")
                .after("tomatoes")
                .kind(Combinator::Or)
                .build(),
        )
        .with_task("plate", TaskConfigBuilder::new().after("sauce").build())
        .with_seed(3)
        .build();

    let mut g = CombinatorGraph::from_config(&cfg).unwrap();
    assert_eq!(g.available(), set(&["cream", "tomatoes"]));
    assert_eq!(g.complete("tomatoes"), set(&["sauce"]));
    assert_eq!(g.complete("sauce"), set(&["plate"]));
}

#[test]
fn bundled_carbonara_demo_runs_to_completion() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/carbonara.toml");
    let cfg = load_and_validate(&path).unwrap();

    let g = CombinatorGraph::from_config(&cfg).unwrap();
    assert_eq!(g.kind_of("grate cheese"), Combinator::Or);
    assert!(g.available().contains("dice pancetta"));

    let tasks = g.graph().len();
    let mut driver = taskdag::exec::RunSchedule::new(g, Some(7));
    let order = driver.run();
    assert!(driver.is_done());
    assert_eq!(order.len(), tasks);

    // Only one cheese has to be grated before the dish can be served; the
    // other one may come last.
    let serve = order.iter().position(|t| t == "serve").unwrap();
    let cheese = order.iter().position(|t| t == "grate cheese").unwrap();
    assert!(cheese < serve);
}
