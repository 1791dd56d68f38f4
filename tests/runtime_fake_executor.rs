// tests/runtime_fake_executor.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::{FakeExecutor, init_tracing, set, with_timeout};

use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use taskdag::config::ConfigFile;
use taskdag::dag::{CombinatorGraph, Schedule};
use taskdag::engine::{CoreRuntime, RedoMode, Runtime, RuntimeOptions, SchedulerEvent, run_phases};
use taskdag::exec::SimulatedExecutorBackend;
use taskdag::types::Combinator;

type TestResult = Result<(), Box<dyn Error>>;

/// Very simple chain: A -> B -> C
fn simple_chain_config() -> ConfigFile {
    ConfigFileBuilder::new()
        .with_task("A", TaskConfigBuilder::new().build())
        .with_task("B", TaskConfigBuilder::new().after("A").build())
        .with_task("C", TaskConfigBuilder::new().after("B").build())
        .build()
}

fn sequential() -> RuntimeOptions {
    RuntimeOptions {
        max_parallel: 1,
        exit_when_done: true,
    }
}

#[tokio::test]
async fn runtime_with_fake_executor_runs_simple_chain() -> TestResult {
    init_tracing();

    let graph = CombinatorGraph::from_config(&simple_chain_config())?;
    let (rt_tx, rt_rx) = mpsc::channel::<SchedulerEvent>(64);

    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone());

    let core = CoreRuntime::new(graph, sequential());
    let runtime = Runtime::new(core, rt_rx, executor);

    let report = with_timeout(runtime.run()).await?;

    let tasks_run = executed.lock().unwrap().clone();
    assert_eq!(tasks_run, vec!["A", "B", "C"]);
    assert_eq!(report.order, vec!["A", "B", "C"]);
    assert!(report.graph.is_done());

    Ok(())
}

#[tokio::test]
async fn redo_reported_mid_run_repeats_downstream_tasks() -> TestResult {
    init_tracing();

    let graph = CombinatorGraph::from_config(&simple_chain_config())?;
    let (rt_tx, rt_rx) = mpsc::channel::<SchedulerEvent>(64);

    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor =
        FakeExecutor::new(rt_tx.clone(), executed.clone()).redo_after("B", "B", RedoMode::Forward);

    let core = CoreRuntime::new(graph, sequential());
    let report = with_timeout(Runtime::new(core, rt_rx, executor).run()).await?;

    // B's completion is accepted (C is dispatched), then B is redone: C's
    // run becomes stale and both run again.
    let tasks_run = executed.lock().unwrap().clone();
    assert_eq!(tasks_run, vec!["A", "B", "C", "B", "C"]);
    assert_eq!(report.order, vec!["A", "B", "B", "C"]);
    assert!(report.graph.is_done());

    Ok(())
}

#[tokio::test]
async fn or_join_runs_with_parallel_branches() -> TestResult {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .with_task(
            "dessert",
            TaskConfigBuilder::new()
                .after("cake")
                .after("fruit")
                .kind(Combinator::Or)
                .build(),
        )
        .with_task("coffee", TaskConfigBuilder::new().after("dessert").build())
        .with_max_parallel(2)
        .build();

    let graph = CombinatorGraph::from_config(&cfg)?;
    let (rt_tx, rt_rx) = mpsc::channel::<SchedulerEvent>(64);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone());

    let options = RuntimeOptions {
        max_parallel: cfg.config.max_parallel,
        exit_when_done: true,
    };
    let report = with_timeout(Runtime::new(CoreRuntime::new(graph, options), rt_rx, executor).run())
        .await?;

    let tasks_run = executed.lock().unwrap().clone();
    assert_eq!(tasks_run.len(), 4);
    assert_eq!(&tasks_run[..2], ["cake", "fruit"]);
    assert_eq!(tasks_run.last().map(String::as_str), Some("coffee"));
    assert!(report.graph.is_done());

    Ok(())
}

#[tokio::test]
async fn shutdown_event_stops_a_waiting_coordinator() -> TestResult {
    init_tracing();

    let graph = CombinatorGraph::from_config(&simple_chain_config())?;
    let (rt_tx, rt_rx) = mpsc::channel::<SchedulerEvent>(64);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone());

    let options = RuntimeOptions {
        max_parallel: 1,
        exit_when_done: false,
    };
    let runtime = Runtime::new(CoreRuntime::new(graph, options), rt_rx, executor);
    let handle = tokio::spawn(runtime.run());

    // Wait until the chain is through, then ask the coordinator to stop.
    with_timeout(async {
        while executed.lock().unwrap().len() < 3 {
            tokio::task::yield_now().await;
        }
    })
    .await;
    rt_tx.send(SchedulerEvent::ShutdownRequested).await?;

    let report = with_timeout(handle).await??;
    assert_eq!(report.order, vec!["A", "B", "C"]);

    Ok(())
}

#[tokio::test]
async fn simulated_backend_completes_every_task() -> TestResult {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .with_task("toss", TaskConfigBuilder::new().after("pasta").after("sauce").build())
        .with_task("pasta", TaskConfigBuilder::new().after("water").build())
        .with_task("sauce", TaskConfigBuilder::new().after("eggs").after("cheese").build())
        .build();

    let graph = CombinatorGraph::from_config(&cfg)?;
    let (rt_tx, rt_rx) = mpsc::channel::<SchedulerEvent>(64);
    let executor = SimulatedExecutorBackend::new(rt_tx.clone(), 5);

    let options = RuntimeOptions {
        max_parallel: 3,
        exit_when_done: true,
    };
    let report = with_timeout(Runtime::new(CoreRuntime::new(graph, options), rt_rx, executor).run())
        .await?;

    assert!(report.graph.is_done());
    assert_eq!(
        report.order.iter().cloned().collect::<std::collections::HashSet<_>>(),
        set(&["toss", "pasta", "sauce", "water", "eggs", "cheese"])
    );
    assert_eq!(report.order.last().map(String::as_str), Some("toss"));

    Ok(())
}

#[tokio::test]
async fn each_planned_redo_gets_its_own_run() -> TestResult {
    init_tracing();

    let graph = CombinatorGraph::from_config(&simple_chain_config())?;
    let executed = Arc::new(Mutex::new(Vec::new()));
    let invalidations = vec![("B".to_string(), RedoMode::Forward)];

    let outcome = with_timeout(run_phases(graph, sequential(), &invalidations, |tx| {
        FakeExecutor::new(tx, executed.clone())
    }))
    .await?;

    assert!(!outcome.interrupted);
    assert_eq!(outcome.phases.len(), 2);
    assert_eq!(outcome.phases[0].order, vec!["A", "B", "C"]);
    assert!(outcome.phases[0].invalidation.is_none());

    let redo = outcome.phases[1].invalidation.as_ref().unwrap();
    assert_eq!(redo.task, "B");
    assert_eq!(redo.undone, set(&["B", "C"]));
    assert_eq!(outcome.phases[1].order, vec!["B", "C"]);

    assert!(outcome.graph.is_done());
    assert_eq!(*executed.lock().unwrap(), vec!["A", "B", "C", "B", "C"]);

    Ok(())
}

#[tokio::test]
async fn shutdown_skips_the_remaining_redo_runs() -> TestResult {
    init_tracing();

    let graph = CombinatorGraph::from_config(&simple_chain_config())?;
    let executed = Arc::new(Mutex::new(Vec::new()));
    let invalidations = vec![
        ("A".to_string(), RedoMode::Forward),
        ("B".to_string(), RedoMode::Bidirectional),
    ];

    let outcome = with_timeout(run_phases(graph, sequential(), &invalidations, |tx| {
        FakeExecutor::new(tx, executed.clone()).shutdown_after("B")
    }))
    .await?;

    assert!(outcome.interrupted);
    assert_eq!(outcome.phases.len(), 1);
    assert_eq!(outcome.phases[0].order, vec!["A", "B"]);

    // Neither redo was applied.
    assert!(outcome.graph.is_completed("A"));
    assert!(outcome.graph.is_completed("B"));
    assert!(!outcome.graph.is_completed("C"));

    Ok(())
}
