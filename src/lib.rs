// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::fmt;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::{CombinatorGraph, Schedule, to_dot};
use crate::engine::{Invalidation, Phase, RedoMode, RuntimeOptions, SchedulerEvent, run_phases};
use crate::exec::{RunSchedule, SimulatedExecutorBackend};
use crate::types::TaskName;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - recipe loading
/// - the combinator graph
/// - the sequential driver or the concurrent coordinator
/// - the requested invalidations, each followed by another run
/// - optional DOT output
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;
    let graph = CombinatorGraph::from_config(&cfg)?;

    if args.dry_run {
        print_dry_run(&cfg, &graph);
        return Ok(());
    }

    let invalidations = planned_invalidations(&args);

    let graph = if args.sequential {
        let seed = args.seed.or(cfg.config.seed);
        run_sequential(graph, seed, &invalidations)
    } else {
        run_concurrent(graph, &cfg, &invalidations).await?
    };

    if let Some(path) = &args.dot {
        std::fs::write(path, to_dot(&graph))?;
        info!(path = %path, "wrote graphviz rendering");
    }

    Ok(())
}

/// Forward redos first, then bidirectional ones, each in CLI order.
fn planned_invalidations(args: &CliArgs) -> Vec<(TaskName, RedoMode)> {
    let forward = args.redo.iter().map(|t| (t.clone(), RedoMode::Forward));
    let cooking = args
        .cooking_redo
        .iter()
        .map(|t| (t.clone(), RedoMode::Bidirectional));
    forward.chain(cooking).collect()
}

fn run_sequential(
    graph: CombinatorGraph,
    seed: Option<u64>,
    invalidations: &[(TaskName, RedoMode)],
) -> CombinatorGraph {
    let mut runner = RunSchedule::new(graph, seed);
    print_phase(
        1,
        &Phase {
            invalidation: None,
            order: runner.run(),
        },
    );

    for (i, (task, mode)) in invalidations.iter().enumerate() {
        let undone = match mode {
            RedoMode::Forward => runner.redo(task.as_str()),
            RedoMode::Bidirectional => runner.cooking_redo(task.as_str()),
        };
        let invalidation = Invalidation {
            task: task.clone(),
            mode: *mode,
            undone,
        };
        print_phase(
            i + 2,
            &Phase {
                invalidation: Some(invalidation),
                order: runner.run(),
            },
        );
    }

    runner.into_inner()
}

async fn run_concurrent(
    graph: CombinatorGraph,
    cfg: &ConfigFile,
    invalidations: &[(TaskName, RedoMode)],
) -> Result<CombinatorGraph> {
    let options = RuntimeOptions {
        max_parallel: cfg.config.max_parallel,
        exit_when_done: true,
    };
    let max_task_millis = cfg.config.max_task_millis;

    // One Ctrl-C listener per run, each feeding that run's channel.
    let mut listeners: Vec<JoinHandle<()>> = Vec::new();
    let outcome = run_phases(graph, options, invalidations, |tx| {
        let ctrl_c_tx = tx.clone();
        listeners.push(tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = ctrl_c_tx.send(SchedulerEvent::ShutdownRequested).await;
        }));
        SimulatedExecutorBackend::new(tx, max_task_millis)
    })
    .await;

    for listener in listeners {
        listener.abort();
    }
    let outcome = outcome?;

    for (i, phase) in outcome.phases.iter().enumerate() {
        print_phase(i + 1, phase);
    }
    if outcome.interrupted {
        warn!("interrupted; remaining redo runs were skipped");
    }

    Ok(outcome.graph)
}

fn print_phase(run: usize, phase: &Phase) {
    if let Some(invalidation) = &phase.invalidation {
        print_undone(invalidation);
    }
    print_order(run, &phase.order);
}

fn print_order(run: usize, order: &[TaskName]) {
    println!("run {run}: {} task(s) completed", order.len());
    for task in order {
        println!("  {task}");
    }
}

fn print_undone(invalidation: &Invalidation) {
    let label = match invalidation.mode {
        RedoMode::Forward => "redo",
        RedoMode::Bidirectional => "cooking-redo",
    };
    println!(
        "{label} {}: marking undone {}",
        invalidation.task,
        sorted_list(&invalidation.undone)
    );
}

fn sorted_list<'a, T>(items: impl IntoIterator<Item = &'a T>) -> String
where
    T: fmt::Display + Ord + 'a,
{
    let mut items: Vec<&T> = items.into_iter().collect();
    items.sort();
    let rendered: Vec<String> = items.iter().map(|t| t.to_string()).collect();
    format!("[{}]", rendered.join(", "))
}

/// Dry-run output: tasks, kinds, dependencies and what could start now.
fn print_dry_run(cfg: &ConfigFile, graph: &CombinatorGraph) {
    println!("taskdag dry-run");
    println!("  config.max_parallel = {}", cfg.config.max_parallel);
    println!("  config.max_task_millis = {}", cfg.config.max_task_millis);
    if let Some(seed) = cfg.config.seed {
        println!("  config.seed = {seed}");
    }
    println!("  default.kind = {}", cfg.default.kind);
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name} [{}]", graph.kind_of(name.as_str()));
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
    }

    let implicit: Vec<&TaskName> = graph
        .graph()
        .tasks()
        .filter(|t| !cfg.task.contains_key(t.as_str()))
        .collect();
    if !implicit.is_empty() {
        println!("implicit tasks: {}", sorted_list(implicit));
    }

    println!("available now: {}", sorted_list(&graph.available()));

    debug!("dry-run complete (no execution)");
}
