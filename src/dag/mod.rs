// src/dag/mod.rs

//! Dependency graphs and the scheduling operations over them.
//!
//! - [`graph`] holds [`TaskGraph`], the base structure with pure AND
//!   semantics: edges in both directions plus the completed set.
//! - [`combinator`] holds [`CombinatorGraph`], which adds a per-task AND/OR
//!   combinator on top of a `TaskGraph`.
//! - [`schedule`] defines the [`Schedule`] trait both graphs implement:
//!   available / complete / redo / bidirectional redo.
//! - [`render`] turns any schedule into Graphviz DOT.

pub mod combinator;
pub mod graph;
pub mod render;
pub mod schedule;

pub use combinator::CombinatorGraph;
pub use graph::TaskGraph;
pub use render::to_dot;
pub use schedule::Schedule;
