//! Splitting a skeleton into connected pieces and paths.

mod components;
mod graph;
mod interjoint;
mod paths;

pub use components::Components;
pub use interjoint::InterjointPaths;
pub use paths::TraversalPaths;

pub(crate) use graph::Adjacency;
