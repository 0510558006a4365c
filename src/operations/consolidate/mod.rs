mod dedup;
mod disconnected;

pub use dedup::Consolidate;
pub use disconnected::RemoveDisconnected;

pub(crate) use dedup::{canonical_edges, chain_edges};
