mod equivalent;
mod isomorphism;

pub use equivalent::Equivalent;
