pub mod error;
pub mod formats;
pub mod math;
pub mod operations;
pub mod skeleton;

pub use error::{Result, SkeletalError};
pub use skeleton::{Edge, Skeleton, Space};
