mod downsample;
mod smoothing;

pub use downsample::Downsample;
pub use smoothing::AverageSmoothing;
