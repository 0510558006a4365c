mod crop;

pub use crop::Crop;
