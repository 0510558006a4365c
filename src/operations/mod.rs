pub mod consolidate;
pub mod decompose;
pub mod modification;
pub mod query;
pub mod resample;
