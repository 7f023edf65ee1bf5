mod derive;
mod generator;

pub use derive::derive_value;
pub use generator::{GenerateReport, SkeletonGenerator};
