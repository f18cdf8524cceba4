pub mod periodic;

pub use periodic::{BatcherHandle, PeriodicBatcher};
