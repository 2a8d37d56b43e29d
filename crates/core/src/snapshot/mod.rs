mod buffer;
mod delta;
mod world;

pub use buffer::DeltaHistory;
pub use delta::{DeltaSnapshot, DiffPolicy};
pub use world::Snapshot;
