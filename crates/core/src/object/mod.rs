mod attributes;
mod game_object;

pub use attributes::{Attributes, Kind, Schema};
pub use game_object::{DiffSet, GameObject, ObjectKind};
