//! Pointer input: picking the clickable mesh.

mod pointer;

pub use pointer::{PickHit, Picker};
