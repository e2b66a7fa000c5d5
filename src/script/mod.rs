pub mod model;

pub use model::{Element, Scene, Script};
