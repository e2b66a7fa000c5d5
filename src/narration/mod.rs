//! Text-to-speech backends and the stage that drives them.

pub mod backend;
pub mod config;
pub mod http;
pub mod local;
pub mod stage;

pub use backend::{NarrationBackend, NarrationError, NarrationRequest, backend_for};
pub use config::{Engine, NarrationConfig};
pub use stage::NarrationStage;
