//! Core traits, settings, and the module registry.

pub mod clock;
pub mod context;
pub mod module;
pub mod registry;
pub mod settings;

pub use clock::{Clock, FixedClock, SystemClock};
pub use context::AppContext;
pub use module::{InitCtx, Migration, Module};
pub use registry::ModuleRegistry;
