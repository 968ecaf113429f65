//! In-flight load bookkeeping shared by every backend.

mod registry;
mod spawn;

pub use registry::{Completer, TaskHandle, TaskRegistry};
pub use spawn::spawn_load;
