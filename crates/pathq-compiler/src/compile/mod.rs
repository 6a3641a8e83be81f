//! Path query compilation.
//!
//! - `registry`: finalized queries and hook bindings for one pass
//! - `emit`: tag assignment and the tagging/capture/hook fragments
//! - `compiled`: the composed result handed to the controller

mod compiled;
mod emit;
mod registry;


pub use compiled::{CompileStats, CompiledPolicy};
pub use emit::{tag_pred, tag_value};
pub use registry::{PathCompiler, PathQuery};
