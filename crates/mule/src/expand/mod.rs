//! The deferred-evaluation layer: settings stay symbolic until a request is
//! assembled, so inheritance merges before any variable is read.

mod env;
mod set;
mod word;

pub use env::{EnvError, Environment};
pub use set::{Set, SetError};
pub use word::{CaseMode, ExpandError, FallbackMode, ReplaceMode, TrimMode, Word};
