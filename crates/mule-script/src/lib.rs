//! The embedded hook-script language: a small dynamically-typed interpreter
//! with arrays, maps, closures, try/catch and prototype-style method dispatch
//! on its runtime values. The host installs native objects (see [`Native`])
//! to expose live state to scripts.

pub mod ast;
pub mod builtins;
mod errors;
mod interp;
mod lexer;
mod module;
mod native;
mod parser;
mod scope;
mod token;
pub mod value;

pub use builtins::prelude;
pub use builtins::url::UrlValue;
pub use errors::{ExecutionError, ParseError};
pub use interp::Interp;
pub use module::{ModuleLoader, SearchLoader};
pub use native::{Native, NativeValue};
pub use parser::Script;
pub use scope::Scope;
pub use value::{Builtin, BuiltinFn, EvalResult, Object, Slot, Value, ValueKind};
