//! A declarative HTTP request runner: collection files describe families of
//! requests whose settings inherit through nested scopes, stay symbolic until
//! a request is assembled, and are surrounded by user hook scripts with live
//! access to the request and response.

pub mod auth;
pub mod body;
pub mod build;
pub mod client;
pub mod collection;
pub mod expand;
pub mod parse;
pub mod runner;
pub mod script;
pub mod tls;

pub use client::{ReqwestTransport, Transport};
pub use collection::Collection;
pub use runner::{RunError, RunOutcome, Runner};
