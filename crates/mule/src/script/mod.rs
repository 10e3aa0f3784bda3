//! Hook execution: installs the `mule` object and the bare request/response
//! constants into a fresh script scope and runs user hook sources.

pub(crate) mod bindings;

use std::sync::Arc;

use mule_script::{Interp, NativeValue, Scope, Script, Value};
use parking_lot::RwLock;

pub use bindings::HookState;
use bindings::MuleBinding;

use crate::client::Response;
use crate::expand::Environment;

#[derive(thiserror::Error, Debug)]
pub enum HookError {
	#[error("script parse: {0}")]
	Parse(#[from] mule_script::ParseError),
	#[error("script: {0}")]
	Exec(mule_script::ExecutionError),
}

impl HookError {
	/// The exit code when the hook called `exit(code)`.
	pub fn exit_code(&self) -> Option<i32> {
		match self {
			HookError::Exec(mule_script::ExecutionError::Exit(code)) => Some(*code),
			_ => None,
		}
	}
}

/// Identity of the collection a hook runs in.
#[derive(Debug, Clone, Default)]
pub struct CollectionInfo {
	pub name: String,
	pub children: Vec<String>,
}

/// One run's hook engine: a single interpreter plus the shared state the
/// live bindings read through.
pub struct HookEngine {
	interp: Interp,
	state: Arc<RwLock<HookState>>,
}

impl Default for HookEngine {
	fn default() -> Self {
		Self::new()
	}
}

impl HookEngine {
	pub fn new() -> HookEngine {
		HookEngine {
			interp: Interp::default(),
			state: Arc::new(RwLock::new(HookState::default())),
		}
	}

	pub fn state(&self) -> Arc<RwLock<HookState>> {
		self.state.clone()
	}

	pub fn set_response(&self, response: Arc<Response>) {
		self.state.write().response = Some(response);
	}

	/// Runs one hook source in a fresh scope enclosing the prelude. The
	/// `variables` environment is the nearest collection's store.
	pub fn run(
		&mut self,
		source: &str,
		variables: &Environment,
		collection: &CollectionInfo,
	) -> Result<Value, HookError> {
		let script = Script::parse(source)?;
		// The prelude is frozen, so hooks cannot redefine globals.
		let scope = mule_script::prelude().child();
		scope.install(
			"mule",
			NativeValue::new(MuleBinding::new(
				self.state.clone(),
				variables.clone(),
				collection.clone(),
			))
			.into(),
		);
		self.install_constants(&scope);
		self
			.interp
			.run(&script, &scope)
			.map_err(HookError::Exec)
	}

	fn install_constants(&self, scope: &Scope) {
		let state = self.state.read();
		if let Some(request) = &state.request {
			let (path, url) = {
				let http = request.http.read();
				(request.path.clone(), http.url.to_string())
			};
			scope.install("requestName", Value::string(path));
			scope.install("requestUri", Value::string(url));
		}
		match &state.response {
			Some(response) => {
				scope.install("requestStatus", Value::Float(response.status as f64));
				scope.install("responseBody", Value::string(response.body_text()));
			},
			None => {
				scope.install("requestStatus", Value::Undefined);
				scope.install("responseBody", Value::Undefined);
			},
		}
	}
}
