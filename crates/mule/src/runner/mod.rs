//! Execution drivers: single requests with transitive `depends`, and flows.

pub mod flow;

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::build::{self, BuildError};
use crate::client::{HttpError, HttpRequest, Response, Transport};
use crate::collection::{Collection, Expect, Found, LookupError, Request};
use crate::expand::{EnvError, ExpandError};
use crate::script::{CollectionInfo, HookEngine, HookError};
use crate::script::bindings::LiveRequest;

#[derive(thiserror::Error, Debug)]
pub enum RunError {
	#[error(transparent)]
	Lookup(#[from] LookupError),
	#[error(transparent)]
	Build(#[from] BuildError),
	#[error(transparent)]
	Http(#[from] HttpError),
	#[error(transparent)]
	Hook(#[from] HookError),
	#[error(transparent)]
	Env(#[from] EnvError),
	#[error(transparent)]
	Expand(#[from] ExpandError),
	#[error("exited with code {0}")]
	Exited(i32),
	#[error("{path}: expected {want:?}, got status {got}")]
	Expectation {
		path: String,
		want: Expect,
		got: u16,
	},
	#[error("dependency cycle through {0}")]
	DependencyCycle(String),
	#[error("{0} is not a request")]
	NotARequest(String),
	#[error("{0} is not a flow")]
	NotAFlow(String),
	#[error(transparent)]
	Flow(#[from] flow::FlowError),
}

/// What one executed request looked like on the wire.
#[derive(Debug, Clone)]
pub struct RequestReport {
	pub path: String,
	pub method: String,
	pub url: String,
	pub status: u16,
	/// Expectation outcome; `true` when no predicate was declared.
	pub ok: bool,
}

#[derive(Debug, Default)]
pub struct RunOutcome {
	pub reports: Vec<RequestReport>,
}

/// Drives requests through hooks and the transport. One runner serves one
/// top-level run; state is not shared across parallel runs.
pub struct Runner<'a> {
	root: &'a Collection,
	transport: &'a dyn Transport,
	engine: HookEngine,
}

impl<'a> Runner<'a> {
	pub fn new(root: &'a Collection, transport: &'a dyn Transport) -> Runner<'a> {
		Runner {
			root,
			transport,
			engine: HookEngine::new(),
		}
	}

	/// Runs a single request, executing its transitive `depends` first,
	/// depth-first and memoized.
	pub fn run(&mut self, path: &str) -> Result<RunOutcome, RunError> {
		let root = self.root;
		let lookup = root.find(path)?;
		let Found::Request(_) = lookup.found else {
			return Err(RunError::NotARequest(path.to_string()));
		};
		let chain = lookup.chain;

		for collection in &chain {
			self.hook(collection.before_all.as_deref(), collection)?;
		}
		let mut outcome = RunOutcome::default();
		let result = self.execute_with_depends(
			path,
			&mut HashSet::new(),
			&mut Vec::new(),
			&mut outcome.reports,
		);
		// AfterAll runs finally-style.
		let after = chain
			.iter()
			.rev()
			.try_for_each(|c| self.hook(c.after_all.as_deref(), c));
		result?;
		after?;
		Ok(outcome)
	}

	fn execute_with_depends(
		&mut self,
		path: &str,
		done: &mut HashSet<String>,
		in_progress: &mut Vec<String>,
		reports: &mut Vec<RequestReport>,
	) -> Result<(), RunError> {
		if done.contains(path) {
			return Ok(());
		}
		if in_progress.iter().any(|p| p == path) {
			return Err(RunError::DependencyCycle(path.to_string()));
		}
		let root = self.root;
		let lookup = root.find(path)?;
		let Found::Request(request) = lookup.found else {
			return Err(RunError::NotARequest(path.to_string()));
		};
		let env = lookup
			.chain
			.last()
			.map(|c| c.environment.clone())
			.unwrap_or_default();

		in_progress.push(path.to_string());
		for dep in &request.depends {
			let dep_path = dep.expand(&env)?;
			debug!(request = path, depends = %dep_path, "resolving dependency");
			self.execute_with_depends(&dep_path, done, in_progress, reports)?;
		}
		in_progress.pop();

		self.execute_one(path, &lookup.chain, request, reports, true, None)?;
		done.insert(path.to_string());
		Ok(())
	}

	/// Executes one concrete request: hook ladder, transport, expectation.
	/// Returns the response status; transport failures read as status 0.
	/// `overlay` carries flow bindings layered over the request's own
	/// environment chain.
	pub(crate) fn execute_one(
		&mut self,
		path: &str,
		chain: &[&Collection],
		request: &Request,
		reports: &mut Vec<RequestReport>,
		enforce_expect: bool,
		overlay: Option<&crate::expand::Environment>,
	) -> Result<u16, RunError> {
		let base_env = chain
			.last()
			.map(|c| c.environment.clone())
			.unwrap_or_default();
		let env = match overlay {
			Some(extra) => {
				let layered = base_env.child();
				for name in extra.local_names() {
					if let Some(word) = extra.lookup(&name) {
						layered.define(&name, word)?;
					}
				}
				layered
			},
			None => base_env,
		};
		let built = build::assemble_in(path, chain, request, env)?;
		let url = built.http.url.to_string();
		let live = LiveRequest {
			path: path.to_string(),
			http: Arc::new(RwLock::new(built.http)),
			username: built.username,
			password: built.password,
			token: built.token,
		};
		{
			let state = self.engine.state();
			let mut state = state.write();
			state.request = Some(live.clone());
			state.response = None;
		}
		let inner = chain.last().copied();

		let mut result: Result<(), RunError> = Ok(());
		for collection in chain {
			if let Err(e) = self.hook(collection.before_each.as_deref(), collection) {
				result = Err(e);
				break;
			}
		}
		if result.is_ok()
			&& let Some(collection) = inner
			&& let Err(e) = self.hook(request.before.as_deref(), collection)
		{
			result = Err(e);
		}

		let mut status = 0u16;
		if result.is_ok() {
			// Hooks may have rewritten the request.
			let http = live.http.read().clone();
			let retries = self.retries(chain, request)?;
			match self.send(&http, retries) {
				Ok(response) => {
					status = response.status;
					self.engine.set_response(Arc::new(response));
				},
				Err(HttpError::Transport(e)) => {
					warn!(request = path, error = %e, "transport failure");
					self.engine.set_response(Arc::new(Response {
						status: 0,
						headers: http::HeaderMap::new(),
						body: bytes::Bytes::new(),
					}));
				},
				Err(other) => result = Err(other.into()),
			}
		}

		// After hooks run finally-style: request's own first, then each
		// enclosing scope inner-most out.
		let mut after: Result<(), RunError> = Ok(());
		if let Some(collection) = inner {
			after = self.hook(request.after.as_deref(), collection);
		}
		for collection in chain.iter().rev() {
			if after.is_err() {
				break;
			}
			after = self.hook(collection.after_each.as_deref(), collection);
		}

		let expectation = request.expect.as_ref().map(|e| e.matches(status));
		reports.push(RequestReport {
			path: path.to_string(),
			method: request.method.to_string(),
			url,
			status,
			ok: expectation.unwrap_or(true),
		});

		result?;
		after?;
		if enforce_expect
			&& let (Some(false), Some(want)) = (expectation, request.expect.clone())
		{
			return Err(RunError::Expectation {
				path: path.to_string(),
				want,
				got: status,
			});
		}
		Ok(status)
	}

	fn retries(&self, chain: &[&Collection], request: &Request) -> Result<u32, RunError> {
		let env = chain
			.last()
			.map(|c| c.environment.clone())
			.unwrap_or_default();
		let word = request
			.common
			.retry
			.as_ref()
			.or_else(|| chain.iter().rev().find_map(|c| c.common.retry.as_ref()));
		match word {
			Some(word) => {
				let raw = word.expand(&env)?;
				Ok(raw.trim().parse().unwrap_or(0))
			},
			None => Ok(0),
		}
	}

	fn send(&self, http: &HttpRequest, retries: u32) -> Result<Response, HttpError> {
		let mut attempt = 0u32;
		loop {
			match self.transport.round_trip(http) {
				Err(HttpError::Transport(e)) if attempt < retries => {
					attempt += 1;
					warn!(error = %e, attempt, "retrying after transport failure");
				},
				other => return other,
			}
		}
	}

	/// Runs a hook source with the given collection as scope; `None`
	/// sources are no-ops. `exit()` from a hook unwinds the run.
	pub(crate) fn hook(
		&mut self,
		source: Option<&str>,
		collection: &Collection,
	) -> Result<(), RunError> {
		let Some(source) = source else {
			return Ok(());
		};
		let info = CollectionInfo {
			name: collection.name().to_string(),
			children: collection
				.collections
				.iter()
				.map(|c| c.name().to_string())
				.collect(),
		};
		self.run_hook_source(source, &collection.environment, &info)
	}

	pub(crate) fn run_hook_source(
		&mut self,
		source: &str,
		variables: &crate::expand::Environment,
		info: &CollectionInfo,
	) -> Result<(), RunError> {
		match self.engine.run(source, variables, info) {
			Ok(_) => Ok(()),
			Err(e) => match e.exit_code() {
				Some(code) => Err(RunError::Exited(code)),
				None => Err(e.into()),
			},
		}
	}
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
