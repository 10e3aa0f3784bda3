use std::sync::Arc;

use mule_script::{EvalResult, ExecutionError, Interp, Native, NativeValue, UrlValue, Value};
use parking_lot::RwLock;

use super::CollectionInfo;
use crate::client::{HttpRequest, Response};
use crate::expand::{Environment, Word};

/// State shared between the runner and the live script bindings. The runner
/// swaps the request and response in as the run progresses.
#[derive(Default)]
pub struct HookState {
	pub request: Option<LiveRequest>,
	pub response: Option<Arc<Response>>,
}

/// The request being assembled, shared so hooks observe and mutate the same
/// object the transport will send.
#[derive(Clone)]
pub struct LiveRequest {
	pub path: String,
	pub http: Arc<RwLock<HttpRequest>>,
	pub username: Option<String>,
	pub password: Option<String>,
	pub token: Option<String>,
}

/// The `mule` prelude object.
pub struct MuleBinding {
	state: Arc<RwLock<HookState>>,
	variables: Environment,
	collection: CollectionInfo,
}

impl MuleBinding {
	pub fn new(
		state: Arc<RwLock<HookState>>,
		variables: Environment,
		collection: CollectionInfo,
	) -> MuleBinding {
		MuleBinding {
			state,
			variables,
			collection,
		}
	}
}

impl Native for MuleBinding {
	fn type_name(&self) -> &'static str {
		"mule"
	}

	fn get(&self, name: &str) -> Option<Value> {
		match name {
			"collection" => Some(
				NativeValue::new(CollectionBinding {
					info: self.collection.clone(),
					store: self.variables.clone(),
				})
				.into(),
			),
			"request" => {
				let state = self.state.read();
				state
					.request
					.as_ref()
					.map(|r| NativeValue::new(RequestBinding { live: r.clone() }).into())
			},
			"response" => {
				let state = self.state.read();
				state
					.response
					.as_ref()
					.map(|r| NativeValue::new(ResponseBinding { response: r.clone() }).into())
			},
			"variables" => Some(
				NativeValue::new(VariablesBinding {
					store: self.variables.clone(),
				})
				.into(),
			),
			"environ" => Some(NativeValue::new(EnvironBinding).into()),
			_ => None,
		}
	}

	fn entries(&self) -> Vec<(Arc<str>, Value)> {
		["collection", "request", "response", "variables", "environ"]
			.iter()
			.filter_map(|k| self.get(k).map(|v| (Arc::from(*k), v)))
			.collect()
	}
}

/// Read-only collection identity plus the variable store entry points.
struct CollectionBinding {
	info: CollectionInfo,
	store: Environment,
}

impl Native for CollectionBinding {
	fn type_name(&self) -> &'static str {
		"collection"
	}

	fn get(&self, name: &str) -> Option<Value> {
		match name {
			"name" => Some(Value::string(&self.info.name)),
			"collections" => Some(Value::array(
				self
					.info
					.children
					.iter()
					.map(Value::string)
					.collect(),
			)),
			_ => None,
		}
	}

	fn call(&self, name: &str, args: &[Value], interp: &mut Interp) -> Option<EvalResult> {
		store_dispatch(&self.store, name, args, interp)
	}
}

/// `mule.variables`: the nearest collection's variable store, exposed as a
/// handle so hooks write through it instead of capturing the container.
struct VariablesBinding {
	store: Environment,
}

impl Native for VariablesBinding {
	fn type_name(&self) -> &'static str {
		"variables"
	}

	fn call(&self, name: &str, args: &[Value], interp: &mut Interp) -> Option<EvalResult> {
		store_dispatch(&self.store, name, args, interp)
	}
}

fn store_dispatch(
	store: &Environment,
	name: &str,
	args: &[Value],
	_interp: &mut Interp,
) -> Option<EvalResult> {
	let result = match name {
		"get" => (|| {
			let key = arg_string(name, args, 0)?;
			match store.lookup(&key) {
				Some(word) => {
					let value = word
						.expand(store)
						.map_err(|e| ExecutionError::function("variables.get", e.to_string()))?;
					Ok(Value::string(value))
				},
				None => Ok(Value::Undefined),
			}
		})(),
		"set" => (|| {
			let key = arg_string(name, args, 0)?;
			let value = args
				.get(1)
				.ok_or_else(|| arity("variables.set", 2, args.len()))?;
			store
				.assign_or_define(&key, Word::Literal(value.display()))
				.map_err(|e| ExecutionError::function("variables.set", e.to_string()))?;
			Ok(Value::Undefined)
		})(),
		"has" => (|| {
			let key = arg_string(name, args, 0)?;
			Ok(Value::Bool(store.has(&key)))
		})(),
		"unset" => (|| {
			let key = arg_string(name, args, 0)?;
			store
				.unset(&key)
				.map_err(|e| ExecutionError::function("variables.unset", e.to_string()))?;
			Ok(Value::Undefined)
		})(),
		_ => return None,
	};
	Some(result)
}

fn arg_string(function: &str, args: &[Value], index: usize) -> Result<String, ExecutionError> {
	args
		.get(index)
		.map(|v| v.display())
		.ok_or_else(|| arity(function, index + 1, args.len()))
}

fn arity(function: &str, want: usize, got: usize) -> ExecutionError {
	ExecutionError::Arity {
		function: function.to_string(),
		want,
		got,
	}
}

/// Live view of the outgoing request.
struct RequestBinding {
	live: LiveRequest,
}

impl Native for RequestBinding {
	fn type_name(&self) -> &'static str {
		"request"
	}

	fn get(&self, name: &str) -> Option<Value> {
		let http = self.live.http.read();
		match name {
			"body" => Some(match &http.body {
				Some(body) => Value::string(body),
				None => Value::string(""),
			}),
			"url" => Some(NativeValue::new(UrlValue::new(http.url.clone())).into()),
			"method" => Some(Value::string(http.method.as_str())),
			"username" => Some(self.live.username.clone().into()),
			"password" => Some(self.live.password.clone().into()),
			"token" => Some(self.live.token.clone().into()),
			"header" => Some(
				NativeValue::new(HeadersBinding {
					http: self.live.http.clone(),
				})
				.into(),
			),
			_ => None,
		}
	}

	fn set(&self, name: &str, value: Value) -> Result<(), ExecutionError> {
		let mut http = self.live.http.write();
		match name {
			"body" => {
				http.body = Some(value.display());
				Ok(())
			},
			_ => Err(ExecutionError::NotWritable(Arc::from(name))),
		}
	}
}

/// Header access for `mule.request.header`; mutating the map mutates the
/// request that will be sent.
struct HeadersBinding {
	http: Arc<RwLock<HttpRequest>>,
}

impl Native for HeadersBinding {
	fn type_name(&self) -> &'static str {
		"headers"
	}

	fn call(&self, name: &str, args: &[Value], _interp: &mut Interp) -> Option<EvalResult> {
		let result = match name {
			"get" => (|| {
				let key = arg_string("header.get", args, 0)?;
				let http = self.http.read();
				match http.headers.get(&key) {
					Some(v) => Ok(Value::string(String::from_utf8_lossy(v.as_bytes()))),
					None => Ok(Value::Undefined),
				}
			})(),
			"has" => (|| {
				let key = arg_string("header.has", args, 0)?;
				Ok(Value::Bool(self.http.read().headers.contains_key(&key)))
			})(),
			"set" => (|| {
				let key = arg_string("header.set", args, 0)?;
				let value = arg_string("header.set", args, 1)?;
				let name: http::HeaderName = key
					.parse()
					.map_err(|_| ExecutionError::function("header.set", format!("invalid name {key:?}")))?;
				let value: http::HeaderValue = value
					.parse()
					.map_err(|_| ExecutionError::function("header.set", "invalid value"))?;
				self.http.write().headers.insert(name, value);
				Ok(Value::Undefined)
			})(),
			_ => return None,
		};
		Some(result)
	}
}

/// Read-only response header view.
struct ResponseHeadersBinding {
	response: Arc<Response>,
}

impl Native for ResponseHeadersBinding {
	fn type_name(&self) -> &'static str {
		"headers"
	}

	fn call(&self, name: &str, args: &[Value], _interp: &mut Interp) -> Option<EvalResult> {
		let result = match name {
			"get" => (|| {
				let key = arg_string("header.get", args, 0)?;
				match self.response.headers.get(&key) {
					Some(v) => Ok(Value::string(String::from_utf8_lossy(v.as_bytes()))),
					None => Ok(Value::Undefined),
				}
			})(),
			"has" => (|| {
				let key = arg_string("header.has", args, 0)?;
				Ok(Value::Bool(self.response.headers.contains_key(&key)))
			})(),
			_ => return None,
		};
		Some(result)
	}
}

/// Live view of the buffered response.
struct ResponseBinding {
	response: Arc<Response>,
}

impl Native for ResponseBinding {
	fn type_name(&self) -> &'static str {
		"response"
	}

	fn get(&self, name: &str) -> Option<Value> {
		match name {
			"body" => Some(Value::string(self.response.body_text())),
			"code" | "status" => Some(Value::Float(self.response.status as f64)),
			"header" => Some(
				NativeValue::new(ResponseHeadersBinding {
					response: self.response.clone(),
				})
				.into(),
			),
			_ => None,
		}
	}

	fn call(&self, name: &str, _args: &[Value], _interp: &mut Interp) -> Option<EvalResult> {
		let result = match name {
			"success" => Ok(Value::Bool(self.response.success())),
			"fail" => Ok(Value::Bool(self.response.fail())),
			"json" => {
				let text = self.response.body_text();
				serde_json::from_str::<serde_json::Value>(&text)
					.map(|json| Value::from_json(&json))
					.map_err(|e| ExecutionError::function("response.json", e.to_string()))
			},
			_ => return None,
		};
		Some(result)
	}
}

/// Read-only view of the OS environment; lookups are uppercased.
struct EnvironBinding;

impl Native for EnvironBinding {
	fn type_name(&self) -> &'static str {
		"environ"
	}

	fn call(&self, name: &str, args: &[Value], _interp: &mut Interp) -> Option<EvalResult> {
		let result = match name {
			"get" => (|| {
				let key = arg_string("environ.get", args, 0)?;
				match std::env::var(key.to_uppercase()) {
					Ok(v) => Ok(Value::string(v)),
					Err(_) => Ok(Value::Undefined),
				}
			})(),
			"has" => (|| {
				let key = arg_string("environ.has", args, 0)?;
				Ok(Value::Bool(std::env::var(key.to_uppercase()).is_ok()))
			})(),
			_ => return None,
		};
		Some(result)
	}
}
