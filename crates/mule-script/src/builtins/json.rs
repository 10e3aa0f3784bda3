use crate::builtins::want_args;
use crate::errors::ExecutionError;
use crate::interp::Interp;
use crate::native::Native;
use crate::value::{EvalResult, Value};

pub struct Json;

impl Native for Json {
	fn type_name(&self) -> &'static str {
		"JSON"
	}

	fn call(&self, name: &str, args: &[Value], _interp: &mut Interp) -> Option<EvalResult> {
		match name {
			"parse" => Some((|| {
				want_args("JSON.parse", 1, args)?;
				let text = args[0].as_str().map_err(|_| {
					ExecutionError::function("JSON.parse", "argument must be a string")
				})?;
				let json: serde_json::Value = serde_json::from_str(&text)
					.map_err(|e| ExecutionError::Json(e.to_string()))?;
				Ok(Value::from_json(&json))
			})()),
			"stringify" => Some((|| {
				want_args("JSON.stringify", 1, args)?;
				let Some(json) = args[0].to_json() else {
					return Ok(Value::Undefined);
				};
				// Second argument (replacer) is accepted and ignored; the third
				// selects pretty printing.
				let pretty = args
					.get(2)
					.map(|v| v.as_number_lossy())
					.map(|n| !n.is_nan() && n > 0.0)
					.unwrap_or(false);
				let out = if pretty {
					serde_json::to_string_pretty(&json)
				} else {
					serde_json::to_string(&json)
				};
				out
					.map(Value::from)
					.map_err(|e| ExecutionError::Json(e.to_string()))
			})()),
			_ => None,
		}
	}
}
