use itertools::Itertools;

use crate::interp::Interp;
use crate::native::Native;
use crate::value::{EvalResult, Value};

/// Script console output, routed through tracing so the host controls where
/// hook chatter lands.
pub struct Console;

impl Native for Console {
	fn type_name(&self) -> &'static str {
		"console"
	}

	fn call(&self, name: &str, args: &[Value], _interp: &mut Interp) -> Option<EvalResult> {
		let line = args.iter().map(|v| v.display()).join(" ");
		match name {
			"log" | "info" => tracing::info!(target: "script", "{line}"),
			"warn" => tracing::warn!(target: "script", "{line}"),
			"error" => tracing::error!(target: "script", "{line}"),
			"debug" | "trace" => tracing::debug!(target: "script", "{line}"),
			_ => return None,
		}
		Some(Ok(Value::Undefined))
	}
}
