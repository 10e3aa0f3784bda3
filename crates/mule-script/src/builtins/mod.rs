use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::errors::ExecutionError;
use crate::interp::Interp;
use crate::native::{Native, NativeValue};
use crate::scope::Scope;
use crate::value::{Builtin, EvalResult, Value, ValueKind};

pub mod array;
mod console;
mod json;
mod math;
pub mod object;
pub mod string;
pub mod url;

static PRELUDE: Lazy<Scope> = Lazy::new(build);

/// The frozen global environment every fresh script scope encloses.
pub fn prelude() -> Scope {
	PRELUDE.clone()
}

fn build() -> Scope {
	let root = Scope::root();
	root.install("console", NativeValue::new(console::Console).into());
	root.install("JSON", NativeValue::new(json::Json).into());
	root.install("Math", NativeValue::new(math::Math).into());
	root.install("Date", NativeValue::new(DateObject).into());
	root.install("NaN", Value::Float(f64::NAN));
	root.install("Infinity", Value::Float(f64::INFINITY));
	root.install(
		"parseInt",
		Value::Builtin(Builtin {
			name: "parseInt",
			f: parse_int,
		}),
	);
	root.install(
		"parseFloat",
		Value::Builtin(Builtin {
			name: "parseFloat",
			f: parse_float,
		}),
	);
	root.install(
		"isNaN",
		Value::Builtin(Builtin {
			name: "isNaN",
			f: is_nan,
		}),
	);
	root.install(
		"exit",
		Value::Builtin(Builtin {
			name: "exit",
			f: exit,
		}),
	);
	root.install("Array", NativeValue::new(ArrayCtor).into());
	root.install("Object", NativeValue::new(ObjectCtor).into());
	root.install("String", NativeValue::new(Marker::STRING).into());
	root.install("Number", NativeValue::new(Marker::NUMBER).into());
	root.install("Boolean", NativeValue::new(Marker::BOOL).into());
	root.install("Function", NativeValue::new(Marker::FUNCTION).into());
	root.freeze()
}

pub(crate) fn want_args(
	function: &str,
	want: usize,
	args: &[Value],
) -> Result<(), ExecutionError> {
	if args.len() < want {
		return Err(ExecutionError::Arity {
			function: function.to_string(),
			want,
			got: args.len(),
		});
	}
	Ok(())
}

fn parse_int(_interp: &mut Interp, _this: Option<Value>, args: &[Value]) -> EvalResult {
	want_args("parseInt", 1, args)?;
	let text = args[0].display();
	let mut s = text.trim();
	let mut sign = 1.0;
	if let Some(rest) = s.strip_prefix('-') {
		sign = -1.0;
		s = rest;
	} else if let Some(rest) = s.strip_prefix('+') {
		s = rest;
	}
	let mut radix = match args.get(1) {
		Some(Value::Float(f)) if *f >= 2.0 && *f <= 36.0 => *f as u32,
		Some(Value::Undefined) | None => 10,
		Some(other) => {
			let n = other.as_number_lossy();
			if n.is_nan() || n == 0.0 {
				10
			} else if (2.0..=36.0).contains(&n) {
				n as u32
			} else {
				return Ok(Value::Float(f64::NAN));
			}
		},
	};
	if (radix == 16 || radix == 10)
		&& let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
	{
		radix = 16;
		s = rest;
	}
	let digits: String = s
		.chars()
		.take_while(|c| c.is_digit(radix))
		.collect();
	if digits.is_empty() {
		return Ok(Value::Float(f64::NAN));
	}
	match i64::from_str_radix(&digits, radix) {
		Ok(v) => Ok(Value::Float(sign * v as f64)),
		Err(_) => Ok(Value::Float(f64::NAN)),
	}
}

fn parse_float(_interp: &mut Interp, _this: Option<Value>, args: &[Value]) -> EvalResult {
	want_args("parseFloat", 1, args)?;
	let text = args[0].display();
	let s = text.trim();
	// Longest prefix that still parses as a float.
	let mut end = 0;
	for i in (1..=s.len()).rev() {
		if s.is_char_boundary(i) && s[..i].parse::<f64>().is_ok() {
			end = i;
			break;
		}
	}
	if end == 0 {
		return Ok(Value::Float(f64::NAN));
	}
	Ok(Value::Float(s[..end].parse::<f64>().unwrap_or(f64::NAN)))
}

fn is_nan(_interp: &mut Interp, _this: Option<Value>, args: &[Value]) -> EvalResult {
	want_args("isNaN", 1, args)?;
	Ok(Value::Bool(args[0].as_number_lossy().is_nan()))
}

fn exit(_interp: &mut Interp, _this: Option<Value>, args: &[Value]) -> EvalResult {
	let code = args.first().map(|v| v.as_number_lossy()).unwrap_or(0.0);
	let code = if code.is_nan() { 0 } else { code as i32 };
	Err(ExecutionError::Exit(code))
}

struct DateObject;

impl Native for DateObject {
	fn type_name(&self) -> &'static str {
		"Date"
	}

	fn call(&self, name: &str, _args: &[Value], _interp: &mut Interp) -> Option<EvalResult> {
		match name {
			"now" => {
				let ms = std::time::SystemTime::now()
					.duration_since(std::time::UNIX_EPOCH)
					.map(|d| d.as_millis() as f64)
					.unwrap_or(f64::NAN);
				Some(Ok(Value::Float(ms)))
			},
			_ => None,
		}
	}
}

/// Constructor stand-ins for `instanceof` checks on primitive kinds.
struct Marker {
	name: &'static str,
	kind: ValueKind,
}

impl Marker {
	const STRING: Marker = Marker {
		name: "String",
		kind: ValueKind::String,
	};
	const NUMBER: Marker = Marker {
		name: "Number",
		kind: ValueKind::Number,
	};
	const BOOL: Marker = Marker {
		name: "Boolean",
		kind: ValueKind::Bool,
	};
	const FUNCTION: Marker = Marker {
		name: "Function",
		kind: ValueKind::Function,
	};
}

impl Native for Marker {
	fn type_name(&self) -> &'static str {
		self.name
	}

	fn instance_check(&self, value: &Value) -> Option<bool> {
		Some(value.kind() == self.kind)
	}
}

struct ArrayCtor;

impl Native for ArrayCtor {
	fn type_name(&self) -> &'static str {
		"Array"
	}

	fn instance_check(&self, value: &Value) -> Option<bool> {
		Some(matches!(value, Value::Array(_)))
	}

	fn call(&self, name: &str, args: &[Value], _interp: &mut Interp) -> Option<EvalResult> {
		match name {
			"isArray" => Some(
				want_args("Array.isArray", 1, args)
					.map(|_| Value::Bool(matches!(args[0], Value::Array(_)))),
			),
			_ => None,
		}
	}
}

struct ObjectCtor;

impl Native for ObjectCtor {
	fn type_name(&self) -> &'static str {
		"Object"
	}

	fn instance_check(&self, value: &Value) -> Option<bool> {
		Some(matches!(
			value,
			Value::Object(_) | Value::Array(_) | Value::Native(_)
		))
	}

	fn call(&self, name: &str, args: &[Value], _interp: &mut Interp) -> Option<EvalResult> {
		let entries = |v: &Value| -> Result<Vec<(Arc<str>, Value)>, ExecutionError> {
			match v {
				Value::Object(o) => Ok(o.read().entries()),
				Value::Native(n) => Ok(n.entries()),
				other => Err(ExecutionError::function(
					"Object",
					format!("expected an object, got {}", other.kind()),
				)),
			}
		};
		match name {
			"keys" => Some(want_args("Object.keys", 1, args).and_then(|_| {
				Ok(Value::array(
					entries(&args[0])?
						.into_iter()
						.map(|(k, _)| Value::String(k))
						.collect(),
				))
			})),
			"values" => Some(want_args("Object.values", 1, args).and_then(|_| {
				Ok(Value::array(
					entries(&args[0])?.into_iter().map(|(_, v)| v).collect(),
				))
			})),
			"entries" => Some(want_args("Object.entries", 1, args).and_then(|_| {
				Ok(Value::array(
					entries(&args[0])?
						.into_iter()
						.map(|(k, v)| Value::array(vec![Value::String(k), v]))
						.collect(),
				))
			})),
			_ => None,
		}
	}
}
