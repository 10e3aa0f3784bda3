use std::sync::Arc;

use crate::builtins::want_args;
use crate::interp::Interp;
use crate::value::{EvalResult, Value};

/// Char-indexed view used by the index-based methods; JS string indices are
/// code units, ours are chars, which agrees for the ASCII payloads these
/// scripts deal in.
fn chars(s: &str) -> Vec<char> {
	s.chars().collect()
}

fn clamp_index(len: usize, v: Option<&Value>, default: usize) -> usize {
	let Some(v) = v else {
		return default;
	};
	if matches!(v, Value::Undefined) {
		return default;
	}
	let n = v.as_number_lossy();
	if n.is_nan() {
		return 0;
	}
	if n < 0.0 {
		len.saturating_sub((-n) as usize)
	} else {
		(n as usize).min(len)
	}
}

/// Method table for strings. `None` means the method name is unknown.
pub fn dispatch(
	_interp: &mut Interp,
	s: &Arc<str>,
	method: &str,
	args: &[Value],
) -> Option<EvalResult> {
	let result = match method {
		"concat" => {
			let mut out = s.to_string();
			for arg in args {
				out.push_str(&arg.display());
			}
			Ok(Value::string(out))
		},
		"endsWith" => (|| {
			want_args("endsWith", 1, args)?;
			Ok(Value::Bool(s.ends_with(args[0].display().as_str())))
		})(),
		"includes" => (|| {
			want_args("includes", 1, args)?;
			Ok(Value::Bool(s.contains(args[0].display().as_str())))
		})(),
		"indexOf" => (|| {
			want_args("indexOf", 1, args)?;
			let needle = args[0].display();
			let hay = chars(s);
			let from = clamp_index(hay.len(), args.get(1), 0);
			let hay_str: String = hay[from..].iter().collect();
			match hay_str.find(&needle) {
				Some(byte_pos) => {
					let char_pos = hay_str[..byte_pos].chars().count();
					Ok(Value::from(from + char_pos))
				},
				None => Ok(Value::Float(-1.0)),
			}
		})(),
		"lastIndexOf" => (|| {
			want_args("lastIndexOf", 1, args)?;
			let needle = args[0].display();
			match s.rfind(&needle) {
				Some(byte_pos) => Ok(Value::from(s[..byte_pos].chars().count())),
				None => Ok(Value::Float(-1.0)),
			}
		})(),
		"padEnd" => (|| {
			want_args("padEnd", 1, args)?;
			let target = args[0].as_number_lossy().max(0.0) as usize;
			let pad = args
				.get(1)
				.map(|v| v.display())
				.unwrap_or_else(|| " ".to_string());
			Ok(Value::string(pad_string(s, target, &pad, false)))
		})(),
		"padStart" => (|| {
			want_args("padStart", 1, args)?;
			let target = args[0].as_number_lossy().max(0.0) as usize;
			let pad = args
				.get(1)
				.map(|v| v.display())
				.unwrap_or_else(|| " ".to_string());
			Ok(Value::string(pad_string(s, target, &pad, true)))
		})(),
		"repeat" => (|| {
			want_args("repeat", 1, args)?;
			let n = args[0].as_number_lossy();
			if n < 0.0 || n.is_nan() {
				return Err(crate::errors::ExecutionError::function(
					"repeat",
					"count must be non-negative",
				));
			}
			Ok(Value::string(s.repeat(n as usize)))
		})(),
		"replace" => (|| {
			want_args("replace", 2, args)?;
			let from = args[0].display();
			let to = args[1].display();
			Ok(Value::string(s.replacen(&from, &to, 1)))
		})(),
		"replaceAll" => (|| {
			want_args("replaceAll", 2, args)?;
			let from = args[0].display();
			let to = args[1].display();
			Ok(Value::string(s.replace(&from, &to)))
		})(),
		"slice" => {
			let cs = chars(s);
			let start = clamp_index(cs.len(), args.first(), 0);
			let end = clamp_index(cs.len(), args.get(1), cs.len());
			if start >= end {
				Ok(Value::string(""))
			} else {
				Ok(Value::string(cs[start..end].iter().collect::<String>()))
			}
		},
		"split" => (|| {
			want_args("split", 1, args)?;
			let limit = match args.get(1) {
				Some(Value::Undefined) | None => usize::MAX,
				Some(v) => {
					let n = v.as_number_lossy();
					if n.is_nan() || n < 0.0 { usize::MAX } else { n as usize }
				},
			};
			let sep = args[0].display();
			let parts: Vec<Value> = if sep.is_empty() {
				s.chars().map(|c| Value::string(c.to_string())).collect()
			} else {
				s.split(sep.as_str()).map(Value::from).collect()
			};
			Ok(Value::array(parts.into_iter().take(limit).collect()))
		})(),
		"startsWith" => (|| {
			want_args("startsWith", 1, args)?;
			Ok(Value::Bool(s.starts_with(args[0].display().as_str())))
		})(),
		"substring" => {
			let cs = chars(s);
			let a = clamp_positive(cs.len(), args.first(), 0);
			let b = clamp_positive(cs.len(), args.get(1), cs.len());
			let (start, end) = if a <= b { (a, b) } else { (b, a) };
			Ok(Value::string(cs[start..end].iter().collect::<String>()))
		},
		"toLowerCase" => Ok(Value::string(s.to_lowercase())),
		"toUpperCase" => Ok(Value::string(s.to_uppercase())),
		"trim" => Ok(Value::string(s.trim())),
		"trimEnd" => Ok(Value::string(s.trim_end())),
		"trimStart" => Ok(Value::string(s.trim_start())),
		_ => return None,
	};
	Some(result)
}

/// substring clamps negatives to zero instead of counting from the end.
fn clamp_positive(len: usize, v: Option<&Value>, default: usize) -> usize {
	let Some(v) = v else {
		return default;
	};
	if matches!(v, Value::Undefined) {
		return default;
	}
	let n = v.as_number_lossy();
	if n.is_nan() || n < 0.0 {
		0
	} else {
		(n as usize).min(len)
	}
}

fn pad_string(s: &str, target: usize, pad: &str, start: bool) -> String {
	let len = s.chars().count();
	if len >= target || pad.is_empty() {
		return s.to_string();
	}
	let missing = target - len;
	let filler: String = pad.chars().cycle().take(missing).collect();
	if start {
		format!("{filler}{s}")
	} else {
		format!("{s}{filler}")
	}
}
