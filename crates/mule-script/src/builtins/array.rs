use crate::builtins::want_args;
use crate::errors::ExecutionError;
use crate::interp::Interp;
use crate::value::{ArrayRef, EvalResult, Value};

/// Resolves a possibly-negative JS index against `len`, clamping into range.
fn resolve_index(len: usize, v: Option<&Value>, default: usize) -> usize {
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
		let back = (-n) as usize;
		len.saturating_sub(back)
	} else {
		(n as usize).min(len)
	}
}

/// Method table for arrays. `None` means the method name is unknown.
pub fn dispatch(
	interp: &mut Interp,
	items: &ArrayRef,
	method: &str,
	args: &[Value],
) -> Option<EvalResult> {
	let result = match method {
		"at" => (|| {
			want_args("at", 1, args)?;
			let snapshot = items.read();
			let n = args[0].as_number_lossy();
			let idx = if n < 0.0 {
				let back = (-n) as usize;
				if back > snapshot.len() {
					return Ok(Value::Undefined);
				}
				snapshot.len() - back
			} else {
				n as usize
			};
			Ok(snapshot.get(idx).cloned().unwrap_or(Value::Undefined))
		})(),
		"concat" => {
			let mut out = items.read().clone();
			for arg in args {
				match arg {
					Value::Array(other) => out.extend(other.read().iter().cloned()),
					other => out.push(other.clone()),
				}
			}
			Ok(Value::array(out))
		},
		"entries" => {
			let snapshot = items.read().clone();
			Ok(Value::array(
				snapshot
					.into_iter()
					.enumerate()
					.map(|(i, v)| Value::array(vec![Value::from(i), v]))
					.collect(),
			))
		},
		"every" => (|| {
			want_args("every", 1, args)?;
			let snapshot = items.read().clone();
			for (i, item) in snapshot.iter().enumerate() {
				let keep = interp.call_value(&args[0], None, &[item.clone(), Value::from(i)])?;
				if !keep.truthy() {
					return Ok(Value::Bool(false));
				}
			}
			Ok(Value::Bool(true))
		})(),
		"fill" => (|| {
			want_args("fill", 1, args)?;
			let mut guard = items.write();
			let len = guard.len();
			let start = resolve_index(len, args.get(1), 0);
			let end = resolve_index(len, args.get(2), len);
			if start < end {
				for slot in guard[start..end].iter_mut() {
					*slot = args[0].clone();
				}
			}
			drop(guard);
			Ok(Value::Array(items.clone()))
		})(),
		"filter" => (|| {
			want_args("filter", 1, args)?;
			let snapshot = items.read().clone();
			let mut out = Vec::new();
			for (i, item) in snapshot.iter().enumerate() {
				let keep = interp.call_value(&args[0], None, &[item.clone(), Value::from(i)])?;
				if keep.truthy() {
					out.push(item.clone());
				}
			}
			Ok(Value::array(out))
		})(),
		"find" => (|| {
			want_args("find", 1, args)?;
			let snapshot = items.read().clone();
			for (i, item) in snapshot.iter().enumerate() {
				let hit = interp.call_value(&args[0], None, &[item.clone(), Value::from(i)])?;
				if hit.truthy() {
					return Ok(item.clone());
				}
			}
			Ok(Value::Undefined)
		})(),
		"findIndex" => (|| {
			want_args("findIndex", 1, args)?;
			let snapshot = items.read().clone();
			for (i, item) in snapshot.iter().enumerate() {
				let hit = interp.call_value(&args[0], None, &[item.clone(), Value::from(i)])?;
				if hit.truthy() {
					return Ok(Value::from(i));
				}
			}
			Ok(Value::Float(-1.0))
		})(),
		"flat" => {
			let depth = args
				.first()
				.map(|v| v.as_number_lossy())
				.filter(|n| !n.is_nan())
				.unwrap_or(1.0) as usize;
			fn flatten(src: &[Value], depth: usize, out: &mut Vec<Value>) {
				for item in src {
					match item {
						Value::Array(inner) if depth > 0 => {
							let inner = inner.read().clone();
							flatten(&inner, depth - 1, out);
						},
						other => out.push(other.clone()),
					}
				}
			}
			let snapshot = items.read().clone();
			let mut out = Vec::new();
			flatten(&snapshot, depth, &mut out);
			Ok(Value::array(out))
		},
		"forEach" => (|| {
			want_args("forEach", 1, args)?;
			let snapshot = items.read().clone();
			for (i, item) in snapshot.iter().enumerate() {
				interp.call_value(&args[0], None, &[item.clone(), Value::from(i)])?;
			}
			Ok(Value::Undefined)
		})(),
		"includes" => (|| {
			want_args("includes", 1, args)?;
			let snapshot = items.read();
			Ok(Value::Bool(snapshot.iter().any(|v| v.strict_eq(&args[0]))))
		})(),
		"indexOf" => (|| {
			want_args("indexOf", 1, args)?;
			let snapshot = items.read();
			match snapshot.iter().position(|v| v.strict_eq(&args[0])) {
				Some(i) => Ok(Value::from(i)),
				None => Ok(Value::Float(-1.0)),
			}
		})(),
		"join" => {
			let sep = match args.first() {
				Some(Value::Undefined) | None => ",".to_string(),
				Some(v) => v.display(),
			};
			let snapshot = items.read();
			let joined = snapshot
				.iter()
				.map(|v| match v {
					Value::Undefined | Value::Null => String::new(),
					other => other.display(),
				})
				.collect::<Vec<_>>()
				.join(&sep);
			Ok(Value::string(joined))
		},
		"map" => (|| {
			want_args("map", 1, args)?;
			let snapshot = items.read().clone();
			let mut out = Vec::with_capacity(snapshot.len());
			for (i, item) in snapshot.iter().enumerate() {
				out.push(interp.call_value(&args[0], None, &[item.clone(), Value::from(i)])?);
			}
			Ok(Value::array(out))
		})(),
		"pop" => Ok(items.write().pop().unwrap_or(Value::Undefined)),
		"push" => {
			let mut guard = items.write();
			guard.extend(args.iter().cloned());
			Ok(Value::from(guard.len()))
		},
		"reduce" => reduce(interp, items, args, false),
		"reduceRight" => reduce(interp, items, args, true),
		"reverse" => {
			items.write().reverse();
			Ok(Value::Array(items.clone()))
		},
		"shift" => {
			let mut guard = items.write();
			if guard.is_empty() {
				Ok(Value::Undefined)
			} else {
				Ok(guard.remove(0))
			}
		},
		"slice" => {
			let snapshot = items.read();
			let len = snapshot.len();
			let start = resolve_index(len, args.first(), 0);
			let end = resolve_index(len, args.get(1), len);
			if start >= end {
				Ok(Value::array(Vec::new()))
			} else {
				Ok(Value::array(snapshot[start..end].to_vec()))
			}
		},
		"splice" => (|| {
			want_args("splice", 1, args)?;
			let mut guard = items.write();
			let len = guard.len();
			let start = resolve_index(len, args.first(), 0);
			let count = match args.get(1) {
				Some(Value::Undefined) | None => len - start,
				Some(v) => {
					let n = v.as_number_lossy();
					if n.is_nan() || n < 0.0 { 0 } else { (n as usize).min(len - start) }
				},
			};
			let removed: Vec<Value> = guard.splice(start..start + count, args.iter().skip(2).cloned()).collect();
			Ok(Value::array(removed))
		})(),
		"some" => (|| {
			want_args("some", 1, args)?;
			let snapshot = items.read().clone();
			for (i, item) in snapshot.iter().enumerate() {
				let hit = interp.call_value(&args[0], None, &[item.clone(), Value::from(i)])?;
				if hit.truthy() {
					return Ok(Value::Bool(true));
				}
			}
			Ok(Value::Bool(false))
		})(),
		"unshift" => {
			let mut guard = items.write();
			for (i, arg) in args.iter().enumerate() {
				guard.insert(i, arg.clone());
			}
			Ok(Value::from(guard.len()))
		},
		_ => return None,
	};
	Some(result)
}

fn reduce(interp: &mut Interp, items: &ArrayRef, args: &[Value], right: bool) -> EvalResult {
	let name = if right { "reduceRight" } else { "reduce" };
	want_args(name, 1, args)?;
	let mut snapshot = items.read().clone();
	if right {
		snapshot.reverse();
	}
	let mut iter = snapshot.into_iter().enumerate();
	let mut acc = match args.get(1) {
		Some(v) => v.clone(),
		None => match iter.next() {
			Some((_, v)) => v,
			None => {
				return Err(ExecutionError::function(
					name,
					"reduce of empty array with no initial value",
				));
			},
		},
	};
	for (i, item) in iter {
		acc = interp.call_value(&args[0], None, &[acc, item, Value::from(i)])?;
	}
	Ok(acc)
}
