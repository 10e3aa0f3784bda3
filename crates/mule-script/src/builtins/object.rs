use crate::builtins::want_args;
use crate::interp::Interp;
use crate::value::{EvalResult, ObjectRef, Value};

/// Fallback methods available on every plain object.
pub fn dispatch(
	_interp: &mut Interp,
	object: &ObjectRef,
	method: &str,
	args: &[Value],
) -> Option<EvalResult> {
	let result = match method {
		"hasOwnProperty" => (|| {
			want_args("hasOwnProperty", 1, args)?;
			Ok(Value::Bool(object.read().has(&args[0].display())))
		})(),
		"toString" => Ok(Value::string("[object Object]")),
		_ => return None,
	};
	Some(result)
}
