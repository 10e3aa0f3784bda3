use std::fmt;
use std::sync::Arc;

use crate::errors::ExecutionError;
use crate::interp::Interp;
use crate::value::{EvalResult, Value};

/// Host objects exposed to scripts. Each implementation opts into the
/// capabilities it supports; the defaults refuse everything.
pub trait Native: Send + Sync {
	fn type_name(&self) -> &'static str;

	/// Property read. `None` means the property does not exist (the reader
	/// decides whether that is `undefined` or an error).
	fn get(&self, _name: &str) -> Option<Value> {
		None
	}

	/// Property write.
	fn set(&self, name: &str, _value: Value) -> Result<(), ExecutionError> {
		Err(ExecutionError::NotWritable(Arc::from(name)))
	}

	/// Method dispatch. `None` means the method does not exist; `Some`
	/// carries the call outcome.
	fn call(&self, _name: &str, _args: &[Value], _interp: &mut Interp) -> Option<EvalResult> {
		None
	}

	/// Calling the value itself, for host objects that are functions.
	fn call_self(&self, _args: &[Value], _interp: &mut Interp) -> Option<EvalResult> {
		None
	}

	/// Enumerable key/value view, used by `for…in`, spread and JSON.
	fn entries(&self) -> Vec<(Arc<str>, Value)> {
		Vec::new()
	}

	/// `instanceof` support for host constructor markers. `None` means the
	/// object cannot appear on the right-hand side of `instanceof`.
	fn instance_check(&self, _value: &Value) -> Option<bool> {
		None
	}
}

#[derive(Clone)]
pub struct NativeValue(Arc<dyn Native>);

impl NativeValue {
	pub fn new(native: impl Native + 'static) -> NativeValue {
		NativeValue(Arc::new(native))
	}

	pub fn ptr_eq(&self, other: &NativeValue) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl std::ops::Deref for NativeValue {
	type Target = dyn Native;

	fn deref(&self) -> &Self::Target {
		self.0.as_ref()
	}
}

impl fmt::Debug for NativeValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "NativeValue<{}>", self.0.type_name())
	}
}

impl From<NativeValue> for Value {
	fn from(v: NativeValue) -> Value {
		Value::Native(v)
	}
}
