use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::ast::FuncDecl;
use crate::errors::ExecutionError;
use crate::interp::Interp;
use crate::native::NativeValue;
use crate::scope::Scope;

pub type EvalResult = Result<Value, ExecutionError>;

pub type ArrayRef = Arc<RwLock<Vec<Value>>>;
pub type ObjectRef = Arc<RwLock<Object>>;

/// A runtime value. Arrays and objects are shared by reference; everything
/// else is a copy.
#[derive(Clone)]
pub enum Value {
	Undefined,
	Null,
	Float(f64),
	Bool(bool),
	String(Arc<str>),
	Array(ArrayRef),
	Object(ObjectRef),
	Function(Arc<Function>),
	Builtin(Builtin),
	Native(NativeValue),
}

pub struct Function {
	pub decl: Arc<FuncDecl>,
	/// Environment the function closed over.
	pub scope: Scope,
	/// `this` captured at definition time; set for arrow functions only.
	pub this: Option<Value>,
}

pub type BuiltinFn = fn(&mut Interp, Option<Value>, &[Value]) -> EvalResult;

#[derive(Clone)]
pub struct Builtin {
	pub name: &'static str,
	pub f: BuiltinFn,
}

/// Property bag of a script object. Slot order is first-insertion order.
#[derive(Default)]
pub struct Object {
	slots: IndexMap<Arc<str>, Slot>,
}

#[derive(Clone)]
pub struct Slot {
	pub value: Value,
	pub writable: bool,
	pub enumerable: bool,
	pub configurable: bool,
}

impl Slot {
	pub fn plain(value: Value) -> Slot {
		Slot {
			value,
			writable: true,
			enumerable: true,
			configurable: true,
		}
	}

	pub fn frozen(value: Value) -> Slot {
		Slot {
			value,
			writable: false,
			enumerable: true,
			configurable: false,
		}
	}
}

impl Object {
	pub fn new() -> Object {
		Object::default()
	}

	pub fn get(&self, key: &str) -> Option<Value> {
		self.slots.get(key).map(|s| s.value.clone())
	}

	pub fn has(&self, key: &str) -> bool {
		self.slots.contains_key(key)
	}

	pub fn set(&mut self, key: &str, value: Value) -> Result<(), ExecutionError> {
		match self.slots.get_mut(key) {
			Some(slot) if !slot.writable => Err(ExecutionError::NotWritable(Arc::from(key))),
			Some(slot) => {
				slot.value = value;
				Ok(())
			},
			None => {
				self.slots.insert(Arc::from(key), Slot::plain(value));
				Ok(())
			},
		}
	}

	pub fn define(&mut self, key: impl Into<Arc<str>>, slot: Slot) {
		self.slots.insert(key.into(), slot);
	}

	pub fn delete(&mut self, key: &str) -> Result<bool, ExecutionError> {
		match self.slots.get(key) {
			Some(slot) if !slot.configurable => Err(ExecutionError::NotWritable(Arc::from(key))),
			Some(_) => {
				self.slots.shift_remove(key);
				Ok(true)
			},
			None => Ok(false),
		}
	}

	pub fn len(&self) -> usize {
		self.slots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Enumerable keys in insertion order.
	pub fn keys(&self) -> Vec<Arc<str>> {
		self
			.slots
			.iter()
			.filter(|(_, s)| s.enumerable)
			.map(|(k, _)| k.clone())
			.collect()
	}

	pub fn entries(&self) -> Vec<(Arc<str>, Value)> {
		self
			.slots
			.iter()
			.filter(|(_, s)| s.enumerable)
			.map(|(k, s)| (k.clone(), s.value.clone()))
			.collect()
	}
}

impl FromIterator<(Arc<str>, Value)> for Object {
	fn from_iter<T: IntoIterator<Item = (Arc<str>, Value)>>(iter: T) -> Self {
		let mut o = Object::new();
		for (k, v) in iter {
			o.define(k, Slot::plain(v));
		}
		o
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
	Undefined,
	Null,
	Number,
	Bool,
	String,
	Array,
	Object,
	Function,
	Native,
}

impl ValueKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ValueKind::Undefined => "undefined",
			ValueKind::Null => "null",
			ValueKind::Number => "number",
			ValueKind::Bool => "bool",
			ValueKind::String => "string",
			ValueKind::Array => "array",
			ValueKind::Object => "object",
			ValueKind::Function => "function",
			ValueKind::Native => "object",
		}
	}
}

impl fmt::Display for ValueKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Value {
	pub fn string(s: impl AsRef<str>) -> Value {
		Value::String(Arc::from(s.as_ref()))
	}

	pub fn array(items: Vec<Value>) -> Value {
		Value::Array(Arc::new(RwLock::new(items)))
	}

	pub fn object(object: Object) -> Value {
		Value::Object(Arc::new(RwLock::new(object)))
	}

	pub fn kind(&self) -> ValueKind {
		match self {
			Value::Undefined => ValueKind::Undefined,
			Value::Null => ValueKind::Null,
			Value::Float(_) => ValueKind::Number,
			Value::Bool(_) => ValueKind::Bool,
			Value::String(_) => ValueKind::String,
			Value::Array(_) => ValueKind::Array,
			Value::Object(_) => ValueKind::Object,
			Value::Function(_) | Value::Builtin(_) => ValueKind::Function,
			Value::Native(_) => ValueKind::Native,
		}
	}

	/// The `typeof` operator string.
	pub fn type_of(&self) -> &'static str {
		match self {
			Value::Undefined => "undefined",
			Value::Null => "object",
			Value::Float(_) => "number",
			Value::Bool(_) => "boolean",
			Value::String(_) => "string",
			Value::Array(_) | Value::Object(_) | Value::Native(_) => "object",
			Value::Function(_) | Value::Builtin(_) => "function",
		}
	}

	pub fn is_nullish(&self) -> bool {
		matches!(self, Value::Undefined | Value::Null)
	}

	/// JS ToBoolean.
	pub fn truthy(&self) -> bool {
		match self {
			Value::Undefined | Value::Null => false,
			Value::Bool(b) => *b,
			Value::Float(f) => *f != 0.0 && !f.is_nan(),
			Value::String(s) => !s.is_empty(),
			_ => true,
		}
	}

	/// JS ToNumber for the coercible kinds; NaN for everything else.
	pub fn as_number_lossy(&self) -> f64 {
		match self {
			Value::Undefined => f64::NAN,
			Value::Null => 0.0,
			Value::Bool(true) => 1.0,
			Value::Bool(false) => 0.0,
			Value::Float(f) => *f,
			Value::String(s) => {
				let t = s.trim();
				if t.is_empty() {
					0.0
				} else {
					t.parse::<f64>().unwrap_or(f64::NAN)
				}
			},
			_ => f64::NAN,
		}
	}

	pub fn as_str(&self) -> Result<Arc<str>, ExecutionError> {
		match self {
			Value::String(s) => Ok(s.clone()),
			other => Err(ExecutionError::UnsupportedUnaryOp {
				op: "string",
				kind: other.kind(),
			}),
		}
	}

	pub fn as_index(&self) -> Result<usize, ExecutionError> {
		match self {
			Value::Float(f) if *f >= 0.0 && f.fract() == 0.0 => Ok(*f as usize),
			other => Err(ExecutionError::UnsupportedUnaryOp {
				op: "index",
				kind: other.kind(),
			}),
		}
	}

	/// JS ToString, used for `+` concatenation, template literals and
	/// console output.
	pub fn display(&self) -> String {
		match self {
			Value::Undefined => "undefined".to_string(),
			Value::Null => "null".to_string(),
			Value::Bool(b) => b.to_string(),
			Value::Float(f) => format_number(*f),
			Value::String(s) => s.to_string(),
			Value::Array(items) => items
				.read()
				.iter()
				.map(|v| match v {
					Value::Undefined | Value::Null => String::new(),
					other => other.display(),
				})
				.collect::<Vec<_>>()
				.join(","),
			Value::Object(_) => "[object Object]".to_string(),
			Value::Function(f) => match &f.decl.name {
				Some(name) => format!("[function {name}]"),
				None => "[function]".to_string(),
			},
			Value::Builtin(b) => format!("[function {}]", b.name),
			Value::Native(n) => format!("[object {}]", n.type_name()),
		}
	}

	/// Strict equality: same kind, same value; reference identity for
	/// arrays, objects and functions.
	pub fn strict_eq(&self, other: &Value) -> bool {
		match (self, other) {
			(Value::Undefined, Value::Undefined) => true,
			(Value::Null, Value::Null) => true,
			(Value::Float(a), Value::Float(b)) => a == b,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::String(a), Value::String(b)) => a == b,
			(Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
			(Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
			(Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
			(Value::Builtin(a), Value::Builtin(b)) => std::ptr::fn_addr_eq(a.f, b.f),
			(Value::Native(a), Value::Native(b)) => a.ptr_eq(b),
			_ => false,
		}
	}

	/// Loose equality: `null == undefined`, number↔string via numeric
	/// parse, bool↔number via 0/1; otherwise strict.
	pub fn loose_eq(&self, other: &Value) -> bool {
		match (self, other) {
			(Value::Null, Value::Undefined) | (Value::Undefined, Value::Null) => true,
			(Value::Float(a), Value::String(_)) => *a == other.as_number_lossy(),
			(Value::String(_), Value::Float(b)) => self.as_number_lossy() == *b,
			(Value::Bool(_), Value::Float(b)) => self.as_number_lossy() == *b,
			(Value::Float(a), Value::Bool(_)) => *a == other.as_number_lossy(),
			(Value::Bool(_), Value::String(_)) | (Value::String(_), Value::Bool(_)) => {
				self.as_number_lossy() == other.as_number_lossy()
			},
			_ => self.strict_eq(other),
		}
	}

	/// Relational comparison: string-to-string is lexicographic, anything
	/// else numeric. `None` when a NaN is involved.
	pub fn compare(&self, other: &Value) -> Option<Ordering> {
		if let (Value::String(a), Value::String(b)) = (self, other) {
			return Some(a.as_ref().cmp(b.as_ref()));
		}
		let (a, b) = (self.as_number_lossy(), other.as_number_lossy());
		a.partial_cmp(&b)
	}

	fn numeric_operands(&self, other: &Value, op: &'static str) -> Result<(f64, f64), ExecutionError> {
		let ok = |v: &Value| {
			matches!(
				v,
				Value::Undefined | Value::Null | Value::Float(_) | Value::Bool(_) | Value::String(_)
			)
		};
		if !ok(self) || !ok(other) {
			return Err(ExecutionError::UnsupportedBinaryOp {
				op,
				left: self.kind(),
				right: other.kind(),
			});
		}
		Ok((self.as_number_lossy(), other.as_number_lossy()))
	}

	pub fn add(&self, other: &Value) -> EvalResult {
		if matches!(self, Value::String(_)) || matches!(other, Value::String(_)) {
			let mut s = self.display();
			s.push_str(&other.display());
			return Ok(Value::string(s));
		}
		let (a, b) = self.numeric_operands(other, "+")?;
		Ok(Value::Float(a + b))
	}

	pub fn sub(&self, other: &Value) -> EvalResult {
		let (a, b) = self.numeric_operands(other, "-")?;
		Ok(Value::Float(a - b))
	}

	pub fn mul(&self, other: &Value) -> EvalResult {
		let (a, b) = self.numeric_operands(other, "*")?;
		Ok(Value::Float(a * b))
	}

	pub fn div(&self, other: &Value) -> EvalResult {
		let (a, b) = self.numeric_operands(other, "/")?;
		if b == 0.0 {
			return Err(ExecutionError::DivisionByZero);
		}
		Ok(Value::Float(a / b))
	}

	pub fn rem(&self, other: &Value) -> EvalResult {
		let (a, b) = self.numeric_operands(other, "%")?;
		if b == 0.0 {
			return Err(ExecutionError::ModuloByZero);
		}
		Ok(Value::Float(a % b))
	}

	pub fn pow(&self, other: &Value) -> EvalResult {
		let (a, b) = self.numeric_operands(other, "**")?;
		Ok(Value::Float(a.powf(b)))
	}

	/// Converts to the JSON tree; `None` for values JSON cannot carry
	/// (functions, undefined, host objects without a JSON view).
	pub fn to_json(&self) -> Option<serde_json::Value> {
		match self {
			Value::Undefined => None,
			Value::Null => Some(serde_json::Value::Null),
			Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
			Value::Float(f) => serde_json::Number::from_f64(*f).map(serde_json::Value::Number),
			Value::String(s) => Some(serde_json::Value::String(s.to_string())),
			Value::Array(items) => Some(serde_json::Value::Array(
				items
					.read()
					.iter()
					.map(|v| v.to_json().unwrap_or(serde_json::Value::Null))
					.collect(),
			)),
			Value::Object(o) => {
				let mut map = serde_json::Map::new();
				for (k, v) in o.read().entries() {
					if let Some(jv) = v.to_json() {
						map.insert(k.to_string(), jv);
					}
				}
				Some(serde_json::Value::Object(map))
			},
			Value::Native(n) => {
				let entries = n.entries();
				if entries.is_empty() {
					None
				} else {
					let mut map = serde_json::Map::new();
					for (k, v) in entries {
						if let Some(jv) = v.to_json() {
							map.insert(k.to_string(), jv);
						}
					}
					Some(serde_json::Value::Object(map))
				}
			},
			Value::Function(_) | Value::Builtin(_) => None,
		}
	}

	pub fn from_json(json: &serde_json::Value) -> Value {
		match json {
			serde_json::Value::Null => Value::Null,
			serde_json::Value::Bool(b) => Value::Bool(*b),
			serde_json::Value::Number(n) => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
			serde_json::Value::String(s) => Value::string(s),
			serde_json::Value::Array(items) => Value::array(items.iter().map(Value::from_json).collect()),
			serde_json::Value::Object(map) => Value::object(
				map
					.iter()
					.map(|(k, v)| (Arc::from(k.as_str()), Value::from_json(v)))
					.collect(),
			),
		}
	}
}

/// JS-style number formatting: integral values print without a fraction.
pub fn format_number(f: f64) -> String {
	if f.is_nan() {
		"NaN".to_string()
	} else if f.is_infinite() {
		if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
	} else if f.fract() == 0.0 && f.abs() < 1e21 {
		format!("{}", f as i64)
	} else {
		format!("{f}")
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Undefined => write!(f, "Undefined"),
			Value::Null => write!(f, "Null"),
			Value::Float(v) => write!(f, "Float({v})"),
			Value::Bool(v) => write!(f, "Bool({v})"),
			Value::String(v) => write!(f, "String({v:?})"),
			Value::Array(items) => write!(f, "Array({:?})", items.read()),
			Value::Object(o) => {
				let o = o.read();
				write!(f, "Object{{")?;
				for (i, (k, v)) in o.entries().iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{k}: {v:?}")?;
				}
				write!(f, "}}")
			},
			Value::Function(v) => match &v.decl.name {
				Some(name) => write!(f, "Function({name})"),
				None => write!(f, "Function"),
			},
			Value::Builtin(b) => write!(f, "Builtin({})", b.name),
			Value::Native(n) => write!(f, "Native<{}>", n.type_name()),
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.display())
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Value {
		Value::Float(v)
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Value {
		Value::Bool(v)
	}
}

impl From<usize> for Value {
	fn from(v: usize) -> Value {
		Value::Float(v as f64)
	}
}

impl From<i64> for Value {
	fn from(v: i64) -> Value {
		Value::Float(v as f64)
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Value {
		Value::string(v)
	}
}

impl From<String> for Value {
	fn from(v: String) -> Value {
		Value::string(v)
	}
}

impl From<Arc<str>> for Value {
	fn from(v: Arc<str>) -> Value {
		Value::String(v)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Value {
		match v {
			Some(v) => v.into(),
			None => Value::Undefined,
		}
	}
}
