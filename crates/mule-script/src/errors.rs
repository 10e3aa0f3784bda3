use std::sync::Arc;

use crate::value::{Value, ValueKind};

/// Parse-time error with the position of the offending token.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{message} at line {line}, column {column}")]
pub struct ParseError {
	pub message: String,
	pub line: usize,
	pub column: usize,
}

impl ParseError {
	pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
		Self {
			message: message.into(),
			line,
			column,
		}
	}
}

/// Runtime errors. The `Break`/`Continue`/`Return`/`Throw`/`Exit` variants are
/// control-flow sentinels: they unwind the tree walker until the matching
/// construct catches them. Escaping past the outermost frame turns them into
/// real errors.
#[derive(thiserror::Error, Debug)]
pub enum ExecutionError {
	#[error("undeclared identifier: {0}")]
	Undeclared(Arc<str>),
	#[error("{kind} has no method {method}")]
	NoSuchMethod { kind: &'static str, method: String },
	#[error("{0} is not callable")]
	NotCallable(ValueKind),
	#[error("{0} is not iterable")]
	NotIterable(ValueKind),
	#[error("unsupported operand types for {op}: {left} and {right}")]
	UnsupportedBinaryOp {
		op: &'static str,
		left: ValueKind,
		right: ValueKind,
	},
	#[error("unsupported operand type for {op}: {kind}")]
	UnsupportedUnaryOp { op: &'static str, kind: ValueKind },
	#[error("{0} does not support property access")]
	NoProperties(ValueKind),
	#[error("{0} does not support indexing")]
	NotIndexable(ValueKind),
	#[error("division by zero")]
	DivisionByZero,
	#[error("modulo by zero")]
	ModuloByZero,
	#[error("{function}: expected {want} argument(s), got {got}")]
	Arity {
		function: String,
		want: usize,
		got: usize,
	},
	#[error("{function}: {message}")]
	Function { function: String, message: String },
	#[error("cannot assign to constant {0}")]
	ConstAssignment(Arc<str>),
	#[error("{0} is already declared in this scope")]
	AlreadyDeclared(Arc<str>),
	#[error("environment is frozen")]
	Frozen,
	#[error("invalid assignment target")]
	BadAssignTarget,
	#[error("property {0} is not writable")]
	NotWritable(Arc<str>),
	#[error("recursion limit exceeded")]
	TooDeep,
	#[error("invalid json: {0}")]
	Json(String),
	#[error("import of {spec} failed: {message}")]
	Import { spec: String, message: String },
	#[error("module parse: {0}")]
	ModuleParse(ParseError),

	// Control-flow sentinels.
	#[error("break outside of a loop")]
	Break(Option<Arc<str>>),
	#[error("continue outside of a loop")]
	Continue(Option<Arc<str>>),
	#[error("return outside of a function")]
	Return(Value),
	#[error("uncaught {}", .0.display())]
	Throw(Value),
	#[error("script exited with code {0}")]
	Exit(i32),
}

impl ExecutionError {
	pub fn function(function: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Function {
			function: function.into(),
			message: message.into(),
		}
	}

	/// True for the sentinels that only a loop, function boundary or try block
	/// may legitimately absorb.
	pub fn is_control_flow(&self) -> bool {
		matches!(
			self,
			Self::Break(_) | Self::Continue(_) | Self::Return(_) | Self::Throw(_) | Self::Exit(_)
		)
	}
}
