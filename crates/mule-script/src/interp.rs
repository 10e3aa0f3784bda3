use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::*;
use crate::builtins;
use crate::errors::ExecutionError;
use crate::module::{ModuleLoader, ModuleObject, SearchLoader};
use crate::native::NativeValue;
use crate::parser::Script;
use crate::scope::Scope;
use crate::value::{EvalResult, Function, Object, Slot, Value};

#[cfg(test)]
#[path = "interp_tests.rs"]
mod tests;

const MAX_CALL_DEPTH: usize = 256;

/// The tree walker. Evaluation is eager, recursive and single-threaded;
/// control-flow exits travel as sentinel errors until the owning construct
/// absorbs them.
pub struct Interp {
	loader: Arc<dyn ModuleLoader>,
	modules: HashMap<Arc<str>, Value>,
	this_stack: Vec<Value>,
	depth: usize,
}

impl Default for Interp {
	fn default() -> Self {
		Self::new(Arc::new(SearchLoader::from_env()))
	}
}

impl Interp {
	pub fn new(loader: Arc<dyn ModuleLoader>) -> Interp {
		Interp {
			loader,
			modules: HashMap::new(),
			this_stack: Vec::new(),
			depth: 0,
		}
	}

	/// Runs a parsed script against `scope`, returning the value of the last
	/// statement. A stray top-level `return` yields its value; `throw`
	/// surfaces as an error.
	pub fn run(&mut self, script: &Script, scope: &Scope) -> EvalResult {
		let mut last = Value::Undefined;
		for stmt in &script.body {
			match self.eval(stmt, scope) {
				Ok(v) => last = v,
				Err(ExecutionError::Return(v)) => return Ok(v),
				Err(e) => return Err(e),
			}
		}
		Ok(last)
	}

	pub fn eval(&mut self, node: &Node, scope: &Scope) -> EvalResult {
		match node {
			Node::Number(n) => Ok(Value::Float(*n)),
			Node::Str(s) => Ok(Value::String(s.clone())),
			Node::Bool(b) => Ok(Value::Bool(*b)),
			Node::Null => Ok(Value::Null),
			Node::Undefined => Ok(Value::Undefined),
			Node::This => Ok(self.this_stack.last().cloned().unwrap_or(Value::Undefined)),
			Node::Template(parts) => {
				let mut out = String::new();
				for part in parts {
					out.push_str(&self.eval(part, scope)?.display());
				}
				Ok(Value::string(out))
			},
			Node::Array(items) => {
				let mut out = Vec::with_capacity(items.len());
				for item in items {
					match item {
						Node::Spread(inner) => {
							let v = self.eval(inner, scope)?;
							out.extend(self.spread_values(&v)?);
						},
						other => out.push(self.eval(other, scope)?),
					}
				}
				Ok(Value::array(out))
			},
			Node::Object(props) => {
				let mut object = Object::new();
				for prop in props {
					match prop {
						ObjectProp::KeyValue(key, value) => {
							let key: Arc<str> = match key {
								PropKey::Ident(name) => name.clone(),
								PropKey::Computed(e) => Arc::from(self.eval(e, scope)?.display().as_str()),
							};
							let value = self.eval(value, scope)?;
							object.define(key, Slot::plain(value));
						},
						ObjectProp::Spread(inner) => {
							let v = self.eval(inner, scope)?;
							for (k, v) in self.entries_of(&v)? {
								object.define(k, Slot::plain(v));
							}
						},
					}
				}
				Ok(Value::object(object))
			},
			Node::Ident(name) => scope
				.get(name)
				.ok_or_else(|| ExecutionError::Undeclared(name.clone())),
			Node::Access {
				target,
				field,
				optional,
			} => {
				let target = self.eval(target, scope)?;
				if *optional && target.is_nullish() {
					return Ok(Value::Undefined);
				}
				self.property_get(&target, field)
			},
			Node::Index { target, index } => {
				let target = self.eval(target, scope)?;
				let index = self.eval(index, scope)?;
				self.index_get(&target, &index)
			},
			Node::Unary { op, expr } => self.eval_unary(*op, expr, scope),
			Node::Binary { op, left, right } => self.eval_binary(*op, left, right, scope),
			Node::Cond { test, then, alt } => {
				if self.eval(test, scope)?.truthy() {
					self.eval(then, scope)
				} else {
					self.eval(alt, scope)
				}
			},
			Node::Assign { target, op, value } => {
				let value = self.eval(value, scope)?;
				let value = match op {
					AssignOp::Assign => value,
					compound => {
						let current = self.eval(target, scope)?;
						match compound {
							AssignOp::Add => current.add(&value)?,
							AssignOp::Sub => current.sub(&value)?,
							AssignOp::Mul => current.mul(&value)?,
							AssignOp::Div => current.div(&value)?,
							AssignOp::Rem => current.rem(&value)?,
							AssignOp::Assign => unreachable!(),
						}
					},
				};
				self.assign_target(target, value.clone(), scope)?;
				Ok(value)
			},
			Node::Step {
				target,
				prefix,
				delta,
			} => {
				let old = self.eval(target, scope)?;
				let old_n = old.as_number_lossy();
				let new = Value::Float(old_n + delta);
				self.assign_target(target, new.clone(), scope)?;
				Ok(if *prefix { new } else { Value::Float(old_n) })
			},
			Node::Call { callee, args } => self.eval_call(callee, args, scope),
			Node::Spread(_) => Err(ExecutionError::function(
				"spread",
				"spread is only valid in array literals and call arguments",
			)),
			Node::Func(decl) => {
				let f = Value::Function(Arc::new(Function {
					decl: decl.clone(),
					scope: scope.clone(),
					this: if decl.arrow {
						self.this_stack.last().cloned()
					} else {
						None
					},
				}));
				if let Some(name) = &decl.name
					&& !decl.arrow
				{
					scope.declare(name.clone(), f.clone(), false)?;
				}
				Ok(f)
			},
			Node::Let { name, init } => {
				let value = match init {
					Some(e) => self.eval(e, scope)?,
					None => Value::Undefined,
				};
				scope.declare(name.clone(), value, false)?;
				Ok(Value::Undefined)
			},
			Node::Const { name, init } => {
				let value = self.eval(init, scope)?;
				scope.declare(name.clone(), value, true)?;
				Ok(Value::Undefined)
			},
			Node::Block(body) => {
				let inner = scope.child();
				for stmt in body {
					self.eval(stmt, &inner)?;
				}
				Ok(Value::Undefined)
			},
			Node::If { test, then, alt } => {
				if self.eval(test, scope)?.truthy() {
					self.eval(then, scope)?;
				} else if let Some(alt) = alt {
					self.eval(alt, scope)?;
				}
				Ok(Value::Undefined)
			},
			Node::Switch { disc, cases } => self.eval_switch(disc, cases, scope),
			Node::While { label, test, body } => {
				while self.eval(test, scope)?.truthy() {
					match self.run_loop_body(body, scope, label) {
						LoopFlow::Normal => {},
						LoopFlow::Break => break,
						LoopFlow::Err(e) => return Err(e),
					}
				}
				Ok(Value::Undefined)
			},
			Node::DoWhile { label, body, test } => {
				loop {
					match self.run_loop_body(body, scope, label) {
						LoopFlow::Normal => {},
						LoopFlow::Break => break,
						LoopFlow::Err(e) => return Err(e),
					}
					if !self.eval(test, scope)?.truthy() {
						break;
					}
				}
				Ok(Value::Undefined)
			},
			Node::For {
				label,
				init,
				test,
				post,
				body,
			} => {
				let head = scope.child();
				if let Some(init) = init {
					self.eval(init, &head)?;
				}
				loop {
					if let Some(test) = test
						&& !self.eval(test, &head)?.truthy()
					{
						break;
					}
					match self.run_loop_body(body, &head, label) {
						LoopFlow::Normal => {},
						LoopFlow::Break => break,
						LoopFlow::Err(e) => return Err(e),
					}
					if let Some(post) = post {
						self.eval(post, &head)?;
					}
				}
				Ok(Value::Undefined)
			},
			Node::ForOf {
				label,
				bind,
				iter,
				body,
			} => {
				let iter = self.eval(iter, scope)?;
				for item in self.spread_values(&iter)? {
					let inner = scope.child();
					inner.declare(bind.clone(), item, false)?;
					match self.run_loop_body(body, &inner, label) {
						LoopFlow::Normal => {},
						LoopFlow::Break => break,
						LoopFlow::Err(e) => return Err(e),
					}
				}
				Ok(Value::Undefined)
			},
			Node::ForIn {
				label,
				bind,
				iter,
				body,
			} => {
				let iter = self.eval(iter, scope)?;
				for key in self.keys_of(&iter)? {
					let inner = scope.child();
					inner.declare(bind.clone(), Value::String(key), false)?;
					match self.run_loop_body(body, &inner, label) {
						LoopFlow::Normal => {},
						LoopFlow::Break => break,
						LoopFlow::Err(e) => return Err(e),
					}
				}
				Ok(Value::Undefined)
			},
			Node::Break(label) => Err(ExecutionError::Break(label.clone())),
			Node::Continue(label) => Err(ExecutionError::Continue(label.clone())),
			Node::Return(value) => {
				let value = match value {
					Some(e) => self.eval(e, scope)?,
					None => Value::Undefined,
				};
				Err(ExecutionError::Return(value))
			},
			Node::Throw(e) => {
				let value = self.eval(e, scope)?;
				Err(ExecutionError::Throw(value))
			},
			Node::Try {
				block,
				catch,
				finally,
			} => self.eval_try(block, catch.as_ref(), finally.as_deref(), scope),
			Node::Import(decl) => self.eval_import(decl, scope),
			Node::Export(inner) => {
				self.eval(inner, scope)?;
				for name in exported_names(inner) {
					scope.export(name);
				}
				Ok(Value::Undefined)
			},
		}
	}

	fn eval_unary(&mut self, op: UnaryOp, expr: &Node, scope: &Scope) -> EvalResult {
		match op {
			UnaryOp::Typeof => {
				// typeof on an undeclared identifier is "undefined", not an error.
				if let Node::Ident(name) = expr
					&& !scope.has(name)
				{
					return Ok(Value::string("undefined"));
				}
				let v = self.eval(expr, scope)?;
				Ok(Value::string(v.type_of()))
			},
			UnaryOp::Delete => match expr {
				Node::Access { target, field, .. } => {
					let target = self.eval(target, scope)?;
					self.delete_property(&target, field)
				},
				Node::Index { target, index } => {
					let target = self.eval(target, scope)?;
					let key = self.eval(index, scope)?;
					match &target {
						Value::Array(items) => {
							let idx = key.as_index()?;
							let mut items = items.write();
							if idx < items.len() {
								items[idx] = Value::Undefined;
							}
							Ok(Value::Bool(true))
						},
						_ => self.delete_property(&target, &key.display()),
					}
				},
				_ => Err(ExecutionError::function(
					"delete",
					"operand must be a property access",
				)),
			},
			UnaryOp::Not => {
				let v = self.eval(expr, scope)?;
				Ok(Value::Bool(!v.truthy()))
			},
			UnaryOp::Plus | UnaryOp::Neg => {
				let v = self.eval(expr, scope)?;
				if !matches!(
					v,
					Value::Undefined | Value::Null | Value::Float(_) | Value::Bool(_) | Value::String(_)
				) {
					return Err(ExecutionError::UnsupportedUnaryOp {
						op: if op == UnaryOp::Neg { "-" } else { "+" },
						kind: v.kind(),
					});
				}
				let n = v.as_number_lossy();
				Ok(Value::Float(if op == UnaryOp::Neg { -n } else { n }))
			},
		}
	}

	fn eval_binary(&mut self, op: BinaryOp, left: &Node, right: &Node, scope: &Scope) -> EvalResult {
		// Short-circuit forms first.
		match op {
			BinaryOp::And => {
				let l = self.eval(left, scope)?;
				return if l.truthy() { self.eval(right, scope) } else { Ok(l) };
			},
			BinaryOp::Or => {
				let l = self.eval(left, scope)?;
				return if l.truthy() { Ok(l) } else { self.eval(right, scope) };
			},
			BinaryOp::Coalesce => {
				let l = self.eval(left, scope)?;
				return if l.is_nullish() {
					self.eval(right, scope)
				} else {
					Ok(l)
				};
			},
			_ => {},
		}
		let l = self.eval(left, scope)?;
		let r = self.eval(right, scope)?;
		match op {
			BinaryOp::Add => l.add(&r),
			BinaryOp::Sub => l.sub(&r),
			BinaryOp::Mul => l.mul(&r),
			BinaryOp::Div => l.div(&r),
			BinaryOp::Rem => l.rem(&r),
			BinaryOp::Pow => l.pow(&r),
			BinaryOp::Eq => Ok(Value::Bool(l.loose_eq(&r))),
			BinaryOp::Ne => Ok(Value::Bool(!l.loose_eq(&r))),
			BinaryOp::StrictEq => Ok(Value::Bool(l.strict_eq(&r))),
			BinaryOp::StrictNe => Ok(Value::Bool(!l.strict_eq(&r))),
			BinaryOp::Lt => Ok(Value::Bool(
				l.compare(&r) == Some(std::cmp::Ordering::Less),
			)),
			BinaryOp::Le => Ok(Value::Bool(matches!(
				l.compare(&r),
				Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
			))),
			BinaryOp::Gt => Ok(Value::Bool(
				l.compare(&r) == Some(std::cmp::Ordering::Greater),
			)),
			BinaryOp::Ge => Ok(Value::Bool(matches!(
				l.compare(&r),
				Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
			))),
			BinaryOp::Instanceof => match &r {
				Value::Native(n) => match n.instance_check(&l) {
					Some(b) => Ok(Value::Bool(b)),
					None => Err(ExecutionError::UnsupportedBinaryOp {
						op: "instanceof",
						left: l.kind(),
						right: r.kind(),
					}),
				},
				_ => Err(ExecutionError::UnsupportedBinaryOp {
					op: "instanceof",
					left: l.kind(),
					right: r.kind(),
				}),
			},
			BinaryOp::In => {
				let key = l.display();
				match &r {
					Value::Object(o) => Ok(Value::Bool(o.read().has(&key))),
					Value::Array(items) => {
						let idx = key.parse::<usize>().ok();
						Ok(Value::Bool(
							idx.map(|i| i < items.read().len()).unwrap_or(false),
						))
					},
					Value::Native(n) => Ok(Value::Bool(n.get(&key).is_some())),
					other => Err(ExecutionError::UnsupportedBinaryOp {
						op: "in",
						left: l.kind(),
						right: other.kind(),
					}),
				}
			},
			BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce => unreachable!(),
		}
	}

	fn eval_switch(&mut self, disc: &Node, cases: &[SwitchCase], scope: &Scope) -> EvalResult {
		let disc = self.eval(disc, scope)?;
		let mut start = None;
		for (i, case) in cases.iter().enumerate() {
			if let Some(test) = &case.test {
				let t = self.eval(test, scope)?;
				if disc.strict_eq(&t) {
					start = Some(i);
					break;
				}
			}
		}
		let start = match start.or_else(|| cases.iter().position(|c| c.test.is_none())) {
			Some(i) => i,
			None => return Ok(Value::Undefined),
		};
		let inner = scope.child();
		// Fall through until a break.
		for case in &cases[start..] {
			for stmt in &case.body {
				match self.eval(stmt, &inner) {
					Ok(_) => {},
					Err(ExecutionError::Break(None)) => return Ok(Value::Undefined),
					Err(e) => return Err(e),
				}
			}
		}
		Ok(Value::Undefined)
	}

	fn eval_try(
		&mut self,
		block: &Node,
		catch: Option<&CatchClause>,
		finally: Option<&Node>,
		scope: &Scope,
	) -> EvalResult {
		let outcome = match (self.eval(block, scope), catch) {
			(Err(ExecutionError::Throw(thrown)), Some(clause)) => {
				let inner = scope.child();
				if let Some(bind) = &clause.bind {
					inner.declare(bind.clone(), thrown, false)?;
				}
				self.eval(&clause.body, &inner)
			},
			(other, _) => other,
		};
		if let Some(finally) = finally {
			// Finally runs unconditionally; its own diversion wins.
			self.eval(finally, scope)?;
		}
		outcome.map(|_| Value::Undefined)
	}

	fn run_loop_body(&mut self, body: &Node, scope: &Scope, label: &Option<Arc<str>>) -> LoopFlow {
		match self.eval(body, scope) {
			Ok(_) => LoopFlow::Normal,
			Err(ExecutionError::Break(l)) if matches_label(&l, label) => LoopFlow::Break,
			Err(ExecutionError::Continue(l)) if matches_label(&l, label) => LoopFlow::Normal,
			Err(e) => LoopFlow::Err(e),
		}
	}

	fn eval_call(&mut self, callee: &Node, args: &[Node], scope: &Scope) -> EvalResult {
		let args = self.eval_args(args, scope)?;
		if let Node::Access {
			target,
			field,
			optional,
		} = callee
		{
			let target = self.eval(target, scope)?;
			if *optional && target.is_nullish() {
				return Ok(Value::Undefined);
			}
			return self.method_call(&target, field, &args);
		}
		let callee = self.eval(callee, scope)?;
		self.call_value(&callee, None, &args)
	}

	fn eval_args(&mut self, args: &[Node], scope: &Scope) -> Result<Vec<Value>, ExecutionError> {
		let mut out = Vec::with_capacity(args.len());
		for arg in args {
			match arg {
				Node::Spread(inner) => {
					let v = self.eval(inner, scope)?;
					out.extend(self.spread_values(&v)?);
				},
				other => out.push(self.eval(other, scope)?),
			}
		}
		Ok(out)
	}

	/// Dispatches `target.method(args)` through the per-kind method tables.
	pub fn method_call(&mut self, target: &Value, method: &str, args: &[Value]) -> EvalResult {
		match target {
			Value::Object(o) => {
				let prop = o.read().get(method);
				match prop {
					Some(f) if matches!(f, Value::Function(_) | Value::Builtin(_) | Value::Native(_)) => {
						self.call_value(&f, Some(target.clone()), args)
					},
					Some(other) => Err(ExecutionError::NotCallable(other.kind())),
					None => builtins::object::dispatch(self, o, method, args).unwrap_or_else(|| {
						Err(ExecutionError::NoSuchMethod {
							kind: "object",
							method: method.to_string(),
						})
					}),
				}
			},
			Value::Array(items) => {
				builtins::array::dispatch(self, items, method, args).unwrap_or_else(|| {
					Err(ExecutionError::NoSuchMethod {
						kind: "array",
						method: method.to_string(),
					})
				})
			},
			Value::String(s) => builtins::string::dispatch(self, s, method, args).unwrap_or_else(|| {
				Err(ExecutionError::NoSuchMethod {
					kind: "string",
					method: method.to_string(),
				})
			}),
			Value::Native(n) => {
				if let Some(result) = n.call(method, args, self) {
					return result;
				}
				match n.get(method) {
					Some(f) if matches!(f, Value::Function(_) | Value::Builtin(_)) => {
						self.call_value(&f, Some(target.clone()), args)
					},
					_ => Err(ExecutionError::NoSuchMethod {
						kind: n.type_name(),
						method: method.to_string(),
					}),
				}
			},
			other => Err(ExecutionError::NoSuchMethod {
				kind: other.kind().as_str(),
				method: method.to_string(),
			}),
		}
	}

	/// Invokes a callable value.
	pub fn call_value(&mut self, callee: &Value, this: Option<Value>, args: &[Value]) -> EvalResult {
		match callee {
			Value::Function(f) => {
				if self.depth >= MAX_CALL_DEPTH {
					return Err(ExecutionError::TooDeep);
				}
				let frame = f.scope.child();
				self.bind_params(&f.decl.params, args, &frame)?;
				let this = if f.decl.arrow {
					f.this.clone().unwrap_or(Value::Undefined)
				} else {
					this.unwrap_or(Value::Undefined)
				};
				self.this_stack.push(this);
				self.depth += 1;
				let result = self.eval(&f.decl.body, &frame);
				self.depth -= 1;
				self.this_stack.pop();
				match result {
					Ok(_) => Ok(Value::Undefined),
					Err(ExecutionError::Return(v)) => Ok(v),
					Err(e) => Err(e),
				}
			},
			Value::Builtin(b) => (b.f)(self, this, args),
			Value::Native(n) => n
				.call_self(args, self)
				.unwrap_or(Err(ExecutionError::NotCallable(callee.kind()))),
			other => Err(ExecutionError::NotCallable(other.kind())),
		}
	}

	fn bind_params(
		&mut self,
		params: &[Param],
		args: &[Value],
		frame: &Scope,
	) -> Result<(), ExecutionError> {
		for (i, param) in params.iter().enumerate() {
			if param.rest {
				let rest: Vec<Value> = args.get(i..).unwrap_or(&[]).to_vec();
				frame.declare(param.name.clone(), Value::array(rest), false)?;
				break;
			}
			let v = args.get(i).cloned().unwrap_or(Value::Undefined);
			frame.declare(param.name.clone(), v, false)?;
		}
		Ok(())
	}

	// ---- property and index access ----

	pub fn property_get(&mut self, target: &Value, field: &str) -> EvalResult {
		match target {
			Value::Undefined | Value::Null => Err(ExecutionError::NoProperties(target.kind())),
			Value::String(s) => match field {
				"length" => Ok(Value::from(s.chars().count())),
				_ => Ok(Value::Undefined),
			},
			Value::Array(items) => match field {
				"length" => Ok(Value::from(items.read().len())),
				_ => Ok(Value::Undefined),
			},
			Value::Object(o) => Ok(o.read().get(field).unwrap_or(Value::Undefined)),
			Value::Native(n) => Ok(n.get(field).unwrap_or(Value::Undefined)),
			_ => Ok(Value::Undefined),
		}
	}

	fn property_set(&mut self, target: &Value, field: &str, value: Value) -> EvalResult {
		match target {
			Value::Object(o) => {
				o.write().set(field, value.clone())?;
				Ok(value)
			},
			Value::Native(n) => {
				n.set(field, value.clone())?;
				Ok(value)
			},
			Value::Array(items) if field == "length" => {
				let len = value.as_index()?;
				let mut items = items.write();
				items.resize(len, Value::Undefined);
				Ok(value)
			},
			other => Err(ExecutionError::NoProperties(other.kind())),
		}
	}

	fn delete_property(&mut self, target: &Value, field: &str) -> EvalResult {
		match target {
			Value::Object(o) => {
				let removed = o.write().delete(field)?;
				Ok(Value::Bool(removed))
			},
			other => Err(ExecutionError::NoProperties(other.kind())),
		}
	}

	fn index_get(&mut self, target: &Value, index: &Value) -> EvalResult {
		match target {
			Value::Array(items) => match index {
				Value::Float(f) if *f >= 0.0 && f.fract() == 0.0 => {
					Ok(items.read().get(*f as usize).cloned().unwrap_or(Value::Undefined))
				},
				Value::Float(_) => Ok(Value::Undefined),
				other => self.property_get(target, &other.display()),
			},
			Value::String(s) => match index {
				Value::Float(f) if *f >= 0.0 && f.fract() == 0.0 => Ok(
					s.chars()
						.nth(*f as usize)
						.map(|c| Value::string(c.to_string()))
						.unwrap_or(Value::Undefined),
				),
				other => self.property_get(target, &other.display()),
			},
			Value::Object(o) => Ok(o.read().get(&index.display()).unwrap_or(Value::Undefined)),
			Value::Native(n) => Ok(n.get(&index.display()).unwrap_or(Value::Undefined)),
			other => Err(ExecutionError::NotIndexable(other.kind())),
		}
	}

	fn assign_target(&mut self, target: &Node, value: Value, scope: &Scope) -> EvalResult {
		match target {
			Node::Ident(name) => {
				scope.assign(name, value.clone())?;
				Ok(value)
			},
			Node::Access { target, field, .. } => {
				let target = self.eval(target, scope)?;
				self.property_set(&target, field, value)
			},
			Node::Index { target, index } => {
				let target = self.eval(target, scope)?;
				let index = self.eval(index, scope)?;
				match &target {
					Value::Array(items) => {
						let idx = index.as_index()?;
						let mut items = items.write();
						if idx >= items.len() {
							items.resize(idx + 1, Value::Undefined);
						}
						items[idx] = value.clone();
						Ok(value)
					},
					_ => self.property_set(&target, &index.display(), value),
				}
			},
			_ => Err(ExecutionError::BadAssignTarget),
		}
	}

	// ---- iteration ----

	/// Values yielded by spread and `for…of`.
	pub fn spread_values(&self, v: &Value) -> Result<Vec<Value>, ExecutionError> {
		match v {
			Value::Array(items) => Ok(items.read().clone()),
			Value::String(s) => Ok(s.chars().map(|c| Value::string(c.to_string())).collect()),
			other => Err(ExecutionError::NotIterable(other.kind())),
		}
	}

	/// Keys yielded by `for…in`.
	fn keys_of(&self, v: &Value) -> Result<Vec<Arc<str>>, ExecutionError> {
		match v {
			Value::Object(o) => Ok(o.read().keys()),
			Value::Array(items) => Ok(
				(0..items.read().len())
					.map(|i| Arc::from(i.to_string().as_str()))
					.collect(),
			),
			Value::String(s) => Ok(
				(0..s.chars().count())
					.map(|i| Arc::from(i.to_string().as_str()))
					.collect(),
			),
			Value::Native(n) => Ok(n.entries().into_iter().map(|(k, _)| k).collect()),
			other => Err(ExecutionError::NotIterable(other.kind())),
		}
	}

	/// Key/value entries used by object spread.
	fn entries_of(&self, v: &Value) -> Result<Vec<(Arc<str>, Value)>, ExecutionError> {
		match v {
			Value::Object(o) => Ok(o.read().entries()),
			Value::Native(n) => Ok(n.entries()),
			Value::Array(items) => Ok(
				items
					.read()
					.iter()
					.enumerate()
					.map(|(i, v)| (Arc::from(i.to_string().as_str()), v.clone()))
					.collect(),
			),
			other => Err(ExecutionError::NotIterable(other.kind())),
		}
	}

	// ---- modules ----

	fn eval_import(&mut self, decl: &ImportDecl, scope: &Scope) -> EvalResult {
		let module = self.load_module(&decl.from)?;
		match &decl.kind {
			ImportKind::Default(name) | ImportKind::Namespace(name) => {
				scope.declare(name.clone(), module, true)?;
			},
			ImportKind::Named(names) => {
				let Value::Native(n) = &module else {
					return Err(ExecutionError::Import {
						spec: decl.from.to_string(),
						message: "module did not evaluate to a module object".to_string(),
					});
				};
				for (name, alias) in names {
					let v = n.get(name).ok_or_else(|| ExecutionError::Import {
						spec: decl.from.to_string(),
						message: format!("module does not export {name}"),
					})?;
					scope.declare(alias.clone(), v, true)?;
				}
			},
		}
		Ok(Value::Undefined)
	}

	pub fn load_module(&mut self, spec: &Arc<str>) -> EvalResult {
		if let Some(cached) = self.modules.get(spec) {
			return Ok(cached.clone());
		}
		let source = self.loader.load(spec)?;
		let script = Script::parse(&source).map_err(ExecutionError::ModuleParse)?;
		let scope = builtins::prelude().child();
		for stmt in &script.body {
			self.eval(stmt, &scope)?;
		}
		let module = Value::Native(NativeValue::new(ModuleObject::new(scope)));
		self.modules.insert(spec.clone(), module.clone());
		Ok(module)
	}
}

enum LoopFlow {
	Normal,
	Break,
	Err(ExecutionError),
}

fn matches_label(carried: &Option<Arc<str>>, loop_label: &Option<Arc<str>>) -> bool {
	match carried {
		None => true,
		Some(l) => loop_label.as_ref() == Some(l),
	}
}

fn exported_names(node: &Node) -> Vec<Arc<str>> {
	match node {
		Node::Let { name, .. } => vec![name.clone()],
		Node::Const { name, .. } => vec![name.clone()],
		Node::Func(decl) => decl.name.iter().cloned().collect(),
		_ => Vec::new(),
	}
}
