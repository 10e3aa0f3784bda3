use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::errors::ExecutionError;
use crate::value::Value;

/// A nested, parent-chained symbol table. Cloning is cheap and shares the
/// underlying bindings; not safe to share across concurrently executing runs.
#[derive(Clone)]
pub struct Scope(Arc<ScopeInner>);

struct ScopeInner {
	parent: Option<Scope>,
	vars: RwLock<HashMap<Arc<str>, Binding>>,
	exports: RwLock<HashSet<Arc<str>>>,
	frozen: bool,
}

struct Binding {
	value: Value,
	constant: bool,
}

impl Scope {
	pub fn root() -> Scope {
		Scope(Arc::new(ScopeInner {
			parent: None,
			vars: RwLock::new(HashMap::new()),
			exports: RwLock::new(HashSet::new()),
			frozen: false,
		}))
	}

	/// A child scope enclosing `self`.
	pub fn child(&self) -> Scope {
		Scope(Arc::new(ScopeInner {
			parent: Some(self.clone()),
			vars: RwLock::new(HashMap::new()),
			exports: RwLock::new(HashSet::new()),
			frozen: false,
		}))
	}

	/// A read-only view over `self`: declarations and assignments fail, reads
	/// pass through.
	pub fn freeze(&self) -> Scope {
		Scope(Arc::new(ScopeInner {
			parent: Some(self.clone()),
			vars: RwLock::new(HashMap::new()),
			exports: RwLock::new(HashSet::new()),
			frozen: true,
		}))
	}

	/// Declares a new binding in this scope. Refuses to shadow a name already
	/// declared in the same scope.
	pub fn declare(
		&self,
		name: impl Into<Arc<str>>,
		value: Value,
		constant: bool,
	) -> Result<(), ExecutionError> {
		if self.0.frozen {
			return Err(ExecutionError::Frozen);
		}
		let name = name.into();
		let mut vars = self.0.vars.write();
		if vars.contains_key(&name) {
			return Err(ExecutionError::AlreadyDeclared(name));
		}
		vars.insert(name, Binding { value, constant });
		Ok(())
	}

	/// Overwrites or creates a binding without the shadow check; used by the
	/// host when installing prelude values.
	pub fn install(&self, name: impl Into<Arc<str>>, value: Value) {
		self.0.vars.write().insert(
			name.into(),
			Binding {
				value,
				constant: false,
			},
		);
	}

	/// Reassigns the nearest binding. Errors on constants; errors when no
	/// binding exists. A frozen scope on the walk stops the assignment,
	/// since writing through the decorator is a mutating op.
	pub fn assign(&self, name: &str, value: Value) -> Result<(), ExecutionError> {
		let mut scope = Some(self.clone());
		while let Some(s) = scope {
			{
				let mut vars = s.0.vars.write();
				if let Some(binding) = vars.get_mut(name) {
					if binding.constant {
						return Err(ExecutionError::ConstAssignment(Arc::from(name)));
					}
					binding.value = value;
					return Ok(());
				}
			}
			if s.0.frozen {
				return Err(ExecutionError::Frozen);
			}
			scope = s.0.parent.clone();
		}
		Err(ExecutionError::Undeclared(Arc::from(name)))
	}

	/// Resolves a name through the chain.
	pub fn get(&self, name: &str) -> Option<Value> {
		let mut scope = Some(self.clone());
		while let Some(s) = scope {
			if let Some(binding) = s.0.vars.read().get(name) {
				return Some(binding.value.clone());
			}
			scope = s.0.parent.clone();
		}
		None
	}

	pub fn has(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Marks a binding of this scope as exported (module evaluation).
	pub fn export(&self, name: impl Into<Arc<str>>) {
		self.0.exports.write().insert(name.into());
	}

	pub fn exported(&self, name: &str) -> Option<Value> {
		if !self.0.exports.read().contains(name) {
			return None;
		}
		self.0.vars.read().get(name).map(|b| b.value.clone())
	}

	pub fn exported_names(&self) -> Vec<Arc<str>> {
		self.0.exports.read().iter().cloned().collect()
	}
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;

	use super::*;
	use crate::errors::ExecutionError;

	#[test]
	fn const_refuses_redeclare_and_assign() {
		let s = Scope::root();
		s.declare("x", Value::Float(1.0), true).unwrap();
		assert_matches!(
			s.declare("x", Value::Float(2.0), false),
			Err(ExecutionError::AlreadyDeclared(_))
		);
		assert_matches!(
			s.assign("x", Value::Float(2.0)),
			Err(ExecutionError::ConstAssignment(_))
		);
		assert_matches!(s.get("x"), Some(Value::Float(f)) if f == 1.0);
	}

	#[test]
	fn child_shadowing_is_allowed_across_scopes() {
		let root = Scope::root();
		root.declare("x", Value::Float(1.0), false).unwrap();
		let child = root.child();
		child.declare("x", Value::Float(2.0), false).unwrap();
		assert_matches!(child.get("x"), Some(Value::Float(f)) if f == 2.0);
		assert_matches!(root.get("x"), Some(Value::Float(f)) if f == 1.0);
	}

	#[test]
	fn assign_walks_to_nearest_binding() {
		let root = Scope::root();
		root.declare("x", Value::Float(1.0), false).unwrap();
		let child = root.child();
		child.assign("x", Value::Float(5.0)).unwrap();
		assert_matches!(root.get("x"), Some(Value::Float(f)) if f == 5.0);
	}

	#[test]
	fn frozen_rejects_mutation_allows_reads() {
		let root = Scope::root();
		root.declare("x", Value::Float(1.0), false).unwrap();
		let frozen = root.freeze();
		assert_matches!(
			frozen.declare("y", Value::Null, false),
			Err(ExecutionError::Frozen)
		);
		assert_matches!(frozen.assign("x", Value::Null), Err(ExecutionError::Frozen));
		assert_matches!(frozen.get("x"), Some(Value::Float(f)) if f == 1.0);
	}
}
