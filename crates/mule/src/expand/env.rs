use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::word::Word;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EnvError {
	#[error("cannot redefine constant {0}")]
	ConstRedefinition(String),
	#[error("cannot assign to constant {0}")]
	ConstAssignment(String),
	#[error("undefined variable: {0}")]
	Undefined(String),
	#[error("environment is frozen")]
	Frozen,
}

/// Parent-chained symbol table holding deferred [`Word`] values. Cloning
/// shares the bindings; lookups walk to the root.
#[derive(Debug, Clone)]
pub struct Environment(Arc<EnvInner>);

#[derive(Debug)]
struct EnvInner {
	parent: Option<Environment>,
	vars: RwLock<HashMap<String, Entry>>,
	frozen: bool,
}

#[derive(Debug)]
struct Entry {
	word: Word,
	constant: bool,
}

impl Default for Environment {
	fn default() -> Self {
		Self::root()
	}
}

impl Environment {
	pub fn root() -> Environment {
		Environment(Arc::new(EnvInner {
			parent: None,
			vars: RwLock::new(HashMap::new()),
			frozen: false,
		}))
	}

	pub fn child(&self) -> Environment {
		Environment(Arc::new(EnvInner {
			parent: Some(self.clone()),
			vars: RwLock::new(HashMap::new()),
			frozen: false,
		}))
	}

	/// A decorator over `self` that rejects every mutating operation with a
	/// single error; reads pass through.
	pub fn freeze(&self) -> Environment {
		Environment(Arc::new(EnvInner {
			parent: Some(self.clone()),
			vars: RwLock::new(HashMap::new()),
			frozen: true,
		}))
	}

	/// Defines `name` in this scope, overwriting an existing mutable binding.
	/// Redefining a constant is an error.
	pub fn define(&self, name: &str, word: Word) -> Result<(), EnvError> {
		self.define_entry(name, word, false)
	}

	pub fn define_const(&self, name: &str, word: Word) -> Result<(), EnvError> {
		self.define_entry(name, word, true)
	}

	fn define_entry(&self, name: &str, word: Word, constant: bool) -> Result<(), EnvError> {
		if self.0.frozen {
			return Err(EnvError::Frozen);
		}
		let mut vars = self.0.vars.write();
		if let Some(existing) = vars.get(name)
			&& existing.constant
		{
			return Err(EnvError::ConstRedefinition(name.to_string()));
		}
		vars.insert(name.to_string(), Entry { word, constant });
		Ok(())
	}

	/// Redefines the nearest binding; fails on constants and on an
	/// undefined name. A frozen decorator on the walk rejects the write.
	pub fn assign(&self, name: &str, word: Word) -> Result<(), EnvError> {
		let mut env = Some(self.clone());
		while let Some(e) = env {
			{
				let mut vars = e.0.vars.write();
				if let Some(entry) = vars.get_mut(name) {
					if entry.constant {
						return Err(EnvError::ConstAssignment(name.to_string()));
					}
					entry.word = word;
					return Ok(());
				}
			}
			if e.0.frozen {
				return Err(EnvError::Frozen);
			}
			env = e.0.parent.clone();
		}
		Err(EnvError::Undefined(name.to_string()))
	}

	/// Assigns the nearest binding, or defines in this scope when the name
	/// is nowhere bound (`${v:=w}` and the flow `set` command).
	pub fn assign_or_define(&self, name: &str, word: Word) -> Result<(), EnvError> {
		match self.assign(name, word.clone()) {
			Err(EnvError::Undefined(_)) => self.define(name, word),
			other => other,
		}
	}

	/// Removes the nearest binding; a no-op when the name is unbound.
	pub fn unset(&self, name: &str) -> Result<(), EnvError> {
		let mut env = Some(self.clone());
		while let Some(e) = env {
			{
				let mut vars = e.0.vars.write();
				if vars.remove(name).is_some() {
					return Ok(());
				}
			}
			if e.0.frozen {
				return Err(EnvError::Frozen);
			}
			env = e.0.parent.clone();
		}
		Ok(())
	}

	/// Resolves `name` through the chain.
	pub fn lookup(&self, name: &str) -> Option<Word> {
		let mut env = Some(self.clone());
		while let Some(e) = env {
			if let Some(entry) = e.0.vars.read().get(name) {
				return Some(entry.word.clone());
			}
			env = e.0.parent.clone();
		}
		None
	}

	pub fn resolve(&self, name: &str) -> Result<Word, EnvError> {
		self
			.lookup(name)
			.ok_or_else(|| EnvError::Undefined(name.to_string()))
	}

	pub fn has(&self, name: &str) -> bool {
		self.lookup(name).is_some()
	}

	/// Names bound in this scope only.
	pub fn local_names(&self) -> Vec<String> {
		self.0.vars.read().keys().cloned().collect()
	}
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;

	use super::*;

	#[test]
	fn define_resolves_and_const_refuses() {
		let env = Environment::root();
		env.define_const("x", Word::literal("1")).unwrap();
		assert_matches!(
			env.define("x", Word::literal("2")),
			Err(EnvError::ConstRedefinition(_))
		);
		assert_eq!(Word::variable("x").expand(&env).unwrap(), "1");
	}

	#[test]
	fn assign_rebinds_nearest() {
		let root = Environment::root();
		root.define("x", Word::literal("1")).unwrap();
		let child = root.child();
		child.assign("x", Word::literal("2")).unwrap();
		assert_eq!(Word::variable("x").expand(&root).unwrap(), "2");
	}

	#[test]
	fn frozen_rejects_mutations_allows_reads() {
		let root = Environment::root();
		root.define("x", Word::literal("1")).unwrap();
		let frozen = root.freeze();
		assert_matches!(frozen.define("y", Word::literal("2")), Err(EnvError::Frozen));
		assert_matches!(
			frozen.assign("x", Word::literal("2")),
			Err(EnvError::Frozen)
		);
		assert_matches!(frozen.unset("x"), Err(EnvError::Frozen));
		assert_eq!(Word::variable("x").expand(&frozen).unwrap(), "1");
	}

	#[test]
	fn unset_removes_nearest() {
		let env = Environment::root();
		env.define("x", Word::literal("1")).unwrap();
		env.unset("x").unwrap();
		assert!(!env.has("x"));
		// Unsetting an unbound name is fine.
		env.unset("x").unwrap();
	}
}
