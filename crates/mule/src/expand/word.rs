use super::env::Environment;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExpandError {
	#[error("undefined variable: {0}")]
	Undefined(String),
	#[error("cyclic variable reference through {0}")]
	Cycle(String),
	#[error("environment is frozen")]
	Frozen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceMode {
	First,
	All,
	Prefix,
	Suffix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimMode {
	Suffix,
	Prefix,
	LongestSuffix,
	LongestPrefix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
	LowerFirst,
	UpperFirst,
	LowerAll,
	UpperAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackMode {
	/// `${v:-w}`: use `w` when `v` is unset or empty.
	Default,
	/// `${v:=w}`: like Default, and assign the result back to `v`.
	Assign,
	/// `${v:+w}`: use `w` only when `v` is set and non-empty.
	Alternate,
}

/// A node of the deferred string-expression tree. Expansion is pure with
/// respect to the environment it is given; nothing is cached between calls.
#[derive(Debug, Clone, PartialEq)]
pub enum Word {
	Literal(String),
	Variable(String),
	Compound(Vec<Word>),
	Replace {
		word: Box<Word>,
		from: Box<Word>,
		to: Box<Word>,
		mode: ReplaceMode,
	},
	Substring {
		word: Box<Word>,
		start: isize,
		length: Option<isize>,
	},
	Trim {
		word: Box<Word>,
		pattern: Box<Word>,
		mode: TrimMode,
	},
	ChangeCase {
		word: Box<Word>,
		mode: CaseMode,
	},
	Fallback {
		word: Box<Word>,
		other: Box<Word>,
		mode: FallbackMode,
	},
}

impl Word {
	pub fn literal(s: impl Into<String>) -> Word {
		Word::Literal(s.into())
	}

	pub fn variable(name: impl Into<String>) -> Word {
		Word::Variable(name.into())
	}

	/// Flattens single-element compounds while building.
	pub fn compound(mut words: Vec<Word>) -> Word {
		if words.len() == 1 {
			words.remove(0)
		} else {
			Word::Compound(words)
		}
	}

	pub fn expand(&self, env: &Environment) -> Result<String, ExpandError> {
		self.expand_with(env, &mut Vec::new())
	}

	fn expand_with(&self, env: &Environment, resolving: &mut Vec<String>) -> Result<String, ExpandError> {
		match self {
			Word::Literal(s) => Ok(s.clone()),
			Word::Variable(name) => {
				if resolving.iter().any(|n| n == name) {
					return Err(ExpandError::Cycle(name.clone()));
				}
				let word = env
					.lookup(name)
					.ok_or_else(|| ExpandError::Undefined(name.clone()))?;
				resolving.push(name.clone());
				let out = word.expand_with(env, resolving);
				resolving.pop();
				out
			},
			Word::Compound(words) => {
				let mut out = String::new();
				for word in words {
					out.push_str(&word.expand_with(env, resolving)?);
				}
				Ok(out)
			},
			Word::Replace {
				word,
				from,
				to,
				mode,
			} => {
				let value = word.expand_with(env, resolving)?;
				let from = from.expand_with(env, resolving)?;
				let to = to.expand_with(env, resolving)?;
				if from.is_empty() {
					return Ok(value);
				}
				Ok(match mode {
					ReplaceMode::First => value.replacen(&from, &to, 1),
					ReplaceMode::All => value.replace(&from, &to),
					ReplaceMode::Prefix => match value.strip_prefix(&from) {
						Some(rest) => format!("{to}{rest}"),
						None => value,
					},
					ReplaceMode::Suffix => match value.strip_suffix(&from) {
						Some(rest) => format!("{rest}{to}"),
						None => value,
					},
				})
			},
			Word::Substring {
				word,
				start,
				length,
			} => {
				let value = word.expand_with(env, resolving)?;
				let chars: Vec<char> = value.chars().collect();
				let start = if *start < 0 {
					chars.len().saturating_sub((-start) as usize)
				} else {
					(*start as usize).min(chars.len())
				};
				let end = match length {
					None => chars.len(),
					Some(n) if *n < 0 => chars.len().saturating_sub((-n) as usize),
					Some(n) => (start + *n as usize).min(chars.len()),
				};
				if start >= end {
					return Ok(String::new());
				}
				Ok(chars[start..end].iter().collect())
			},
			Word::Trim {
				word,
				pattern,
				mode,
			} => {
				let value = word.expand_with(env, resolving)?;
				let pattern = pattern.expand_with(env, resolving)?;
				if pattern.is_empty() {
					return Ok(value);
				}
				Ok(match mode {
					TrimMode::Suffix => value
						.strip_suffix(&pattern)
						.map(str::to_string)
						.unwrap_or(value),
					TrimMode::Prefix => value
						.strip_prefix(&pattern)
						.map(str::to_string)
						.unwrap_or(value),
					TrimMode::LongestSuffix => {
						let mut out = value.as_str();
						while let Some(rest) = out.strip_suffix(&pattern) {
							out = rest;
						}
						out.to_string()
					},
					TrimMode::LongestPrefix => {
						let mut out = value.as_str();
						while let Some(rest) = out.strip_prefix(&pattern) {
							out = rest;
						}
						out.to_string()
					},
				})
			},
			Word::ChangeCase { word, mode } => {
				let value = word.expand_with(env, resolving)?;
				Ok(match mode {
					CaseMode::LowerAll => value.to_lowercase(),
					CaseMode::UpperAll => value.to_uppercase(),
					CaseMode::LowerFirst => map_first(&value, |c| c.to_lowercase().collect()),
					CaseMode::UpperFirst => map_first(&value, |c| c.to_uppercase().collect()),
				})
			},
			Word::Fallback { word, other, mode } => {
				// A fallback tolerates an unset variable underneath it.
				let value = match word.expand_with(env, resolving) {
					Ok(v) => Some(v),
					Err(ExpandError::Undefined(_)) => None,
					Err(e) => return Err(e),
				};
				let set = value.as_deref().is_some_and(|v| !v.is_empty());
				match mode {
					FallbackMode::Default | FallbackMode::Assign => {
						if set {
							return Ok(value.unwrap_or_default());
						}
						let fallback = other.expand_with(env, resolving)?;
						if *mode == FallbackMode::Assign
							&& let Word::Variable(name) = word.as_ref()
						{
							env
								.assign_or_define(name, Word::Literal(fallback.clone()))
								.map_err(|_| ExpandError::Frozen)?;
						}
						Ok(fallback)
					},
					FallbackMode::Alternate => {
						if set {
							other.expand_with(env, resolving)
						} else {
							Ok(String::new())
						}
					},
				}
			},
		}
	}
}

fn map_first(s: &str, f: impl Fn(char) -> String) -> String {
	let mut chars = s.chars();
	match chars.next() {
		Some(first) => format!("{}{}", f(first), chars.as_str()),
		None => String::new(),
	}
}

impl From<&str> for Word {
	fn from(s: &str) -> Word {
		Word::Literal(s.to_string())
	}
}

impl From<String> for Word {
	fn from(s: String) -> Word {
		Word::Literal(s)
	}
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;

	use super::*;

	fn env_with(pairs: &[(&str, Word)]) -> Environment {
		let env = Environment::root();
		for (name, word) in pairs {
			env.define(name, word.clone()).unwrap();
		}
		env
	}

	#[test]
	fn literal_and_compound() {
		let env = Environment::root();
		assert_eq!(Word::literal("abc").expand(&env).unwrap(), "abc");
		let w = Word::compound(vec![Word::literal("a"), Word::literal("b")]);
		assert_eq!(w.expand(&env).unwrap(), "ab");
	}

	#[test]
	fn variables_resolve_recursively() {
		let env = env_with(&[
			("host", Word::literal("example.com")),
			(
				"base",
				Word::compound(vec![Word::literal("http://"), Word::variable("host")]),
			),
		]);
		assert_eq!(Word::variable("base").expand(&env).unwrap(), "http://example.com");
	}

	#[test]
	fn expansion_is_pure() {
		let env = env_with(&[("x", Word::literal("v"))]);
		let w = Word::compound(vec![Word::variable("x"), Word::literal("!")]);
		let first = w.expand(&env).unwrap();
		let second = w.expand(&env).unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn cycles_are_detected() {
		let env = env_with(&[
			("a", Word::variable("b")),
			("b", Word::variable("a")),
		]);
		assert_matches!(
			Word::variable("a").expand(&env),
			Err(ExpandError::Cycle(_))
		);
	}

	#[test]
	fn undefined_variable_errors() {
		let env = Environment::root();
		assert_matches!(
			Word::variable("ghost").expand(&env),
			Err(ExpandError::Undefined(name)) if name == "ghost"
		);
	}

	#[test]
	fn replace_modes() {
		let env = Environment::root();
		let mk = |mode| Word::Replace {
			word: Box::new(Word::literal("a-b-a")),
			from: Box::new(Word::literal("a")),
			to: Box::new(Word::literal("x")),
			mode,
		};
		assert_eq!(mk(ReplaceMode::First).expand(&env).unwrap(), "x-b-a");
		assert_eq!(mk(ReplaceMode::All).expand(&env).unwrap(), "x-b-x");
		assert_eq!(mk(ReplaceMode::Prefix).expand(&env).unwrap(), "x-b-a");
		assert_eq!(mk(ReplaceMode::Suffix).expand(&env).unwrap(), "a-b-x");
	}

	#[test]
	fn trim_modes() {
		let env = Environment::root();
		let mk = |value: &str, mode| Word::Trim {
			word: Box::new(Word::literal(value)),
			pattern: Box::new(Word::literal("ab")),
			mode,
		};
		assert_eq!(mk("ababX", TrimMode::Prefix).expand(&env).unwrap(), "abX");
		assert_eq!(mk("ababX", TrimMode::LongestPrefix).expand(&env).unwrap(), "X");
		assert_eq!(mk("Xabab", TrimMode::Suffix).expand(&env).unwrap(), "Xab");
		assert_eq!(mk("Xabab", TrimMode::LongestSuffix).expand(&env).unwrap(), "X");
	}

	#[test]
	fn substring_bounds() {
		let env = Environment::root();
		let mk = |start, length| Word::Substring {
			word: Box::new(Word::literal("hello")),
			start,
			length,
		};
		assert_eq!(mk(1, Some(3)).expand(&env).unwrap(), "ell");
		assert_eq!(mk(0, None).expand(&env).unwrap(), "hello");
		assert_eq!(mk(-3, None).expand(&env).unwrap(), "llo");
		assert_eq!(mk(9, None).expand(&env).unwrap(), "");
	}

	#[test]
	fn change_case() {
		let env = Environment::root();
		let mk = |mode| Word::ChangeCase {
			word: Box::new(Word::literal("hello World")),
			mode,
		};
		assert_eq!(mk(CaseMode::UpperAll).expand(&env).unwrap(), "HELLO WORLD");
		assert_eq!(mk(CaseMode::LowerAll).expand(&env).unwrap(), "hello world");
		assert_eq!(mk(CaseMode::UpperFirst).expand(&env).unwrap(), "Hello World");
		assert_eq!(mk(CaseMode::LowerFirst).expand(&env).unwrap(), "hello World");
	}

	#[test]
	fn fallback_default_and_assign() {
		let env = env_with(&[("set", Word::literal("v"))]);
		let default = Word::Fallback {
			word: Box::new(Word::variable("unset")),
			other: Box::new(Word::literal("fb")),
			mode: FallbackMode::Default,
		};
		assert_eq!(default.expand(&env).unwrap(), "fb");
		// Default does not write back.
		assert!(env.lookup("unset").is_none());

		let assign = Word::Fallback {
			word: Box::new(Word::variable("unset")),
			other: Box::new(Word::literal("fb")),
			mode: FallbackMode::Assign,
		};
		assert_eq!(assign.expand(&env).unwrap(), "fb");
		assert_eq!(Word::variable("unset").expand(&env).unwrap(), "fb");

		let alternate = Word::Fallback {
			word: Box::new(Word::variable("set")),
			other: Box::new(Word::literal("alt")),
			mode: FallbackMode::Alternate,
		};
		assert_eq!(alternate.expand(&env).unwrap(), "alt");
	}

	#[test]
	fn round_trip_through_literal() {
		let env = env_with(&[("x", Word::literal("42"))]);
		let w = Word::compound(vec![Word::literal("n="), Word::variable("x")]);
		let once = w.expand(&env).unwrap();
		assert_eq!(Word::literal(once.clone()).expand(&env).unwrap(), once);
	}
}
