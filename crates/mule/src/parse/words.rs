use crate::expand::{CaseMode, FallbackMode, ReplaceMode, TrimMode, Word};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct WordError {
	pub message: String,
}

fn err(message: impl Into<String>) -> WordError {
	WordError {
		message: message.into(),
	}
}

/// Parses a raw text segment into a [`Word`], honoring `$var`, `${…}` and
/// the POSIX-style substitution forms.
pub fn parse_word(raw: &str) -> Result<Word, WordError> {
	let chars: Vec<char> = raw.chars().collect();
	let mut pos = 0;
	let word = parse_until(&chars, &mut pos, &[])?;
	if pos != chars.len() {
		return Err(err(format!("trailing characters in {raw:?}")));
	}
	Ok(word)
}

fn parse_until(chars: &[char], pos: &mut usize, stop: &[char]) -> Result<Word, WordError> {
	let mut parts = Vec::new();
	let mut lit = String::new();
	while *pos < chars.len() {
		let c = chars[*pos];
		if stop.contains(&c) {
			break;
		}
		match c {
			'\\' if *pos + 1 < chars.len() => {
				lit.push(chars[*pos + 1]);
				*pos += 2;
			},
			'$' => {
				if !lit.is_empty() {
					parts.push(Word::Literal(std::mem::take(&mut lit)));
				}
				*pos += 1;
				parts.push(parse_reference(chars, pos)?);
			},
			other => {
				lit.push(other);
				*pos += 1;
			},
		}
	}
	if !lit.is_empty() {
		parts.push(Word::Literal(lit));
	}
	if parts.is_empty() {
		parts.push(Word::Literal(String::new()));
	}
	Ok(Word::compound(parts))
}

fn parse_reference(chars: &[char], pos: &mut usize) -> Result<Word, WordError> {
	if *pos >= chars.len() {
		return Err(err("dangling $"));
	}
	if chars[*pos] != '{' {
		let name = take_ident(chars, pos);
		if name.is_empty() {
			return Err(err("empty variable name after $"));
		}
		return Ok(Word::Variable(name));
	}
	*pos += 1;
	let name = take_ident(chars, pos);
	if name.is_empty() {
		return Err(err("empty variable name in ${…}"));
	}
	let base = Word::Variable(name.clone());
	let word = match peek(chars, *pos) {
		Some('}') => base,
		Some(':') => {
			*pos += 1;
			match peek(chars, *pos) {
				Some('-') => {
					*pos += 1;
					let other = parse_until(chars, pos, &['}'])?;
					Word::Fallback {
						word: Box::new(base),
						other: Box::new(other),
						mode: FallbackMode::Default,
					}
				},
				Some('=') => {
					*pos += 1;
					let other = parse_until(chars, pos, &['}'])?;
					Word::Fallback {
						word: Box::new(base),
						other: Box::new(other),
						mode: FallbackMode::Assign,
					}
				},
				Some('+') => {
					*pos += 1;
					let other = parse_until(chars, pos, &['}'])?;
					Word::Fallback {
						word: Box::new(base),
						other: Box::new(other),
						mode: FallbackMode::Alternate,
					}
				},
				_ => {
					// ${name:offset} or ${name:offset:length}
					let start = take_number(chars, pos).ok_or_else(|| err("expected offset"))?;
					let length = if peek(chars, *pos) == Some(':') {
						*pos += 1;
						Some(take_number(chars, pos).ok_or_else(|| err("expected length"))?)
					} else {
						None
					};
					Word::Substring {
						word: Box::new(base),
						start,
						length,
					}
				},
			}
		},
		Some('#') => {
			*pos += 1;
			let mode = if peek(chars, *pos) == Some('#') {
				*pos += 1;
				TrimMode::LongestPrefix
			} else {
				TrimMode::Prefix
			};
			let pattern = parse_until(chars, pos, &['}'])?;
			Word::Trim {
				word: Box::new(base),
				pattern: Box::new(pattern),
				mode,
			}
		},
		Some('%') => {
			*pos += 1;
			let mode = if peek(chars, *pos) == Some('%') {
				*pos += 1;
				TrimMode::LongestSuffix
			} else {
				TrimMode::Suffix
			};
			let pattern = parse_until(chars, pos, &['}'])?;
			Word::Trim {
				word: Box::new(base),
				pattern: Box::new(pattern),
				mode,
			}
		},
		Some('/') => {
			*pos += 1;
			let mode = match peek(chars, *pos) {
				Some('/') => {
					*pos += 1;
					ReplaceMode::All
				},
				Some('#') => {
					*pos += 1;
					ReplaceMode::Prefix
				},
				Some('%') => {
					*pos += 1;
					ReplaceMode::Suffix
				},
				_ => ReplaceMode::First,
			};
			let from = parse_until(chars, pos, &['/', '}'])?;
			let to = if peek(chars, *pos) == Some('/') {
				*pos += 1;
				parse_until(chars, pos, &['}'])?
			} else {
				Word::Literal(String::new())
			};
			Word::Replace {
				word: Box::new(base),
				from: Box::new(from),
				to: Box::new(to),
				mode,
			}
		},
		Some(',') => {
			*pos += 1;
			let mode = if peek(chars, *pos) == Some(',') {
				*pos += 1;
				CaseMode::LowerAll
			} else {
				CaseMode::LowerFirst
			};
			Word::ChangeCase {
				word: Box::new(base),
				mode,
			}
		},
		Some('^') => {
			*pos += 1;
			let mode = if peek(chars, *pos) == Some('^') {
				*pos += 1;
				CaseMode::UpperAll
			} else {
				CaseMode::UpperFirst
			};
			Word::ChangeCase {
				word: Box::new(base),
				mode,
			}
		},
		Some(other) => return Err(err(format!("unexpected {other:?} in ${{{name}…}}"))),
		None => return Err(err("unterminated ${…}")),
	};
	if peek(chars, *pos) != Some('}') {
		return Err(err("unterminated ${…}"));
	}
	*pos += 1;
	Ok(word)
}

fn peek(chars: &[char], pos: usize) -> Option<char> {
	chars.get(pos).copied()
}

fn take_ident(chars: &[char], pos: &mut usize) -> String {
	let mut out = String::new();
	while let Some(c) = peek(chars, *pos) {
		if c.is_ascii_alphanumeric() || c == '_' {
			out.push(c);
			*pos += 1;
		} else {
			break;
		}
	}
	out
}

fn take_number(chars: &[char], pos: &mut usize) -> Option<isize> {
	let mut out = String::new();
	if peek(chars, *pos) == Some('-') {
		out.push('-');
		*pos += 1;
	}
	while let Some(c) = peek(chars, *pos) {
		if c.is_ascii_digit() {
			out.push(c);
			*pos += 1;
		} else {
			break;
		}
	}
	out.parse().ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::expand::Environment;

	fn expand(raw: &str, pairs: &[(&str, &str)]) -> String {
		let env = Environment::root();
		for (k, v) in pairs {
			env.define(k, Word::literal(*v)).unwrap();
		}
		parse_word(raw).unwrap().expand(&env).unwrap()
	}

	#[test]
	fn plain_and_variable() {
		assert_eq!(expand("hello", &[]), "hello");
		assert_eq!(expand("$a/$b", &[("a", "1"), ("b", "2")]), "1/2");
		assert_eq!(expand("pre${x}post", &[("x", "-")]), "pre-post");
	}

	#[test]
	fn fallbacks() {
		assert_eq!(expand("${missing:-fb}", &[]), "fb");
		assert_eq!(expand("${x:-fb}", &[("x", "v")]), "v");
		assert_eq!(expand("${x:+alt}", &[("x", "v")]), "alt");
		assert_eq!(expand("${missing:+alt}", &[]), "");
	}

	#[test]
	fn substring_offsets() {
		assert_eq!(expand("${x:1}", &[("x", "hello")]), "ello");
		assert_eq!(expand("${x:1:3}", &[("x", "hello")]), "ell");
		assert_eq!(expand("${x:-3}", &[("x", "hello")]), "hello");
	}

	#[test]
	fn trims() {
		assert_eq!(expand("${x#ab}", &[("x", "ababX")]), "abX");
		assert_eq!(expand("${x##ab}", &[("x", "ababX")]), "X");
		assert_eq!(expand("${x%ab}", &[("x", "Xabab")]), "Xab");
		assert_eq!(expand("${x%%ab}", &[("x", "Xabab")]), "X");
	}

	#[test]
	fn replaces() {
		assert_eq!(expand("${x/a/o}", &[("x", "banana")]), "bonana");
		assert_eq!(expand("${x//a/o}", &[("x", "banana")]), "bonono");
		assert_eq!(expand("${x/#ba/BA}", &[("x", "banana")]), "BAnana");
		assert_eq!(expand("${x/%na/NA}", &[("x", "banana")]), "banaNA");
		assert_eq!(expand("${x//an/}", &[("x", "banana")]), "ba");
	}

	#[test]
	fn case_changes() {
		assert_eq!(expand("${x^}", &[("x", "ab")]), "Ab");
		assert_eq!(expand("${x^^}", &[("x", "ab")]), "AB");
		assert_eq!(expand("${x,}", &[("x", "AB")]), "aB");
		assert_eq!(expand("${x,,}", &[("x", "AB")]), "ab");
	}

	#[test]
	fn escapes_protect_dollars() {
		assert_eq!(expand(r"a\$b", &[]), "a$b");
	}

	#[test]
	fn malformed_references_error() {
		assert!(parse_word("${").is_err());
		assert!(parse_word("${x").is_err());
		assert!(parse_word("$").is_err());
	}
}
