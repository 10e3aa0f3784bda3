use http::header::{HeaderMap, HeaderName, HeaderValue};
use indexmap::IndexMap;

use super::env::Environment;
use super::word::{ExpandError, Word};

#[derive(thiserror::Error, Debug)]
pub enum SetError {
	#[error(transparent)]
	Expand(#[from] ExpandError),
	#[error("invalid header name {0:?}")]
	HeaderName(String),
	#[error("invalid header value for {0}")]
	HeaderValue(String),
}

/// An ordered multimap of deferred values. Keys are case-preserved and keep
/// their first-insertion position; duplicate keys accumulate values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Set {
	entries: IndexMap<String, Vec<Word>>,
}

impl Set {
	pub fn new() -> Set {
		Set::default()
	}

	pub fn add(&mut self, key: impl Into<String>, word: Word) {
		self.entries.entry(key.into()).or_default().push(word);
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn get(&self, key: &str) -> &[Word] {
		self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn contains(&self, key: &str) -> bool {
		self.entries.contains_key(key)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &[Word])> {
		self
			.entries
			.iter()
			.map(|(k, v)| (k.as_str(), v.as_slice()))
	}

	/// Union: for each key the result carries `self`'s values followed by
	/// `other`'s; keys only in one side appear unchanged. `self` keys keep
	/// their positions, keys new in `other` append in `other`'s order.
	pub fn merge(&self, other: &Set) -> Set {
		let mut out = self.clone();
		for (key, words) in &other.entries {
			out.entries.entry(key.clone()).or_default().extend(words.iter().cloned());
		}
		out
	}

	/// Expands every value into flat `(key, value)` pairs, insertion order
	/// preserved, duplicates kept.
	pub fn pairs(&self, env: &Environment) -> Result<Vec<(String, String)>, ExpandError> {
		let mut out = Vec::new();
		for (key, words) in &self.entries {
			for word in words {
				out.push((key.clone(), word.expand(env)?));
			}
		}
		Ok(out)
	}

	/// Expands into HTTP headers; duplicate keys become repeated header
	/// fields.
	pub fn header(&self, env: &Environment) -> Result<HeaderMap, SetError> {
		let mut out = HeaderMap::new();
		for (key, value) in self.pairs(env)? {
			let name: HeaderName = key
				.parse()
				.map_err(|_| SetError::HeaderName(key.clone()))?;
			let value: HeaderValue = value
				.parse()
				.map_err(|_| SetError::HeaderValue(key.clone()))?;
			out.append(name, value);
		}
		Ok(out)
	}

	/// Expands into query pairs, insertion order preserved.
	pub fn query(&self, env: &Environment) -> Result<Vec<(String, String)>, ExpandError> {
		self.pairs(env)
	}

	/// Expands into a flat map; for duplicated keys the first value wins.
	pub fn map(&self, env: &Environment) -> Result<IndexMap<String, String>, ExpandError> {
		let mut out = IndexMap::new();
		for (key, value) in self.pairs(env)? {
			out.entry(key).or_insert(value);
		}
		Ok(out)
	}

	/// Expands into a multi-valued map, insertion order preserved.
	pub fn multi_map(&self, env: &Environment) -> Result<IndexMap<String, Vec<String>>, ExpandError> {
		let mut out: IndexMap<String, Vec<String>> = IndexMap::new();
		for (key, value) in self.pairs(env)? {
			out.entry(key).or_default().push(value);
		}
		Ok(out)
	}

	/// Expands into an `application/x-www-form-urlencoded` payload.
	pub fn form_encoded(&self, env: &Environment) -> Result<String, ExpandError> {
		let pairs = self.pairs(env)?;
		Ok(serde_urlencoded::to_string(&pairs).unwrap_or_default())
	}
}

impl FromIterator<(String, Word)> for Set {
	fn from_iter<T: IntoIterator<Item = (String, Word)>>(iter: T) -> Self {
		let mut set = Set::new();
		for (k, w) in iter {
			set.add(k, w);
		}
		set
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn set(pairs: &[(&str, &str)]) -> Set {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), Word::literal(*v)))
			.collect()
	}

	#[test]
	fn insertion_order_and_duplicates() {
		let mut s = Set::new();
		s.add("b", Word::literal("1"));
		s.add("a", Word::literal("2"));
		s.add("b", Word::literal("3"));
		let env = Environment::root();
		assert_eq!(
			s.pairs(&env).unwrap(),
			vec![
				("b".to_string(), "1".to_string()),
				("b".to_string(), "3".to_string()),
				("a".to_string(), "2".to_string()),
			]
		);
	}

	#[test]
	fn merge_concatenates_per_key() {
		let a = set(&[("k", "a1"), ("only-a", "x")]);
		let b = set(&[("k", "b1"), ("only-b", "y")]);
		let merged = a.merge(&b);
		let env = Environment::root();
		let pairs = merged.pairs(&env).unwrap();
		assert_eq!(
			pairs,
			vec![
				("k".to_string(), "a1".to_string()),
				("k".to_string(), "b1".to_string()),
				("only-a".to_string(), "x".to_string()),
				("only-b".to_string(), "y".to_string()),
			]
		);
	}

	#[test]
	fn header_projection_repeats_fields() {
		let s = set(&[("Accept", "text/plain"), ("Accept", "application/json")]);
		let env = Environment::root();
		let headers = s.header(&env).unwrap();
		let got: Vec<_> = headers.get_all("accept").iter().collect();
		assert_eq!(got.len(), 2);
	}

	#[test]
	fn form_encoding_percent_escapes() {
		let s = set(&[("q", "a b"), ("x", "1&2")]);
		let env = Environment::root();
		assert_eq!(s.form_encoded(&env).unwrap(), "q=a+b&x=1%262");
	}

	#[test]
	fn case_preserved_keys() {
		let s = set(&[("X-Token", "t")]);
		assert!(s.contains("X-Token"));
		assert!(!s.contains("x-token"));
	}
}
