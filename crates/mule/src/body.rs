use crate::expand::{Environment, ExpandError, Set, Word};

#[derive(thiserror::Error, Debug)]
pub enum BodyError {
	#[error(transparent)]
	Expand(#[from] ExpandError),
	#[error("json body: {0}")]
	Json(#[from] serde_json::Error),
}

/// Request payload strategies. Each expands to the final byte payload and
/// names the `Content-Type` it implies.
#[derive(Debug, Clone)]
pub enum Body {
	Json(Set),
	Xml(Set),
	UrlEncoded(Set),
	Text(Word),
	Octet(Word),
}

impl Body {
	pub fn content_type(&self) -> &'static str {
		match self {
			Body::Json(_) => "application/json",
			Body::Xml(_) => "application/xml",
			Body::UrlEncoded(_) => "application/x-www-form-urlencoded",
			Body::Text(_) => "text/plain",
			Body::Octet(_) => "application/octet-stream",
		}
	}

	pub fn expand(&self, env: &Environment) -> Result<String, BodyError> {
		match self {
			Body::Json(set) => {
				let mut object = serde_json::Map::new();
				for (key, values) in set.multi_map(env)? {
					// A single value is a scalar; two or more become an array.
					let value = if values.len() == 1 {
						scalar(&values[0])
					} else {
						serde_json::Value::Array(values.iter().map(|v| scalar(v)).collect())
					};
					object.insert(key, value);
				}
				Ok(serde_json::to_string(&serde_json::Value::Object(object))?)
			},
			Body::Xml(set) => {
				let mut out = String::new();
				for (key, value) in set.pairs(env)? {
					out.push('<');
					out.push_str(&key);
					out.push('>');
					out.push_str(&escape_xml(&value));
					out.push_str("</");
					out.push_str(&key);
					out.push('>');
				}
				Ok(out)
			},
			Body::UrlEncoded(set) => Ok(set.form_encoded(env)?),
			Body::Text(word) => Ok(word.expand(env)?),
			Body::Octet(word) => Ok(word.expand(env)?),
		}
	}
}

/// Values that read as canonical JSON numbers, booleans or null are emitted
/// unquoted; anything else is a JSON string. Values like "01234" that would
/// not round-trip stay strings. Callers needing nested structure embed JSON
/// literal strings instead.
fn scalar(raw: &str) -> serde_json::Value {
	match raw {
		"true" => return serde_json::Value::Bool(true),
		"false" => return serde_json::Value::Bool(false),
		"null" => return serde_json::Value::Null,
		_ => {},
	}
	if let Ok(n) = raw.parse::<i64>()
		&& n.to_string() == raw
	{
		return serde_json::Value::from(n);
	}
	if let Ok(f) = raw.parse::<f64>()
		&& f.to_string() == raw
		&& let Some(n) = serde_json::Number::from_f64(f)
	{
		return serde_json::Value::Number(n);
	}
	serde_json::Value::String(raw.to_string())
}

fn escape_xml(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&apos;"),
			other => out.push(other),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn set(pairs: &[(&str, &str)]) -> Set {
		let mut s = Set::new();
		for (k, v) in pairs {
			s.add(*k, Word::literal(*v));
		}
		s
	}

	#[test]
	fn json_scalars_and_arrays() {
		let env = Environment::root();
		let mut s = set(&[("name", "mule"), ("count", "5")]);
		s.add("tags", Word::literal("a"));
		s.add("tags", Word::literal("b"));
		let body = Body::Json(s).expand(&env).unwrap();
		assert_eq!(body, r#"{"name":"mule","count":5,"tags":["a","b"]}"#);
	}

	#[test]
	fn json_embedded_literals_stay_strings() {
		let env = Environment::root();
		let s = set(&[("zip", "01234")]);
		// Leading-zero values must not collapse into numbers.
		let body = Body::Json(s).expand(&env).unwrap();
		assert_eq!(body, r#"{"zip":"01234"}"#);
	}

	#[test]
	fn xml_elements_escape_content() {
		let env = Environment::root();
		let s = set(&[("q", "a<b&c")]);
		assert_eq!(Body::Xml(s).expand(&env).unwrap(), "<q>a&lt;b&amp;c</q>");
	}

	#[test]
	fn urlencoded_keeps_order() {
		let env = Environment::root();
		let s = set(&[("b", "2"), ("a", "1 x")]);
		assert_eq!(Body::UrlEncoded(s).expand(&env).unwrap(), "b=2&a=1+x");
	}

	#[test]
	fn content_types() {
		assert_eq!(Body::Json(Set::new()).content_type(), "application/json");
		assert_eq!(Body::Text(Word::literal("")).content_type(), "text/plain");
		assert_eq!(
			Body::UrlEncoded(Set::new()).content_type(),
			"application/x-www-form-urlencoded"
		);
	}
}
