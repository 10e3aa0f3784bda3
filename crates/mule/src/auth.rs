use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use jsonwebtoken::{Algorithm, EncodingKey, Header};

use crate::expand::{Environment, ExpandError, Set, Word};

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
	#[error(transparent)]
	Expand(#[from] ExpandError),
	#[error("unknown jwt algorithm {0:?}")]
	Algorithm(String),
	#[error("jwt signing: {0}")]
	Sign(#[from] jsonwebtoken::errors::Error),
}

/// Authorization strategies. The resolved strategy turns into an
/// `Authorization` header at request-build time.
#[derive(Debug, Clone)]
pub enum Authorization {
	Basic { username: Word, password: Word },
	Bearer { token: Word },
	Jwt(JwtAuth),
}

#[derive(Debug, Clone)]
pub struct JwtAuth {
	pub alg: Option<Word>,
	pub secret: Word,
	pub claims: Set,
}

impl Authorization {
	/// The value of the `Authorization` header this strategy emits.
	pub fn header_value(&self, env: &Environment) -> Result<String, AuthError> {
		match self {
			Authorization::Basic { username, password } => {
				let user = username.expand(env)?;
				let pass = password.expand(env)?;
				let credentials = BASE64_STANDARD.encode(format!("{user}:{pass}"));
				Ok(format!("Basic {credentials}"))
			},
			Authorization::Bearer { token } => Ok(format!("Bearer {}", token.expand(env)?)),
			Authorization::Jwt(jwt) => Ok(format!("Bearer {}", jwt.encode(env)?)),
		}
	}

	/// Expanded username, when the strategy carries one.
	pub fn username(&self, env: &Environment) -> Result<Option<String>, AuthError> {
		match self {
			Authorization::Basic { username, .. } => Ok(Some(username.expand(env)?)),
			_ => Ok(None),
		}
	}

	pub fn password(&self, env: &Environment) -> Result<Option<String>, AuthError> {
		match self {
			Authorization::Basic { password, .. } => Ok(Some(password.expand(env)?)),
			_ => Ok(None),
		}
	}

	/// Expanded bearer token (for JWT, the signed token).
	pub fn token(&self, env: &Environment) -> Result<Option<String>, AuthError> {
		match self {
			Authorization::Bearer { token } => Ok(Some(token.expand(env)?)),
			Authorization::Jwt(jwt) => Ok(Some(jwt.encode(env)?)),
			Authorization::Basic { .. } => Ok(None),
		}
	}
}

impl JwtAuth {
	/// Signs the claim bag. Claim values that read as JSON numbers or
	/// booleans are encoded as such, so `exp`/`iat` stay numeric.
	pub fn encode(&self, env: &Environment) -> Result<String, AuthError> {
		let alg = match &self.alg {
			Some(word) => {
				let name = word.expand(env)?;
				name
					.parse::<Algorithm>()
					.map_err(|_| AuthError::Algorithm(name))?
			},
			None => Algorithm::HS256,
		};
		let mut claims = serde_json::Map::new();
		for (key, value) in self.claims.map(env)? {
			claims.insert(key, claim_value(&value));
		}
		let secret = self.secret.expand(env)?;
		let token = jsonwebtoken::encode(
			&Header::new(alg),
			&serde_json::Value::Object(claims),
			&EncodingKey::from_secret(secret.as_bytes()),
		)?;
		Ok(token)
	}
}

fn claim_value(raw: &str) -> serde_json::Value {
	if let Ok(n) = raw.parse::<i64>() {
		return serde_json::Value::from(n);
	}
	if let Ok(f) = raw.parse::<f64>() {
		return serde_json::Value::from(f);
	}
	match raw {
		"true" => serde_json::Value::Bool(true),
		"false" => serde_json::Value::Bool(false),
		_ => serde_json::Value::String(raw.to_string()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::expand::Word;

	#[test]
	fn basic_encodes_credentials() {
		let env = Environment::root();
		let auth = Authorization::Basic {
			username: Word::literal("foo"),
			password: Word::literal("bar"),
		};
		assert_eq!(auth.header_value(&env).unwrap(), "Basic Zm9vOmJhcg==");
	}

	#[test]
	fn bearer_passes_token_through() {
		let env = Environment::root();
		env.define("tok", Word::literal("abc123")).unwrap();
		let auth = Authorization::Bearer {
			token: Word::variable("tok"),
		};
		assert_eq!(auth.header_value(&env).unwrap(), "Bearer abc123");
	}

	#[test]
	fn jwt_hs256_round_trips() {
		let env = Environment::root();
		let mut claims = Set::new();
		claims.add("sub", Word::literal("mule"));
		claims.add("exp", Word::literal("4102444800"));
		let auth = Authorization::Jwt(JwtAuth {
			alg: None,
			secret: Word::literal("s3cret"),
			claims,
		});
		let header = auth.header_value(&env).unwrap();
		let token = header.strip_prefix("Bearer ").unwrap();

		let mut validation = jsonwebtoken::Validation::new(Algorithm::HS256);
		validation.set_required_spec_claims(&["exp"]);
		let decoded = jsonwebtoken::decode::<serde_json::Value>(
			token,
			&jsonwebtoken::DecodingKey::from_secret(b"s3cret"),
			&validation,
		)
		.unwrap();
		assert_eq!(decoded.claims["sub"], "mule");
		assert_eq!(decoded.claims["exp"], 4102444800i64);
	}

	#[test]
	fn unknown_algorithm_is_reported() {
		let env = Environment::root();
		let auth = JwtAuth {
			alg: Some(Word::literal("XX999")),
			secret: Word::literal("k"),
			claims: Set::new(),
		};
		assert!(matches!(auth.encode(&env), Err(AuthError::Algorithm(_))));
	}
}
