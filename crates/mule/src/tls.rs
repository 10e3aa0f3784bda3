use crate::expand::{Environment, ExpandError, Word};

#[derive(thiserror::Error, Debug)]
pub enum TlsError {
	#[error(transparent)]
	Expand(#[from] ExpandError),
	#[error("reading {path}: {source}")]
	Io {
		path: String,
		source: std::io::Error,
	},
	#[error("invalid certificate material: {0}")]
	Certificate(#[from] reqwest::Error),
}

/// Per-scope TLS settings; child-wins-if-set like the other scalar fields.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
	/// Extra PEM root certificate file.
	pub ca_file: Option<Word>,
	/// Client certificate PEM file.
	pub cert_file: Option<Word>,
	/// Client private key PEM file.
	pub key_file: Option<Word>,
	/// Skip server certificate verification.
	pub insecure: Option<Word>,
}

/// The TLS material resolved against an environment, ready to configure a
/// client.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTls {
	pub ca_pem: Option<Vec<u8>>,
	pub identity_pem: Option<Vec<u8>>,
	pub insecure: bool,
}

impl TlsConfig {
	pub fn resolve(&self, env: &Environment) -> Result<ResolvedTls, TlsError> {
		let read = |word: &Word| -> Result<Vec<u8>, TlsError> {
			let path = word.expand(env)?;
			fs_err::read(&path).map_err(|source| TlsError::Io { path, source })
		};
		let ca_pem = self.ca_file.as_ref().map(read).transpose()?;
		let identity_pem = match (&self.cert_file, &self.key_file) {
			(Some(cert), Some(key)) => {
				let mut pem = read(cert)?;
				pem.extend(read(key)?);
				Some(pem)
			},
			(Some(cert), None) => Some(read(cert)?),
			(None, Some(key)) => Some(read(key)?),
			(None, None) => None,
		};
		let insecure = match &self.insecure {
			Some(word) => {
				let v = word.expand(env)?;
				matches!(v.as_str(), "true" | "yes" | "1" | "on")
			},
			None => false,
		};
		Ok(ResolvedTls {
			ca_pem,
			identity_pem,
			insecure,
		})
	}
}

impl ResolvedTls {
	/// Applies the material to a client builder.
	pub fn configure(
		&self,
		mut builder: reqwest::blocking::ClientBuilder,
	) -> Result<reqwest::blocking::ClientBuilder, TlsError> {
		if let Some(pem) = &self.ca_pem {
			builder = builder.add_root_certificate(reqwest::Certificate::from_pem(pem)?);
		}
		if let Some(pem) = &self.identity_pem {
			builder = builder.identity(reqwest::Identity::from_pem(pem)?);
		}
		if self.insecure {
			builder = builder.danger_accept_invalid_certs(true);
		}
		Ok(builder)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn insecure_flag_parses_truthy_words() {
		let env = Environment::root();
		let tls = TlsConfig {
			insecure: Some(Word::literal("true")),
			..TlsConfig::default()
		};
		assert!(tls.resolve(&env).unwrap().insecure);
		let tls = TlsConfig {
			insecure: Some(Word::literal("false")),
			..TlsConfig::default()
		};
		assert!(!tls.resolve(&env).unwrap().insecure);
	}

	#[test]
	fn missing_ca_file_is_reported_with_path() {
		let env = Environment::root();
		let tls = TlsConfig {
			ca_file: Some(Word::literal("/does/not/exist.pem")),
			..TlsConfig::default()
		};
		let err = tls.resolve(&env).unwrap_err();
		assert!(matches!(err, TlsError::Io { path, .. } if path == "/does/not/exist.pem"));
	}
}
