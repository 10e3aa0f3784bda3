use std::time::Duration;

use http::HeaderMap;
use http::header::{ACCEPT_ENCODING, AUTHORIZATION, CONTENT_TYPE, COOKIE, HeaderValue};
use url::Url;

use crate::auth::AuthError;
use crate::body::BodyError;
use crate::client::{HttpRequest, RedirectPolicy};
use crate::collection::{Collection, Common, Request};
use crate::expand::{Environment, ExpandError, Set, SetError};
use crate::tls::{ResolvedTls, TlsError};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
	#[error(transparent)]
	Expand(#[from] ExpandError),
	#[error(transparent)]
	Set(#[from] SetError),
	#[error(transparent)]
	Auth(#[from] AuthError),
	#[error(transparent)]
	Body(#[from] BodyError),
	#[error(transparent)]
	Tls(#[from] TlsError),
	#[error("invalid url {url:?}: {source}")]
	Url {
		url: String,
		source: url::ParseError,
	},
	#[error("{0}: no absolute url in scope")]
	NoUrl(String),
	#[error("{0} is abstract and cannot be executed")]
	Abstract(String),
	#[error("invalid cookie: {0}")]
	Cookie(String),
	#[error("invalid header value for {0}")]
	HeaderValue(String),
	#[error("invalid timeout {0:?}")]
	Timeout(String),
	#[error("invalid redirect {0:?}")]
	Redirect(String),
}

/// A concrete request plus the context hooks need: the environment it was
/// expanded against and the resolved credentials.
#[derive(Debug, Clone)]
pub struct BuiltRequest {
	pub path: String,
	pub http: HttpRequest,
	pub env: Environment,
	pub username: Option<String>,
	pub password: Option<String>,
	pub token: Option<String>,
}

/// Folds the collection chain and the request into one executable request,
/// outermost scope first so inner settings win. Expansion uses the nearest
/// environment in the chain.
pub fn assemble(path: &str, chain: &[&Collection], request: &Request) -> Result<BuiltRequest, BuildError> {
	let env = chain
		.last()
		.map(|c| c.environment.clone())
		.unwrap_or_default();
	assemble_in(path, chain, request, env)
}

/// Like [`assemble`], expanding against the given environment (flows layer
/// their own bindings over the request's chain).
pub fn assemble_in(
	path: &str,
	chain: &[&Collection],
	request: &Request,
	env: Environment,
) -> Result<BuiltRequest, BuildError> {
	let Some(method) = request.method.to_http() else {
		return Err(BuildError::Abstract(path.to_string()));
	};

	// Chain commons outermost-first, the request's own last.
	let commons: Vec<&Common> = chain
		.iter()
		.map(|c| &c.common)
		.chain(std::iter::once(&request.common))
		.collect();

	let mut url = fold_url(path, &commons, &env)?;

	let mut headers = Set::new();
	let mut query = Set::new();
	for common in &commons {
		headers = headers.merge(&common.headers);
		query = query.merge(&common.query);
	}
	for (key, value) in query.query(&env)? {
		url.query_pairs_mut().append_pair(&key, &value);
	}

	let mut header_map = headers.header(&env)?;

	let auth = last_set(&commons, |c| c.auth.as_ref());
	let mut username = None;
	let mut password = None;
	let mut token = None;
	if let Some(auth) = auth {
		username = auth.username(&env)?;
		password = auth.password(&env)?;
		token = auth.token(&env)?;
		if !header_map.contains_key(AUTHORIZATION) {
			let value = auth.header_value(&env)?;
			let value: HeaderValue = value
				.parse()
				.map_err(|_| BuildError::HeaderValue("Authorization".to_string()))?;
			header_map.insert(AUTHORIZATION, value);
		}
	}

	let body = match last_set(&commons, |c| c.body.as_ref()) {
		Some(body) => {
			if !header_map.contains_key(CONTENT_TYPE) {
				header_map.insert(CONTENT_TYPE, HeaderValue::from_static(body.content_type()));
			}
			Some(body.expand(&env)?)
		},
		None => None,
	};

	attach_cookies(&commons, &env, &mut header_map)?;

	if let Some(word) = &request.compressed {
		let v = word.expand(&env)?;
		if matches!(v.as_str(), "true" | "yes" | "1" | "on") && !header_map.contains_key(ACCEPT_ENCODING)
		{
			header_map.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
		}
	}

	let timeout = match last_set(&commons, |c| c.timeout.as_ref()) {
		Some(word) => parse_timeout(&word.expand(&env)?)?,
		None => None,
	};
	let redirect = match last_set(&commons, |c| c.redirect.as_ref()) {
		Some(word) => parse_redirect(&word.expand(&env)?)?,
		None => RedirectPolicy::Default,
	};
	let tls = match last_set(&commons, |c| c.tls.as_ref()) {
		Some(tls) => tls.resolve(&env)?,
		None => ResolvedTls::default(),
	};

	Ok(BuiltRequest {
		path: path.to_string(),
		http: HttpRequest {
			method,
			url,
			headers: header_map,
			body,
			timeout,
			redirect,
			tls,
		},
		env,
		username,
		password,
		token,
	})
}

fn last_set<'a, T: ?Sized>(
	commons: &[&'a Common],
	pick: impl Fn(&'a Common) -> Option<&'a T>,
) -> Option<&'a T> {
	commons.iter().rev().find_map(|c| pick(c))
}

/// URL composition over the scope chain: an absolute child wins outright, a
/// schemeless host-bearing child replaces the host, anything else appends as
/// path components.
fn fold_url(path: &str, commons: &[&Common], env: &Environment) -> Result<Url, BuildError> {
	enum Acc {
		None,
		Relative(String),
		Absolute(Url),
	}

	let mut acc = Acc::None;
	for common in commons {
		let Some(word) = &common.url else {
			continue;
		};
		let text = word.expand(env)?;
		acc = match acc {
			Acc::None | Acc::Relative(_) if is_absolute(&text) => {
				Acc::Absolute(parse_url(&text)?)
			},
			Acc::None => Acc::Relative(text),
			Acc::Relative(parent) => Acc::Relative(join_paths(&parent, &text)),
			Acc::Absolute(parent) => Acc::Absolute(join_url(&parent, &text)?),
		};
	}
	match acc {
		Acc::Absolute(url) => Ok(url),
		_ => Err(BuildError::NoUrl(path.to_string())),
	}
}

fn is_absolute(s: &str) -> bool {
	Url::parse(s).map(|u| u.has_host()).unwrap_or(false)
}

fn parse_url(s: &str) -> Result<Url, BuildError> {
	Url::parse(s).map_err(|source| BuildError::Url {
		url: s.to_string(),
		source,
	})
}

fn join_url(parent: &Url, child: &str) -> Result<Url, BuildError> {
	if is_absolute(child) {
		return parse_url(child);
	}
	// A schemeless but host-bearing child replaces the authority.
	if let Some(rest) = child.strip_prefix("//") {
		return parse_url(&format!("{}://{}", parent.scheme(), rest));
	}
	let (path_part, query_part) = match child.split_once('?') {
		Some((p, q)) => (p, Some(q)),
		None => (child, None),
	};
	let mut out = parent.clone();
	out.set_path(&join_paths(parent.path(), path_part));
	if let Some(q) = query_part {
		out.set_query(Some(q));
	}
	Ok(out)
}

fn join_paths(parent: &str, child: &str) -> String {
	if child.is_empty() {
		return parent.to_string();
	}
	let parent = parent.trim_end_matches('/');
	let child = child.trim_start_matches('/');
	format!("{parent}/{child}")
}

fn attach_cookies(
	commons: &[&Common],
	env: &Environment,
	headers: &mut HeaderMap,
) -> Result<(), BuildError> {
	let mut pairs = Vec::new();
	for common in commons {
		for descriptor in &common.cookies {
			let map = descriptor.map(env)?;
			let name = map.get("name").cloned().unwrap_or_default();
			let value = map.get("value").cloned().unwrap_or_default();
			// Validation happens on the full descriptor; only name=value goes
			// on the wire for a request.
			let mut raw = format!("{name}={value}");
			for attr in ["path", "domain", "max-age", "expires"] {
				if let Some(v) = map.get(attr) {
					raw.push_str(&format!("; {attr}={v}"));
				}
			}
			for flag in ["secure", "http-only"] {
				if map.get(flag).is_some_and(|v| v == "true") {
					raw.push_str("; ");
					raw.push_str(flag);
				}
			}
			let parsed = cookie::Cookie::parse(raw.clone())
				.map_err(|e| BuildError::Cookie(format!("{raw}: {e}")))?;
			pairs.push(format!("{}={}", parsed.name(), parsed.value()));
		}
	}
	if pairs.is_empty() {
		return Ok(());
	}
	let value: HeaderValue = pairs
		.join("; ")
		.parse()
		.map_err(|_| BuildError::HeaderValue("Cookie".to_string()))?;
	headers.insert(COOKIE, value);
	Ok(())
}

fn parse_timeout(raw: &str) -> Result<Option<Duration>, BuildError> {
	let raw = raw.trim();
	if raw.is_empty() || raw == "0" {
		return Ok(None);
	}
	if let Some(ms) = raw.strip_suffix("ms") {
		let v: u64 = ms
			.trim()
			.parse()
			.map_err(|_| BuildError::Timeout(raw.to_string()))?;
		return Ok(Some(Duration::from_millis(v)));
	}
	let secs = raw.strip_suffix('s').unwrap_or(raw).trim();
	let v: f64 = secs
		.parse()
		.map_err(|_| BuildError::Timeout(raw.to_string()))?;
	if v < 0.0 {
		return Err(BuildError::Timeout(raw.to_string()));
	}
	Ok(Some(Duration::from_secs_f64(v)))
}

fn parse_redirect(raw: &str) -> Result<RedirectPolicy, BuildError> {
	match raw.trim() {
		"" => Ok(RedirectPolicy::Default),
		"none" | "false" | "0" => Ok(RedirectPolicy::None),
		n => n
			.parse::<usize>()
			.map(RedirectPolicy::Limited)
			.map_err(|_| BuildError::Redirect(raw.to_string())),
	}
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
