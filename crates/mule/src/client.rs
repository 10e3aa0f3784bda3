use std::time::Duration;

use bytes::Bytes;
use http::HeaderMap;
use url::Url;

use crate::tls::{ResolvedTls, TlsError};

#[derive(thiserror::Error, Debug)]
pub enum HttpError {
	#[error("transport: {0}")]
	Transport(#[from] reqwest::Error),
	#[error(transparent)]
	Tls(#[from] TlsError),
}

/// Redirect handling for one request, resolved from the `redirect` setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RedirectPolicy {
	/// The client's default policy.
	#[default]
	Default,
	None,
	Limited(usize),
}

/// A fully assembled request, ready for the wire. This is what the builder
/// produces and the only thing a [`Transport`] sees.
#[derive(Debug, Clone)]
pub struct HttpRequest {
	pub method: http::Method,
	pub url: Url,
	pub headers: HeaderMap,
	pub body: Option<String>,
	pub timeout: Option<Duration>,
	pub redirect: RedirectPolicy,
	pub tls: ResolvedTls,
}

/// A buffered response. The body is fully read into memory before any hook
/// sees it, so every reader observes the same bytes.
#[derive(Debug, Clone)]
pub struct Response {
	pub status: u16,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	pub fn body_text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	pub fn success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	pub fn fail(&self) -> bool {
		self.status >= 400 || self.status == 0
	}
}

/// The HTTP round trip, behind a seam so flows can be replayed against a
/// scripted sequence of responses.
pub trait Transport: Send + Sync {
	fn round_trip(&self, request: &HttpRequest) -> Result<Response, HttpError>;
}

/// Production transport over reqwest's blocking client. A client is built
/// per call because TLS material, redirect policy and timeout are per-request
/// concerns here.
#[derive(Debug, Default)]
pub struct ReqwestTransport;

impl Transport for ReqwestTransport {
	fn round_trip(&self, request: &HttpRequest) -> Result<Response, HttpError> {
		let mut builder = reqwest::blocking::Client::builder();
		builder = request.tls.configure(builder)?;
		builder = match request.redirect {
			RedirectPolicy::Default => builder,
			RedirectPolicy::None => builder.redirect(reqwest::redirect::Policy::none()),
			RedirectPolicy::Limited(n) => builder.redirect(reqwest::redirect::Policy::limited(n)),
		};
		if let Some(timeout) = request.timeout {
			builder = builder.timeout(timeout);
		}
		let client = builder.build()?;

		let mut req = client
			.request(request.method.clone(), request.url.clone())
			.headers(request.headers.clone());
		if let Some(body) = &request.body {
			req = req.body(body.clone());
		}
		let response = req.send()?;

		let status = response.status().as_u16();
		let headers = response.headers().clone();
		// Buffer the whole body up front; hooks and reporting re-read it.
		let body = response.bytes()?;
		Ok(Response {
			status,
			headers,
			body,
		})
	}
}
