use crate::auth::Authorization;
use crate::body::Body;
use crate::expand::{Environment, Set, Word};
use crate::tls::TlsConfig;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LookupError {
	#[error("{0}: not found")]
	NotFound(String),
}

/// Settings shared by collections, requests and flows, inherited downward
/// through the scope tree.
#[derive(Debug, Clone, Default)]
pub struct Common {
	pub name: String,
	pub description: Option<String>,
	pub url: Option<Word>,
	pub auth: Option<Authorization>,
	pub retry: Option<Word>,
	pub timeout: Option<Word>,
	pub redirect: Option<Word>,
	pub body: Option<Body>,
	pub headers: Set,
	pub query: Set,
	pub tls: Option<TlsConfig>,
	pub cookies: Vec<Set>,
}

impl Common {
	pub fn named(name: impl Into<String>) -> Common {
		Common {
			name: name.into(),
			..Common::default()
		}
	}
}

/// A node of the scope tree. Immutable after load; request builds work on
/// copies produced by the merge.
#[derive(Debug, Clone)]
pub struct Collection {
	pub common: Common,
	pub environment: Environment,
	pub before_all: Option<String>,
	pub before_each: Option<String>,
	pub after_all: Option<String>,
	pub after_each: Option<String>,
	pub requests: Vec<Request>,
	pub collections: Vec<Collection>,
	pub flows: Vec<Flow>,
}

impl Collection {
	pub fn new(name: impl Into<String>) -> Collection {
		Collection {
			common: Common::named(name),
			environment: Environment::root(),
			before_all: None,
			before_each: None,
			after_all: None,
			after_each: None,
			requests: Vec::new(),
			collections: Vec::new(),
			flows: Vec::new(),
		}
	}

	pub fn name(&self) -> &str {
		&self.common.name
	}

	pub fn child(&self, name: &str) -> Option<&Collection> {
		self.collections.iter().find(|c| c.name() == name)
	}

	pub fn request(&self, name: &str) -> Option<&Request> {
		self.requests.iter().find(|r| r.common.name == name)
	}

	pub fn flow(&self, name: &str) -> Option<&Flow> {
		self.flows.iter().find(|f| f.common.name == name)
	}

	/// Dotted-path lookup. All but the last segment walk sub-collections; the
	/// last resolves against requests first, then collections, then flows.
	pub fn find(&self, path: &str) -> Result<Lookup<'_>, LookupError> {
		let mut chain = vec![self];
		let segments: Vec<&str> = path.split('.').collect();
		let (last, dirs) = segments
			.split_last()
			.ok_or_else(|| LookupError::NotFound(path.to_string()))?;
		let mut current = self;
		for dir in dirs {
			current = current
				.child(dir)
				.ok_or_else(|| LookupError::NotFound(path.to_string()))?;
			chain.push(current);
		}
		let found = if let Some(request) = current.request(last) {
			Found::Request(request)
		} else if let Some(collection) = current.child(last) {
			chain.push(collection);
			Found::Collection(collection)
		} else if let Some(flow) = current.flow(last) {
			Found::Flow(flow)
		} else {
			return Err(LookupError::NotFound(path.to_string()));
		};
		Ok(Lookup { chain, found })
	}

	/// Dotted paths of every concrete (non-abstract) request in the subtree.
	pub fn request_paths(&self) -> Vec<String> {
		fn walk(collection: &Collection, prefix: &str, out: &mut Vec<String>) {
			for request in &collection.requests {
				if request.is_abstract() {
					continue;
				}
				out.push(format!("{prefix}{}", request.common.name));
			}
			for child in &collection.collections {
				walk(child, &format!("{prefix}{}.", child.name()), out);
			}
		}
		let mut out = Vec::new();
		walk(self, "", &mut out);
		out
	}

	pub fn flow_paths(&self) -> Vec<String> {
		fn walk(collection: &Collection, prefix: &str, out: &mut Vec<String>) {
			for flow in &collection.flows {
				out.push(format!("{prefix}{}", flow.common.name));
			}
			for child in &collection.collections {
				walk(child, &format!("{prefix}{}.", child.name()), out);
			}
		}
		let mut out = Vec::new();
		walk(self, "", &mut out);
		out
	}
}

#[derive(Debug)]
pub struct Lookup<'a> {
	/// Collections traversed from the root to the containing scope,
	/// outermost first.
	pub chain: Vec<&'a Collection>,
	pub found: Found<'a>,
}

#[derive(Debug)]
pub enum Found<'a> {
	Request(&'a Request),
	Collection(&'a Collection),
	Flow(&'a Flow),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
	#[default]
	Get,
	Post,
	Put,
	Patch,
	Delete,
	Head,
	Options,
	/// Template method: the request is abstract and never executed directly.
	Do,
}

impl Method {
	pub fn parse(s: &str) -> Option<Method> {
		Some(match s.to_ascii_lowercase().as_str() {
			"get" => Method::Get,
			"post" => Method::Post,
			"put" => Method::Put,
			"patch" => Method::Patch,
			"delete" => Method::Delete,
			"head" => Method::Head,
			"options" => Method::Options,
			"do" => Method::Do,
			_ => return None,
		})
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
			Method::Head => "HEAD",
			Method::Options => "OPTIONS",
			Method::Do => "DO",
		}
	}

	pub fn to_http(&self) -> Option<http::Method> {
		Some(match self {
			Method::Get => http::Method::GET,
			Method::Post => http::Method::POST,
			Method::Put => http::Method::PUT,
			Method::Patch => http::Method::PATCH,
			Method::Delete => http::Method::DELETE,
			Method::Head => http::Method::HEAD,
			Method::Options => http::Method::OPTIONS,
			Method::Do => return None,
		})
	}
}

impl std::fmt::Display for Method {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The response-status predicate attached to a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Expect {
	Codes(Vec<u16>),
	/// Any 2xx.
	Success,
	/// Status 400 and above, or a transport failure.
	Fail,
}

impl Expect {
	pub fn matches(&self, status: u16) -> bool {
		match self {
			Expect::Codes(codes) => codes.contains(&status),
			Expect::Success => (200..300).contains(&status),
			Expect::Fail => status >= 400 || status == 0,
		}
	}
}

#[derive(Debug, Clone)]
pub struct Request {
	pub common: Common,
	pub method: Method,
	pub depends: Vec<Word>,
	pub before: Option<String>,
	pub after: Option<String>,
	pub expect: Option<Expect>,
	pub compressed: Option<Word>,
	pub usage: Option<String>,
}

impl Request {
	pub fn new(name: impl Into<String>, method: Method) -> Request {
		Request {
			common: Common::named(name),
			method,
			depends: Vec::new(),
			before: None,
			after: None,
			expect: None,
			compressed: None,
			usage: None,
		}
	}

	pub fn name(&self) -> &str {
		&self.common.name
	}

	pub fn is_abstract(&self) -> bool {
		self.method == Method::Do
	}
}

#[derive(Debug, Clone)]
pub struct Flow {
	pub common: Common,
	pub before_all: Option<String>,
	pub before_each: Option<String>,
	pub after_all: Option<String>,
	pub after_each: Option<String>,
	pub steps: Vec<Step>,
}

impl Flow {
	pub fn new(name: impl Into<String>) -> Flow {
		Flow {
			common: Common::named(name),
			before_all: None,
			before_each: None,
			after_all: None,
			after_each: None,
			steps: Vec::new(),
		}
	}
}

/// One step of a flow: the dotted path of the request (or nested flow) to
/// execute, and the branch table dispatched on the response status.
#[derive(Debug, Clone)]
pub struct Step {
	pub request: String,
	/// Script run before the step's request is assembled.
	pub before: Option<String>,
	pub branches: Vec<Branch>,
}

#[derive(Debug, Clone, Default)]
pub struct Branch {
	/// Matching statuses; empty is a catch-all. Transport failures carry
	/// status 0.
	pub codes: Vec<u16>,
	/// Implicit goto taken after the commands unless an exit fired.
	pub target: Option<String>,
	pub script: Option<String>,
	pub commands: Vec<Command>,
}

impl Branch {
	pub fn matches(&self, status: u16) -> bool {
		self.codes.is_empty() || self.codes.contains(&status)
	}
}

#[derive(Debug, Clone)]
pub enum Command {
	Set { target: Word, source: Word },
	Unset(Word),
	Goto(Word),
	Exit(Word),
	Script(String),
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;

	use super::*;

	fn tree() -> Collection {
		let mut root = Collection::new("root");
		root.requests.push(Request::new("ping", Method::Get));
		let mut api = Collection::new("api");
		api.requests.push(Request::new("list", Method::Get));
		api.flows.push(Flow::new("seed"));
		let mut inner = Collection::new("v2");
		inner.requests.push(Request::new("list", Method::Post));
		api.collections.push(inner);
		root.collections.push(api);
		root
	}

	#[test]
	fn find_walks_dotted_paths() {
		let root = tree();
		assert_matches!(root.find("ping").unwrap().found, Found::Request(r) if r.method == Method::Get);
		let lookup = root.find("api.list").unwrap();
		assert_matches!(lookup.found, Found::Request(_));
		assert_eq!(lookup.chain.len(), 2);
		let lookup = root.find("api.v2.list").unwrap();
		assert_matches!(lookup.found, Found::Request(r) if r.method == Method::Post);
		assert_eq!(lookup.chain.len(), 3);
	}

	#[test]
	fn find_prefers_requests_then_collections_then_flows() {
		let root = tree();
		assert_matches!(root.find("api.seed").unwrap().found, Found::Flow(_));
		assert_matches!(root.find("api.v2").unwrap().found, Found::Collection(_));
	}

	#[test]
	fn find_reports_misses() {
		let root = tree();
		assert_matches!(root.find("api.nope"), Err(LookupError::NotFound(p)) if p == "api.nope");
		assert_matches!(root.find("ghost.x"), Err(LookupError::NotFound(_)));
	}

	#[test]
	fn request_paths_skip_abstract() {
		let mut root = tree();
		root.requests.push(Request::new("template", Method::Do));
		let paths = root.request_paths();
		assert!(paths.contains(&"ping".to_string()));
		assert!(paths.contains(&"api.v2.list".to_string()));
		assert!(!paths.iter().any(|p| p.contains("template")));
	}

	#[test]
	fn expect_predicates() {
		assert!(Expect::Codes(vec![200, 201]).matches(201));
		assert!(!Expect::Codes(vec![200]).matches(404));
		assert!(Expect::Success.matches(204));
		assert!(!Expect::Success.matches(301));
		assert!(Expect::Fail.matches(500));
		assert!(Expect::Fail.matches(0));
		assert!(!Expect::Fail.matches(200));
	}
}
