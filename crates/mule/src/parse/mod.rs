//! Parser for the collection file format: `{…}` blocks, line-terminated
//! statements, `#`/`//` comments, `$`-references with POSIX-style
//! substitutions, here-docs and `@` macros.

mod words;

use std::path::{Path, PathBuf};

use crate::auth::{Authorization, JwtAuth};
use crate::body::Body;
use crate::collection::{Branch, Collection, Command, Expect, Flow, Method, Request, Step};
use crate::expand::{Environment, Set, Word};
use crate::tls::TlsConfig;

#[derive(thiserror::Error, Debug)]
#[error("{message} at line {line}")]
pub struct ParseError {
	pub message: String,
	pub line: usize,
}

/// Resolves referenced files for `@include` and `@readfile`: the including
/// file's directory first, then each search path in order.
#[derive(Debug, Clone, Default)]
pub struct Loader {
	search: Vec<PathBuf>,
}

impl Loader {
	/// Search paths from the colon-separated `MULE_SEARCHPATH` variable.
	pub fn from_env() -> Loader {
		let search = std::env::var("MULE_SEARCHPATH")
			.map(|raw| {
				raw
					.split(':')
					.filter(|s| !s.is_empty())
					.map(PathBuf::from)
					.collect()
			})
			.unwrap_or_default();
		Loader { search }
	}

	pub fn push(&mut self, dir: PathBuf) {
		self.search.push(dir);
	}

	fn resolve(&self, spec: &str, base: &Path) -> Option<PathBuf> {
		let direct = base.join(spec);
		if direct.is_file() {
			return Some(direct);
		}
		for dir in &self.search {
			let candidate = dir.join(spec);
			if candidate.is_file() {
				return Some(candidate);
			}
		}
		let bare = PathBuf::from(spec);
		bare.is_file().then_some(bare)
	}
}

/// Parses a collection file. The root collection is named after the file's
/// base name, without extension.
pub fn parse_file(path: &Path) -> Result<Collection, ParseError> {
	parse_file_with(path, Loader::from_env(), Environment::root())
}

fn parse_file_with(path: &Path, loader: Loader, env: Environment) -> Result<Collection, ParseError> {
	let source = fs_err::read_to_string(path).map_err(|e| ParseError {
		message: format!("{}: {e}", path.display()),
		line: 0,
	})?;
	let name = base_name(path);
	let base = path
		.parent()
		.map(Path::to_path_buf)
		.unwrap_or_else(|| PathBuf::from("."));
	parse_collection_source(&source, &name, base, loader, env)
}

/// Parses source text as the body of a root collection named `name`.
/// Relative includes resolve against the current directory.
pub fn parse_source(source: &str, name: &str) -> Result<Collection, ParseError> {
	parse_collection_source(
		source,
		name,
		PathBuf::from("."),
		Loader::from_env(),
		Environment::root(),
	)
}

fn parse_collection_source(
	source: &str,
	name: &str,
	base: PathBuf,
	loader: Loader,
	env: Environment,
) -> Result<Collection, ParseError> {
	let mut parser = Parser {
		chars: source.chars().collect(),
		pos: 0,
		line: 1,
		base,
		loader,
	};
	let mut collection = Collection::new(name);
	collection.environment = env;
	parser.collection_body(&mut collection, true)?;
	Ok(collection)
}

fn base_name(path: &Path) -> String {
	path
		.file_stem()
		.map(|s| s.to_string_lossy().into_owned())
		.unwrap_or_else(|| "collection".to_string())
}

struct Parser {
	chars: Vec<char>,
	pos: usize,
	line: usize,
	base: PathBuf,
	loader: Loader,
}

impl Parser {
	fn error(&self, message: impl Into<String>) -> ParseError {
		ParseError {
			message: message.into(),
			line: self.line,
		}
	}

	fn peek(&self) -> Option<char> {
		self.chars.get(self.pos).copied()
	}

	fn peek_at(&self, n: usize) -> Option<char> {
		self.chars.get(self.pos + n).copied()
	}

	fn bump(&mut self) -> Option<char> {
		let c = self.peek()?;
		self.pos += 1;
		if c == '\n' {
			self.line += 1;
		}
		Some(c)
	}

	/// Skips spaces and tabs on the current line.
	fn skip_space(&mut self) {
		while matches!(self.peek(), Some(' ') | Some('\t') | Some('\r')) {
			self.bump();
		}
	}

	/// Skips whitespace of any kind, comments included.
	fn skip_blank(&mut self) {
		loop {
			match self.peek() {
				Some(c) if c.is_whitespace() => {
					self.bump();
				},
				Some('#') => self.skip_to_eol(),
				Some('/') if self.peek_at(1) == Some('/') => self.skip_to_eol(),
				_ => return,
			}
		}
	}

	fn skip_to_eol(&mut self) {
		while let Some(c) = self.peek() {
			if c == '\n' {
				return;
			}
			self.bump();
		}
	}

	fn at_line_end(&mut self) -> bool {
		self.skip_space();
		match self.peek() {
			None | Some('\n') | Some('}') | Some('{') => true,
			Some('#') => true,
			Some('/') if self.peek_at(1) == Some('/') => true,
			_ => false,
		}
	}

	/// A bare token: characters up to whitespace or a block delimiter.
	fn bare_token(&mut self) -> String {
		let mut out = String::new();
		while let Some(c) = self.peek() {
			if c.is_whitespace() || c == '{' || c == '}' {
				break;
			}
			out.push(c);
			self.pos += 1;
		}
		out
	}

	fn expect_open(&mut self) -> Result<(), ParseError> {
		self.skip_blank();
		if self.peek() == Some('{') {
			self.bump();
			Ok(())
		} else {
			Err(self.error("expected `{`"))
		}
	}

	fn expect_close(&mut self) -> Result<(), ParseError> {
		self.skip_blank();
		if self.peek() == Some('}') {
			self.bump();
			Ok(())
		} else {
			Err(self.error("expected `}`"))
		}
	}

	fn at_close(&mut self) -> bool {
		self.skip_blank();
		matches!(self.peek(), Some('}') | None)
	}

	/// One value token: quoted string, here-doc, `@` macro or bare word.
	fn value_word(&mut self) -> Result<Word, ParseError> {
		self.skip_space();
		match self.peek() {
			Some('"') => {
				let raw = self.quoted_raw()?;
				words::parse_word(&raw).map_err(|e| self.error(e.message))
			},
			Some('<') if self.peek_at(1) == Some('<') => Ok(Word::Literal(self.heredoc()?)),
			Some('@') => self.macro_word(),
			Some(_) => {
				let raw = self.bare_token();
				words::parse_word(&raw).map_err(|e| self.error(e.message))
			},
			None => Err(self.error("expected a value")),
		}
	}

	/// Remaining value tokens on the current line.
	fn value_words(&mut self) -> Result<Vec<Word>, ParseError> {
		let mut out = Vec::new();
		while !self.at_line_end() {
			out.push(self.value_word()?);
		}
		Ok(out)
	}

	fn one_value(&mut self, what: &str) -> Result<Word, ParseError> {
		if self.at_line_end() {
			return Err(self.error(format!("{what}: missing value")));
		}
		self.value_word()
	}

	/// Raw content of a double-quoted string; `\"` and `\\` unescape, other
	/// backslashes pass through for the word parser.
	fn quoted_raw(&mut self) -> Result<String, ParseError> {
		self.bump();
		let mut out = String::new();
		loop {
			match self.bump() {
				Some('"') => return Ok(out),
				Some('\\') => match self.bump() {
					Some('"') => out.push('"'),
					Some(c) => {
						out.push('\\');
						out.push(c);
					},
					None => return Err(self.error("unterminated string")),
				},
				Some(c) => out.push(c),
				None => return Err(self.error("unterminated string")),
			}
		}
	}

	/// `<<TAG … TAG`: content is literal, no interpolation. The terminator
	/// is TAG standing alone as a word.
	fn heredoc(&mut self) -> Result<String, ParseError> {
		self.bump();
		self.bump();
		let tag = self.bare_token();
		if tag.is_empty() {
			return Err(self.error("here-doc requires a tag"));
		}
		let mut content = String::new();
		let mut word = String::new();
		loop {
			match self.bump() {
				Some(c) if c.is_whitespace() => {
					if word == tag {
						// Drop the terminator and the whitespace before it.
						let cut = content.len() - word.len();
						let mut out = content[..cut].trim_end().to_string();
						if let Some(stripped) = out.strip_prefix('\n') {
							out = stripped.to_string();
						}
						return Ok(out);
					}
					content.push(c);
					word.clear();
				},
				Some(c) => {
					content.push(c);
					word.push(c);
				},
				None => {
					if word == tag {
						let cut = content.len() - word.len();
						return Ok(content[..cut].trim_end().to_string());
					}
					return Err(self.error(format!("unterminated here-doc (missing {tag})")));
				},
			}
		}
	}

	/// Value-position macros: `@readfile path`, `@env NAME`.
	fn macro_word(&mut self) -> Result<Word, ParseError> {
		let name = self.bare_token();
		match name.as_str() {
			"@readfile" => {
				self.skip_space();
				let spec = self.bare_token();
				if spec.is_empty() {
					return Err(self.error("@readfile: missing path"));
				}
				let path = self
					.loader
					.resolve(&spec, &self.base)
					.ok_or_else(|| self.error(format!("@readfile: {spec} not found")))?;
				let content = fs_err::read_to_string(&path)
					.map_err(|e| self.error(format!("@readfile: {e}")))?;
				Ok(Word::Literal(content))
			},
			"@env" => {
				self.skip_space();
				let var = self.bare_token();
				if var.is_empty() {
					return Err(self.error("@env: missing variable name"));
				}
				Ok(Word::Literal(
					std::env::var(var.to_uppercase()).unwrap_or_default(),
				))
			},
			other => Err(self.error(format!("unknown macro {other}"))),
		}
	}

	/// A script source: here-doc or quoted string.
	fn script_source(&mut self) -> Result<String, ParseError> {
		self.skip_space();
		match self.peek() {
			Some('<') if self.peek_at(1) == Some('<') => self.heredoc(),
			Some('"') => {
				let raw = self.quoted_raw()?;
				Ok(raw.replace("\\\\", "\\"))
			},
			_ => Err(self.error("expected a script (here-doc or string)")),
		}
	}

	// ---- statement bodies ----

	fn collection_body(&mut self, collection: &mut Collection, top: bool) -> Result<(), ParseError> {
		loop {
			self.skip_blank();
			match self.peek() {
				None => {
					if top {
						return Ok(());
					}
					return Err(self.error("unexpected end of file"));
				},
				Some('}') => {
					if top {
						return Err(self.error("unexpected `}`"));
					}
					return Ok(());
				},
				_ => {},
			}
			let keyword = self.bare_token();
			if keyword.is_empty() {
				return Err(self.error("expected a statement"));
			}
			if let Some(method) = Method::parse(&keyword) {
				let request = self.request(method)?;
				collection.requests.push(request);
				continue;
			}
			match keyword.as_str() {
				"collection" => {
					self.skip_space();
					let name = self.bare_token();
					if name.is_empty() {
						return Err(self.error("collection: missing name"));
					}
					let mut child = Collection::new(name);
					child.environment = collection.environment.child();
					self.expect_open()?;
					self.collection_body(&mut child, false)?;
					self.expect_close()?;
					collection.collections.push(child);
				},
				"flow" => {
					let flow = self.flow()?;
					collection.flows.push(flow);
				},
				"variables" => self.variables_block(&collection.environment)?,
				"headers" => self.set_block(&mut collection.common.headers)?,
				"query" => self.set_block(&mut collection.common.query)?,
				"tls" => collection.common.tls = Some(self.tls_block()?),
				"cookie" => {
					let mut set = Set::new();
					self.set_block(&mut set)?;
					collection.common.cookies.push(set);
				},
				"url" => collection.common.url = Some(self.one_value("url")?),
				"auth" => collection.common.auth = Some(self.auth_clause()?),
				"username" => {
					let word = self.one_value("username")?;
					set_username(&mut collection.common.auth, word);
				},
				"password" => {
					let word = self.one_value("password")?;
					set_password(&mut collection.common.auth, word);
				},
				"token" => {
					let word = self.one_value("token")?;
					collection.common.auth = Some(Authorization::Bearer { token: word });
				},
				"retry" => collection.common.retry = Some(self.one_value("retry")?),
				"timeout" => collection.common.timeout = Some(self.one_value("timeout")?),
				"redirect" => collection.common.redirect = Some(self.one_value("redirect")?),
				"description" => {
					collection.common.description = Some(self.text_value("description")?);
				},
				"beforeAll" => collection.before_all = Some(self.script_source()?),
				"beforeEach" => collection.before_each = Some(self.script_source()?),
				"afterAll" => collection.after_all = Some(self.script_source()?),
				"afterEach" => collection.after_each = Some(self.script_source()?),
				"before" => collection.before_each = Some(self.script_source()?),
				"after" => collection.after_each = Some(self.script_source()?),
				"@include" => self.include(collection)?,
				"@searchpath" => {
					self.skip_space();
					let dir = self.bare_token();
					if dir.is_empty() {
						return Err(self.error("@searchpath: missing directory"));
					}
					self.loader.push(PathBuf::from(dir));
				},
				other => return Err(self.error(format!("unknown statement {other:?}"))),
			}
		}
	}

	fn text_value(&mut self, what: &str) -> Result<String, ParseError> {
		self.skip_space();
		match self.peek() {
			Some('<') if self.peek_at(1) == Some('<') => self.heredoc(),
			Some('"') => self.quoted_raw(),
			Some(_) => Ok(self.bare_token()),
			None => Err(self.error(format!("{what}: missing value"))),
		}
	}

	fn include(&mut self, collection: &mut Collection) -> Result<(), ParseError> {
		self.skip_space();
		let spec = self.bare_token();
		if spec.is_empty() {
			return Err(self.error("@include: missing path"));
		}
		self.skip_space();
		let alias = if self.at_line_end() {
			None
		} else {
			Some(self.bare_token())
		};
		let path = self
			.loader
			.resolve(&spec, &self.base)
			.ok_or_else(|| self.error(format!("@include: {spec} not found")))?;
		let mut included = parse_file_with(
			&path,
			self.loader.clone(),
			collection.environment.child(),
		)
		.map_err(|e| self.error(format!("@include {spec}: {e}")))?;
		if let Some(alias) = alias {
			included.common.name = alias;
		}
		collection.collections.push(included);
		Ok(())
	}

	fn variables_block(&mut self, env: &Environment) -> Result<(), ParseError> {
		self.expect_open()?;
		while !self.at_close() {
			let name = self.bare_token();
			if name.is_empty() {
				return Err(self.error("variables: expected a name"));
			}
			let values = self.value_words()?;
			let word = match values.len() {
				0 => Word::Literal(String::new()),
				1 => values.into_iter().next().unwrap_or_else(|| Word::Literal(String::new())),
				_ => {
					let mut parts = Vec::new();
					for (i, w) in values.into_iter().enumerate() {
						if i > 0 {
							parts.push(Word::Literal(" ".to_string()));
						}
						parts.push(w);
					}
					Word::Compound(parts)
				},
			};
			env
				.define(&name, word)
				.map_err(|e| self.error(e.to_string()))?;
		}
		self.expect_close()
	}

	fn set_block(&mut self, set: &mut Set) -> Result<(), ParseError> {
		self.expect_open()?;
		while !self.at_close() {
			let key = self.bare_token();
			if key.is_empty() {
				return Err(self.error("expected a key"));
			}
			let values = self.value_words()?;
			if values.is_empty() {
				return Err(self.error(format!("{key}: missing value")));
			}
			for value in values {
				set.add(key.clone(), value);
			}
		}
		self.expect_close()
	}

	fn tls_block(&mut self) -> Result<TlsConfig, ParseError> {
		let mut tls = TlsConfig::default();
		self.expect_open()?;
		while !self.at_close() {
			let key = self.bare_token();
			match key.as_str() {
				"certFile" | "certfile" | "cert" => tls.cert_file = Some(self.one_value(&key)?),
				"keyFile" | "keyfile" | "key" => tls.key_file = Some(self.one_value(&key)?),
				"caFile" | "cafile" | "ca" => tls.ca_file = Some(self.one_value(&key)?),
				"insecure" => tls.insecure = Some(self.one_value("insecure")?),
				other => return Err(self.error(format!("tls: unknown setting {other:?}"))),
			}
		}
		self.expect_close()?;
		Ok(tls)
	}

	fn auth_clause(&mut self) -> Result<Authorization, ParseError> {
		self.skip_space();
		let kind = self.bare_token();
		match kind.as_str() {
			"basic" => {
				let mut username = None;
				let mut password = None;
				self.expect_open()?;
				while !self.at_close() {
					let key = self.bare_token();
					match key.as_str() {
						"username" => username = Some(self.one_value("username")?),
						"password" => password = Some(self.one_value("password")?),
						other => return Err(self.error(format!("auth basic: unknown {other:?}"))),
					}
				}
				self.expect_close()?;
				Ok(Authorization::Basic {
					username: username.unwrap_or_else(|| Word::Literal(String::new())),
					password: password.unwrap_or_else(|| Word::Literal(String::new())),
				})
			},
			"bearer" => {
				let token = self.one_value("auth bearer")?;
				Ok(Authorization::Bearer { token })
			},
			"jwt" => {
				let mut alg = None;
				let mut secret = None;
				let mut claims = Set::new();
				self.expect_open()?;
				while !self.at_close() {
					let key = self.bare_token();
					match key.as_str() {
						"alg" => alg = Some(self.one_value("alg")?),
						"secret" => secret = Some(self.one_value("secret")?),
						"claims" => self.set_block(&mut claims)?,
						other => return Err(self.error(format!("auth jwt: unknown {other:?}"))),
					}
				}
				self.expect_close()?;
				let secret = secret.ok_or_else(|| self.error("auth jwt: missing secret"))?;
				Ok(Authorization::Jwt(JwtAuth {
					alg,
					secret,
					claims,
				}))
			},
			other => Err(self.error(format!("auth: unknown scheme {other:?}"))),
		}
	}

	fn request(&mut self, method: Method) -> Result<Request, ParseError> {
		self.skip_space();
		let name = self.bare_token();
		if name.is_empty() {
			return Err(self.error("request: missing name"));
		}
		let mut request = Request::new(name, method);
		self.expect_open()?;
		while !self.at_close() {
			let keyword = self.bare_token();
			match keyword.as_str() {
				"url" => request.common.url = Some(self.one_value("url")?),
				"headers" => self.set_block(&mut request.common.headers)?,
				"query" => self.set_block(&mut request.common.query)?,
				"tls" => request.common.tls = Some(self.tls_block()?),
				"cookie" => {
					let mut set = Set::new();
					self.set_block(&mut set)?;
					request.common.cookies.push(set);
				},
				"auth" => request.common.auth = Some(self.auth_clause()?),
				"username" => {
					let word = self.one_value("username")?;
					set_username(&mut request.common.auth, word);
				},
				"password" => {
					let word = self.one_value("password")?;
					set_password(&mut request.common.auth, word);
				},
				"token" => {
					let word = self.one_value("token")?;
					request.common.auth = Some(Authorization::Bearer { token: word });
				},
				"body" => request.common.body = Some(self.body_clause()?),
				"depends" => request.depends = self.value_words()?,
				"expect" => request.expect = Some(self.expect_clause()?),
				"retry" => request.common.retry = Some(self.one_value("retry")?),
				"timeout" => request.common.timeout = Some(self.one_value("timeout")?),
				"redirect" => request.common.redirect = Some(self.one_value("redirect")?),
				"compressed" => request.compressed = Some(self.one_value("compressed")?),
				"description" => request.common.description = Some(self.text_value("description")?),
				"usage" => request.usage = Some(self.text_value("usage")?),
				"before" => request.before = Some(self.script_source()?),
				"after" => request.after = Some(self.script_source()?),
				other => return Err(self.error(format!("request: unknown statement {other:?}"))),
			}
		}
		self.expect_close()?;
		Ok(request)
	}

	fn body_clause(&mut self) -> Result<Body, ParseError> {
		self.skip_space();
		let kind = self.bare_token();
		match kind.as_str() {
			"json" => {
				let mut set = Set::new();
				self.set_block(&mut set)?;
				Ok(Body::Json(set))
			},
			"xml" => {
				let mut set = Set::new();
				self.set_block(&mut set)?;
				Ok(Body::Xml(set))
			},
			"urlencoded" | "form" => {
				let mut set = Set::new();
				self.set_block(&mut set)?;
				Ok(Body::UrlEncoded(set))
			},
			"text" => Ok(Body::Text(self.one_value("body text")?)),
			"octet" | "octet-stream" => Ok(Body::Octet(self.one_value("body octet")?)),
			other => Err(self.error(format!("body: unknown format {other:?}"))),
		}
	}

	fn expect_clause(&mut self) -> Result<Expect, ParseError> {
		self.skip_space();
		let first = self.bare_token();
		match first.as_str() {
			"success" => return Ok(Expect::Success),
			"fail" => return Ok(Expect::Fail),
			_ => {},
		}
		let mut codes = vec![
			first
				.parse::<u16>()
				.map_err(|_| self.error(format!("expect: invalid status {first:?}")))?,
		];
		while !self.at_line_end() {
			let token = self.bare_token();
			codes.push(
				token
					.parse::<u16>()
					.map_err(|_| self.error(format!("expect: invalid status {token:?}")))?,
			);
		}
		Ok(Expect::Codes(codes))
	}

	fn flow(&mut self) -> Result<Flow, ParseError> {
		self.skip_space();
		let name = self.bare_token();
		if name.is_empty() {
			return Err(self.error("flow: missing name"));
		}
		let mut flow = Flow::new(name);
		self.expect_open()?;
		while !self.at_close() {
			let keyword = self.bare_token();
			match keyword.as_str() {
				"beforeAll" => flow.before_all = Some(self.script_source()?),
				"beforeEach" => flow.before_each = Some(self.script_source()?),
				"afterAll" => flow.after_all = Some(self.script_source()?),
				"afterEach" => flow.after_each = Some(self.script_source()?),
				"url" => flow.common.url = Some(self.one_value("url")?),
				"headers" => self.set_block(&mut flow.common.headers)?,
				"query" => self.set_block(&mut flow.common.query)?,
				"description" => flow.common.description = Some(self.text_value("description")?),
				"step" => {
					self.skip_space();
					let path = self.bare_token();
					if path.is_empty() {
						return Err(self.error("step: missing request path"));
					}
					flow.steps.push(self.step(path)?);
				},
				path => {
					let path = path.to_string();
					flow.steps.push(self.step(path)?);
				},
			}
		}
		self.expect_close()?;
		Ok(flow)
	}

	fn step(&mut self, path: String) -> Result<Step, ParseError> {
		let mut step = Step {
			request: path,
			before: None,
			branches: Vec::new(),
		};
		self.expect_open()?;
		while !self.at_close() {
			let keyword = self.bare_token();
			match keyword.as_str() {
				"before" | "script" => step.before = Some(self.script_source()?),
				"when" => step.branches.push(self.branch()?),
				other => return Err(self.error(format!("step: unknown statement {other:?}"))),
			}
		}
		self.expect_close()?;
		Ok(step)
	}

	fn branch(&mut self) -> Result<Branch, ParseError> {
		let mut branch = Branch::default();
		// Status codes, then an optional `goto target`, then an optional
		// command block.
		loop {
			self.skip_space();
			match self.peek() {
				Some('{') | Some('\n') | Some('}') | None => break,
				_ => {},
			}
			let token = self.bare_token();
			if token == "goto" {
				self.skip_space();
				let target = self.bare_token();
				if target.is_empty() {
					return Err(self.error("when: goto requires a target"));
				}
				branch.target = Some(target);
				break;
			}
			let code = token
				.parse::<u16>()
				.map_err(|_| self.error(format!("when: invalid status {token:?}")))?;
			branch.codes.push(code);
		}
		self.skip_space();
		if self.peek() == Some('{') {
			self.bump();
			while !self.at_close() {
				let keyword = self.bare_token();
				match keyword.as_str() {
					"set" => {
						self.skip_space();
						let target = self.bare_token();
						if target.is_empty() {
							return Err(self.error("set: missing target"));
						}
						let source = self.one_value("set")?;
						branch.commands.push(Command::Set {
							target: Word::Literal(target),
							source,
						});
					},
					"unset" => {
						self.skip_space();
						let name = self.bare_token();
						if name.is_empty() {
							return Err(self.error("unset: missing name"));
						}
						branch.commands.push(Command::Unset(Word::Literal(name)));
					},
					"goto" => {
						self.skip_space();
						let label = self.bare_token();
						if label.is_empty() {
							return Err(self.error("goto: missing label"));
						}
						branch.commands.push(Command::Goto(Word::Literal(label)));
					},
					"exit" => {
						let code = self.one_value("exit")?;
						branch.commands.push(Command::Exit(code));
					},
					"script" => {
						let source = self.script_source()?;
						branch.commands.push(Command::Script(source));
					},
					other => return Err(self.error(format!("when: unknown command {other:?}"))),
				}
			}
			self.expect_close()?;
		}
		Ok(branch)
	}
}

fn set_username(auth: &mut Option<Authorization>, word: Word) {
	match auth {
		Some(Authorization::Basic { username, .. }) => *username = word,
		_ => {
			*auth = Some(Authorization::Basic {
				username: word,
				password: Word::Literal(String::new()),
			});
		},
	}
}

fn set_password(auth: &mut Option<Authorization>, word: Word) {
	match auth {
		Some(Authorization::Basic { password, .. }) => *password = word,
		_ => {
			*auth = Some(Authorization::Basic {
				username: Word::Literal(String::new()),
				password: word,
			});
		},
	}
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
