use std::sync::Arc;

use crate::ast::*;
use crate::errors::ParseError;
use crate::lexer::Lexer;
use crate::token::{TemplateChunk, Tok, Token};

/// A parsed script: the statement list of one source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
	pub body: Vec<Node>,
}

impl Script {
	pub fn parse(src: &str) -> Result<Script, ParseError> {
		let tokens = Lexer::tokenize(src)?;
		let mut p = Parser { tokens, pos: 0 };
		let mut body = Vec::new();
		while !p.at(&Tok::Eof) {
			body.push(p.statement()?);
		}
		Ok(Script { body })
	}
}

struct Parser {
	tokens: Vec<Token>,
	pos: usize,
}

impl Parser {
	fn cur(&self) -> &Token {
		&self.tokens[self.pos.min(self.tokens.len() - 1)]
	}

	fn peek_tok(&self, n: usize) -> &Tok {
		let i = (self.pos + n).min(self.tokens.len() - 1);
		&self.tokens[i].tok
	}

	fn at(&self, t: &Tok) -> bool {
		&self.cur().tok == t
	}

	fn bump(&mut self) -> Token {
		let t = self.cur().clone();
		if self.pos < self.tokens.len() - 1 {
			self.pos += 1;
		}
		t
	}

	fn eat(&mut self, t: &Tok) -> bool {
		if self.at(t) {
			self.bump();
			true
		} else {
			false
		}
	}

	fn expect(&mut self, t: &Tok) -> Result<(), ParseError> {
		if self.eat(t) {
			Ok(())
		} else {
			Err(self.error(format!("expected {t}, found {}", self.cur().tok)))
		}
	}

	fn error(&self, message: impl Into<String>) -> ParseError {
		let t = self.cur();
		ParseError::new(message, t.line, t.column)
	}

	fn ident(&mut self) -> Result<Arc<str>, ParseError> {
		match self.cur().tok.clone() {
			Tok::Ident(s) => {
				self.bump();
				Ok(s)
			},
			// Contextual keywords usable as plain identifiers.
			Tok::Of => {
				self.bump();
				Ok(Arc::from("of"))
			},
			Tok::From => {
				self.bump();
				Ok(Arc::from("from"))
			},
			Tok::As => {
				self.bump();
				Ok(Arc::from("as"))
			},
			other => Err(self.error(format!("expected identifier, found {other}"))),
		}
	}

	fn semi(&mut self) {
		// Semicolons are statement terminators but not required.
		while self.eat(&Tok::Semicolon) {}
	}

	// ---- statements ----

	fn statement(&mut self) -> Result<Node, ParseError> {
		// Labelled loop: `name: while …`.
		if let Tok::Ident(name) = self.cur().tok.clone()
			&& self.peek_tok(1) == &Tok::Colon
			&& matches!(self.peek_tok(2), Tok::While | Tok::Do | Tok::For)
		{
			self.bump();
			self.bump();
			return self.loop_statement(Some(name));
		}

		let node = match &self.cur().tok {
			Tok::LBrace => self.block(),
			Tok::Let => self.let_decl(),
			Tok::Const => self.const_decl(),
			Tok::Function => self.function_decl(),
			Tok::If => self.if_statement(),
			Tok::Switch => self.switch_statement(),
			Tok::While | Tok::Do | Tok::For => self.loop_statement(None),
			Tok::Break => {
				self.bump();
				let label = match self.cur().tok.clone() {
					Tok::Ident(s) => {
						self.bump();
						Some(s)
					},
					_ => None,
				};
				Ok(Node::Break(label))
			},
			Tok::Continue => {
				self.bump();
				let label = match self.cur().tok.clone() {
					Tok::Ident(s) => {
						self.bump();
						Some(s)
					},
					_ => None,
				};
				Ok(Node::Continue(label))
			},
			Tok::Return => {
				self.bump();
				let value = if self.at(&Tok::Semicolon) || self.at(&Tok::RBrace) || self.at(&Tok::Eof) {
					None
				} else {
					Some(Box::new(self.expression()?))
				};
				Ok(Node::Return(value))
			},
			Tok::Throw => {
				self.bump();
				Ok(Node::Throw(Box::new(self.expression()?)))
			},
			Tok::Try => self.try_statement(),
			Tok::Import => self.import_decl(),
			Tok::Export => {
				self.bump();
				let inner = match &self.cur().tok {
					Tok::Let | Tok::Const | Tok::Function => self.statement()?,
					_ => return Err(self.error("export must precede a declaration")),
				};
				Ok(Node::Export(Box::new(inner)))
			},
			_ => {
				let e = self.expression()?;
				Ok(e)
			},
		}?;
		self.semi();
		Ok(node)
	}

	fn block(&mut self) -> Result<Node, ParseError> {
		self.expect(&Tok::LBrace)?;
		let mut body = Vec::new();
		while !self.at(&Tok::RBrace) && !self.at(&Tok::Eof) {
			body.push(self.statement()?);
		}
		self.expect(&Tok::RBrace)?;
		Ok(Node::Block(body))
	}

	fn let_decl(&mut self) -> Result<Node, ParseError> {
		self.expect(&Tok::Let)?;
		let name = self.ident()?;
		let init = if self.eat(&Tok::Assign) {
			Some(Box::new(self.expression()?))
		} else {
			None
		};
		Ok(Node::Let { name, init })
	}

	fn const_decl(&mut self) -> Result<Node, ParseError> {
		self.expect(&Tok::Const)?;
		let name = self.ident()?;
		self.expect(&Tok::Assign)?;
		let init = Box::new(self.expression()?);
		Ok(Node::Const { name, init })
	}

	fn function_decl(&mut self) -> Result<Node, ParseError> {
		self.expect(&Tok::Function)?;
		let name = Some(self.ident()?);
		let params = self.params()?;
		let body = self.block()?;
		Ok(Node::Func(Arc::new(FuncDecl {
			name,
			params,
			body,
			arrow: false,
		})))
	}

	fn params(&mut self) -> Result<Vec<Param>, ParseError> {
		self.expect(&Tok::LParen)?;
		let mut params = Vec::new();
		while !self.at(&Tok::RParen) {
			let rest = self.eat(&Tok::Ellipsis);
			let name = self.ident()?;
			params.push(Param { name, rest });
			if rest && !self.at(&Tok::RParen) {
				return Err(self.error("rest parameter must be last"));
			}
			if !self.eat(&Tok::Comma) {
				break;
			}
		}
		self.expect(&Tok::RParen)?;
		Ok(params)
	}

	fn if_statement(&mut self) -> Result<Node, ParseError> {
		self.expect(&Tok::If)?;
		self.expect(&Tok::LParen)?;
		let test = Box::new(self.expression()?);
		self.expect(&Tok::RParen)?;
		let then = Box::new(self.statement()?);
		let alt = if self.eat(&Tok::Else) {
			Some(Box::new(self.statement()?))
		} else {
			None
		};
		Ok(Node::If { test, then, alt })
	}

	fn switch_statement(&mut self) -> Result<Node, ParseError> {
		self.expect(&Tok::Switch)?;
		self.expect(&Tok::LParen)?;
		let disc = Box::new(self.expression()?);
		self.expect(&Tok::RParen)?;
		self.expect(&Tok::LBrace)?;
		let mut cases = Vec::new();
		while !self.at(&Tok::RBrace) && !self.at(&Tok::Eof) {
			let test = if self.eat(&Tok::Case) {
				let e = self.expression()?;
				Some(e)
			} else {
				self.expect(&Tok::Default)?;
				None
			};
			self.expect(&Tok::Colon)?;
			let mut body = Vec::new();
			while !self.at(&Tok::Case) && !self.at(&Tok::Default) && !self.at(&Tok::RBrace) {
				body.push(self.statement()?);
			}
			cases.push(SwitchCase { test, body });
		}
		self.expect(&Tok::RBrace)?;
		Ok(Node::Switch { disc, cases })
	}

	fn loop_statement(&mut self, label: Option<Arc<str>>) -> Result<Node, ParseError> {
		match &self.cur().tok {
			Tok::While => {
				self.bump();
				self.expect(&Tok::LParen)?;
				let test = Box::new(self.expression()?);
				self.expect(&Tok::RParen)?;
				let body = Box::new(self.statement()?);
				Ok(Node::While { label, test, body })
			},
			Tok::Do => {
				self.bump();
				let body = Box::new(self.statement()?);
				self.expect(&Tok::While)?;
				self.expect(&Tok::LParen)?;
				let test = Box::new(self.expression()?);
				self.expect(&Tok::RParen)?;
				Ok(Node::DoWhile { label, body, test })
			},
			Tok::For => self.for_statement(label),
			other => Err(self.error(format!("expected loop, found {other}"))),
		}
	}

	fn for_statement(&mut self, label: Option<Arc<str>>) -> Result<Node, ParseError> {
		self.expect(&Tok::For)?;
		self.expect(&Tok::LParen)?;

		// for (let x of e), for (let x in e), for (x of e), for (x in e)
		let decl = matches!(self.cur().tok, Tok::Let | Tok::Const);
		let ident_at = if decl { 1 } else { 0 };
		if let Tok::Ident(bind) = self.peek_tok(ident_at).clone()
			&& matches!(self.peek_tok(ident_at + 1), Tok::Of | Tok::In)
		{
			if decl {
				self.bump();
			}
			self.bump();
			let of = self.eat(&Tok::Of);
			if !of {
				self.expect(&Tok::In)?;
			}
			let iter = Box::new(self.expression()?);
			self.expect(&Tok::RParen)?;
			let body = Box::new(self.statement()?);
			return Ok(if of {
				Node::ForOf {
					label,
					bind,
					iter,
					body,
				}
			} else {
				Node::ForIn {
					label,
					bind,
					iter,
					body,
				}
			});
		}

		let init = if self.at(&Tok::Semicolon) {
			None
		} else if self.at(&Tok::Let) {
			Some(Box::new(self.let_decl()?))
		} else if self.at(&Tok::Const) {
			Some(Box::new(self.const_decl()?))
		} else {
			Some(Box::new(self.expression()?))
		};
		self.expect(&Tok::Semicolon)?;
		let test = if self.at(&Tok::Semicolon) {
			None
		} else {
			Some(Box::new(self.expression()?))
		};
		self.expect(&Tok::Semicolon)?;
		let post = if self.at(&Tok::RParen) {
			None
		} else {
			Some(Box::new(self.expression()?))
		};
		self.expect(&Tok::RParen)?;
		let body = Box::new(self.statement()?);
		Ok(Node::For {
			label,
			init,
			test,
			post,
			body,
		})
	}

	fn try_statement(&mut self) -> Result<Node, ParseError> {
		self.expect(&Tok::Try)?;
		let block = Box::new(self.block()?);
		let catch = if self.eat(&Tok::Catch) {
			let bind = if self.eat(&Tok::LParen) {
				let name = self.ident()?;
				self.expect(&Tok::RParen)?;
				Some(name)
			} else {
				None
			};
			Some(CatchClause {
				bind,
				body: Box::new(self.block()?),
			})
		} else {
			None
		};
		let finally = if self.eat(&Tok::Finally) {
			Some(Box::new(self.block()?))
		} else {
			None
		};
		if catch.is_none() && finally.is_none() {
			return Err(self.error("try requires catch or finally"));
		}
		Ok(Node::Try {
			block,
			catch,
			finally,
		})
	}

	fn import_decl(&mut self) -> Result<Node, ParseError> {
		self.expect(&Tok::Import)?;
		let kind = match self.cur().tok.clone() {
			Tok::Star => {
				self.bump();
				self.expect(&Tok::As)?;
				ImportKind::Namespace(self.ident()?)
			},
			Tok::LBrace => {
				self.bump();
				let mut names = Vec::new();
				while !self.at(&Tok::RBrace) {
					let name = self.ident()?;
					let alias = if self.eat(&Tok::As) {
						self.ident()?
					} else {
						name.clone()
					};
					names.push((name, alias));
					if !self.eat(&Tok::Comma) {
						break;
					}
				}
				self.expect(&Tok::RBrace)?;
				ImportKind::Named(names)
			},
			_ => ImportKind::Default(self.ident()?),
		};
		self.expect(&Tok::From)?;
		let from = match self.cur().tok.clone() {
			Tok::Str(s) => {
				self.bump();
				s
			},
			other => return Err(self.error(format!("expected module path, found {other}"))),
		};
		Ok(Node::Import(ImportDecl { kind, from }))
	}

	// ---- expressions ----

	fn expression(&mut self) -> Result<Node, ParseError> {
		self.assignment()
	}

	fn assignment(&mut self) -> Result<Node, ParseError> {
		// Arrow functions sit at assignment precedence.
		if let Some(arrow) = self.try_arrow()? {
			return Ok(arrow);
		}
		let left = self.conditional()?;
		let op = match &self.cur().tok {
			Tok::Assign => AssignOp::Assign,
			Tok::PlusAssign => AssignOp::Add,
			Tok::MinusAssign => AssignOp::Sub,
			Tok::StarAssign => AssignOp::Mul,
			Tok::SlashAssign => AssignOp::Div,
			Tok::PercentAssign => AssignOp::Rem,
			_ => return Ok(left),
		};
		if !matches!(left, Node::Ident(_) | Node::Access { .. } | Node::Index { .. }) {
			return Err(self.error("invalid assignment target"));
		}
		self.bump();
		let value = Box::new(self.assignment()?);
		Ok(Node::Assign {
			target: Box::new(left),
			op,
			value,
		})
	}

	/// Attempts `x => …` and `(a, b) => …`; restores the cursor when the
	/// lookahead is not actually an arrow head.
	fn try_arrow(&mut self) -> Result<Option<Node>, ParseError> {
		let start = self.pos;
		let params = match self.cur().tok.clone() {
			Tok::Ident(name) if self.peek_tok(1) == &Tok::Arrow => {
				self.bump();
				vec![Param { name, rest: false }]
			},
			Tok::LParen => {
				match self.params() {
					Ok(params) if self.at(&Tok::Arrow) => params,
					_ => {
						self.pos = start;
						return Ok(None);
					},
				}
			},
			_ => return Ok(None),
		};
		self.expect(&Tok::Arrow)?;
		let body = if self.at(&Tok::LBrace) {
			self.block()?
		} else {
			// Expression body: implicit return.
			Node::Return(Some(Box::new(self.assignment()?)))
		};
		Ok(Some(Node::Func(Arc::new(FuncDecl {
			name: None,
			params,
			body,
			arrow: true,
		}))))
	}

	fn conditional(&mut self) -> Result<Node, ParseError> {
		let test = self.coalesce()?;
		if self.eat(&Tok::Question) {
			let then = Box::new(self.assignment()?);
			self.expect(&Tok::Colon)?;
			let alt = Box::new(self.assignment()?);
			return Ok(Node::Cond {
				test: Box::new(test),
				then,
				alt,
			});
		}
		Ok(test)
	}

	fn coalesce(&mut self) -> Result<Node, ParseError> {
		let mut left = self.logical_or()?;
		while self.eat(&Tok::Coalesce) {
			let right = self.logical_or()?;
			left = Node::Binary {
				op: BinaryOp::Coalesce,
				left: Box::new(left),
				right: Box::new(right),
			};
		}
		Ok(left)
	}

	fn logical_or(&mut self) -> Result<Node, ParseError> {
		let mut left = self.logical_and()?;
		while self.eat(&Tok::OrOr) {
			let right = self.logical_and()?;
			left = Node::Binary {
				op: BinaryOp::Or,
				left: Box::new(left),
				right: Box::new(right),
			};
		}
		Ok(left)
	}

	fn logical_and(&mut self) -> Result<Node, ParseError> {
		let mut left = self.equality()?;
		while self.eat(&Tok::AndAnd) {
			let right = self.equality()?;
			left = Node::Binary {
				op: BinaryOp::And,
				left: Box::new(left),
				right: Box::new(right),
			};
		}
		Ok(left)
	}

	fn equality(&mut self) -> Result<Node, ParseError> {
		let mut left = self.relational()?;
		loop {
			let op = match &self.cur().tok {
				Tok::Eq => BinaryOp::Eq,
				Tok::StrictEq => BinaryOp::StrictEq,
				Tok::Ne => BinaryOp::Ne,
				Tok::StrictNe => BinaryOp::StrictNe,
				_ => return Ok(left),
			};
			self.bump();
			let right = self.relational()?;
			left = Node::Binary {
				op,
				left: Box::new(left),
				right: Box::new(right),
			};
		}
	}

	fn relational(&mut self) -> Result<Node, ParseError> {
		let mut left = self.additive()?;
		loop {
			let op = match &self.cur().tok {
				Tok::Lt => BinaryOp::Lt,
				Tok::Le => BinaryOp::Le,
				Tok::Gt => BinaryOp::Gt,
				Tok::Ge => BinaryOp::Ge,
				Tok::Instanceof => BinaryOp::Instanceof,
				Tok::In => BinaryOp::In,
				_ => return Ok(left),
			};
			self.bump();
			let right = self.additive()?;
			left = Node::Binary {
				op,
				left: Box::new(left),
				right: Box::new(right),
			};
		}
	}

	fn additive(&mut self) -> Result<Node, ParseError> {
		let mut left = self.multiplicative()?;
		loop {
			let op = match &self.cur().tok {
				Tok::Plus => BinaryOp::Add,
				Tok::Minus => BinaryOp::Sub,
				_ => return Ok(left),
			};
			self.bump();
			let right = self.multiplicative()?;
			left = Node::Binary {
				op,
				left: Box::new(left),
				right: Box::new(right),
			};
		}
	}

	fn multiplicative(&mut self) -> Result<Node, ParseError> {
		let mut left = self.power()?;
		loop {
			let op = match &self.cur().tok {
				Tok::Star => BinaryOp::Mul,
				Tok::Slash => BinaryOp::Div,
				Tok::Percent => BinaryOp::Rem,
				_ => return Ok(left),
			};
			self.bump();
			let right = self.power()?;
			left = Node::Binary {
				op,
				left: Box::new(left),
				right: Box::new(right),
			};
		}
	}

	fn power(&mut self) -> Result<Node, ParseError> {
		let base = self.unary()?;
		if self.eat(&Tok::StarStar) {
			// Right-associative.
			let exp = self.power()?;
			return Ok(Node::Binary {
				op: BinaryOp::Pow,
				left: Box::new(base),
				right: Box::new(exp),
			});
		}
		Ok(base)
	}

	fn unary(&mut self) -> Result<Node, ParseError> {
		let op = match &self.cur().tok {
			Tok::Plus => Some(UnaryOp::Plus),
			Tok::Minus => Some(UnaryOp::Neg),
			Tok::Bang => Some(UnaryOp::Not),
			Tok::Typeof => Some(UnaryOp::Typeof),
			Tok::Delete => Some(UnaryOp::Delete),
			Tok::Incr | Tok::Decr => {
				let delta = if self.at(&Tok::Incr) { 1.0 } else { -1.0 };
				self.bump();
				let target = self.unary()?;
				if !matches!(target, Node::Ident(_) | Node::Access { .. } | Node::Index { .. }) {
					return Err(self.error("invalid increment target"));
				}
				return Ok(Node::Step {
					target: Box::new(target),
					prefix: true,
					delta,
				});
			},
			Tok::New => return Err(self.error("`new` is not supported")),
			_ => None,
		};
		if let Some(op) = op {
			self.bump();
			let expr = Box::new(self.unary()?);
			return Ok(Node::Unary { op, expr });
		}
		self.postfix()
	}

	fn postfix(&mut self) -> Result<Node, ParseError> {
		let mut node = self.primary()?;
		loop {
			match &self.cur().tok {
				Tok::Dot => {
					self.bump();
					let field = self.ident()?;
					node = Node::Access {
						target: Box::new(node),
						field,
						optional: false,
					};
				},
				Tok::OptionalDot => {
					self.bump();
					let field = self.ident()?;
					node = Node::Access {
						target: Box::new(node),
						field,
						optional: true,
					};
				},
				Tok::LBracket => {
					self.bump();
					let index = Box::new(self.expression()?);
					self.expect(&Tok::RBracket)?;
					node = Node::Index {
						target: Box::new(node),
						index,
					};
				},
				Tok::LParen => {
					self.bump();
					let mut args = Vec::new();
					while !self.at(&Tok::RParen) {
						if self.eat(&Tok::Ellipsis) {
							args.push(Node::Spread(Box::new(self.assignment()?)));
						} else {
							args.push(self.assignment()?);
						}
						if !self.eat(&Tok::Comma) {
							break;
						}
					}
					self.expect(&Tok::RParen)?;
					node = Node::Call {
						callee: Box::new(node),
						args,
					};
				},
				Tok::Incr | Tok::Decr => {
					if !matches!(node, Node::Ident(_) | Node::Access { .. } | Node::Index { .. }) {
						return Ok(node);
					}
					let delta = if self.at(&Tok::Incr) { 1.0 } else { -1.0 };
					self.bump();
					node = Node::Step {
						target: Box::new(node),
						prefix: false,
						delta,
					};
				},
				_ => return Ok(node),
			}
		}
	}

	fn primary(&mut self) -> Result<Node, ParseError> {
		let node = match self.cur().tok.clone() {
			Tok::Number(n) => {
				self.bump();
				Node::Number(n)
			},
			Tok::Str(s) => {
				self.bump();
				Node::Str(s)
			},
			Tok::Template(chunks) => {
				self.bump();
				let mut parts = Vec::new();
				for chunk in chunks {
					match chunk {
						TemplateChunk::Lit(s) => parts.push(Node::Str(s)),
						TemplateChunk::Expr(src) => {
							let tokens = Lexer::tokenize(&src)?;
							let mut sub = Parser { tokens, pos: 0 };
							let expr = sub.expression()?;
							if !sub.at(&Tok::Eof) {
								return Err(sub.error("unexpected trailing input in template expression"));
							}
							parts.push(expr);
						},
					}
				}
				Node::Template(parts)
			},
			Tok::True => {
				self.bump();
				Node::Bool(true)
			},
			Tok::False => {
				self.bump();
				Node::Bool(false)
			},
			Tok::Null => {
				self.bump();
				Node::Null
			},
			Tok::Undefined => {
				self.bump();
				Node::Undefined
			},
			Tok::This => {
				self.bump();
				Node::This
			},
			Tok::Ident(name) => {
				self.bump();
				Node::Ident(name)
			},
			Tok::LParen => {
				self.bump();
				let inner = self.expression()?;
				self.expect(&Tok::RParen)?;
				inner
			},
			Tok::LBracket => {
				self.bump();
				let mut items = Vec::new();
				while !self.at(&Tok::RBracket) {
					if self.eat(&Tok::Ellipsis) {
						items.push(Node::Spread(Box::new(self.assignment()?)));
					} else {
						items.push(self.assignment()?);
					}
					if !self.eat(&Tok::Comma) {
						break;
					}
				}
				self.expect(&Tok::RBracket)?;
				Node::Array(items)
			},
			Tok::LBrace => {
				self.bump();
				let mut props = Vec::new();
				while !self.at(&Tok::RBrace) {
					if self.eat(&Tok::Ellipsis) {
						// Spread in object literal merges the operand's entries.
						props.push(ObjectProp::Spread(self.assignment()?));
					} else {
						let key = match self.cur().tok.clone() {
							Tok::Str(s) => {
								self.bump();
								PropKey::Ident(s)
							},
							Tok::Number(n) => {
								self.bump();
								PropKey::Ident(Arc::from(format_number_key(n).as_str()))
							},
							Tok::LBracket => {
								self.bump();
								let e = self.expression()?;
								self.expect(&Tok::RBracket)?;
								PropKey::Computed(Box::new(e))
							},
							_ => PropKey::Ident(self.ident()?),
						};
						let value = if self.eat(&Tok::Colon) {
							self.assignment()?
						} else {
							// Shorthand `{ name }`.
							match &key {
								PropKey::Ident(name) => Node::Ident(name.clone()),
								PropKey::Computed(_) => {
									return Err(self.error("computed key requires a value"));
								},
							}
						};
						props.push(ObjectProp::KeyValue(key, value));
					}
					if !self.eat(&Tok::Comma) {
						break;
					}
				}
				self.expect(&Tok::RBrace)?;
				Node::Object(props)
			},
			Tok::Function => {
				self.bump();
				let name = match self.cur().tok.clone() {
					Tok::Ident(s) => {
						self.bump();
						Some(s)
					},
					_ => None,
				};
				let params = self.params()?;
				let body = self.block()?;
				Node::Func(Arc::new(FuncDecl {
					name,
					params,
					body,
					arrow: false,
				}))
			},
			other => return Err(self.error(format!("unexpected {other}"))),
		};
		Ok(node)
	}
}

/// JS-style property key for a numeric literal: integral values print without
/// a fraction.
pub(crate) fn format_number_key(n: f64) -> String {
	if n.fract() == 0.0 && n.is_finite() {
		format!("{}", n as i64)
	} else {
		format!("{n}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(src: &str) -> Vec<Node> {
		Script::parse(src).unwrap().body
	}

	#[test]
	fn precedence() {
		let body = parse("1 + 2 * 3");
		assert_eq!(
			body[0],
			Node::Binary {
				op: BinaryOp::Add,
				left: Box::new(Node::Number(1.0)),
				right: Box::new(Node::Binary {
					op: BinaryOp::Mul,
					left: Box::new(Node::Number(2.0)),
					right: Box::new(Node::Number(3.0)),
				}),
			}
		);
	}

	#[test]
	fn arrow_vs_paren() {
		let body = parse("(a, b) => a + b");
		let Node::Func(f) = &body[0] else {
			panic!("expected function, got {body:?}");
		};
		assert!(f.arrow);
		assert_eq!(f.params.len(), 2);

		let body = parse("(a)");
		assert_eq!(body[0], Node::Ident("a".into()));
	}

	#[test]
	fn for_variants() {
		assert!(matches!(parse("for (let i = 0; i < 3; i++) {}")[0], Node::For { .. }));
		assert!(matches!(parse("for (let x of xs) {}")[0], Node::ForOf { .. }));
		assert!(matches!(parse("for (k in m) {}")[0], Node::ForIn { .. }));
	}

	#[test]
	fn labelled_loop() {
		let body = parse("outer: while (true) { break outer }");
		let Node::While { label, .. } = &body[0] else {
			panic!("expected while");
		};
		assert_eq!(label.as_deref(), Some("outer"));
	}

	#[test]
	fn imports() {
		assert_eq!(
			parse(r#"import * as util from "lib/util.js""#)[0],
			Node::Import(ImportDecl {
				kind: ImportKind::Namespace("util".into()),
				from: "lib/util.js".into(),
			})
		);
		assert_eq!(
			parse(r#"import { a, b as c } from "m.js""#)[0],
			Node::Import(ImportDecl {
				kind: ImportKind::Named(vec![("a".into(), "a".into()), ("b".into(), "c".into())]),
				from: "m.js".into(),
			})
		);
	}

	#[test]
	fn optional_chain() {
		let body = parse("a?.b");
		assert_eq!(
			body[0],
			Node::Access {
				target: Box::new(Node::Ident("a".into())),
				field: "b".into(),
				optional: true,
			}
		);
	}

	#[test]
	fn try_catch_finally() {
		let body = parse("try { f() } catch (e) { g(e) } finally { h() }");
		let Node::Try { catch, finally, .. } = &body[0] else {
			panic!("expected try");
		};
		assert_eq!(catch.as_ref().unwrap().bind.as_deref(), Some("e"));
		assert!(finally.is_some());
	}
}
