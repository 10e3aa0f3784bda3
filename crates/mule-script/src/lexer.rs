use std::sync::Arc;

use crate::errors::ParseError;
use crate::token::{TemplateChunk, Tok, Token};

pub struct Lexer<'a> {
	src: &'a [u8],
	pos: usize,
	line: usize,
	column: usize,
}

impl<'a> Lexer<'a> {
	pub fn new(src: &'a str) -> Self {
		Self {
			src: src.as_bytes(),
			pos: 0,
			line: 1,
			column: 1,
		}
	}

	pub fn tokenize(src: &'a str) -> Result<Vec<Token>, ParseError> {
		let mut lx = Lexer::new(src);
		let mut out = Vec::new();
		loop {
			let tok = lx.next_token()?;
			let done = tok.tok == Tok::Eof;
			out.push(tok);
			if done {
				return Ok(out);
			}
		}
	}

	fn error(&self, message: impl Into<String>) -> ParseError {
		ParseError::new(message, self.line, self.column)
	}

	fn peek(&self) -> Option<u8> {
		self.src.get(self.pos).copied()
	}

	fn peek_at(&self, n: usize) -> Option<u8> {
		self.src.get(self.pos + n).copied()
	}

	fn bump(&mut self) -> Option<u8> {
		let c = self.peek()?;
		self.pos += 1;
		if c == b'\n' {
			self.line += 1;
			self.column = 1;
		} else {
			self.column += 1;
		}
		Some(c)
	}

	fn eat(&mut self, c: u8) -> bool {
		if self.peek() == Some(c) {
			self.bump();
			true
		} else {
			false
		}
	}

	fn skip_trivia(&mut self) -> Result<(), ParseError> {
		loop {
			match self.peek() {
				Some(c) if c.is_ascii_whitespace() => {
					self.bump();
				},
				Some(b'/') if self.peek_at(1) == Some(b'/') => {
					while let Some(c) = self.peek() {
						if c == b'\n' {
							break;
						}
						self.bump();
					}
				},
				Some(b'/') if self.peek_at(1) == Some(b'*') => {
					self.bump();
					self.bump();
					loop {
						match self.peek() {
							Some(b'*') if self.peek_at(1) == Some(b'/') => {
								self.bump();
								self.bump();
								break;
							},
							Some(_) => {
								self.bump();
							},
							None => return Err(self.error("unterminated block comment")),
						}
					}
				},
				_ => return Ok(()),
			}
		}
	}

	fn next_token(&mut self) -> Result<Token, ParseError> {
		self.skip_trivia()?;
		let (line, column) = (self.line, self.column);
		let at = |tok| Token { tok, line, column };

		let Some(c) = self.peek() else {
			return Ok(at(Tok::Eof));
		};

		if c.is_ascii_alphabetic() || c == b'_' || c == b'$' {
			let word = self.lex_word();
			let tok = Tok::keyword(&word).unwrap_or_else(|| Tok::Ident(Arc::from(word.as_str())));
			return Ok(at(tok));
		}
		if c.is_ascii_digit() {
			return Ok(at(self.lex_number()?));
		}
		if c == b'"' || c == b'\'' {
			return Ok(at(self.lex_string(c)?));
		}
		if c == b'`' {
			return Ok(at(self.lex_template()?));
		}

		self.bump();
		let tok = match c {
			b'(' => Tok::LParen,
			b')' => Tok::RParen,
			b'{' => Tok::LBrace,
			b'}' => Tok::RBrace,
			b'[' => Tok::LBracket,
			b']' => Tok::RBracket,
			b',' => Tok::Comma,
			b';' => Tok::Semicolon,
			b':' => Tok::Colon,
			b'.' => {
				if self.peek() == Some(b'.') && self.peek_at(1) == Some(b'.') {
					self.bump();
					self.bump();
					Tok::Ellipsis
				} else {
					Tok::Dot
				}
			},
			b'+' => {
				if self.eat(b'+') {
					Tok::Incr
				} else if self.eat(b'=') {
					Tok::PlusAssign
				} else {
					Tok::Plus
				}
			},
			b'-' => {
				if self.eat(b'-') {
					Tok::Decr
				} else if self.eat(b'=') {
					Tok::MinusAssign
				} else {
					Tok::Minus
				}
			},
			b'*' => {
				if self.eat(b'*') {
					Tok::StarStar
				} else if self.eat(b'=') {
					Tok::StarAssign
				} else {
					Tok::Star
				}
			},
			b'/' => {
				if self.eat(b'=') {
					Tok::SlashAssign
				} else {
					Tok::Slash
				}
			},
			b'%' => {
				if self.eat(b'=') {
					Tok::PercentAssign
				} else {
					Tok::Percent
				}
			},
			b'!' => {
				if self.eat(b'=') {
					if self.eat(b'=') { Tok::StrictNe } else { Tok::Ne }
				} else {
					Tok::Bang
				}
			},
			b'=' => {
				if self.eat(b'=') {
					if self.eat(b'=') { Tok::StrictEq } else { Tok::Eq }
				} else if self.eat(b'>') {
					Tok::Arrow
				} else {
					Tok::Assign
				}
			},
			b'<' => {
				if self.eat(b'=') {
					Tok::Le
				} else {
					Tok::Lt
				}
			},
			b'>' => {
				if self.eat(b'=') {
					Tok::Ge
				} else {
					Tok::Gt
				}
			},
			b'&' => {
				if self.eat(b'&') {
					Tok::AndAnd
				} else {
					return Err(self.error("unexpected character `&`"));
				}
			},
			b'|' => {
				if self.eat(b'|') {
					Tok::OrOr
				} else {
					return Err(self.error("unexpected character `|`"));
				}
			},
			b'?' => {
				if self.eat(b'?') {
					Tok::Coalesce
				} else if self.eat(b'.') {
					Tok::OptionalDot
				} else {
					Tok::Question
				}
			},
			other => {
				return Err(self.error(format!("unexpected character `{}`", other as char)));
			},
		};
		Ok(at(tok))
	}

	fn lex_word(&mut self) -> String {
		let start = self.pos;
		while let Some(c) = self.peek() {
			if c.is_ascii_alphanumeric() || c == b'_' || c == b'$' {
				self.bump();
			} else {
				break;
			}
		}
		String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
	}

	fn lex_number(&mut self) -> Result<Tok, ParseError> {
		let start = self.pos;
		if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x') | Some(b'X')) {
			self.bump();
			self.bump();
			let hex_start = self.pos;
			while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
				self.bump();
			}
			let digits = std::str::from_utf8(&self.src[hex_start..self.pos])
				.map_err(|_| self.error("invalid number"))?;
			let v =
				u64::from_str_radix(digits, 16).map_err(|e| self.error(format!("invalid number: {e}")))?;
			return Ok(Tok::Number(v as f64));
		}
		while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
			self.bump();
		}
		if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
			self.bump();
			while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
				self.bump();
			}
		}
		if matches!(self.peek(), Some(b'e') | Some(b'E')) {
			self.bump();
			if matches!(self.peek(), Some(b'+') | Some(b'-')) {
				self.bump();
			}
			while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
				self.bump();
			}
		}
		let text = std::str::from_utf8(&self.src[start..self.pos])
			.map_err(|_| self.error("invalid number"))?;
		text
			.parse::<f64>()
			.map(Tok::Number)
			.map_err(|e| self.error(format!("invalid number: {e}")))
	}

	fn lex_escape(&mut self) -> Result<char, ParseError> {
		match self.bump() {
			Some(b'n') => Ok('\n'),
			Some(b't') => Ok('\t'),
			Some(b'r') => Ok('\r'),
			Some(b'0') => Ok('\0'),
			Some(b'\\') => Ok('\\'),
			Some(b'\'') => Ok('\''),
			Some(b'"') => Ok('"'),
			Some(b'`') => Ok('`'),
			Some(b'$') => Ok('$'),
			Some(b'u') => {
				if !self.eat(b'{') {
					return Err(self.error("expected `{` after \\u"));
				}
				let start = self.pos;
				while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
					self.bump();
				}
				let digits = std::str::from_utf8(&self.src[start..self.pos])
					.map_err(|_| self.error("invalid unicode escape"))?
					.to_string();
				if !self.eat(b'}') {
					return Err(self.error("unterminated unicode escape"));
				}
				let cp =
					u32::from_str_radix(&digits, 16).map_err(|_| self.error("invalid unicode escape"))?;
				char::from_u32(cp).ok_or_else(|| self.error("invalid unicode codepoint"))
			},
			Some(other) => Err(self.error(format!("unknown escape `\\{}`", other as char))),
			None => Err(self.error("unterminated escape")),
		}
	}

	fn lex_string(&mut self, quote: u8) -> Result<Tok, ParseError> {
		self.bump();
		let mut out = String::new();
		loop {
			match self.bump() {
				Some(c) if c == quote => return Ok(Tok::Str(Arc::from(out.as_str()))),
				Some(b'\\') => out.push(self.lex_escape()?),
				Some(b'\n') => return Err(self.error("unterminated string literal")),
				Some(c) => {
					// Re-assemble multi-byte UTF-8 sequences.
					if c < 0x80 {
						out.push(c as char);
					} else {
						let mut buf = vec![c];
						while let Some(b) = self.peek() {
							if b & 0xC0 != 0x80 {
								break;
							}
							buf.push(b);
							self.bump();
						}
						out.push_str(&String::from_utf8_lossy(&buf));
					}
				},
				None => return Err(self.error("unterminated string literal")),
			}
		}
	}

	fn lex_template(&mut self) -> Result<Tok, ParseError> {
		self.bump();
		let mut chunks = Vec::new();
		let mut lit = String::new();
		loop {
			match self.bump() {
				Some(b'`') => {
					if !lit.is_empty() || chunks.is_empty() {
						chunks.push(TemplateChunk::Lit(Arc::from(lit.as_str())));
					}
					return Ok(Tok::Template(chunks));
				},
				Some(b'\\') => lit.push(self.lex_escape()?),
				Some(b'$') if self.peek() == Some(b'{') => {
					self.bump();
					if !lit.is_empty() {
						chunks.push(TemplateChunk::Lit(Arc::from(lit.as_str())));
						lit.clear();
					}
					// Scan the embedded expression source, tracking brace depth
					// so nested object literals survive.
					let mut depth = 1usize;
					let mut expr: Vec<u8> = Vec::new();
					loop {
						match self.bump() {
							Some(b'{') => {
								depth += 1;
								expr.push(b'{');
							},
							Some(b'}') => {
								depth -= 1;
								if depth == 0 {
									break;
								}
								expr.push(b'}');
							},
							Some(c) => expr.push(c),
							None => return Err(self.error("unterminated template expression")),
						}
					}
					chunks.push(TemplateChunk::Expr(
						String::from_utf8_lossy(&expr).into_owned(),
					));
				},
				Some(c) => {
					if c < 0x80 {
						lit.push(c as char);
					} else {
						let mut buf = vec![c];
						while let Some(b) = self.peek() {
							if b & 0xC0 != 0x80 {
								break;
							}
							buf.push(b);
							self.bump();
						}
						lit.push_str(&String::from_utf8_lossy(&buf));
					}
				},
				None => return Err(self.error("unterminated template literal")),
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn toks(src: &str) -> Vec<Tok> {
		Lexer::tokenize(src)
			.unwrap()
			.into_iter()
			.map(|t| t.tok)
			.collect()
	}

	#[test]
	fn operators_max_munch() {
		assert_eq!(
			toks("a === b !== c ?? d?.e"),
			vec![
				Tok::Ident("a".into()),
				Tok::StrictEq,
				Tok::Ident("b".into()),
				Tok::StrictNe,
				Tok::Ident("c".into()),
				Tok::Coalesce,
				Tok::Ident("d".into()),
				Tok::OptionalDot,
				Tok::Ident("e".into()),
				Tok::Eof,
			]
		);
	}

	#[test]
	fn numbers() {
		assert_eq!(
			toks("1 2.5 1e3 0xff"),
			vec![
				Tok::Number(1.0),
				Tok::Number(2.5),
				Tok::Number(1000.0),
				Tok::Number(255.0),
				Tok::Eof,
			]
		);
	}

	#[test]
	fn strings_and_escapes() {
		assert_eq!(
			toks(r#"'a\n' "b\"c""#),
			vec![Tok::Str("a\n".into()), Tok::Str("b\"c".into()), Tok::Eof]
		);
	}

	#[test]
	fn template_chunks() {
		let got = toks("`a ${x + 1} b`");
		let Tok::Template(chunks) = &got[0] else {
			panic!("expected template, got {got:?}");
		};
		assert_eq!(
			chunks,
			&vec![
				TemplateChunk::Lit("a ".into()),
				TemplateChunk::Expr("x + 1".to_string()),
				TemplateChunk::Lit(" b".into()),
			]
		);
	}

	#[test]
	fn comments_are_trivia() {
		assert_eq!(
			toks("a // line\n/* block */ b"),
			vec![Tok::Ident("a".into()), Tok::Ident("b".into()), Tok::Eof]
		);
	}
}
