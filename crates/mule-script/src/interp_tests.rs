use assert_matches::assert_matches;

use super::*;
use crate::builtins::prelude;
use crate::errors::ExecutionError;
use crate::parser::Script;
use crate::value::Value;

fn eval(src: &str) -> Value {
	let script = Script::parse(src).unwrap_or_else(|e| panic!("parse failed: {e}\n{src}"));
	let scope = prelude().child();
	Interp::default()
		.run(&script, &scope)
		.unwrap_or_else(|e| panic!("eval failed: {e}\n{src}"))
}

fn eval_err(src: &str) -> ExecutionError {
	let script = Script::parse(src).unwrap_or_else(|e| panic!("parse failed: {e}\n{src}"));
	let scope = prelude().child();
	Interp::default()
		.run(&script, &scope)
		.expect_err("expected error")
}

fn num(src: &str) -> f64 {
	match eval(src) {
		Value::Float(f) => f,
		other => panic!("expected number, got {other:?} for {src}"),
	}
}

fn boolean(src: &str) -> bool {
	match eval(src) {
		Value::Bool(b) => b,
		other => panic!("expected bool, got {other:?} for {src}"),
	}
}

fn text(src: &str) -> String {
	match eval(src) {
		Value::String(s) => s.to_string(),
		other => panic!("expected string, got {other:?} for {src}"),
	}
}

#[test]
fn arithmetic() {
	assert_eq!(num("1 + 2 * 3"), 7.0);
	assert_eq!(num("2 ** 10"), 1024.0);
	assert_eq!(num("10 % 3"), 1.0);
	assert_eq!(num("(1 + 2) * 3"), 9.0);
	assert_eq!(text("'a' + 1"), "a1");
	assert_eq!(text("1 + 'a'"), "1a");
}

#[test]
fn division_by_zero_is_an_error() {
	assert_matches!(eval_err("1 / 0"), ExecutionError::DivisionByZero);
	assert_matches!(eval_err("1 % 0"), ExecutionError::ModuloByZero);
}

#[test]
fn nan_propagates_through_undefined_operands() {
	assert!(num("undefined + 1").is_nan());
	assert!(num("undefined * 2").is_nan());
}

#[test]
fn equality_matrix() {
	assert!(boolean("1 == '1'"));
	assert!(!boolean("1 === '1'"));
	assert!(boolean("null == undefined"));
	assert!(!boolean("null === undefined"));
	assert!(boolean("true == 1"));
	assert!(!boolean("true === 1"));
	assert!(boolean("'a' === 'a'"));
	assert!(!boolean("NaN === NaN"));
}

#[test]
fn coalesce_and_logic() {
	assert_eq!(num("null ?? 5"), 5.0);
	assert_eq!(num("0 ?? 5"), 0.0);
	assert_eq!(num("0 || 5"), 5.0);
	assert_eq!(num("2 && 3"), 3.0);
	// Short circuit: the right side must not evaluate.
	assert_eq!(num("let x = 1; false && (x = 99); x"), 1.0);
}

#[test]
fn let_and_const_rules() {
	assert_matches!(
		eval_err("let a = 1; let a = 2"),
		ExecutionError::AlreadyDeclared(_)
	);
	assert_matches!(
		eval_err("const c = 1; c = 2"),
		ExecutionError::ConstAssignment(_)
	);
	assert_matches!(
		eval_err("const c = 1; const c = 2"),
		ExecutionError::AlreadyDeclared(_)
	);
	// Shadowing in a nested block is fine.
	assert_eq!(num("let a = 1; { let a = 2; } a"), 1.0);
}

#[test]
fn loops_and_labels() {
	assert_eq!(num("let n = 0; for (let i = 0; i < 5; i++) { n += i } n"), 10.0);
	assert_eq!(num("let n = 0; while (n < 7) { n++ } n"), 7.0);
	assert_eq!(num("let n = 0; do { n++ } while (n < 3); n"), 3.0);
	assert_eq!(
		num("let n = 0; for (let i = 0; i < 10; i++) { if (i === 3) break; n = i } n"),
		2.0
	);
	assert_eq!(
		num("let n = 0; for (let i = 0; i < 5; i++) { if (i % 2 === 0) continue; n += i } n"),
		4.0
	);
	assert_eq!(
		num(
			"let n = 0;
			outer: for (let i = 0; i < 3; i++) {
				for (let j = 0; j < 3; j++) {
					if (j === 1) continue outer
					n++
				}
			}
			n"
		),
		3.0
	);
}

#[test]
fn for_of_and_for_in() {
	assert_eq!(num("let n = 0; for (let x of [1, 2, 3]) { n += x } n"), 6.0);
	assert_eq!(
		text("let keys = ''; for (let k in { a: 1, b: 2 }) { keys += k } keys"),
		"ab"
	);
	assert_eq!(text("let s = ''; for (let c of 'abc') { s = c + s } s"), "cba");
}

#[test]
fn switch_falls_through_until_break() {
	let src = "
		let out = '';
		switch (2) {
			case 1: out += 'one';
			case 2: out += 'two';
			case 3: out += 'three'; break;
			default: out += 'other';
		}
		out";
	assert_eq!(text(src), "twothree");
}

#[test]
fn functions_and_closures() {
	assert_eq!(num("function add(a, b) { return a + b } add(2, 3)"), 5.0);
	assert_eq!(
		num(
			"function counter() { let n = 0; return () => { n++; return n } }
			const c = counter();
			c(); c(); c()"
		),
		3.0
	);
	assert_eq!(num("const twice = (f, x) => f(f(x)); twice(n => n * 2, 3)"), 12.0);
	// Rest parameters.
	assert_eq!(
		num("function sum(...xs) { return xs.reduce((a, b) => a + b, 0) } sum(1, 2, 3, 4)"),
		10.0
	);
}

#[test]
fn this_binding_and_arrows() {
	let src = "
		const obj = {
			n: 41,
			plain: function () { return this.n + 1 },
		};
		obj.plain()";
	assert_eq!(num(src), 42.0);
}

#[test]
fn try_catch_finally() {
	assert_eq!(
		text("let out = ''; try { throw 'boom' } catch (e) { out = e } out"),
		"boom"
	);
	assert_eq!(
		num(
			"let n = 0;
			try { throw 1 } catch { n += 1 } finally { n += 10 }
			n"
		),
		11.0
	);
	// Finally runs when nothing throws.
	assert_eq!(num("let n = 0; try { n = 1 } finally { n += 10 } n"), 11.0);
	// Uncaught throw escapes as an error.
	assert_matches!(eval_err("throw 'up'"), ExecutionError::Throw(_));
}

#[test]
fn typeof_and_delete() {
	assert_eq!(text("typeof 1"), "number");
	assert_eq!(text("typeof 'x'"), "string");
	assert_eq!(text("typeof undefined"), "undefined");
	assert_eq!(text("typeof null"), "object");
	assert_eq!(text("typeof (() => 0)"), "function");
	assert_eq!(text("typeof neverDeclared"), "undefined");
	assert!(boolean("const o = { a: 1 }; delete o.a; !o.hasOwnProperty('a')"));
}

#[test]
fn increment_decrement() {
	assert_eq!(num("let i = 1; i++"), 1.0);
	assert_eq!(num("let i = 1; ++i"), 2.0);
	assert_eq!(num("let i = 1; i++; i"), 2.0);
	assert_eq!(num("let i = 1; i--; i"), 0.0);
	assert_eq!(num("const o = { n: 5 }; o.n++; o.n"), 6.0);
}

#[test]
fn arrays_share_by_reference() {
	assert_eq!(num("const a = [1]; const b = a; b.push(2); a.length"), 2.0);
}

#[test]
fn array_methods() {
	assert_eq!(num("[1, 2, 3].map(x => x * 2).reduce((a, b) => a + b)"), 12.0);
	assert_eq!(num("[1, 2, 3, 4].filter(x => x % 2 === 0).length"), 2.0);
	assert_eq!(text("['a', 'b'].join('-')"), "a-b");
	assert_eq!(num("[5, 6, 7].indexOf(6)"), 1.0);
	assert_eq!(num("[5, 6].indexOf(9)"), -1.0);
	assert!(boolean("[1, 2].includes(2)"));
	assert_eq!(num("[[1, 2], [3, [4]]].flat().length"), 3.0);
	assert_eq!(num("[1, 2, 3].at(-1)"), 3.0);
	assert_eq!(num("[1, 2, 3].slice(1).length"), 2.0);
	assert_eq!(num("const a = [1, 2, 3, 4]; a.splice(1, 2); a.length"), 2.0);
	assert_eq!(num("[3, 1, 2].find(x => x < 2)"), 1.0);
	assert_eq!(num("[3, 1, 2].findIndex(x => x < 2)"), 1.0);
	assert!(boolean("[1, 2, 3].every(x => x > 0)"));
	assert!(boolean("[1, 2, 3].some(x => x > 2)"));
	assert_eq!(num("const a = []; a.unshift(9); a[0]"), 9.0);
	assert_eq!(num("[1, 2].concat([3], 4).length"), 4.0);
}

#[test]
fn string_methods() {
	assert!(boolean("'hello'.startsWith('he')"));
	assert!(boolean("'hello'.endsWith('lo')"));
	assert_eq!(num("'hello'.indexOf('l')"), 2.0);
	assert_eq!(num("'hello'.lastIndexOf('l')"), 3.0);
	assert_eq!(text("'a-b-c'.replace('-', '+')"), "a+b-c");
	assert_eq!(text("'a-b-c'.replaceAll('-', '+')"), "a+b+c");
	assert_eq!(text("'  pad '.trim()"), "pad");
	assert_eq!(text("'7'.padStart(3, '0')"), "007");
	assert_eq!(text("'ab'.repeat(3)"), "ababab");
	assert_eq!(num("'a,b,c'.split(',').length"), 3.0);
	assert_eq!(text("'HELLO'.toLowerCase()"), "hello");
	assert_eq!(text("'hello'.substring(3, 1)"), "el");
	assert_eq!(text("'hello'.slice(-3)"), "llo");
	assert_eq!(num("'héllo'.length"), 5.0);
}

#[test]
fn object_literals_and_spread() {
	assert_eq!(num("const o = { a: 1, ['b' + 'c']: 2 }; o.bc"), 2.0);
	assert_eq!(num("const n = 3; const o = { n }; o.n"), 3.0);
	assert_eq!(num("const o = { ...{ a: 1 }, b: 2 }; o.a + o.b"), 3.0);
	assert_eq!(num("const xs = [1, ...[2, 3], 4]; xs.length"), 4.0);
	assert_eq!(num("Object.keys({ a: 1, b: 2 }).length"), 2.0);
	assert_eq!(num("Object.entries({ a: 5 })[0][1]"), 5.0);
}

#[test]
fn json_round_trip() {
	assert_eq!(num("JSON.parse('[1, 2, 3]').length"), 3.0);
	assert_eq!(num("JSON.parse('{\"a\": {\"b\": 4}}').a.b"), 4.0);
	assert_eq!(text("JSON.stringify({ a: [1, true, null] })"), r#"{"a":[1,true,null]}"#);
	assert_eq!(text("JSON.stringify(JSON.parse('{\"x\":1}'))"), r#"{"x":1}"#);
	assert_matches!(eval_err("JSON.parse('{oops')"), ExecutionError::Json(_));
}

#[test]
fn math_object() {
	assert_eq!(num("Math.floor(2.9)"), 2.0);
	assert_eq!(num("Math.max(1, 9, 4)"), 9.0);
	assert_eq!(num("Math.min(3, -1)"), -1.0);
	assert!(num("Math.PI") > 3.14);
	assert_eq!(num("Math.pow(2, 8)"), 256.0);
}

#[test]
fn parse_numbers() {
	assert_eq!(num("parseInt('42px')"), 42.0);
	assert_eq!(num("parseInt('ff', 16)"), 255.0);
	assert_eq!(num("parseFloat('2.5rem')"), 2.5);
	assert!(boolean("isNaN(parseInt('nope'))"));
}

#[test]
fn instanceof_markers() {
	assert!(boolean("[] instanceof Array"));
	assert!(boolean("({}) instanceof Object"));
	assert!(!boolean("'s' instanceof Array"));
	assert!(boolean("Array.isArray([1])"));
}

#[test]
fn optional_chaining() {
	assert_matches!(eval("null?.missing"), Value::Undefined);
	assert_matches!(eval("undefined?.also()"), Value::Undefined);
	assert_eq!(num("const o = { a: { b: 2 } }; o.a?.b"), 2.0);
}

#[test]
fn template_literals() {
	assert_eq!(text("const who = 'world'; `hello ${who}!`"), "hello world!");
	assert_eq!(text("`1 + 1 = ${1 + 1}`"), "1 + 1 = 2");
}

#[test]
fn exit_unwinds_as_fatal() {
	assert_matches!(eval_err("exit(3)"), ExecutionError::Exit(3));
	// Not even try/catch absorbs it.
	assert_matches!(eval_err("try { exit(4) } catch (e) {}"), ExecutionError::Exit(4));
}

#[test]
fn undeclared_identifier_errors() {
	assert_matches!(eval_err("nothing + 1"), ExecutionError::Undeclared(_));
	assert_matches!(eval_err("missing = 2"), ExecutionError::Undeclared(_));
}

#[test]
fn prelude_is_frozen() {
	assert_matches!(eval_err("JSON = 5"), ExecutionError::Frozen);
}

mod modules {
	use std::io::Write;

	use super::*;
	use crate::module::SearchLoader;

	fn write_module(dir: &std::path::Path, name: &str, body: &str) {
		let mut f = std::fs::File::create(dir.join(name)).unwrap();
		f.write_all(body.as_bytes()).unwrap();
	}

	fn eval_with_loader(dir: &std::path::Path, src: &str) -> Value {
		let loader = SearchLoader::new(vec![dir.to_path_buf()]);
		let script = Script::parse(src).unwrap();
		let scope = prelude().child();
		Interp::new(std::sync::Arc::new(loader))
			.run(&script, &scope)
			.unwrap_or_else(|e| panic!("eval failed: {e}"))
	}

	#[test]
	fn named_imports_honor_aliases() {
		let dir = tempfile::tempdir().unwrap();
		write_module(
			dir.path(),
			"util.js",
			"export function double(x) { return x * 2 }\nexport const BASE = 10\nlet hidden = 1",
		);
		let v = eval_with_loader(
			dir.path(),
			r#"import { double, BASE as start } from "util.js"; double(start)"#,
		);
		assert_matches!(v, Value::Float(f) if f == 20.0);
	}

	#[test]
	fn namespace_import_only_sees_exports() {
		let dir = tempfile::tempdir().unwrap();
		write_module(
			dir.path(),
			"m.js",
			"export const visible = 1\nlet hidden = 2",
		);
		let v = eval_with_loader(dir.path(), r#"import * as m from "m.js"; m.visible"#);
		assert_matches!(v, Value::Float(f) if f == 1.0);
		let v = eval_with_loader(dir.path(), r#"import * as m from "m.js"; m.hidden"#);
		assert_matches!(v, Value::Undefined);
	}

	#[test]
	fn missing_named_export_errors() {
		let dir = tempfile::tempdir().unwrap();
		write_module(dir.path(), "m.js", "export const a = 1");
		let loader = SearchLoader::new(vec![dir.path().to_path_buf()]);
		let script = Script::parse(r#"import { nope } from "m.js""#).unwrap();
		let scope = prelude().child();
		let err = Interp::new(std::sync::Arc::new(loader))
			.run(&script, &scope)
			.expect_err("expected import error");
		assert_matches!(err, ExecutionError::Import { .. });
	}
}
