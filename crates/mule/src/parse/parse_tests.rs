use std::io::Write;

use assert_matches::assert_matches;

use super::*;
use crate::collection::Found;

fn parse(src: &str) -> Collection {
	parse_source(src, "test").unwrap_or_else(|e| panic!("parse failed: {e}\n{src}"))
}

#[test]
fn collection_with_request() {
	let root = parse(
		r#"
		collection api {
			url "http://h"
			get a {
				url "/x"
				query { q 1 }
			}
		}
		"#,
	);
	let lookup = root.find("api.a").unwrap();
	let Found::Request(request) = lookup.found else {
		panic!("expected request");
	};
	assert_eq!(request.method, Method::Get);
	let env = Environment::root();
	assert_eq!(request.common.url.as_ref().unwrap().expand(&env).unwrap(), "/x");
	assert_eq!(request.common.query.get("q").len(), 1);
}

#[test]
fn variables_resolve_in_requests() {
	let root = parse(
		r#"
		variables {
			five 5
		}
		get a {
			url "http://h"
			query {
				offset $five
				count $five
			}
		}
		"#,
	);
	let lookup = root.find("a").unwrap();
	let Found::Request(request) = lookup.found else {
		panic!("expected request");
	};
	let built = crate::build::assemble("a", &lookup.chain, request).unwrap();
	assert_eq!(built.http.url.query(), Some("offset=5&count=5"));
}

#[test]
fn auth_basic_block() {
	let root = parse(
		r#"
		collection api {
			url "http://h"
			auth basic {
				username foo
				password bar
			}
			get a { url "/x" }
		}
		"#,
	);
	let lookup = root.find("api.a").unwrap();
	let Found::Request(request) = lookup.found else {
		panic!("expected request");
	};
	let built = crate::build::assemble("api.a", &lookup.chain, request).unwrap();
	assert_eq!(
		built.http.headers.get("authorization").unwrap(),
		"Basic Zm9vOmJhcg=="
	);
}

#[test]
fn username_password_imply_basic_auth() {
	let root = parse(
		r#"
		get a {
			url "http://h"
			username foo
			password bar
		}
		"#,
	);
	let Found::Request(request) = root.find("a").unwrap().found else {
		panic!("expected request");
	};
	assert_matches!(
		request.common.auth,
		Some(Authorization::Basic { .. })
	);
}

#[test]
fn heredoc_hooks() {
	let root = parse(
		"get a {\n\turl \"http://h\"\n\tbefore <<S\nconst n = 1;\nmule.variables.set(\"n\", n)\nS\n}\n",
	);
	let Found::Request(request) = root.find("a").unwrap().found else {
		panic!("expected request");
	};
	let script = request.before.as_deref().unwrap();
	assert!(script.contains("const n = 1;"));
	assert!(script.contains("mule.variables.set"));
	assert!(!script.contains("<<"));
}

#[test]
fn inline_heredoc_terminates_on_tag() {
	let root = parse("get a {\n\turl \"http://h\"\n\tbefore <<S mule.variables.set(\"n\", 1) S\n}\n");
	let Found::Request(request) = root.find("a").unwrap().found else {
		panic!("expected request");
	};
	assert_eq!(
		request.before.as_deref().unwrap(),
		"mule.variables.set(\"n\", 1)"
	);
}

#[test]
fn flow_steps_and_branches() {
	let root = parse(
		r#"
		flow f {
			r1 {
				when 200 goto r2
				when 500 {
					set err $status
					exit 1
				}
				when {
					goto done
				}
			}
			r2 {
				when 200
			}
		}
		"#,
	);
	let flow = root.flows.first().unwrap();
	assert_eq!(flow.steps.len(), 2);
	let step = &flow.steps[0];
	assert_eq!(step.request, "r1");
	assert_eq!(step.branches.len(), 3);
	assert_eq!(step.branches[0].codes, vec![200]);
	assert_eq!(step.branches[0].target.as_deref(), Some("r2"));
	assert_eq!(step.branches[1].codes, vec![500]);
	assert_eq!(step.branches[1].commands.len(), 2);
	assert!(step.branches[2].codes.is_empty());
	assert_matches!(step.branches[2].commands[0], Command::Goto(_));
}

#[test]
fn bodies() {
	let root = parse(
		r#"
		post a {
			url "http://h"
			body json {
				name mule
				count 5
			}
		}
		post b {
			url "http://h"
			body text "plain payload"
		}
		"#,
	);
	let Found::Request(a) = root.find("a").unwrap().found else {
		panic!("expected request");
	};
	assert_matches!(a.common.body, Some(Body::Json(_)));
	let Found::Request(b) = root.find("b").unwrap().found else {
		panic!("expected request");
	};
	let env = Environment::root();
	assert_eq!(
		b.common.body.as_ref().unwrap().expand(&env).unwrap(),
		"plain payload"
	);
}

#[test]
fn expect_clauses() {
	let root = parse(
		r#"
		get a { url "http://h"
			expect 200 201 }
		get b { url "http://h"
			expect success }
		"#,
	);
	let Found::Request(a) = root.find("a").unwrap().found else {
		panic!("expected request");
	};
	assert_eq!(a.expect, Some(Expect::Codes(vec![200, 201])));
	let Found::Request(b) = root.find("b").unwrap().found else {
		panic!("expected request");
	};
	assert_eq!(b.expect, Some(Expect::Success));
}

#[test]
fn depends_and_do_templates() {
	let root = parse(
		r#"
		do login {
			url "http://h/login"
		}
		get a {
			url "http://h"
			depends login
		}
		"#,
	);
	let Found::Request(a) = root.find("a").unwrap().found else {
		panic!("expected request");
	};
	assert_eq!(a.depends.len(), 1);
	let Found::Request(login) = root.find("login").unwrap().found else {
		panic!("expected request");
	};
	assert!(login.is_abstract());
}

#[test]
fn comments_and_blank_lines() {
	let root = parse(
		r#"
		# a comment
		// another
		get a {
			url "http://h" # trailing
		}
		"#,
	);
	assert!(root.find("a").is_ok());
}

#[test]
fn nested_collections_chain_environments() {
	let root = parse(
		r#"
		variables { outer o }
		collection api {
			variables { inner i }
			get a { url "http://h" }
		}
		"#,
	);
	let api = root.child("api").unwrap();
	assert_eq!(Word::variable("outer").expand(&api.environment).unwrap(), "o");
	assert_eq!(Word::variable("inner").expand(&api.environment).unwrap(), "i");
	assert!(Word::variable("inner").expand(&root.environment).is_err());
}

#[test]
fn unknown_statement_errors_with_line() {
	let err = parse_source("get a {\n\tnonsense here\n}\n", "t").unwrap_err();
	assert!(err.to_string().contains("line 2"), "{err}");
}

#[test]
fn tls_block_parses() {
	let root = parse(
		r#"
		get a {
			url "https://h"
			tls {
				insecure true
			}
		}
		"#,
	);
	let Found::Request(a) = root.find("a").unwrap().found else {
		panic!("expected request");
	};
	assert!(a.common.tls.is_some());
}

mod includes {
	use super::*;

	fn write(dir: &std::path::Path, name: &str, content: &str) {
		let mut f = std::fs::File::create(dir.join(name)).unwrap();
		f.write_all(content.as_bytes()).unwrap();
	}

	#[test]
	fn include_uses_base_name_without_alias() {
		let dir = tempfile::tempdir().unwrap();
		write(dir.path(), "other.mu", "get ping { url \"http://h/ping\" }\n");
		write(dir.path(), "main.mu", "@include other.mu\n");
		let root = parse_file(&dir.path().join("main.mu")).unwrap();
		assert_eq!(root.name(), "main");
		assert_matches!(root.find("other.ping").unwrap().found, Found::Request(_));
	}

	#[test]
	fn include_alias_renames_the_scope() {
		let dir = tempfile::tempdir().unwrap();
		write(dir.path(), "other.mu", "get ping { url \"http://h/ping\" }\n");
		write(dir.path(), "main.mu", "@include other.mu x\n");
		let root = parse_file(&dir.path().join("main.mu")).unwrap();
		assert_matches!(root.find("x.ping").unwrap().found, Found::Request(_));
		assert_matches!(root.find("other.ping"), Err(_));
	}

	#[test]
	fn searchpath_statement_extends_resolution() {
		let dir = tempfile::tempdir().unwrap();
		let sub = dir.path().join("lib");
		std::fs::create_dir(&sub).unwrap();
		write(&sub, "shared.mu", "get ping { url \"http://h\" }\n");
		write(
			dir.path(),
			"main.mu",
			&format!("@searchpath {}\n@include shared.mu\n", sub.display()),
		);
		let root = parse_file(&dir.path().join("main.mu")).unwrap();
		assert_matches!(root.find("shared.ping").unwrap().found, Found::Request(_));
	}

	#[test]
	fn readfile_macro_inlines_contents() {
		let dir = tempfile::tempdir().unwrap();
		write(dir.path(), "payload.txt", "from-a-file");
		write(
			dir.path(),
			"main.mu",
			"post a {\n\turl \"http://h\"\n\tbody text @readfile payload.txt\n}\n",
		);
		let root = parse_file(&dir.path().join("main.mu")).unwrap();
		let Found::Request(a) = root.find("a").unwrap().found else {
			panic!("expected request");
		};
		let env = Environment::root();
		assert_eq!(
			a.common.body.as_ref().unwrap().expand(&env).unwrap(),
			"from-a-file"
		);
	}
}
