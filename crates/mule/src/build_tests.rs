use assert_matches::assert_matches;

use super::*;
use crate::auth::Authorization;
use crate::body::Body;
use crate::collection::{Collection, Method, Request};
use crate::expand::Word;

fn collection_with_url(name: &str, url: &str) -> Collection {
	let mut c = Collection::new(name);
	c.common.url = Some(Word::literal(url));
	c
}

fn get(name: &str, url: &str) -> Request {
	let mut r = Request::new(name, Method::Get);
	r.common.url = Some(Word::literal(url));
	r
}

#[test]
fn relative_child_joins_parent() {
	let root = collection_with_url("root", "http://h");
	let mut request = get("a", "/x");
	request.common.query.add("q", Word::literal("1"));
	let built = assemble("a", &[&root], &request).unwrap();
	assert_eq!(built.http.method, http::Method::GET);
	assert_eq!(built.http.url.as_str(), "http://h/x?q=1");
}

#[test]
fn absolute_child_wins() {
	let root = collection_with_url("root", "http://parent");
	let request = get("a", "https://other.example/z");
	let built = assemble("a", &[&root], &request).unwrap();
	assert_eq!(built.http.url.as_str(), "https://other.example/z");
}

#[test]
fn schemeless_host_child_replaces_host() {
	let root = collection_with_url("root", "https://parent/api");
	let request = get("a", "//other.example/z");
	let built = assemble("a", &[&root], &request).unwrap();
	assert_eq!(built.http.url.as_str(), "https://other.example/z");
}

#[test]
fn nested_paths_concatenate() {
	let root = collection_with_url("root", "http://h/api");
	let mid = collection_with_url("mid", "v2");
	let request = get("a", "items");
	let built = assemble("mid.a", &[&root, &mid], &request).unwrap();
	assert_eq!(built.http.url.as_str(), "http://h/api/v2/items");
}

#[test]
fn inline_absolute_equals_composed() {
	let root = collection_with_url("root", "http://h/api");
	let composed = assemble("a", &[&root], &get("a", "/x")).unwrap();
	let inline = assemble("a", &[], &get("a", "http://h/api/x")).unwrap();
	assert_eq!(composed.http.url, inline.http.url);
}

#[test]
fn no_absolute_url_errors() {
	let root = collection_with_url("root", "/only/a/path");
	let err = assemble("a", &[&root], &get("a", "x")).unwrap_err();
	assert_matches!(err, BuildError::NoUrl(_));
}

#[test]
fn variables_expand_in_query() {
	let mut root = collection_with_url("root", "http://h");
	root.environment.define("five", Word::literal("5")).unwrap();
	let mut request = Request::new("a", Method::Get);
	request.common.query.add("offset", Word::variable("five"));
	request.common.query.add("count", Word::variable("five"));
	let built = assemble("a", &[&root], &request).unwrap();
	assert_eq!(built.http.url.query(), Some("offset=5&count=5"));
}

#[test]
fn headers_merge_child_after_parent() {
	let mut root = collection_with_url("root", "http://h");
	root.common.headers.add("X-Trace", Word::literal("parent"));
	let mut request = Request::new("a", Method::Get);
	request.common.headers.add("X-Trace", Word::literal("child"));
	let built = assemble("a", &[&root], &request).unwrap();
	let values: Vec<_> = built.http.headers.get_all("x-trace").iter().collect();
	assert_eq!(values, vec!["parent", "child"]);
}

#[test]
fn inherited_basic_auth_emits_header() {
	let mut root = collection_with_url("root", "http://h");
	root.common.auth = Some(Authorization::Basic {
		username: Word::literal("foo"),
		password: Word::literal("bar"),
	});
	let request = Request::new("a", Method::Get);
	let built = assemble("a", &[&root], &request).unwrap();
	assert_eq!(
		built.http.headers.get("authorization").unwrap(),
		"Basic Zm9vOmJhcg=="
	);
	assert_eq!(built.username.as_deref(), Some("foo"));
	assert_eq!(built.password.as_deref(), Some("bar"));
}

#[test]
fn explicit_authorization_header_is_not_overridden() {
	let mut root = collection_with_url("root", "http://h");
	root.common.auth = Some(Authorization::Bearer {
		token: Word::literal("from-auth"),
	});
	let mut request = Request::new("a", Method::Get);
	request
		.common
		.headers
		.add("Authorization", Word::literal("Bearer explicit"));
	let built = assemble("a", &[&root], &request).unwrap();
	assert_eq!(
		built.http.headers.get("authorization").unwrap(),
		"Bearer explicit"
	);
}

#[test]
fn body_sets_content_type_unless_present() {
	let mut root = collection_with_url("root", "http://h");
	let mut request = Request::new("a", Method::Post);
	let mut set = crate::expand::Set::new();
	set.add("k", Word::literal("v"));
	request.common.body = Some(Body::Json(set));
	let built = assemble("a", &[&root], &request).unwrap();
	assert_eq!(
		built.http.headers.get("content-type").unwrap(),
		"application/json"
	);
	assert_eq!(built.http.body.as_deref(), Some(r#"{"k":"v"}"#));

	root.common.headers.add("Content-Type", Word::literal("text/custom"));
	let built = assemble("a", &[&root], &request).unwrap();
	assert_eq!(built.http.headers.get("content-type").unwrap(), "text/custom");
}

#[test]
fn abstract_requests_refuse_to_build() {
	let root = collection_with_url("root", "http://h");
	let request = Request::new("tmpl", Method::Do);
	assert_matches!(
		assemble("tmpl", &[&root], &request),
		Err(BuildError::Abstract(_))
	);
}

#[test]
fn cookies_expand_and_validate() {
	let mut root = collection_with_url("root", "http://h");
	let mut cookie = crate::expand::Set::new();
	cookie.add("name", Word::literal("session"));
	cookie.add("value", Word::literal("abc"));
	root.common.cookies.push(cookie);
	let request = Request::new("a", Method::Get);
	let built = assemble("a", &[&root], &request).unwrap();
	assert_eq!(built.http.headers.get("cookie").unwrap(), "session=abc");
}

#[test]
fn invalid_cookie_fails_the_build() {
	let mut root = collection_with_url("root", "http://h");
	let mut cookie = crate::expand::Set::new();
	cookie.add("name", Word::literal("bad;name"));
	cookie.add("value", Word::literal("v"));
	root.common.cookies.push(cookie);
	let request = Request::new("a", Method::Get);
	assert_matches!(
		assemble("a", &[&root], &request),
		Err(BuildError::Cookie(_))
	);
}

#[test]
fn timeout_and_redirect_parse() {
	let mut root = collection_with_url("root", "http://h");
	root.common.timeout = Some(Word::literal("2.5"));
	root.common.redirect = Some(Word::literal("none"));
	let request = Request::new("a", Method::Get);
	let built = assemble("a", &[&root], &request).unwrap();
	assert_eq!(built.http.timeout, Some(std::time::Duration::from_millis(2500)));
	assert_eq!(built.http.redirect, RedirectPolicy::None);

	let mut root = collection_with_url("root", "http://h");
	root.common.timeout = Some(Word::literal("250ms"));
	root.common.redirect = Some(Word::literal("5"));
	let built = assemble("a", &[&root], &request).unwrap();
	assert_eq!(built.http.timeout, Some(std::time::Duration::from_millis(250)));
	assert_eq!(built.http.redirect, RedirectPolicy::Limited(5));
}

#[test]
fn expansion_is_stable_across_builds() {
	let mut root = collection_with_url("root", "http://h");
	root.environment.define("p", Word::literal("v1")).unwrap();
	let mut r = Request::new("a", Method::Get);
	r.common.url = Some(Word::Compound(vec![
		Word::literal("/"),
		Word::variable("p"),
	]));
	let one = assemble("a", &[&root], &r).unwrap();
	let two = assemble("a", &[&root], &r).unwrap();
	assert_eq!(one.http.url, two.http.url);
	assert_eq!(one.http.url.path(), "/v1");
}
