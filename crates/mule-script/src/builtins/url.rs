use std::sync::Arc;

use crate::native::Native;
use crate::value::Value;

/// A parsed URL exposed to scripts (`mule.request.url` and friends).
pub struct UrlValue(pub url::Url);

impl UrlValue {
	pub fn new(url: url::Url) -> UrlValue {
		UrlValue(url)
	}
}

impl Native for UrlValue {
	fn type_name(&self) -> &'static str {
		"url"
	}

	fn get(&self, name: &str) -> Option<Value> {
		let u = &self.0;
		match name {
			"scheme" | "protocol" => Some(Value::string(u.scheme())),
			"host" => Some(match (u.host_str(), u.port()) {
				(Some(h), Some(p)) => Value::string(format!("{h}:{p}")),
				(Some(h), None) => Value::string(h),
				(None, _) => Value::string(""),
			}),
			"hostname" => Some(Value::string(u.host_str().unwrap_or(""))),
			"port" => Some(match u.port_or_known_default() {
				Some(p) => Value::from(p as usize),
				None => Value::Undefined,
			}),
			"path" | "pathname" => Some(Value::string(u.path())),
			"query" => Some(match u.query() {
				Some(q) => Value::string(q),
				None => Value::string(""),
			}),
			"username" => Some(Value::string(u.username())),
			_ => None,
		}
	}

	fn entries(&self) -> Vec<(Arc<str>, Value)> {
		["scheme", "host", "hostname", "port", "path", "query"]
			.iter()
			.filter_map(|k| self.get(k).map(|v| (Arc::from(*k), v)))
			.collect()
	}
}
