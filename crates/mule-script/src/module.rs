use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::ExecutionError;
use crate::native::Native;
use crate::scope::Scope;
use crate::value::Value;

/// Resolves an import specifier to module source text.
pub trait ModuleLoader: Send + Sync {
	fn load(&self, spec: &str) -> Result<String, ExecutionError>;
}

/// The default loader: `http(s)://` specifiers are fetched over the wire,
/// anything else is read from disk, trying each search path in order before
/// the specifier itself.
pub struct SearchLoader {
	paths: Vec<PathBuf>,
}

impl SearchLoader {
	pub fn new(paths: Vec<PathBuf>) -> SearchLoader {
		SearchLoader { paths }
	}

	/// Search paths from the colon-separated `MULE_SEARCHPATH` variable.
	pub fn from_env() -> SearchLoader {
		let paths = std::env::var("MULE_SEARCHPATH")
			.map(|raw| raw.split(':').map(PathBuf::from).collect())
			.unwrap_or_default();
		SearchLoader { paths }
	}

	fn import_error(spec: &str, message: impl Into<String>) -> ExecutionError {
		ExecutionError::Import {
			spec: spec.to_string(),
			message: message.into(),
		}
	}
}

impl ModuleLoader for SearchLoader {
	fn load(&self, spec: &str) -> Result<String, ExecutionError> {
		if spec.starts_with("http://") || spec.starts_with("https://") {
			let response = reqwest::blocking::get(spec)
				.map_err(|e| Self::import_error(spec, e.to_string()))?
				.error_for_status()
				.map_err(|e| Self::import_error(spec, e.to_string()))?;
			return response
				.text()
				.map_err(|e| Self::import_error(spec, e.to_string()));
		}
		for dir in &self.paths {
			let candidate = dir.join(spec);
			if candidate.is_file() {
				return fs_err::read_to_string(&candidate)
					.map_err(|e| Self::import_error(spec, e.to_string()));
			}
		}
		fs_err::read_to_string(spec).map_err(|e| Self::import_error(spec, e.to_string()))
	}
}

/// The runtime face of an evaluated module: only symbols its environment
/// marked exported are visible.
pub struct ModuleObject {
	scope: Scope,
}

impl ModuleObject {
	pub fn new(scope: Scope) -> ModuleObject {
		ModuleObject { scope }
	}
}

impl Native for ModuleObject {
	fn type_name(&self) -> &'static str {
		"module"
	}

	fn get(&self, name: &str) -> Option<Value> {
		self.scope.exported(name)
	}

	fn entries(&self) -> Vec<(Arc<str>, Value)> {
		self
			.scope
			.exported_names()
			.into_iter()
			.filter_map(|name| self.scope.exported(&name).map(|v| (name, v)))
			.collect()
	}
}
