use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use mule::client::ReqwestTransport;
use mule::collection::Found;
use mule::runner::{RunError, Runner};
use mule::{Collection, parse};

#[derive(Parser)]
#[command(name = "mule", about = "Declarative HTTP request runner", version)]
struct Args {
	/// Collection file to load.
	file: PathBuf,

	#[command(subcommand)]
	command: CommandLine,
}

#[derive(Subcommand)]
enum CommandLine {
	/// Execute a request by its dotted path, dependencies first.
	Run { path: String },
	/// Execute a named flow.
	Flow { name: String },
	/// List the requests and flows of the collection.
	List {
		/// Emit the listing as JSON.
		#[arg(long)]
		json: bool,
	},
	/// Parse and statically validate the collection file.
	Check,
}

const EXIT_OK: u8 = 0;
const EXIT_EXPECTATION: u8 = 1;
const EXIT_EXECUTION: u8 = 2;
const EXIT_PARSE: u8 = 3;

fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.with_writer(std::io::stderr)
		.init();

	let args = Args::parse();
	let root = match parse::parse_file(&args.file) {
		Ok(root) => root,
		Err(e) => {
			error!("{e}");
			return ExitCode::from(EXIT_PARSE);
		},
	};

	match args.command {
		CommandLine::Run { path } => run(&root, &path),
		CommandLine::Flow { name } => run_flow(&root, &name),
		CommandLine::List { json } => list(&root, json),
		CommandLine::Check => check(&root),
	}
}

fn run(root: &Collection, path: &str) -> ExitCode {
	let transport = ReqwestTransport;
	let mut runner = Runner::new(root, &transport);
	match runner.run(path) {
		Ok(outcome) => {
			print_reports(&outcome.reports);
			ExitCode::from(EXIT_OK)
		},
		Err(e) => {
			print_run_error(&e);
			exit_for(&e)
		},
	}
}

fn run_flow(root: &Collection, name: &str) -> ExitCode {
	let transport = ReqwestTransport;
	let mut runner = Runner::new(root, &transport);
	match runner.run_flow(name) {
		Ok(outcome) => {
			print_reports(&outcome.reports);
			if outcome.exit_code == 0 {
				ExitCode::from(EXIT_OK)
			} else {
				ExitCode::from(outcome.exit_code.clamp(0, u8::MAX as i32) as u8)
			}
		},
		Err(e) => {
			print_run_error(&e);
			exit_for(&e)
		},
	}
}

fn print_reports(reports: &[mule::runner::RequestReport]) {
	for report in reports {
		let mark = if report.ok { "ok" } else { "fail" };
		println!(
			"{:4} {:7} {} {} [{}]",
			mark, report.method, report.url, report.status, report.path
		);
	}
}

fn print_run_error(e: &RunError) {
	match e {
		RunError::Expectation { path, want, got } => {
			error!("{path}: expected {want:?}, got status {got}");
		},
		other => error!("{other}"),
	}
}

fn exit_for(e: &RunError) -> ExitCode {
	match e {
		RunError::Expectation { .. } => ExitCode::from(EXIT_EXPECTATION),
		RunError::Exited(code) => ExitCode::from((*code).clamp(0, u8::MAX as i32) as u8),
		_ => ExitCode::from(EXIT_EXECUTION),
	}
}

fn list(root: &Collection, json: bool) -> ExitCode {
	if json {
		let requests = root.request_paths();
		let flows = root.flow_paths();
		let doc = serde_json::json!({
			"collection": root.name(),
			"requests": requests,
			"flows": flows,
		});
		println!("{}", serde_json::to_string_pretty(&doc).unwrap_or_default());
		return ExitCode::from(EXIT_OK);
	}
	for path in root.request_paths() {
		if let Ok(lookup) = root.find(&path)
			&& let Found::Request(request) = lookup.found
		{
			match &request.usage {
				Some(usage) => println!("{:7} {path}  - {usage}", request.method.to_string()),
				None => println!("{:7} {path}", request.method.to_string()),
			}
		}
	}
	for path in root.flow_paths() {
		println!("flow    {path}");
	}
	ExitCode::from(EXIT_OK)
}

/// Static validation beyond the parse: step targets must resolve, goto
/// labels must name declared steps, names must be unique per scope.
fn check(root: &Collection) -> ExitCode {
	let mut problems = Vec::new();
	check_collection(root, root, "", &mut problems);
	if problems.is_empty() {
		println!("{}: ok", root.name());
		ExitCode::from(EXIT_OK)
	} else {
		for problem in &problems {
			error!("{problem}");
		}
		ExitCode::from(EXIT_PARSE)
	}
}

fn check_collection(root: &Collection, scope: &Collection, prefix: &str, problems: &mut Vec<String>) {
	let mut seen = std::collections::HashSet::new();
	for request in &scope.requests {
		if !seen.insert(request.name().to_string()) {
			problems.push(format!("{prefix}{}: duplicate name", request.name()));
		}
	}
	for child in &scope.collections {
		if !seen.insert(child.name().to_string()) {
			problems.push(format!("{prefix}{}: duplicate name", child.name()));
		}
	}
	for flow in &scope.flows {
		if !seen.insert(flow.common.name.clone()) {
			problems.push(format!("{prefix}{}: duplicate name", flow.common.name));
		}
		let labels: std::collections::HashSet<&str> =
			flow.steps.iter().map(|s| s.request.as_str()).collect();
		for step in &flow.steps {
			match root.find(&step.request) {
				Ok(lookup) => {
					if let Found::Request(request) = lookup.found
						&& request.is_abstract()
					{
						problems.push(format!(
							"{prefix}{}: step {} references an abstract request",
							flow.common.name, step.request
						));
					}
					if let Found::Collection(_) = lookup.found {
						problems.push(format!(
							"{prefix}{}: step {} references a collection",
							flow.common.name, step.request
						));
					}
				},
				Err(_) => problems.push(format!(
					"{prefix}{}: step {} does not resolve",
					flow.common.name, step.request
				)),
			}
			for branch in &step.branches {
				if let Some(target) = &branch.target
					&& !labels.contains(target.as_str())
				{
					problems.push(format!(
						"{prefix}{}: goto target {target:?} is not a step",
						flow.common.name
					));
				}
			}
		}
	}
	for child in &scope.collections {
		check_collection(root, child, &format!("{prefix}{}.", child.name()), problems);
	}
}
