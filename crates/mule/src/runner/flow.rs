use std::collections::HashMap;

use tracing::debug;

use super::{RequestReport, RunError, Runner};
use crate::collection::{Collection, Command, Flow, Found};
use crate::expand::Word;
use crate::script::CollectionInfo;

/// Revisit guard: a step entered more often than this aborts the flow.
const MAX_VISITS: usize = 1024;

#[derive(thiserror::Error, Debug)]
pub enum FlowError {
	#[error("unknown step target {0:?}")]
	UnknownTarget(String),
	#[error("step {0:?} revisited more than {MAX_VISITS} times")]
	TooManyVisits(String),
	#[error("invalid exit code {0:?}")]
	BadExitCode(String),
	#[error("{0} cannot be used as a flow step")]
	BadStepTarget(String),
}

#[derive(Debug, Default)]
pub struct FlowOutcome {
	/// Code set by an `exit` command; 0 when the flow ran to the end.
	pub exit_code: i32,
	/// Step labels in execution order.
	pub executed: Vec<String>,
	pub reports: Vec<RequestReport>,
	/// Status of the last executed request, for nested-flow dispatch.
	pub last_status: u16,
}

impl Runner<'_> {
	/// Runs a named flow to completion.
	pub fn run_flow(&mut self, path: &str) -> Result<FlowOutcome, RunError> {
		let root = self.root;
		let lookup = root.find(path)?;
		let Found::Flow(flow) = lookup.found else {
			return Err(RunError::NotAFlow(path.to_string()));
		};
		let chain = lookup.chain;

		for collection in &chain {
			self.hook(collection.before_all.as_deref(), collection)?;
		}
		let result = self.flow_inner(flow, &chain);
		let after = chain
			.iter()
			.rev()
			.try_for_each(|c| self.hook(c.after_all.as_deref(), c));
		let outcome = result?;
		after?;
		Ok(outcome)
	}

	pub(crate) fn flow_inner(
		&mut self,
		flow: &Flow,
		chain: &[&Collection],
	) -> Result<FlowOutcome, RunError> {
		let containing = chain.last().copied();
		// The flow environment encloses the containing collection's; step
		// commands bind into it.
		let env = containing
			.map(|c| c.environment.child())
			.unwrap_or_default();
		let info = CollectionInfo {
			name: flow.common.name.clone(),
			children: Vec::new(),
		};

		let labels: HashMap<&str, usize> = flow
			.steps
			.iter()
			.enumerate()
			.map(|(i, s)| (s.request.as_str(), i))
			.collect();
		let resolve_label = |label: &str| -> Result<usize, FlowError> {
			labels
				.get(label)
				.copied()
				.ok_or_else(|| FlowError::UnknownTarget(label.to_string()))
		};

		let mut outcome = FlowOutcome::default();
		let mut visits = vec![0usize; flow.steps.len()];

		if let Some(src) = &flow.before_all {
			self.run_hook_source(src, &env, &info)?;
		}

		let mut idx = 0usize;
		'steps: while idx < flow.steps.len() {
			let step = &flow.steps[idx];
			visits[idx] += 1;
			if visits[idx] > MAX_VISITS {
				return Err(FlowError::TooManyVisits(step.request.clone()).into());
			}
			debug!(flow = %flow.common.name, step = %step.request, "executing step");
			outcome.executed.push(step.request.clone());

			if let Some(src) = &flow.before_each {
				self.run_hook_source(src, &env, &info)?;
			}
			if let Some(src) = &step.before {
				self.run_hook_source(src, &env, &info)?;
			}

			// The step reference is a full collection path, resolved from
			// the root; it may name a nested flow.
			let root = self.root;
			let lookup = root.find(&step.request)?;
			let status = match lookup.found {
				Found::Request(request) => self.execute_one(
					&step.request,
					&lookup.chain,
					request,
					&mut outcome.reports,
					false,
					Some(&env),
				)?,
				Found::Flow(nested) => {
					let sub = self.flow_inner(nested, &lookup.chain)?;
					let status = sub.last_status;
					outcome.reports.extend(sub.reports);
					if sub.exit_code != 0 {
						outcome.exit_code = sub.exit_code;
						break 'steps;
					}
					status
				},
				Found::Collection(_) => {
					return Err(FlowError::BadStepTarget(step.request.clone()).into());
				},
			};
			outcome.last_status = status;
			env.assign_or_define("status", Word::Literal(status.to_string()))?;

			// First matching branch wins; none matching falls through to the
			// next step in declaration order.
			let branch = step.branches.iter().find(|b| b.matches(status));
			let mut next = None;
			let mut exited = false;
			if let Some(branch) = branch {
				if let Some(src) = &branch.script {
					self.run_hook_source(src, &env, &info)?;
				}
				for command in &branch.commands {
					match command {
						Command::Set { target, source } => {
							let name = target.expand(&env)?;
							let value = source.expand(&env)?;
							env.assign_or_define(&name, Word::Literal(value))?;
						},
						Command::Unset(word) => {
							let name = word.expand(&env)?;
							env.unset(&name)?;
						},
						Command::Goto(word) => {
							let label = word.expand(&env)?;
							next = Some(resolve_label(&label)?);
						},
						Command::Exit(word) => {
							let raw = word.expand(&env)?;
							outcome.exit_code = raw
								.trim()
								.parse()
								.map_err(|_| FlowError::BadExitCode(raw.clone()))?;
							exited = true;
							break;
						},
						Command::Script(src) => self.run_hook_source(src, &env, &info)?,
					}
				}
				if !exited
					&& next.is_none()
					&& let Some(target) = &branch.target
				{
					next = Some(resolve_label(target)?);
				}
			}

			if let Some(src) = &flow.after_each {
				self.run_hook_source(src, &env, &info)?;
			}
			if exited {
				break 'steps;
			}
			idx = match next {
				Some(n) => n,
				None => idx + 1,
			};
		}

		if let Some(src) = &flow.after_all {
			self.run_hook_source(src, &env, &info)?;
		}
		Ok(outcome)
	}
}
