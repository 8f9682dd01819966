use svcman_core::Outcome;

use crate::error::EngineError;

#[derive(Debug)]
pub struct BatchEntry<T> {
	pub name: String,
	pub result: Result<T, EngineError>,
}

/// Per-service results of an `*_all` operation, in configuration order.
#[derive(Debug)]
pub struct BatchReport<T> {
	pub entries: Vec<BatchEntry<T>>,
}

impl<T> BatchReport<T> {
	pub(crate) fn collect<F>(names: Vec<String>, mut op: F) -> Self
	where
		F: FnMut(&str) -> Result<T, EngineError>,
	{
		let entries = names
			.into_iter()
			.map(|name| {
				let result = op(&name);
				BatchEntry { name, result }
			})
			.collect();
		Self { entries }
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl<T: Outcome> BatchReport<T> {
	/// True only if every service succeeded. An empty batch succeeds.
	pub fn success(&self) -> bool {
		self.entries
			.iter()
			.all(|e| matches!(&e.result, Ok(outcome) if outcome.is_success()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use svcman_core::StopOutcome;

	#[test]
	fn success_is_conjunction() {
		let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
		let report = BatchReport::collect(names.clone(), |name| match name {
			"b" => Ok(StopOutcome::StillRunning { pid: 7 }),
			_ => Ok(StopOutcome::NotRunning),
		});
		assert_eq!(report.entries.len(), 3);
		assert!(!report.success());

		let report = BatchReport::collect(names, |name| match name {
			"c" => Err(EngineError::UnknownService(name.into())),
			_ => Ok(StopOutcome::Stopped { pid: 1 }),
		});
		assert!(!report.success());
		assert_eq!(report.entries[2].name, "c");

		let empty: BatchReport<StopOutcome> = BatchReport::collect(vec![], |_| unreachable!());
		assert!(empty.success());
		assert!(empty.is_empty());
	}
}
