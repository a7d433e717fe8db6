// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: verisum
// Module: reconcile
// Purpose: Three-way drift classification against a baseline.

use std::collections::HashSet;

use crate::vsm::manifest::FileRecord;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DriftKind {
	Added,
	Removed,
	Modified,
}

impl DriftKind {
	pub fn marker(self) -> char {
		match self {
			DriftKind::Added => '+',
			DriftKind::Removed => '-',
			DriftKind::Modified => '!',
		}
	}
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Drift {
	pub kind: DriftKind,
	pub path: String,
}

#[derive(Debug, Default)]
pub struct ReconcileReport {
	pub drifts: Vec<Drift>,
}

impl ReconcileReport {
	pub fn verified(&self) -> bool {
		self.drifts.is_empty()
	}
}

/// Classify the difference between the freshly scanned tree and the
/// stored baseline. Differences use full-record equality (path and
/// both digests). `still_present` probes whether a relative path
/// currently exists in the tree: a baseline record whose path is
/// still present but whose record differs is a content change,
/// reported once as Modified, with the matching current-side record
/// suppressed. All differences are processed; there is no early
/// exit.
pub fn reconcile<F>(
	current: &[FileRecord],
	baseline: &[FileRecord],
	mut still_present: F,
) -> ReconcileReport
where
	F: FnMut(&str) -> bool,
{
	let current_set: HashSet<&FileRecord> =
		current.iter().collect();
	let baseline_set: HashSet<&FileRecord> =
		baseline.iter().collect();
	let mut report = ReconcileReport::default();
	let mut reported_modified: HashSet<&str> = HashSet::new();

	for record in baseline {
		if current_set.contains(record) {
			continue;
		}
		if still_present(&record.path) {
			reported_modified.insert(record.path.as_str());
			report.drifts.push(Drift {
				kind: DriftKind::Modified,
				path: record.path.clone(),
			});
		} else {
			report.drifts.push(Drift {
				kind: DriftKind::Removed,
				path: record.path.clone(),
			});
		}
	}

	for record in current {
		if baseline_set.contains(record) {
			continue;
		}
		if reported_modified.contains(record.path.as_str()) {
			continue;
		}
		report.drifts.push(Drift {
			kind: DriftKind::Added,
			path: record.path.clone(),
		});
	}

	report
}
