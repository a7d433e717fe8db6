// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: verisum
// Module: progress
// Purpose: Timing and throughput summary for the -t flag.

use std::time::Instant;

/// Accumulates hashing volume and renders the one-line summary
/// emitted on stderr when timing is requested.
pub struct ThroughputTimer {
	start: Instant,
	files: u64,
	bytes: u128,
}

impl ThroughputTimer {
	pub fn start() -> Self {
		Self {
			start: Instant::now(),
			files: 0,
			bytes: 0,
		}
	}

	pub fn record(&mut self, bytes: u64) {
		self.files += 1;
		self.bytes += bytes as u128;
	}

	pub fn summary(&self) -> String {
		let elapsed =
			self.start.elapsed().as_secs_f64().max(0.001);
		let mib = self.bytes as f64 / (1024.0 * 1024.0);
		format!(
			"Hashed {} files ({:.1} MiB) in {:.2}s ({:.1} MiB/s)",
			self.files,
			mib,
			elapsed,
			mib / elapsed,
		)
	}
}
