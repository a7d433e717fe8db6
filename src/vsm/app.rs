// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: verisum
// Module: app
// Purpose: CLI surface and driver orchestration.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};

use crate::vsm::hasher::{
	self, ChunkPolicy, HashError, LOW_MEMORY_CHUNK,
};
use crate::vsm::manifest::{
	self, FileRecord, ManifestError, ManifestHeader, RecordSet,
};
use crate::vsm::platform;
use crate::vsm::progress::ThroughputTimer;
use crate::vsm::reconcile::{self, ReconcileReport};
use crate::vsm::walker;

const VERDICT_OK: &str = "Verification complete, no errors.";
const VERDICT_FAILED: &str = "Verification failed.";

#[derive(Parser, Debug)]
#[command(
	name = "verisum",
	version,
	about = "Generate and verify MD5+SHA-1 manifests for a \
	         directory tree.",
	after_help = "With no arguments, prints this usage text. In \
	              verify mode, + marks a file absent from the \
	              manifest, - marks a file missing from the tree, \
	              and ! marks a content mismatch."
)]
pub struct Cli {
	/// Reduce memory consumption while hashing (64 KiB chunks)
	#[arg(short = 'l')]
	pub low_memory: bool,

	/// Verify the tree against the VERSION-*.txt manifest found
	/// in the starting directory
	#[arg(short = 'v')]
	pub verify: bool,

	/// Report elapsed time and hashing throughput on stderr
	#[arg(short = 't')]
	pub timing: bool,

	/// Starting directory for the scan
	pub start_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub enum AppError {
	Config(String),
	Walk { source: io::Error, root: PathBuf },
	Hash(HashError),
	Manifest(ManifestError),
	Output(io::Error),
}

impl fmt::Display for AppError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AppError::Config(message) => write!(f, "{}", message),
			AppError::Walk { source, root } => write!(
				f,
				"Cannot walk {}: {}",
				root.display(),
				source
			),
			AppError::Hash(err) => write!(f, "{}", err),
			AppError::Manifest(err) => write!(f, "{}", err),
			AppError::Output(err) => {
				write!(f, "Cannot write output: {}", err)
			}
		}
	}
}

impl std::error::Error for AppError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			AppError::Config(_) => None,
			AppError::Walk { source, .. } => Some(source),
			AppError::Hash(err) => Some(err),
			AppError::Manifest(err) => Some(err),
			AppError::Output(err) => Some(err),
		}
	}
}

impl From<HashError> for AppError {
	fn from(err: HashError) -> Self {
		AppError::Hash(err)
	}
}

impl From<ManifestError> for AppError {
	fn from(err: ManifestError) -> Self {
		AppError::Manifest(err)
	}
}

pub fn run() -> Result<(), AppError> {
	let cli = Cli::parse();
	let root = match cli.start_dir.as_deref() {
		Some(root) => root.to_path_buf(),
		None => {
			if cli.low_memory || cli.verify || cli.timing {
				return Err(AppError::Config(
					"Last argument must be the starting \
					 directory for content."
						.to_string(),
				));
			}
			// Bare invocation prints usage and succeeds.
			Cli::command()
				.print_help()
				.map_err(AppError::Output)?;
			return Ok(());
		}
	};
	run_with(&cli, &root)
}

fn run_with(cli: &Cli, root: &Path) -> Result<(), AppError> {
	if !root.is_dir() {
		return Err(AppError::Config(format!(
			"Last argument must be the starting directory for \
			 content; {} is not a directory.",
			root.display()
		)));
	}
	let policy = if cli.low_memory {
		ChunkPolicy::Fixed(LOW_MEMORY_CHUNK)
	} else {
		ChunkPolicy::WholeFile
	};

	// Locate the baseline before any hashing work so a discovery
	// problem fails fast.
	let manifest_path = if cli.verify {
		Some(manifest::discover_manifest(root)?)
	} else {
		None
	};

	let mut timer = ThroughputTimer::start();
	let records = scan_tree(root, policy, &mut timer)?;

	match manifest_path {
		Some(manifest_path) => {
			let baseline =
				manifest::parse_manifest(&manifest_path)?;
			let report =
				reconcile::reconcile(&records, &baseline, |path| {
					root.join(platform::native_path(path))
						.is_file()
				});
			print_report(&report).map_err(AppError::Output)?;
		}
		None => {
			let header = ManifestHeader::for_invocation();
			let stdout = io::stdout();
			manifest::write_manifest(
				stdout.lock(),
				&header,
				&records,
			)
			.map_err(AppError::Output)?;
		}
	}

	if cli.timing {
		eprintln!("{}", timer.summary());
	}
	Ok(())
}

/// Walk the tree and hash every qualifying file, returning the
/// normalized record set.
pub fn scan_tree(
	root: &Path,
	policy: ChunkPolicy,
	timer: &mut ThroughputTimer,
) -> Result<RecordSet, AppError> {
	let paths =
		walker::walk_tree(root).map_err(|source| AppError::Walk {
			source,
			root: root.to_path_buf(),
		})?;
	let mut records = Vec::with_capacity(paths.len());
	for path in paths {
		let (digests, bytes) = hasher::hash_file(&path, policy)?;
		timer.record(bytes);
		records.push(FileRecord {
			path: walker::relative_wire_path(root, &path),
			md5: digests.md5,
			sha1: digests.sha1,
		});
	}
	Ok(manifest::normalize(records))
}

fn print_report(report: &ReconcileReport) -> io::Result<()> {
	let stdout = io::stdout();
	let mut out = stdout.lock();
	for drift in &report.drifts {
		writeln!(out, "{} {}", drift.kind.marker(), drift.path)?;
	}
	if report.verified() {
		writeln!(out, "{}", VERDICT_OK)
	} else {
		writeln!(out, "{}", VERDICT_FAILED)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::error::ErrorKind;

	#[test]
	fn cli_parses_all_flags() {
		let cli = Cli::try_parse_from([
			"verisum", "-l", "-v", "-t", "/data",
		])
		.unwrap();
		assert!(cli.low_memory);
		assert!(cli.verify);
		assert!(cli.timing);
		assert_eq!(cli.start_dir, Some(PathBuf::from("/data")));
	}

	#[test]
	fn cli_allows_bare_invocation() {
		let cli = Cli::try_parse_from(["verisum"]).unwrap();
		assert_eq!(cli.start_dir, None);
	}

	#[test]
	fn cli_help_is_a_clean_exit() {
		let err =
			Cli::try_parse_from(["verisum", "-h"]).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::DisplayHelp);
	}

	#[test]
	fn missing_directory_is_a_config_error() {
		let cli = Cli::try_parse_from([
			"verisum",
			"/definitely/not/a/real/directory",
		])
		.unwrap();
		let root = cli.start_dir.clone().unwrap();
		let err = run_with(&cli, &root).unwrap_err();
		assert!(matches!(err, AppError::Config(_)));
	}
}
