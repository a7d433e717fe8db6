// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: verisum
// Module: manifest
// Purpose: FileRecord model, manifest codec, and file discovery.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use csv::{ReaderBuilder, Terminator, WriterBuilder};

/// Files whose name carries this prefix are manifests: excluded from
/// the tree walk, matched (with [`MANIFEST_SUFFIX`]) during verify
/// mode discovery, and ignored if they show up as a data row.
pub const MANIFEST_PREFIX: &str = "VERSION-";
pub const MANIFEST_SUFFIX: &str = ".txt";

const COMMENT_MARKER: char = '#';

/// One file's relative path plus both digest values. Equality and
/// ordering cover all three fields.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FileRecord {
	pub path: String,
	pub md5: String,
	pub sha1: String,
}

/// Sorted, path-deduplicated snapshot of one tree scan.
pub type RecordSet = Vec<FileRecord>;

/// Sort lexicographically and drop duplicate paths, keeping the
/// first record for each path.
pub fn normalize(mut records: Vec<FileRecord>) -> RecordSet {
	records.sort();
	records.dedup_by(|a, b| a.path == b.path);
	records
}

/// Metadata written into the manifest's comment header.
#[derive(Clone, Debug)]
pub struct ManifestHeader {
	pub generated_at: DateTime<Local>,
	pub user: String,
	pub command_line: String,
}

impl ManifestHeader {
	pub fn for_invocation() -> Self {
		Self {
			generated_at: Local::now(),
			user: invoking_user(),
			command_line: std::env::args()
				.collect::<Vec<_>>()
				.join(" "),
		}
	}
}

fn invoking_user() -> String {
	std::env::var("USER")
		.or_else(|_| std::env::var("USERNAME"))
		.unwrap_or_else(|_| "unknown".to_string())
}

#[derive(Debug)]
pub enum ManifestError {
	Io { source: io::Error, path: PathBuf },
	Parse { path: PathBuf, reason: String },
	Discovery { dir: PathBuf, found: usize },
}

impl fmt::Display for ManifestError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ManifestError::Io { source, path } => write!(
				f,
				"Cannot read manifest {}: {}",
				path.display(),
				source
			),
			ManifestError::Parse { path, reason } => write!(
				f,
				"Cannot parse manifest {}: {}. Was it generated \
				 by a different tool?",
				path.display(),
				reason
			),
			ManifestError::Discovery { dir, found: 0 } => write!(
				f,
				"No {}*{} manifest found in {}.",
				MANIFEST_PREFIX,
				MANIFEST_SUFFIX,
				dir.display()
			),
			ManifestError::Discovery { dir, found } => write!(
				f,
				"Found {} files matching {}*{} in {}; expected \
				 exactly one. Rename or move the extra files.",
				found,
				MANIFEST_PREFIX,
				MANIFEST_SUFFIX,
				dir.display()
			),
		}
	}
}

impl std::error::Error for ManifestError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			ManifestError::Io { source, .. } => Some(source),
			_ => None,
		}
	}
}

/// Locate the single manifest in `dir` (non-recursive). Zero or
/// multiple candidates is a configuration error.
pub fn discover_manifest(
	dir: &Path,
) -> Result<PathBuf, ManifestError> {
	let entries =
		fs::read_dir(dir).map_err(|source| ManifestError::Io {
			source,
			path: dir.to_path_buf(),
		})?;
	let mut matches = Vec::new();
	for entry in entries {
		let entry = entry.map_err(|source| ManifestError::Io {
			source,
			path: dir.to_path_buf(),
		})?;
		let name = entry.file_name();
		let name = name.to_string_lossy();
		if name.starts_with(MANIFEST_PREFIX)
			&& name.ends_with(MANIFEST_SUFFIX)
			&& entry.path().is_file()
		{
			matches.push(entry.path());
		}
	}
	if matches.len() == 1 {
		Ok(matches.remove(0))
	} else {
		Err(ManifestError::Discovery {
			dir: dir.to_path_buf(),
			found: matches.len(),
		})
	}
}

/// Write the three comment header lines and one quote-escaped CSV
/// row per record, all CRLF-terminated. Records are written in the
/// order given; callers pass a normalized set.
pub fn write_manifest<W: Write>(
	mut out: W,
	header: &ManifestHeader,
	records: &[FileRecord],
) -> io::Result<()> {
	write!(
		out,
		"{} {} {} output generated on {} by {}\r\n",
		COMMENT_MARKER,
		env!("CARGO_PKG_NAME"),
		env!("CARGO_PKG_VERSION"),
		header.generated_at.format("%Y-%m-%d %H:%M:%S"),
		header.user
	)?;
	write!(out, "{} {}\r\n", COMMENT_MARKER, header.command_line)?;
	write!(out, "{} filename,MD5,SHA1\r\n", COMMENT_MARKER)?;

	let mut writer = WriterBuilder::new()
		.has_headers(false)
		.terminator(Terminator::CRLF)
		.from_writer(out);
	for record in records {
		writer
			.write_record([
				record.path.as_str(),
				record.md5.as_str(),
				record.sha1.as_str(),
			])
			.map_err(csv_to_io)?;
	}
	writer.flush()
}

fn csv_to_io(err: csv::Error) -> io::Error {
	io::Error::new(io::ErrorKind::Other, err)
}

/// Read a manifest back into a normalized RecordSet. Tolerates a
/// UTF-8 byte-order marker and UTF-16 content (redirected Windows
/// console output); skips comment rows, empty lines, and
/// self-referential manifest rows. The whole text goes through one
/// CSV reader so quote-escaped line terminators inside a path
/// survive the trip.
pub fn parse_manifest(
	path: &Path,
) -> Result<RecordSet, ManifestError> {
	let bytes =
		fs::read(path).map_err(|source| ManifestError::Io {
			source,
			path: path.to_path_buf(),
		})?;
	let text = decode_text(&bytes).map_err(|reason| {
		ManifestError::Parse {
			path: path.to_path_buf(),
			reason,
		}
	})?;

	let parse_err = |reason: String| ManifestError::Parse {
		path: path.to_path_buf(),
		reason,
	};
	let mut reader = ReaderBuilder::new()
		.has_headers(false)
		.flexible(true)
		.from_reader(text.as_bytes());
	let mut records = Vec::new();
	for row in reader.records() {
		let record =
			row.map_err(|err| parse_err(err.to_string()))?;
		// The skip check is field-based: the first field decides
		// whether a row is a comment or a self-referential
		// manifest artifact.
		let first = record.get(0).unwrap_or("");
		if first.starts_with(COMMENT_MARKER)
			|| first.starts_with(MANIFEST_PREFIX)
		{
			continue;
		}
		if record.len() == 1 && first.is_empty() {
			continue;
		}
		if record.len() != 3 {
			let line = record
				.position()
				.map(|p| p.line())
				.unwrap_or(0);
			return Err(parse_err(format!(
				"line {}: expected 3 fields, found {}",
				line,
				record.len()
			)));
		}
		records.push(FileRecord {
			path: record[0].to_string(),
			md5: record[1].to_string(),
			sha1: record[2].to_string(),
		});
	}
	Ok(normalize(records))
}

fn decode_text(bytes: &[u8]) -> Result<String, String> {
	if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
		return String::from_utf8(bytes[3..].to_vec())
			.map_err(|_| "not valid UTF-8 after BOM".to_string());
	}
	if bytes.starts_with(&[0xFF, 0xFE]) {
		return decode_utf16(&bytes[2..], u16::from_le_bytes);
	}
	if bytes.starts_with(&[0xFE, 0xFF]) {
		return decode_utf16(&bytes[2..], u16::from_be_bytes);
	}
	String::from_utf8(bytes.to_vec())
		.map_err(|_| "not valid UTF-8".to_string())
}

fn decode_utf16(
	bytes: &[u8],
	combine: fn([u8; 2]) -> u16,
) -> Result<String, String> {
	if bytes.len() % 2 != 0 {
		return Err("truncated UTF-16 content".to_string());
	}
	let units: Vec<u16> = bytes
		.chunks_exact(2)
		.map(|pair| combine([pair[0], pair[1]]))
		.collect();
	String::from_utf16(&units)
		.map_err(|_| "not valid UTF-16".to_string())
}
