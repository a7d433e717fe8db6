// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: verisum
// Module: hasher
// Purpose: Streaming MD5+SHA-1 digest pair over file content.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use digest::Digest;
use md5::Md5;
use sha1::Sha1;

/// Chunk size for the memory-conservation mode (`-l`) and for the
/// fallback when a whole-file buffer cannot be reserved.
pub const LOW_MEMORY_CHUNK: usize = 64 * 1024;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChunkPolicy {
	/// One buffer sized to the file. Throughput-optimized default.
	WholeFile,
	/// Bounded-memory streaming with a fixed chunk size.
	Fixed(usize),
}

/// Both digests of one file, lowercase hex.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DigestPair {
	pub md5: String,
	pub sha1: String,
}

#[derive(Debug)]
pub enum HashError {
	Io { source: io::Error, path: PathBuf },
	Memory { path: PathBuf },
}

impl fmt::Display for HashError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			HashError::Io { source, path } => write!(
				f,
				"Cannot read {}: {}. Check file permissions and \
				 for interference from antivirus or backup \
				 software.",
				path.display(),
				source
			),
			HashError::Memory { path } => write!(
				f,
				"Out of memory hashing {} even at the {} KiB \
				 fallback chunk size.",
				path.display(),
				LOW_MEMORY_CHUNK / 1024
			),
		}
	}
}

impl std::error::Error for HashError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			HashError::Io { source, .. } => Some(source),
			HashError::Memory { .. } => None,
		}
	}
}

/// Hash a file's full content through MD5 and SHA-1 in one pass,
/// returning the digest pair and the number of bytes read. Digest
/// values do not depend on the chunk policy.
pub fn hash_file(
	path: &Path,
	policy: ChunkPolicy,
) -> Result<(DigestPair, u64), HashError> {
	let file = File::open(path).map_err(|source| HashError::Io {
		source,
		path: path.to_path_buf(),
	})?;
	match policy {
		ChunkPolicy::WholeFile => {
			let len = file
				.metadata()
				.map_err(|source| HashError::Io {
					source,
					path: path.to_path_buf(),
				})?
				.len();
			match whole_file_buffer(len) {
				Some(buf) => hash_whole(path, file, buf),
				// Whole-file buffer does not fit; retry this one
				// file with bounded-memory streaming.
				None => {
					hash_chunked(path, file, LOW_MEMORY_CHUNK)
				}
			}
		}
		ChunkPolicy::Fixed(size) => hash_chunked(path, file, size),
	}
}

/// Reserve a buffer for the whole file up front. `None` when the
/// length does not fit in usize (32-bit targets) or the reservation
/// fails; both cases take the bounded-memory fallback.
fn whole_file_buffer(len: u64) -> Option<Vec<u8>> {
	let capacity = usize::try_from(len).ok()?;
	let mut buf = Vec::new();
	buf.try_reserve_exact(capacity).ok()?;
	Some(buf)
}

fn hash_whole(
	path: &Path,
	mut file: File,
	mut buf: Vec<u8>,
) -> Result<(DigestPair, u64), HashError> {
	file.read_to_end(&mut buf).map_err(|source| HashError::Io {
		source,
		path: path.to_path_buf(),
	})?;
	let mut md5 = Md5::new();
	let mut sha1 = Sha1::new();
	md5.update(&buf);
	sha1.update(&buf);
	Ok((finish(md5, sha1), buf.len() as u64))
}

fn hash_chunked(
	path: &Path,
	mut file: File,
	chunk: usize,
) -> Result<(DigestPair, u64), HashError> {
	let chunk = chunk.max(1);
	let mut buf = Vec::new();
	if buf.try_reserve_exact(chunk).is_err() {
		return Err(HashError::Memory {
			path: path.to_path_buf(),
		});
	}
	buf.resize(chunk, 0);
	let mut md5 = Md5::new();
	let mut sha1 = Sha1::new();
	let mut total = 0u64;
	loop {
		let read =
			file.read(&mut buf).map_err(|source| HashError::Io {
				source,
				path: path.to_path_buf(),
			})?;
		if read == 0 {
			break;
		}
		md5.update(&buf[..read]);
		sha1.update(&buf[..read]);
		total += read as u64;
	}
	Ok((finish(md5, sha1), total))
}

fn finish(md5: Md5, sha1: Sha1) -> DigestPair {
	DigestPair {
		md5: hex::encode(md5.finalize()),
		sha1: hex::encode(sha1.finalize()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::Path;
	use tempfile::tempdir;

	fn write(path: &Path, contents: &[u8]) {
		std::fs::write(path, contents).unwrap();
	}

	#[test]
	fn known_vectors_for_empty_file() {
		let tmp = tempdir().unwrap();
		let file = tmp.path().join("empty");
		write(&file, b"");

		let (pair, bytes) =
			hash_file(&file, ChunkPolicy::WholeFile).unwrap();
		assert_eq!(bytes, 0);
		assert_eq!(pair.md5, "d41d8cd98f00b204e9800998ecf8427e");
		assert_eq!(
			pair.sha1,
			"da39a3ee5e6b4b0d3255bfef95601890afd80709"
		);
	}

	#[test]
	fn known_vectors_for_hello_world() {
		let tmp = tempdir().unwrap();
		let file = tmp.path().join("hello");
		write(&file, b"hello world");

		let (pair, bytes) =
			hash_file(&file, ChunkPolicy::WholeFile).unwrap();
		assert_eq!(bytes, 11);
		assert_eq!(pair.md5, "5eb63bbbe01eeed093cb22bb8f5acdc3");
		assert_eq!(
			pair.sha1,
			"2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
		);
	}

	#[test]
	fn digests_are_chunk_size_invariant() {
		let tmp = tempdir().unwrap();
		let file = tmp.path().join("data");
		let content: Vec<u8> =
			(0..200_000).map(|i| (i % 251) as u8).collect();
		write(&file, &content);

		let (whole, _) =
			hash_file(&file, ChunkPolicy::WholeFile).unwrap();
		let (tiny, _) =
			hash_file(&file, ChunkPolicy::Fixed(7)).unwrap();
		let (low, _) =
			hash_file(&file, ChunkPolicy::Fixed(LOW_MEMORY_CHUNK))
				.unwrap();
		assert_eq!(whole, tiny);
		assert_eq!(whole, low);
	}

	#[test]
	fn zero_chunk_size_still_consumes_the_file() {
		let tmp = tempdir().unwrap();
		let file = tmp.path().join("data");
		write(&file, b"abc");

		let (whole, _) =
			hash_file(&file, ChunkPolicy::WholeFile).unwrap();
		let (fixed, bytes) =
			hash_file(&file, ChunkPolicy::Fixed(0)).unwrap();
		assert_eq!(whole, fixed);
		assert_eq!(bytes, 3);
	}

	#[test]
	fn oversized_buffer_request_takes_the_fallback() {
		assert!(whole_file_buffer(u64::MAX).is_none());
		assert!(whole_file_buffer(16).is_some());
	}

	#[test]
	fn missing_file_is_an_io_error() {
		let tmp = tempdir().unwrap();
		let file = tmp.path().join("absent");

		let err =
			hash_file(&file, ChunkPolicy::WholeFile).unwrap_err();
		match err {
			HashError::Io { path, .. } => assert_eq!(path, file),
			other => panic!("expected Io error, got {:?}", other),
		}
	}

	#[cfg(unix)]
	#[test]
	fn unreadable_file_is_an_io_error() {
		use std::os::unix::fs::PermissionsExt;

		let tmp = tempdir().unwrap();
		let file = tmp.path().join("locked");
		write(&file, b"secret");
		let mut perms =
			std::fs::metadata(&file).unwrap().permissions();
		perms.set_mode(0o000);
		std::fs::set_permissions(&file, perms).unwrap();

		let result = hash_file(&file, ChunkPolicy::WholeFile);
		let mut restore =
			std::fs::metadata(&file).unwrap().permissions();
		restore.set_mode(0o600);
		std::fs::set_permissions(&file, restore).unwrap();

		// root ignores permission bits; nothing to assert then.
		if result.is_ok() {
			return;
		}
		assert!(matches!(result, Err(HashError::Io { .. })));
	}
}
