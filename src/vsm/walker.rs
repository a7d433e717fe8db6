// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: verisum
// Module: walker
// Purpose: Recursive enumeration of regular files under a root.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::vsm::manifest::MANIFEST_PREFIX;
use crate::vsm::platform;

/// Enumerate every regular file below `root`, at any depth, skipping
/// manifest files by name prefix. Symlinks are neither followed nor
/// reported. Traversal order is unspecified; callers sort the
/// derived records.
pub fn walk_tree(root: &Path) -> io::Result<Vec<PathBuf>> {
	let mut files = Vec::new();
	for entry in WalkDir::new(root).follow_links(false) {
		let entry = entry.map_err(to_io_error)?;
		if !entry.file_type().is_file() {
			continue;
		}
		if entry
			.file_name()
			.to_string_lossy()
			.starts_with(MANIFEST_PREFIX)
		{
			continue;
		}
		files.push(entry.into_path());
	}
	Ok(files)
}

/// Root-relative path in the serialized forward-slash form.
pub fn relative_wire_path(root: &Path, path: &Path) -> String {
	let rel = path.strip_prefix(root).unwrap_or(path);
	let joined = rel
		.components()
		.map(|c| c.as_os_str().to_string_lossy().into_owned())
		.collect::<Vec<_>>()
		.join("/");
	platform::wire_path(&joined)
}

fn to_io_error(err: walkdir::Error) -> io::Error {
	if let Some(inner) = err.io_error() {
		return io::Error::new(inner.kind(), inner.to_string());
	}
	io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::Path;
	use tempfile::tempdir;

	fn write(path: &Path, contents: &str) {
		std::fs::create_dir_all(path.parent().unwrap()).unwrap();
		std::fs::write(path, contents).unwrap();
	}

	#[test]
	fn walks_nested_directories_without_depth_limit() {
		let tmp = tempdir().unwrap();
		let root = tmp.path();
		write(&root.join("top.txt"), "t");
		write(&root.join("a/b/c/deep.txt"), "d");

		let mut rel: Vec<String> = walk_tree(root)
			.unwrap()
			.iter()
			.map(|p| relative_wire_path(root, p))
			.collect();
		rel.sort();
		assert_eq!(rel, vec!["a/b/c/deep.txt", "top.txt"]);
	}

	#[test]
	fn skips_manifest_files_anywhere_in_the_tree() {
		let tmp = tempdir().unwrap();
		let root = tmp.path();
		write(&root.join("VERSION-1.txt"), "manifest");
		write(&root.join("sub/VERSION-old.txt"), "manifest");
		write(&root.join("sub/data.bin"), "data");
		// prefix match is case-sensitive
		write(&root.join("version-notes.txt"), "notes");

		let mut rel: Vec<String> = walk_tree(root)
			.unwrap()
			.iter()
			.map(|p| relative_wire_path(root, p))
			.collect();
		rel.sort();
		assert_eq!(rel, vec!["sub/data.bin", "version-notes.txt"]);
	}

	#[cfg(unix)]
	#[test]
	fn ignores_symlinks() {
		use std::os::unix::fs::symlink;

		let tmp = tempdir().unwrap();
		let root = tmp.path();
		write(&root.join("real.txt"), "real");
		symlink(root.join("real.txt"), root.join("link.txt"))
			.unwrap();

		let rel: Vec<String> = walk_tree(root)
			.unwrap()
			.iter()
			.map(|p| relative_wire_path(root, p))
			.collect();
		assert_eq!(rel, vec!["real.txt"]);
	}
}
