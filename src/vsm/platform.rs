// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: verisum
// Module: platform
// Purpose: Separator normalization and terminal capabilities.

/// Serialized manifest paths use forward slashes on every host.
pub fn wire_path(path: &str) -> String {
	path.replace('\\', "/")
}

/// Host-native form of a serialized path. Inverse of [`wire_path`]
/// on Windows, identity elsewhere.
pub fn native_path(path: &str) -> String {
	if cfg!(windows) {
		path.replace('/', "\\")
	} else {
		path.to_string()
	}
}

/// Terminal width for message wrapping. Runtime query of the
/// COLUMNS variable with an 80-column fallback.
pub fn terminal_width() -> usize {
	std::env::var("COLUMNS")
		.ok()
		.and_then(|value| value.trim().parse::<usize>().ok())
		.filter(|width| *width > 0)
		.unwrap_or(80)
}

/// Greedy word wrap. A word longer than `width` gets a line of its
/// own rather than being split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
	let width = width.max(1);
	let mut lines = Vec::new();
	let mut line = String::new();
	for word in text.split_whitespace() {
		if line.is_empty() {
			line.push_str(word);
		} else if line.len() + 1 + word.len() <= width {
			line.push(' ');
			line.push_str(word);
		} else {
			lines.push(std::mem::take(&mut line));
			line.push_str(word);
		}
	}
	if !line.is_empty() {
		lines.push(line);
	}
	lines
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wire_path_normalizes_backslashes() {
		assert_eq!(wire_path("a\\b\\c.txt"), "a/b/c.txt");
		assert_eq!(wire_path("a/b/c.txt"), "a/b/c.txt");
	}

	#[cfg(not(windows))]
	#[test]
	fn native_path_is_identity_on_unix() {
		assert_eq!(native_path("a/b/c.txt"), "a/b/c.txt");
	}

	#[test]
	fn wrap_packs_words_up_to_width() {
		let lines = wrap("one two three four", 9);
		assert_eq!(lines, vec!["one two", "three", "four"]);
	}

	#[test]
	fn wrap_gives_long_words_their_own_line() {
		let lines = wrap("a verylongword b", 6);
		assert_eq!(lines, vec!["a", "verylongword", "b"]);
	}

	#[test]
	fn wrap_of_empty_text_is_empty() {
		assert!(wrap("", 40).is_empty());
	}
}
