// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: verisum
// File: lib.rs

pub mod vsm {
	pub mod app;
	pub mod hasher;
	pub mod manifest;
	pub mod platform;
	pub mod progress;
	pub mod reconcile;
	pub mod walker;
}
