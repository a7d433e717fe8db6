// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: verisum
// File: main.rs

use colored::Colorize;
use verisum::vsm::{app, platform};

fn main() {
	if let Err(err) = app::run() {
		let width = platform::terminal_width();
		let lines = platform::wrap(&err.to_string(), width);
		for (index, line) in lines.iter().enumerate() {
			if index == 0 {
				eprintln!("{} {}", "Error:".red(), line);
			} else {
				eprintln!("{}", line);
			}
		}
		std::process::exit(1);
	}
}
