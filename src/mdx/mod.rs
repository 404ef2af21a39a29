//! Compilation of MDX content: markdown with GFM extensions and embedded
//! JSX components.

pub mod render;

use std::panic::{self, AssertUnwindSafe};

use markdown::{mdast::Node, Constructs, ParseOptions};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub use render::Rendered;

/// The first error reported by the MDX compiler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CompileError {
	pub message: String,
}

impl CompileError {
	fn new(message: impl Into<String>) -> Self {
		let message = message.into();

		Self {
			message: if message.trim().is_empty() {
				"content could not be compiled".into()
			} else {
				message
			},
		}
	}
}

pub fn parse_options() -> ParseOptions {
	ParseOptions {
		constructs: Constructs {
			gfm_autolink_literal: true,
			gfm_strikethrough: true,
			gfm_table: true,
			gfm_task_list_item: true,
			..Constructs::mdx()
		},
		..ParseOptions::mdx()
	}
}

/// Parses `source` into a syntax tree. A panic inside the parser is
/// reported as a [`CompileError`] too.
pub fn parse(source: &str) -> Result<Node, CompileError> {
	let options = parse_options();

	let tree = match panic::catch_unwind(AssertUnwindSafe(|| markdown::to_mdast(source, &options))) {
		Ok(Ok(tree)) => tree,
		Ok(Err(message)) => return Err(CompileError::new(message.to_string())),
		Err(_) => return Err(CompileError::new("the compiler crashed on this content")),
	};

	match unclosed_tag(source, &tree) {
		Some(offset) => {
			let (line, column) = line_column(source, offset);

			Err(CompileError::new(format!(
				"{line}:{column}: Unexpected `<` in text, expected a closed tag such as `<Callout>...</Callout>` or an escaped `\\<`"
			)))
		}
		None => Ok(tree),
	}
}

/// Finds the byte offset of a `<` that starts a tag but ended up in a text
/// node. The parser leaves a tag it could not finish as plain text instead
/// of failing, most notably at the end of the input.
fn unclosed_tag(source: &str, node: &Node) -> Option<usize> {
	if let Node::Text(text) = node {
		let (start, end) = text
			.position
			.as_ref()
			.map_or((0, 0), |position| (position.start.offset, position.end.offset));

		// Escapes and character references are already resolved in the value,
		// so the raw source is what gets scanned.
		return match source.get(start..end) {
			Some(raw) if end > start => tag_start(raw).map(|index| start + index),
			_ => None,
		};
	}

	node.children()?
		.iter()
		.find_map(|child| unclosed_tag(source, child))
}

fn tag_start(raw: &str) -> Option<usize> {
	let bytes = raw.as_bytes();

	(0..bytes.len()).find(|&index| {
		bytes[index] == b'<'
			&& (index == 0 || bytes[index - 1] != b'\\')
			&& bytes
				.get(index + 1)
				.is_some_and(|next| next.is_ascii_alphabetic() || matches!(next, b'/' | b'>'))
	})
}

/// 1-indexed line and column of a byte offset.
fn line_column(source: &str, offset: usize) -> (usize, usize) {
	let before = source.get(..offset).unwrap_or(source);
	let line = before.matches('\n').count() + 1;
	let column = before
		.rfind('\n')
		.map_or(before.chars().count(), |newline| before[newline + 1..].chars().count())
		+ 1;

	(line, column)
}

/// Checks that `source` compiles.
pub async fn check(source: String) -> Result<(), CompileError> {
	tokio::task::spawn_blocking(move || parse(&source).map(drop))
		.await
		.map_err(|error| CompileError::new(error.to_string()))?
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct MdxInput {
	/// The MDX source to compile.
	pub content: String,
}

/// The outcome of validating MDX content.
#[derive(Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct MdxReport {
	pub valid: bool,
	/// The compiler's message when the content is invalid.
	pub error: Option<String>,
}

/// Validates `source` without producing output. Never fails.
pub async fn validate(source: String) -> MdxReport {
	match check(source).await {
		Ok(()) => MdxReport {
			valid: true,
			error: None,
		},
		Err(error) => MdxReport {
			valid: false,
			error: Some(error.message),
		},
	}
}
