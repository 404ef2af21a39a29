use uuid::Uuid;

pub const MIN_LENGTH: usize = 3;

/// Lowercases `input`, strips diacritics and joins its alphanumeric runs
/// with single hyphens, so `Hello, World! 2024` becomes `hello-world-2024`.
pub fn slugify(input: &str) -> String {
	let ascii = deunicode::deunicode(input);
	let mut slug = String::with_capacity(ascii.len());
	let mut separate = false;

	for c in ascii.chars() {
		if c.is_ascii_alphanumeric() {
			if separate && !slug.is_empty() {
				slug.push('-');
			}

			separate = false;
			slug.push(c.to_ascii_lowercase());
		} else {
			separate = true;
		}
	}

	slug
}

/// Whether `slug` can be used as an explicit slug.
pub fn is_valid(slug: &str) -> bool {
	slug.len() >= MIN_LENGTH
		&& slug
			.bytes()
			.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Derives a slug from `text`, padding it with part of `id` when the text
/// alone does not produce a long enough slug.
pub fn derive(text: &str, id: Uuid, fallback: &str) -> String {
	let slug = slugify(text);
	let suffix = id.simple().to_string();
	let suffix = &suffix[..8];

	if slug.is_empty() {
		format!("{fallback}-{suffix}")
	} else if slug.len() < MIN_LENGTH {
		format!("{slug}-{suffix}")
	} else {
		slug
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_slugify() {
		assert_eq!(slugify("Hello, World! 2024"), "hello-world-2024");
		assert_eq!(slugify("  --Rust   & Axum--  "), "rust-axum");
		assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
		assert_eq!(slugify("!!!"), "");
	}

	#[test]
	fn test_slugify_is_deterministic() {
		for title in ["Hello, World! 2024", "Ünïcödé tïtle", "a_b c"] {
			let slug = slugify(title);

			assert_eq!(slug, slugify(title));
			assert!(slug
				.bytes()
				.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'));
			assert!(!slug.starts_with('-') && !slug.ends_with('-'));
		}
	}

	#[test]
	fn test_is_valid() {
		assert!(is_valid("hello-world"));
		assert!(!is_valid("hi"));
		assert!(!is_valid("Hello"));
		assert!(!is_valid("hello world"));
	}

	#[test]
	fn test_derive_pads_short_slugs() {
		let id = Uuid::parse_str("1a2b3c4d-0000-4000-8000-000000000000").unwrap();

		assert_eq!(derive("Hi", id, "post"), "hi-1a2b3c4d");
		assert_eq!(derive("???", id, "post"), "post-1a2b3c4d");
		assert_eq!(derive("Hello", id, "post"), "hello");
	}
}
