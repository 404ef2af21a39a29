use schemars::JsonSchema;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// These can be removed when [`serde`] supports
/// literal defaults: <https://github.com/serde-rs/serde/issues/368>
#[inline]
fn first_page() -> i64 {
	1
}

#[inline]
fn default_size() -> i64 {
	DEFAULT_PAGE_SIZE
}

/// Query parameters shared by every listing.
#[derive(Debug, Clone, Copy, Deserialize, Validate, JsonSchema)]
pub struct Paginate {
	/// The page number to return (1-indexed).
	#[validate(range(min = 1, max = 1000))]
	#[serde(default = "first_page")]
	pub page: i64,
	/// The number of posts to return per page.
	#[validate(range(min = 1, max = 100))]
	#[serde(default = "default_size")]
	pub size: i64,
}

impl Default for Paginate {
	fn default() -> Self {
		Self {
			page: first_page(),
			size: default_size(),
		}
	}
}

impl Paginate {
	pub fn offset(&self) -> i64 {
		(self.page - 1) * self.size
	}

	pub fn limit(&self) -> i64 {
		self.size
	}
}

/// A path addressing a post or category by its id.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	pub id: Uuid,
}

/// A path addressing a post or category by its slug.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct SlugInput {
	#[validate(length(min = 1, max = 200))]
	pub slug: String,
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_paginate_window() {
		let paginate = Paginate::default();

		assert_eq!((paginate.limit(), paginate.offset()), (10, 0));

		let paginate = Paginate { page: 3, size: 25 };

		assert_eq!((paginate.limit(), paginate.offset()), (25, 50));
	}

	#[test]
	fn test_paginate_defaults_from_query() {
		let paginate: Paginate = serde_json::from_str("{}").unwrap();

		assert_eq!(paginate.page, 1);
		assert_eq!(paginate.size, DEFAULT_PAGE_SIZE);
	}

	#[test]
	fn test_paginate_bounds() {
		assert!(Paginate { page: 0, size: 10 }.validate().is_err());
		assert!(Paginate { page: 1, size: MAX_PAGE_SIZE + 1 }.validate().is_err());
		assert!(Paginate { page: 1000, size: MAX_PAGE_SIZE }.validate().is_ok());
	}
}
