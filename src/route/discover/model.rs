pub use crate::route::model::Paginate;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::model::{validate_not_blank, CategoryRef, Post};

pub const SEARCH_LIMIT: i64 = 10;

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct SearchInput {
	/// Matched case-insensitively against titles and excerpts.
	#[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
	pub q: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct TagInput {
	#[validate(length(min = 1, max = 64))]
	pub tag: String,
}

/// A compact search result.
#[derive(Debug, Serialize, JsonSchema)]
pub struct SearchHit {
	pub id: Uuid,
	pub title: String,
	pub slug: String,
	pub category: Option<CategoryRef>,
	pub tags: Vec<String>,
}

impl From<Post> for SearchHit {
	fn from(post: Post) -> Self {
		Self {
			id: post.id,
			title: post.title,
			slug: post.slug,
			category: post.category,
			tags: post.tags,
		}
	}
}
