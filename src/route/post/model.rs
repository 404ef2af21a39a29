pub use crate::route::model::{Paginate, SlugInput};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{mdx::Rendered, model::Post};

/// The most related posts returned for a post.
pub const RELATED_LIMIT: usize = 6;
/// How many candidates the related posts are drawn from.
pub const RELATED_POOL: i64 = 20;

/// A published post with its content rendered to HTML.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostDetail {
	#[serde(flatten)]
	pub post: Post,
	#[serde(flatten)]
	pub rendered: Rendered,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct LikeInput {
	/// `true` to add a like, `false` to take one back.
	pub like: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct LikeOutput {
	/// The like count after the change.
	pub likes: i64,
}
