use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
	if value.trim().is_empty() {
		let mut error = ValidationError::new("blank");

		error.message = Some("must contain more than whitespace".into());
		return Err(error);
	}

	Ok(())
}

/// The publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
	#[default]
	Draft,
	Published,
}

impl PostStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Draft => "draft",
			Self::Published => "published",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		match value {
			"draft" => Some(Self::Draft),
			"published" => Some(Self::Published),
			_ => None,
		}
	}

	pub fn is_published(self) -> bool {
		self == Self::Published
	}
}

/// The author of a post, as shown next to it.
///
/// A post whose author profile no longer exists (or never did) still has
/// an author value, named [`Author::UNKNOWN_NAME`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Author {
	pub id: Option<Uuid>,
	pub display_name: String,
	pub avatar_url: Option<String>,
}

impl Author {
	pub const UNKNOWN_NAME: &'static str = "Unknown author";

	pub fn unknown(id: Option<Uuid>) -> Self {
		Self {
			id,
			display_name: Self::UNKNOWN_NAME.into(),
			avatar_url: None,
		}
	}
}

/// The category a post is filed under, embedded in the post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct CategoryRef {
	pub id: Uuid,
	pub name: String,
	pub slug: String,
}

/// A single post, always in its canonical shape regardless of how the
/// store laid out its rows.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Post {
	/// The unique identifier of the post.
	pub id: Uuid,
	/// The unique, URL-safe identifier of the post.
	pub slug: String,
	pub title: String,
	pub excerpt: Option<String>,
	/// The MDX source of the post.
	pub content: String,
	pub cover_url: Option<String>,
	pub tags: Vec<String>,
	pub category_id: Option<Uuid>,
	pub category: Option<CategoryRef>,
	pub status: PostStatus,
	/// When the post was first published. Kept when a post is unpublished.
	pub published_at: Option<DateTime<Utc>>,
	pub views: i64,
	pub likes: i64,
	pub author_id: Option<Uuid>,
	pub author: Author,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// A classification label that posts can be filed under.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct Category {
	/// The unique identifier of the category.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The display name of the category.
	#[validate(length(min = 1, max = 64), custom(function = "validate_not_blank"))]
	pub name: String,
	/// The unique slug, derived from the name.
	#[serde(skip_deserializing)]
	pub slug: String,
	/// An optional description shown on the category page.
	pub description: Option<String>,
	/// The creation time of the category.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
	/// The last time the category was edited.
	#[serde(skip_deserializing)]
	pub updated_at: DateTime<Utc>,
}

/// A category along with the number of published posts filed under it.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CategorySummary {
	#[serde(flatten)]
	pub category: Category,
	pub post_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	Admin,
	Member,
}

impl Role {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Admin => "admin",
			Self::Member => "member",
		}
	}

	/// Anything other than `admin` is an ordinary member.
	pub fn parse(value: &str) -> Self {
		if value == "admin" {
			Self::Admin
		} else {
			Self::Member
		}
	}
}

/// The public identity of an account.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Profile {
	pub id: Uuid,
	pub display_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	pub avatar_url: Option<String>,
	pub bio: Option<String>,
	pub role: Role,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Profile {
	pub fn is_admin(&self) -> bool {
		self.role == Role::Admin
	}

	/// The name to attribute posts to when no display name was set.
	pub fn fallback_name(&self) -> String {
		fallback_name(self.display_name.as_deref(), self.email.as_deref())
	}
}

pub fn fallback_name(display_name: Option<&str>, email: Option<&str>) -> String {
	display_name
		.filter(|name| !name.is_empty())
		.or_else(|| email.and_then(|email| email.split('@').next()))
		.filter(|name| !name.is_empty())
		.unwrap_or("Author")
		.to_owned()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct DashboardStats {
	pub total_posts: i64,
	pub drafts: i64,
	pub published: i64,
	pub last_updated: Option<DateTime<Utc>>,
}
