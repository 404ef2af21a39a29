//! Raw rows as the stores produce them, and their conversion into the
//! canonical model types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{
	self, Author, Category, CategoryRef, CategorySummary, Post, PostStatus, Profile, Role,
};

/// A post row joined with its interaction, category and author rows,
/// any of which may be missing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
	pub id: Uuid,
	pub slug: String,
	pub title: String,
	pub excerpt: Option<String>,
	pub content: String,
	pub cover_url: Option<String>,
	pub tags: Option<Vec<String>>,
	pub category_id: Option<Uuid>,
	pub status: String,
	pub published_at: Option<DateTime<Utc>>,
	pub author_id: Option<Uuid>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub views: Option<i64>,
	pub likes: Option<i64>,
	pub joined_category_id: Option<Uuid>,
	pub category_name: Option<String>,
	pub category_slug: Option<String>,
	pub joined_author_id: Option<Uuid>,
	pub author_display_name: Option<String>,
	pub author_email: Option<String>,
	pub author_avatar_url: Option<String>,
}

impl From<PostRow> for Post {
	fn from(row: PostRow) -> Self {
		let status = PostStatus::parse(&row.status).unwrap_or_default();

		let category = match (row.joined_category_id, row.category_name, row.category_slug) {
			(Some(id), Some(name), Some(slug)) => Some(CategoryRef { id, name, slug }),
			_ => None,
		};

		let author = match row.joined_author_id {
			Some(id) => Author {
				id: Some(id),
				display_name: model::fallback_name(
					row.author_display_name.as_deref(),
					row.author_email.as_deref(),
				),
				avatar_url: row.author_avatar_url,
			},
			None => Author::unknown(row.author_id),
		};

		let published_at = match (status, row.published_at) {
			(PostStatus::Published, None) => Some(row.created_at),
			(_, published_at) => published_at,
		};

		Self {
			id: row.id,
			slug: row.slug,
			title: row.title,
			excerpt: row.excerpt,
			content: row.content,
			cover_url: row.cover_url,
			tags: row.tags.unwrap_or_default(),
			category_id: category.as_ref().map(|category| category.id),
			category,
			status,
			published_at,
			views: row.views.unwrap_or(0).max(0),
			likes: row.likes.unwrap_or(0).max(0),
			author_id: row.author_id,
			author,
			created_at: row.created_at,
			updated_at: row.updated_at,
		}
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
	pub id: Uuid,
	pub name: String,
	pub slug: String,
	pub description: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
	fn from(row: CategoryRow) -> Self {
		Self {
			id: row.id,
			name: row.name,
			slug: row.slug,
			description: row.description,
			created_at: row.created_at,
			updated_at: row.updated_at,
		}
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategorySummaryRow {
	#[sqlx(flatten)]
	pub category: CategoryRow,
	pub post_count: Option<i64>,
}

impl From<CategorySummaryRow> for CategorySummary {
	fn from(row: CategorySummaryRow) -> Self {
		Self {
			category: row.category.into(),
			post_count: row.post_count.unwrap_or(0),
		}
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
	pub id: Uuid,
	pub display_name: Option<String>,
	pub email: Option<String>,
	pub avatar_url: Option<String>,
	pub bio: Option<String>,
	pub role: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
	fn from(row: ProfileRow) -> Self {
		Self {
			id: row.id,
			display_name: row.display_name,
			email: row.email,
			avatar_url: row.avatar_url,
			bio: row.bio,
			role: Role::parse(&row.role),
			created_at: row.created_at,
			updated_at: row.updated_at,
		}
	}
}
