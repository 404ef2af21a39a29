pub mod memory;
pub mod postgres;
pub mod row;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use uuid::Uuid;

use crate::model::{Category, CategorySummary, DashboardStats, Post, PostStatus, Profile, Role};

/// Names of the constraints whose violations are reported to clients.
pub mod constraint {
	pub const ACCOUNT_EMAIL: &str = "account_email_key";
	pub const POST_SLUG: &str = "post_slug_key";
	pub const POST_CATEGORY: &str = "post_category_id_fkey";
	pub const CATEGORY_SLUG: &str = "category_slug_key";
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("unique constraint {0} violated")]
	Conflict(String),
	#[error("foreign key constraint {0} violated")]
	MissingReference(String),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// A new account together with its profile.
#[derive(Debug, Clone)]
pub struct NewAccount {
	pub id: Uuid,
	pub email: String,
	pub password: Vec<u8>,
	pub display_name: Option<String>,
	pub role: Role,
}

#[derive(Debug, Clone)]
pub struct Account {
	pub id: Uuid,
	pub email: String,
	pub password: Vec<u8>,
}

/// The profile created for an author if they do not have one yet.
#[derive(Debug, Clone)]
pub struct ProfileSeed {
	pub id: Uuid,
	pub display_name: String,
	pub email: Option<String>,
}

impl From<&Profile> for ProfileSeed {
	fn from(profile: &Profile) -> Self {
		Self {
			id: profile.id,
			display_name: profile.fallback_name(),
			email: profile.email.clone(),
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
	pub display_name: Option<String>,
	pub avatar_url: Option<String>,
	pub bio: Option<String>,
}

/// Interaction counters of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
	pub views: i64,
	pub likes: i64,
}

impl Counters {
	/// Cosmetic counters for a freshly created post.
	pub fn seeded() -> Self {
		Self {
			views: 500 + i64::from(OsRng.next_u32() % 501),
			likes: i64::from(OsRng.next_u32() % 501),
		}
	}
}

/// A fully resolved post write. `author_id` and `counters` only apply
/// when `create` is set.
#[derive(Debug, Clone)]
pub struct PostWrite {
	pub id: Uuid,
	pub create: bool,
	pub slug: String,
	pub title: String,
	pub excerpt: Option<String>,
	pub content: String,
	pub cover_url: Option<String>,
	pub tags: Vec<String>,
	pub category_id: Option<Uuid>,
	pub status: PostStatus,
	pub published_at: Option<DateTime<Utc>>,
	pub author_id: Uuid,
	pub counters: Counters,
}

#[derive(Debug, Clone, Copy)]
pub enum PostKey<'a> {
	Id(Uuid),
	Slug(&'a str),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostOrder {
	/// Newest publication first.
	#[default]
	Published,
	/// Most recently edited first.
	Updated,
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
	pub status: Option<PostStatus>,
	pub category_slug: Option<String>,
	pub tag: Option<String>,
	/// Case-insensitive substring of the title or excerpt.
	pub search: Option<String>,
	/// Leaves out the post with this slug.
	pub exclude_slug: Option<String>,
	pub order: PostOrder,
	pub limit: i64,
	pub offset: i64,
}

impl PostFilter {
	pub fn published() -> Self {
		Self {
			status: Some(PostStatus::Published),
			..Self::default()
		}
	}

	#[must_use]
	pub fn page(mut self, limit: i64, offset: i64) -> Self {
		self.limit = limit;
		self.offset = offset;
		self
	}
}

#[derive(Debug, Clone)]
pub struct NewCategory {
	pub id: Uuid,
	pub name: String,
	pub slug: String,
	pub description: Option<String>,
}

/// Fields left as `None` are kept.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
	pub name: Option<String>,
	pub slug: Option<String>,
	pub description: Option<Option<String>>,
}

/// The persistent store behind the application.
///
/// Every post returned has gone through [`row::PostRow`] normalization.
#[async_trait]
pub trait Store: Send + Sync {
	/// Creates an account and its profile.
	async fn create_account(&self, account: &NewAccount) -> Result<Profile>;
	async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;

	async fn create_session(&self, account_id: Uuid) -> Result<Uuid>;
	async fn delete_session(&self, session_id: Uuid) -> Result<()>;
	/// Returns the profile of the account owning the session.
	async fn find_session_profile(&self, session_id: Uuid) -> Result<Option<Profile>>;
	async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<Profile>>;

	/// Ensures the author's profile exists, then creates or updates the post,
	/// as a single unit. Returns `None` when updating a post that does not exist.
	async fn save_post(&self, author: &ProfileSeed, post: &PostWrite) -> Result<Option<Post>>;
	async fn find_post(&self, key: PostKey<'_>) -> Result<Option<Post>>;
	async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>>;
	/// Returns `false` when no post was deleted.
	async fn delete_post(&self, id: Uuid) -> Result<bool>;
	async fn post_stats(&self) -> Result<DashboardStats>;

	/// All categories ordered by name, with their published post count.
	async fn list_categories(&self) -> Result<Vec<CategorySummary>>;
	async fn insert_category(&self, category: &NewCategory) -> Result<Category>;
	async fn update_category(&self, id: Uuid, patch: &CategoryPatch) -> Result<Option<Category>>;
	/// Posts filed under the category are kept without a category.
	async fn delete_category(&self, id: Uuid) -> Result<bool>;

	/// Atomically adds a view to a published post, returning the new count.
	async fn record_view(&self, slug: &str) -> Result<Option<i64>>;
	/// Atomically adds or removes a like, never going below zero.
	async fn record_like(&self, slug: &str, like: bool) -> Result<Option<i64>>;
}
