use std::{borrow::Cow, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{de, Deserialize, Deserializer};
use uuid::Uuid;
use validator::{Validate, ValidateUrl, ValidationError, ValidationErrors};

use super::slug;
use crate::{
	mdx::{self, CompileError},
	model::{Post, PostStatus, Profile},
	store::{Counters, PostKey, PostWrite, ProfileSeed, Store, StoreError},
};

pub const EXCERPT_MAX_LENGTH: usize = 1000;
pub const PUBLISHED_TITLE_MIN_LENGTH: usize = 4;
pub const PUBLISHED_CONTENT_MIN_LENGTH: usize = 10;

/// Treats an empty string the same as a missing value.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
	D: Deserializer<'de>,
	T: FromStr,
	T::Err: Display,
{
	match Option::<String>::deserialize(deserializer)? {
		Some(value) if !value.trim().is_empty() => {
			value.trim().parse().map(Some).map_err(de::Error::custom)
		}
		_ => Ok(None),
	}
}

/// A create or update request for a post, as submitted by the editor.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct PostInput {
	/// The post to update. Creates a new post when absent.
	#[serde(default, deserialize_with = "empty_as_none")]
	#[schemars(with = "Option<String>")]
	pub id: Option<Uuid>,
	#[serde(default)]
	pub title: String,
	/// Derived from the title when absent.
	#[serde(default, deserialize_with = "empty_as_none")]
	pub slug: Option<String>,
	#[serde(default, deserialize_with = "empty_as_none")]
	pub excerpt: Option<String>,
	/// The MDX source of the post.
	#[serde(default)]
	pub content: String,
	#[serde(default, deserialize_with = "empty_as_none")]
	pub cover_url: Option<String>,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default, deserialize_with = "empty_as_none")]
	#[schemars(with = "Option<String>")]
	pub category_id: Option<Uuid>,
	#[serde(default)]
	pub status: PostStatus,
	/// An explicit publication time. Stamped automatically on first publish.
	#[serde(default, deserialize_with = "empty_as_none")]
	pub published_at: Option<DateTime<Utc>>,
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
	let mut error = ValidationError::new(code);

	error.message = Some(Cow::Borrowed(message));
	error
}

impl Validate for PostInput {
	/// Base rules always apply. The stricter publish rules only apply when
	/// the requested status is `published`.
	fn validate(&self) -> Result<(), ValidationErrors> {
		let mut errors = ValidationErrors::new();
		let title = self.title.trim().chars().count();
		let content = self.content.trim().chars().count();

		if title == 0 {
			errors.add("title", field_error("required", "Title is required"));
		}

		if content == 0 {
			errors.add("content", field_error("required", "Content is required"));
		}

		if let Some(slug) = &self.slug {
			if !slug::is_valid(slug) {
				errors.add(
					"slug",
					field_error(
						"slug",
						"Slug must be at least 3 characters of lowercase letters, digits and hyphens",
					),
				);
			}
		}

		if self
			.excerpt
			.as_ref()
			.is_some_and(|excerpt| excerpt.chars().count() > EXCERPT_MAX_LENGTH)
		{
			let mut error = field_error("length", "Excerpt must be at most 1000 characters");

			error.add_param(Cow::Borrowed("max"), &EXCERPT_MAX_LENGTH);
			errors.add("excerpt", error);
		}

		if self
			.cover_url
			.as_ref()
			.is_some_and(|url| !url.validate_url())
		{
			errors.add("cover_url", field_error("url", "Cover must be a valid URL"));
		}

		if self.status.is_published() {
			if title > 0 && title < PUBLISHED_TITLE_MIN_LENGTH {
				let mut error = field_error(
					"length",
					"Title must be at least 4 characters to publish",
				);

				error.add_param(Cow::Borrowed("min"), &PUBLISHED_TITLE_MIN_LENGTH);
				errors.add("title", error);
			}

			if content > 0 && content < PUBLISHED_CONTENT_MIN_LENGTH {
				let mut error = field_error(
					"length",
					"Content must be at least 10 characters to publish",
				);

				error.add_param(Cow::Borrowed("min"), &PUBLISHED_CONTENT_MIN_LENGTH);
				errors.add("content", error);
			}
		}

		if errors.errors().is_empty() {
			Ok(())
		} else {
			Err(errors)
		}
	}
}

/// Trims and lowercases tags, dropping empty and repeated ones.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
	let mut normalized: Vec<String> = Vec::with_capacity(tags.len());

	for tag in tags {
		let tag = tag.trim().to_lowercase();

		if !tag.is_empty() && !normalized.contains(&tag) {
			normalized.push(tag);
		}
	}

	normalized
}

/// Decides the publication time of a post.
///
/// Drafts keep whatever time they had. A published post uses the explicit
/// time, else its previous one, else `now`, so a post is stamped once and
/// keeps that time across unpublishing and republishing.
pub fn resolve_published_at(
	status: PostStatus,
	requested: Option<DateTime<Utc>>,
	previous: Option<DateTime<Utc>>,
	now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
	match status {
		PostStatus::Draft => previous,
		PostStatus::Published => requested.or(previous).or(Some(now)),
	}
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
	#[error("validation error: {0}")]
	Validation(#[from] ValidationErrors),
	#[error("compile error: {0}")]
	Compile(#[from] CompileError),
	#[error("unknown post {0}")]
	NotFound(Uuid),
	#[error(transparent)]
	Store(#[from] StoreError),
}

/// Validates and persists posts.
pub struct Lifecycle<'a> {
	store: &'a dyn Store,
	seed_interactions: bool,
}

impl<'a> Lifecycle<'a> {
	pub fn new(store: &'a dyn Store, seed_interactions: bool) -> Self {
		Self {
			store,
			seed_interactions,
		}
	}

	/// Creates the post when `input.id` is absent, otherwise updates it in
	/// place. Nothing is written unless the input and its content are valid.
	pub async fn save(&self, actor: &Profile, input: PostInput) -> Result<Post, SaveError> {
		input.validate()?;
		mdx::check(input.content.clone()).await?;

		let previous = match input.id {
			Some(id) => Some(
				self.store
					.find_post(PostKey::Id(id))
					.await?
					.ok_or(SaveError::NotFound(id))?,
			),
			None => None,
		};

		let id = previous.as_ref().map_or_else(Uuid::new_v4, |post| post.id);
		let slug = input
			.slug
			.unwrap_or_else(|| slug::derive(&input.title, id, "post"));

		let published_at = resolve_published_at(
			input.status,
			input.published_at,
			previous.as_ref().and_then(|post| post.published_at),
			Utc::now(),
		);

		let counters = if self.seed_interactions {
			Counters::seeded()
		} else {
			Counters::default()
		};

		let write = PostWrite {
			id,
			create: previous.is_none(),
			slug,
			title: input.title.trim().to_owned(),
			excerpt: input.excerpt,
			content: input.content,
			cover_url: input.cover_url,
			tags: normalize_tags(&input.tags),
			category_id: input.category_id,
			status: input.status,
			published_at,
			author_id: actor.id,
			counters,
		};

		let post = self
			.store
			.save_post(&ProfileSeed::from(actor), &write)
			.await?
			.ok_or(SaveError::NotFound(id))?;

		tracing::info!(
			post_id = %post.id,
			slug = %post.slug,
			status = post.status.as_str(),
			created = write.create,
			"saved post"
		);

		Ok(post)
	}

	pub async fn delete(&self, id: Uuid) -> Result<(), SaveError> {
		if !self.store.delete_post(id).await? {
			return Err(SaveError::NotFound(id));
		}

		tracing::info!(post_id = %id, "deleted post");

		Ok(())
	}
}

#[cfg(test)]
mod test {
	use chrono::Duration;

	use super::*;
	use crate::{
		model::Role,
		store::{memory::MemoryStore, PostFilter},
	};

	fn actor() -> Profile {
		let now = Utc::now();

		Profile {
			id: Uuid::new_v4(),
			display_name: None,
			email: Some("writer@example.com".into()),
			avatar_url: None,
			bio: None,
			role: Role::Admin,
			created_at: now,
			updated_at: now,
		}
	}

	fn input(title: &str, status: PostStatus) -> PostInput {
		PostInput {
			title: title.into(),
			content: "# Heading\n\nSome body text.".into(),
			status,
			..PostInput::default()
		}
	}

	#[test]
	fn test_publish_rules_only_apply_when_publishing() {
		let errors = input("Hi", PostStatus::Published).validate().unwrap_err();

		assert!(errors.field_errors().contains_key("title"));
		assert!(input("Hi", PostStatus::Draft).validate().is_ok());
	}

	#[test]
	fn test_base_rules() {
		let input = PostInput {
			slug: Some("Bad Slug".into()),
			excerpt: Some("x".repeat(1001)),
			cover_url: Some("not a url".into()),
			..PostInput::default()
		};

		let errors = input.validate().unwrap_err();
		let fields = errors.field_errors();

		for field in ["title", "content", "slug", "excerpt", "cover_url"] {
			assert!(fields.contains_key(field), "missing {field}");
		}
	}

	#[test]
	fn test_empty_strings_are_absent() {
		let input: PostInput = serde_json::from_value(serde_json::json!({
			"id": "",
			"title": "Title",
			"content": "Content",
			"slug": "",
			"category_id": "",
			"published_at": "",
		}))
		.unwrap();

		assert!(input.id.is_none());
		assert!(input.slug.is_none());
		assert!(input.category_id.is_none());
		assert!(input.published_at.is_none());
		assert_eq!(input.status, PostStatus::Draft);

		let input: PostInput = serde_json::from_value(serde_json::json!({
			"title": "Title",
			"published_at": "2024-03-01T12:00:00Z",
		}))
		.unwrap();

		assert_eq!(
			input.published_at.map(|at| at.to_rfc3339()).as_deref(),
			Some("2024-03-01T12:00:00+00:00")
		);
	}

	#[test]
	fn test_normalize_tags() {
		let tags = vec![" Rust ".into(), "rust".into(), String::new(), "Axum".into()];

		assert_eq!(normalize_tags(&tags), vec!["rust", "axum"]);
	}

	#[test]
	fn test_resolve_published_at() {
		let now = Utc::now();
		let earlier = now - Duration::days(3);

		assert_eq!(resolve_published_at(PostStatus::Draft, None, None, now), None);
		assert_eq!(
			resolve_published_at(PostStatus::Published, None, None, now),
			Some(now)
		);
		assert_eq!(
			resolve_published_at(PostStatus::Published, None, Some(earlier), now),
			Some(earlier)
		);
		assert_eq!(
			resolve_published_at(PostStatus::Draft, None, Some(earlier), now),
			Some(earlier)
		);
		assert_eq!(
			resolve_published_at(PostStatus::Published, Some(earlier), None, now),
			Some(earlier)
		);
	}

	#[tokio::test]
	async fn test_publish_gating_writes_nothing() {
		let store = MemoryStore::new();
		let lifecycle = Lifecycle::new(&store, false);
		let actor = actor();

		let error = lifecycle
			.save(&actor, input("Hi", PostStatus::Published))
			.await
			.unwrap_err();

		assert!(matches!(error, SaveError::Validation(..)));
		assert!(store
			.list_posts(&PostFilter::default().page(10, 0))
			.await
			.unwrap()
			.is_empty());

		let post = lifecycle
			.save(&actor, input("Hi", PostStatus::Draft))
			.await
			.unwrap();

		assert_eq!(post.status, PostStatus::Draft);
		assert!(post.slug.starts_with("hi-"));
	}

	#[tokio::test]
	async fn test_published_at_is_set_once() {
		let store = MemoryStore::new();
		let lifecycle = Lifecycle::new(&store, false);
		let actor = actor();

		let draft = lifecycle
			.save(&actor, input("First post", PostStatus::Draft))
			.await
			.unwrap();

		assert!(draft.published_at.is_none());
		assert_eq!(draft.slug, "first-post");
		assert_eq!(draft.author_id, Some(actor.id));

		let published = lifecycle
			.save(
				&actor,
				PostInput {
					id: Some(draft.id),
					..input("First post", PostStatus::Published)
				},
			)
			.await
			.unwrap();

		let stamped = published.published_at.expect("publishing stamps the post");

		let unpublished = lifecycle
			.save(
				&actor,
				PostInput {
					id: Some(draft.id),
					..input("First post", PostStatus::Draft)
				},
			)
			.await
			.unwrap();

		assert_eq!(unpublished.published_at, Some(stamped));

		let republished = lifecycle
			.save(
				&actor,
				PostInput {
					id: Some(draft.id),
					..input("First post", PostStatus::Published)
				},
			)
			.await
			.unwrap();

		assert_eq!(republished.published_at, Some(stamped));
		assert_eq!(republished.created_at, draft.created_at);
	}

	#[tokio::test]
	async fn test_invalid_mdx_blocks_draft_save() {
		let store = MemoryStore::new();
		let lifecycle = Lifecycle::new(&store, false);

		let error = lifecycle
			.save(
				&actor(),
				PostInput {
					content: "<Unclosed".into(),
					..input("Broken", PostStatus::Draft)
				},
			)
			.await
			.unwrap_err();

		assert!(matches!(error, SaveError::Compile(..)));
	}

	#[tokio::test]
	async fn test_update_and_delete_missing_post() {
		let store = MemoryStore::new();
		let lifecycle = Lifecycle::new(&store, false);
		let id = Uuid::new_v4();

		let error = lifecycle
			.save(
				&actor(),
				PostInput {
					id: Some(id),
					..input("Ghost post", PostStatus::Draft)
				},
			)
			.await
			.unwrap_err();

		assert!(matches!(error, SaveError::NotFound(missing) if missing == id));
		assert!(matches!(
			lifecycle.delete(id).await,
			Err(SaveError::NotFound(..))
		));
	}

	#[tokio::test]
	async fn test_seeded_counters() {
		let store = MemoryStore::new();
		let lifecycle = Lifecycle::new(&store, true);

		let post = lifecycle
			.save(&actor(), input("Seeded post", PostStatus::Draft))
			.await
			.unwrap();

		assert!((500..=1000).contains(&post.views));
		assert!((0..=500).contains(&post.likes));
	}
}
