use std::{
	collections::HashMap,
	sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
	constraint, row::PostRow, Account, CategoryPatch, Counters, NewAccount, NewCategory, PostFilter,
	PostKey, PostOrder, PostWrite, ProfileSeed, ProfileUpdate, Result, Store, StoreError,
};
use crate::model::{Category, CategorySummary, DashboardStats, Post, PostStatus, Profile};

#[derive(Debug, Clone)]
struct PostRecord {
	id: Uuid,
	slug: String,
	title: String,
	excerpt: Option<String>,
	content: String,
	cover_url: Option<String>,
	tags: Vec<String>,
	category_id: Option<Uuid>,
	status: PostStatus,
	published_at: Option<DateTime<Utc>>,
	author_id: Option<Uuid>,
	created_at: DateTime<Utc>,
	updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
	accounts: HashMap<Uuid, Account>,
	sessions: HashMap<Uuid, Uuid>,
	profiles: HashMap<Uuid, Profile>,
	categories: HashMap<Uuid, Category>,
	posts: HashMap<Uuid, PostRecord>,
	interactions: HashMap<Uuid, Counters>,
}

impl Tables {
	/// Joins a post record the same way the SQL store does.
	fn row(&self, post: &PostRecord) -> PostRow {
		let counters = self.interactions.get(&post.id);
		let category = post
			.category_id
			.and_then(|id| self.categories.get(&id));
		let author = post.author_id.and_then(|id| self.profiles.get(&id));

		PostRow {
			id: post.id,
			slug: post.slug.clone(),
			title: post.title.clone(),
			excerpt: post.excerpt.clone(),
			content: post.content.clone(),
			cover_url: post.cover_url.clone(),
			tags: Some(post.tags.clone()),
			category_id: post.category_id,
			status: post.status.as_str().into(),
			published_at: post.published_at,
			author_id: post.author_id,
			created_at: post.created_at,
			updated_at: post.updated_at,
			views: counters.map(|counters| counters.views),
			likes: counters.map(|counters| counters.likes),
			joined_category_id: category.map(|category| category.id),
			category_name: category.map(|category| category.name.clone()),
			category_slug: category.map(|category| category.slug.clone()),
			joined_author_id: author.map(|author| author.id),
			author_display_name: author.and_then(|author| author.display_name.clone()),
			author_email: author.and_then(|author| author.email.clone()),
			author_avatar_url: author.and_then(|author| author.avatar_url.clone()),
		}
	}

	fn post(&self, post: &PostRecord) -> Post {
		self.row(post).into()
	}

	fn matches(&self, post: &PostRecord, filter: &PostFilter) -> bool {
		if filter.status.is_some_and(|status| status != post.status) {
			return false;
		}

		if let Some(slug) = &filter.category_slug {
			let category = post
				.category_id
				.and_then(|id| self.categories.get(&id));

			if !category.is_some_and(|category| &category.slug == slug) {
				return false;
			}
		}

		if let Some(tag) = &filter.tag {
			if !post.tags.contains(tag) {
				return false;
			}
		}

		if filter.exclude_slug.as_ref() == Some(&post.slug) {
			return false;
		}

		if let Some(search) = &filter.search {
			let search = search.to_lowercase();
			let title = post.title.to_lowercase().contains(&search);
			let excerpt = post
				.excerpt
				.as_ref()
				.is_some_and(|excerpt| excerpt.to_lowercase().contains(&search));

			if !title && !excerpt {
				return false;
			}
		}

		true
	}

	fn slug_taken(&self, slug: &str, except: Uuid) -> bool {
		self.posts
			.values()
			.any(|post| post.slug == slug && post.id != except)
	}

	fn counters_by_slug(&mut self, slug: &str) -> Option<&mut Counters> {
		let id = self
			.posts
			.values()
			.find(|post| post.slug == slug && post.status == PostStatus::Published)?
			.id;

		Some(self.interactions.entry(id).or_default())
	}
}

/// A process-local store.
///
/// Every operation runs under a single lock, so each one is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
	tables: Mutex<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn tables(&self) -> MutexGuard<'_, Tables> {
		self.tables.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

#[async_trait]
impl Store for MemoryStore {
	async fn create_account(&self, account: &NewAccount) -> Result<Profile> {
		let mut tables = self.tables();

		if tables
			.accounts
			.values()
			.any(|existing| existing.email == account.email)
		{
			return Err(StoreError::Conflict(constraint::ACCOUNT_EMAIL.into()));
		}

		let now = Utc::now();
		let profile = Profile {
			id: account.id,
			display_name: account.display_name.clone(),
			email: Some(account.email.clone()),
			avatar_url: None,
			bio: None,
			role: account.role,
			created_at: now,
			updated_at: now,
		};

		tables.accounts.insert(
			account.id,
			Account {
				id: account.id,
				email: account.email.clone(),
				password: account.password.clone(),
			},
		);
		tables.profiles.insert(account.id, profile.clone());

		Ok(profile)
	}

	async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
		Ok(self
			.tables()
			.accounts
			.values()
			.find(|account| account.email == email)
			.cloned())
	}

	async fn create_session(&self, account_id: Uuid) -> Result<Uuid> {
		let id = Uuid::new_v4();

		self.tables().sessions.insert(id, account_id);
		Ok(id)
	}

	async fn delete_session(&self, session_id: Uuid) -> Result<()> {
		self.tables().sessions.remove(&session_id);
		Ok(())
	}

	async fn find_session_profile(&self, session_id: Uuid) -> Result<Option<Profile>> {
		let tables = self.tables();

		Ok(tables
			.sessions
			.get(&session_id)
			.and_then(|account_id| tables.profiles.get(account_id))
			.cloned())
	}

	async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<Profile>> {
		let mut tables = self.tables();
		let Some(profile) = tables.profiles.get_mut(&id) else {
			return Ok(None);
		};

		if let Some(display_name) = &update.display_name {
			profile.display_name = Some(display_name.clone());
		}

		if let Some(avatar_url) = &update.avatar_url {
			profile.avatar_url = Some(avatar_url.clone());
		}

		if let Some(bio) = &update.bio {
			profile.bio = Some(bio.clone());
		}

		profile.updated_at = Utc::now();
		Ok(Some(profile.clone()))
	}

	async fn save_post(&self, author: &ProfileSeed, write: &PostWrite) -> Result<Option<Post>> {
		let mut tables = self.tables();
		let now = Utc::now();

		if tables.slug_taken(&write.slug, write.id) {
			return Err(StoreError::Conflict(constraint::POST_SLUG.into()));
		}

		if write
			.category_id
			.is_some_and(|id| !tables.categories.contains_key(&id))
		{
			return Err(StoreError::MissingReference(
				constraint::POST_CATEGORY.into(),
			));
		}

		if !write.create && !tables.posts.contains_key(&write.id) {
			return Ok(None);
		}

		let profile = tables.profiles.entry(author.id).or_insert_with(|| Profile {
			id: author.id,
			display_name: None,
			email: author.email.clone(),
			avatar_url: None,
			bio: None,
			role: crate::model::Role::Member,
			created_at: now,
			updated_at: now,
		});

		if profile.display_name.is_none() {
			profile.display_name = Some(author.display_name.clone());
			profile.updated_at = now;
		}

		let (author_id, created_at) = match tables.posts.get(&write.id) {
			Some(existing) => (existing.author_id, existing.created_at),
			None => (Some(write.author_id), now),
		};

		let record = PostRecord {
			id: write.id,
			slug: write.slug.clone(),
			title: write.title.clone(),
			excerpt: write.excerpt.clone(),
			content: write.content.clone(),
			cover_url: write.cover_url.clone(),
			tags: write.tags.clone(),
			category_id: write.category_id,
			status: write.status,
			published_at: write.published_at,
			author_id,
			created_at,
			updated_at: now,
		};

		if write.create {
			tables.interactions.insert(write.id, write.counters);
		}

		let post = tables.post(&record);

		tables.posts.insert(write.id, record);
		Ok(Some(post))
	}

	async fn find_post(&self, key: PostKey<'_>) -> Result<Option<Post>> {
		let tables = self.tables();
		let record = match key {
			PostKey::Id(id) => tables.posts.get(&id),
			PostKey::Slug(slug) => tables.posts.values().find(|post| post.slug == slug),
		};

		Ok(record.map(|record| tables.post(record)))
	}

	async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>> {
		let tables = self.tables();
		let mut records = tables
			.posts
			.values()
			.filter(|post| tables.matches(post, filter))
			.collect::<Vec<_>>();

		match filter.order {
			PostOrder::Published => records.sort_by(|a, b| {
				b.published_at
					.cmp(&a.published_at)
					.then(b.created_at.cmp(&a.created_at))
			}),
			PostOrder::Updated => records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
		}

		let offset = usize::try_from(filter.offset).unwrap_or(0);
		let limit = usize::try_from(filter.limit).unwrap_or(0);

		Ok(records
			.into_iter()
			.skip(offset)
			.take(limit)
			.map(|record| tables.post(record))
			.collect())
	}

	async fn delete_post(&self, id: Uuid) -> Result<bool> {
		let mut tables = self.tables();

		tables.interactions.remove(&id);
		Ok(tables.posts.remove(&id).is_some())
	}

	async fn post_stats(&self) -> Result<DashboardStats> {
		let tables = self.tables();
		let count = |status| {
			tables
				.posts
				.values()
				.filter(|post| post.status == status)
				.count()
		};

		Ok(DashboardStats {
			total_posts: i64::try_from(tables.posts.len()).unwrap_or(i64::MAX),
			drafts: i64::try_from(count(PostStatus::Draft)).unwrap_or(i64::MAX),
			published: i64::try_from(count(PostStatus::Published)).unwrap_or(i64::MAX),
			last_updated: tables.posts.values().map(|post| post.updated_at).max(),
		})
	}

	async fn list_categories(&self) -> Result<Vec<CategorySummary>> {
		let tables = self.tables();
		let mut categories = tables
			.categories
			.values()
			.map(|category| {
				let post_count = tables
					.posts
					.values()
					.filter(|post| {
						post.category_id == Some(category.id)
							&& post.status == PostStatus::Published
					})
					.count();

				CategorySummary {
					category: category.clone(),
					post_count: i64::try_from(post_count).unwrap_or(i64::MAX),
				}
			})
			.collect::<Vec<_>>();

		categories.sort_by(|a, b| a.category.name.cmp(&b.category.name));
		Ok(categories)
	}

	async fn insert_category(&self, category: &NewCategory) -> Result<Category> {
		let mut tables = self.tables();

		if tables
			.categories
			.values()
			.any(|existing| existing.slug == category.slug)
		{
			return Err(StoreError::Conflict(constraint::CATEGORY_SLUG.into()));
		}

		let now = Utc::now();
		let category = Category {
			id: category.id,
			name: category.name.clone(),
			slug: category.slug.clone(),
			description: category.description.clone(),
			created_at: now,
			updated_at: now,
		};

		tables.categories.insert(category.id, category.clone());
		Ok(category)
	}

	async fn update_category(&self, id: Uuid, patch: &CategoryPatch) -> Result<Option<Category>> {
		let mut tables = self.tables();

		if let Some(slug) = &patch.slug {
			if tables
				.categories
				.values()
				.any(|existing| &existing.slug == slug && existing.id != id)
			{
				return Err(StoreError::Conflict(constraint::CATEGORY_SLUG.into()));
			}
		}

		let Some(category) = tables.categories.get_mut(&id) else {
			return Ok(None);
		};

		if let Some(name) = &patch.name {
			category.name = name.clone();
		}

		if let Some(slug) = &patch.slug {
			category.slug = slug.clone();
		}

		if let Some(description) = &patch.description {
			category.description = description.clone();
		}

		category.updated_at = Utc::now();
		Ok(Some(category.clone()))
	}

	async fn delete_category(&self, id: Uuid) -> Result<bool> {
		let mut tables = self.tables();

		if tables.categories.remove(&id).is_none() {
			return Ok(false);
		}

		for post in tables.posts.values_mut() {
			if post.category_id == Some(id) {
				post.category_id = None;
			}
		}

		Ok(true)
	}

	async fn record_view(&self, slug: &str) -> Result<Option<i64>> {
		Ok(self.tables().counters_by_slug(slug).map(|counters| {
			counters.views += 1;
			counters.views
		}))
	}

	async fn record_like(&self, slug: &str, like: bool) -> Result<Option<i64>> {
		Ok(self.tables().counters_by_slug(slug).map(|counters| {
			counters.likes = if like {
				counters.likes.max(0) + 1
			} else {
				(counters.likes - 1).max(0)
			};

			counters.likes
		}))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn write(slug: &str, status: PostStatus) -> PostWrite {
		PostWrite {
			id: Uuid::new_v4(),
			create: true,
			slug: slug.into(),
			title: "A title".into(),
			excerpt: None,
			content: "Some content here".into(),
			cover_url: None,
			tags: vec!["rust".into()],
			category_id: None,
			status,
			published_at: status.is_published().then(Utc::now),
			author_id: Uuid::new_v4(),
			counters: Counters::default(),
		}
	}

	fn author(id: Uuid) -> ProfileSeed {
		ProfileSeed {
			id,
			display_name: "Writer".into(),
			email: None,
		}
	}

	#[tokio::test]
	async fn test_slug_conflict() {
		let store = MemoryStore::new();
		let first = write("same-slug", PostStatus::Draft);
		let second = write("same-slug", PostStatus::Draft);

		store.save_post(&author(first.author_id), &first).await.unwrap();

		let error = store
			.save_post(&author(second.author_id), &second)
			.await
			.unwrap_err();

		assert!(matches!(error, StoreError::Conflict(c) if c == constraint::POST_SLUG));
	}

	#[tokio::test]
	async fn test_save_creates_author_profile() {
		let store = MemoryStore::new();
		let post = write("with-author", PostStatus::Draft);

		let saved = store
			.save_post(&author(post.author_id), &post)
			.await
			.unwrap()
			.unwrap();

		assert_eq!(saved.author.display_name, "Writer");
		assert_eq!(saved.author_id, Some(post.author_id));
	}

	#[tokio::test]
	async fn test_update_of_missing_post() {
		let store = MemoryStore::new();
		let post = PostWrite {
			create: false,
			..write("missing", PostStatus::Draft)
		};

		assert!(store
			.save_post(&author(post.author_id), &post)
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn test_like_floor_and_drafts() {
		let store = MemoryStore::new();
		let published = write("published", PostStatus::Published);
		let draft = write("draft-post", PostStatus::Draft);

		store.save_post(&author(published.author_id), &published).await.unwrap();
		store.save_post(&author(draft.author_id), &draft).await.unwrap();

		assert_eq!(store.record_like("published", false).await.unwrap(), Some(0));
		assert_eq!(store.record_like("published", true).await.unwrap(), Some(1));
		assert_eq!(store.record_view("published").await.unwrap(), Some(1));
		assert_eq!(store.record_like("draft-post", true).await.unwrap(), None);
		assert_eq!(store.record_view("nope").await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_filters() {
		let store = MemoryStore::new();
		let mut post = write("searchable", PostStatus::Published);

		post.title = "Learning Rust Ownership".into();
		store.save_post(&author(post.author_id), &post).await.unwrap();

		let filter = PostFilter {
			search: Some("rust own".into()),
			..PostFilter::published().page(10, 0)
		};

		assert_eq!(store.list_posts(&filter).await.unwrap().len(), 1);

		let filter = PostFilter {
			tag: Some("go".into()),
			..PostFilter::published().page(10, 0)
		};

		assert!(store.list_posts(&filter).await.unwrap().is_empty());

		let filter = PostFilter {
			exclude_slug: Some("searchable".into()),
			..PostFilter::published().page(10, 0)
		};

		assert!(store.list_posts(&filter).await.unwrap().is_empty());
	}
}
