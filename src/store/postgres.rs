use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{error::ErrorKind, postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
	row::{CategoryRow, CategorySummaryRow, PostRow, ProfileRow},
	Account, CategoryPatch, NewAccount, NewCategory, PostFilter, PostKey, PostOrder, PostWrite,
	ProfileSeed, ProfileUpdate, Result, Store, StoreError,
};
use crate::model::{Category, CategorySummary, DashboardStats, Post, Profile};

const POST_SELECT: &str = r"
	SELECT
		post.id, post.slug, post.title, post.excerpt, post.content, post.cover_url, post.tags,
		post.category_id, post.status, post.published_at, post.author_id,
		post.created_at, post.updated_at,
		post_interaction.views, post_interaction.likes,
		category.id AS joined_category_id,
		category.name AS category_name,
		category.slug AS category_slug,
		profile.id AS joined_author_id,
		profile.display_name AS author_display_name,
		profile.email AS author_email,
		profile.avatar_url AS author_avatar_url
	FROM post
	LEFT JOIN post_interaction ON post_interaction.post_id = post.id
	LEFT JOIN category ON category.id = post.category_id
	LEFT JOIN profile ON profile.id = post.author_id
";

const PROFILE_COLUMNS: &str =
	"id, display_name, email, avatar_url, bio, role, created_at, updated_at";

const CATEGORY_COLUMNS: &str = "id, name, slug, description, created_at, updated_at";

/// Maps constraint violations to their own variants so callers can
/// report them.
fn map_error(error: sqlx::Error) -> StoreError {
	if let sqlx::Error::Database(ref database) = error {
		if let Some(constraint) = database.constraint() {
			match database.kind() {
				ErrorKind::UniqueViolation => return StoreError::Conflict(constraint.into()),
				ErrorKind::ForeignKeyViolation => {
					return StoreError::MissingReference(constraint.into())
				}
				_ => {}
			}
		}
	}

	StoreError::Database(error)
}

/// Escapes the wildcards of a `LIKE` pattern.
fn escape_like(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len());

	for c in value.chars() {
		if matches!(c, '\\' | '%' | '_') {
			escaped.push('\\');
		}

		escaped.push(c);
	}

	escaped
}

pub struct PgStore {
	pool: PgPool,
}

impl PgStore {
	/// Connects to the database and applies pending migrations.
	pub async fn connect(url: &str) -> Result<Self> {
		let pool = PgPoolOptions::new()
			.max_connections(20)
			.acquire_timeout(Duration::from_secs(5))
			.connect(url)
			.await?;

		tracing::info!("connected to postgres, running migrations");

		sqlx::migrate!().run(&pool).await?;

		Ok(Self { pool })
	}
}

#[async_trait]
impl Store for PgStore {
	async fn create_account(&self, account: &NewAccount) -> Result<Profile> {
		let mut tx = self.pool.begin().await?;

		sqlx::query("INSERT INTO account (id, email, password) VALUES ($1, $2, $3)")
			.bind(account.id)
			.bind(&account.email)
			.bind(&account.password)
			.execute(&mut *tx)
			.await
			.map_err(map_error)?;

		let profile = sqlx::query_as::<_, ProfileRow>(&format!(
			r"
				INSERT INTO profile (id, display_name, email, role)
				VALUES ($1, $2, $3, $4)
				RETURNING {PROFILE_COLUMNS}
			"
		))
		.bind(account.id)
		.bind(&account.display_name)
		.bind(&account.email)
		.bind(account.role.as_str())
		.fetch_one(&mut *tx)
		.await
		.map_err(map_error)?;

		tx.commit().await?;

		Ok(profile.into())
	}

	async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
		let account = sqlx::query_as::<_, (Uuid, String, Vec<u8>)>(
			"SELECT id, email, password FROM account WHERE email = $1",
		)
		.bind(email)
		.fetch_optional(&self.pool)
		.await?;

		Ok(account.map(|(id, email, password)| Account {
			id,
			email,
			password,
		}))
	}

	async fn create_session(&self, account_id: Uuid) -> Result<Uuid> {
		Ok(
			sqlx::query_scalar("INSERT INTO session (account_id) VALUES ($1) RETURNING id")
				.bind(account_id)
				.fetch_one(&self.pool)
				.await?,
		)
	}

	async fn delete_session(&self, session_id: Uuid) -> Result<()> {
		sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(session_id)
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	async fn find_session_profile(&self, session_id: Uuid) -> Result<Option<Profile>> {
		let profile = sqlx::query_as::<_, ProfileRow>(
			r"
				SELECT profile.id, profile.display_name, profile.email, profile.avatar_url,
					profile.bio, profile.role, profile.created_at, profile.updated_at
				FROM session
				JOIN profile ON profile.id = session.account_id
				WHERE session.id = $1
			",
		)
		.bind(session_id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(profile.map(Profile::from))
	}

	async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<Profile>> {
		let profile = sqlx::query_as::<_, ProfileRow>(&format!(
			r"
				UPDATE profile
				SET display_name = COALESCE($2, display_name),
					avatar_url = COALESCE($3, avatar_url),
					bio = COALESCE($4, bio),
					updated_at = now()
				WHERE id = $1
				RETURNING {PROFILE_COLUMNS}
			"
		))
		.bind(id)
		.bind(&update.display_name)
		.bind(&update.avatar_url)
		.bind(&update.bio)
		.fetch_optional(&self.pool)
		.await?;

		Ok(profile.map(Profile::from))
	}

	async fn save_post(&self, author: &ProfileSeed, post: &PostWrite) -> Result<Option<Post>> {
		let mut tx = self.pool.begin().await?;

		sqlx::query(
			r"
				INSERT INTO profile (id, display_name, email)
				VALUES ($1, $2, $3)
				ON CONFLICT (id) DO UPDATE
				SET display_name = COALESCE(profile.display_name, EXCLUDED.display_name)
			",
		)
		.bind(author.id)
		.bind(&author.display_name)
		.bind(&author.email)
		.execute(&mut *tx)
		.await
		.map_err(map_error)?;

		if post.create {
			sqlx::query(
				r"
					INSERT INTO post (
						id, slug, title, excerpt, content, cover_url, tags,
						category_id, status, published_at, author_id
					)
					VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
				",
			)
			.bind(post.id)
			.bind(&post.slug)
			.bind(&post.title)
			.bind(&post.excerpt)
			.bind(&post.content)
			.bind(&post.cover_url)
			.bind(&post.tags)
			.bind(post.category_id)
			.bind(post.status.as_str())
			.bind(post.published_at)
			.bind(post.author_id)
			.execute(&mut *tx)
			.await
			.map_err(map_error)?;

			sqlx::query("INSERT INTO post_interaction (post_id, views, likes) VALUES ($1, $2, $3)")
				.bind(post.id)
				.bind(post.counters.views)
				.bind(post.counters.likes)
				.execute(&mut *tx)
				.await?;
		} else {
			let updated = sqlx::query(
				r"
					UPDATE post
					SET slug = $2, title = $3, excerpt = $4, content = $5, cover_url = $6,
						tags = $7, category_id = $8, status = $9, published_at = $10,
						updated_at = now()
					WHERE id = $1
				",
			)
			.bind(post.id)
			.bind(&post.slug)
			.bind(&post.title)
			.bind(&post.excerpt)
			.bind(&post.content)
			.bind(&post.cover_url)
			.bind(&post.tags)
			.bind(post.category_id)
			.bind(post.status.as_str())
			.bind(post.published_at)
			.execute(&mut *tx)
			.await
			.map_err(map_error)?;

			if updated.rows_affected() == 0 {
				tx.rollback().await?;
				return Ok(None);
			}
		}

		let row = sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} WHERE post.id = $1"))
			.bind(post.id)
			.fetch_one(&mut *tx)
			.await?;

		tx.commit().await?;

		Ok(Some(row.into()))
	}

	async fn find_post(&self, key: PostKey<'_>) -> Result<Option<Post>> {
		let query = match key {
			PostKey::Id(id) => {
				sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} WHERE post.id = $1"))
					.bind(id)
					.fetch_optional(&self.pool)
					.await
			}
			PostKey::Slug(slug) => {
				sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} WHERE post.slug = $1"))
					.bind(slug)
					.fetch_optional(&self.pool)
					.await
			}
		};

		Ok(query?.map(Post::from))
	}

	async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>> {
		let mut query = QueryBuilder::<Postgres>::new(POST_SELECT);

		query.push(" WHERE TRUE");

		if let Some(status) = filter.status {
			query.push(" AND post.status = ").push_bind(status.as_str());
		}

		if let Some(slug) = &filter.category_slug {
			query.push(" AND category.slug = ").push_bind(slug.clone());
		}

		if let Some(tag) = &filter.tag {
			query
				.push(" AND ")
				.push_bind(tag.clone())
				.push(" = ANY(post.tags)");
		}

		if let Some(slug) = &filter.exclude_slug {
			query.push(" AND post.slug <> ").push_bind(slug.clone());
		}

		if let Some(search) = &filter.search {
			let pattern = format!("%{}%", escape_like(search));

			query
				.push(" AND (post.title ILIKE ")
				.push_bind(pattern.clone())
				.push(" OR post.excerpt ILIKE ")
				.push_bind(pattern)
				.push(")");
		}

		query.push(match filter.order {
			PostOrder::Published => {
				" ORDER BY post.published_at DESC NULLS LAST, post.created_at DESC"
			}
			PostOrder::Updated => " ORDER BY post.updated_at DESC",
		});

		query
			.push(" LIMIT ")
			.push_bind(filter.limit)
			.push(" OFFSET ")
			.push_bind(filter.offset);

		let rows = query
			.build_query_as::<PostRow>()
			.fetch_all(&self.pool)
			.await?;

		Ok(rows.into_iter().map(Post::from).collect())
	}

	async fn delete_post(&self, id: Uuid) -> Result<bool> {
		let deleted = sqlx::query("DELETE FROM post WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(deleted.rows_affected() > 0)
	}

	async fn post_stats(&self) -> Result<DashboardStats> {
		let (total_posts, drafts, published, last_updated) =
			sqlx::query_as::<_, (i64, i64, i64, Option<DateTime<Utc>>)>(
				r"
					SELECT
						COUNT(*),
						COUNT(*) FILTER (WHERE status = 'draft'),
						COUNT(*) FILTER (WHERE status = 'published'),
						MAX(updated_at)
					FROM post
				",
			)
			.fetch_one(&self.pool)
			.await?;

		Ok(DashboardStats {
			total_posts,
			drafts,
			published,
			last_updated,
		})
	}

	async fn list_categories(&self) -> Result<Vec<CategorySummary>> {
		let rows = sqlx::query_as::<_, CategorySummaryRow>(
			r"
				SELECT category.id, category.name, category.slug, category.description,
					category.created_at, category.updated_at,
					COUNT(post.id) AS post_count
				FROM category
				LEFT JOIN post ON post.category_id = category.id AND post.status = 'published'
				GROUP BY category.id
				ORDER BY category.name
			",
		)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.into_iter().map(CategorySummary::from).collect())
	}

	async fn insert_category(&self, category: &NewCategory) -> Result<Category> {
		let row = sqlx::query_as::<_, CategoryRow>(&format!(
			r"
				INSERT INTO category (id, name, slug, description)
				VALUES ($1, $2, $3, $4)
				RETURNING {CATEGORY_COLUMNS}
			"
		))
		.bind(category.id)
		.bind(&category.name)
		.bind(&category.slug)
		.bind(&category.description)
		.fetch_one(&self.pool)
		.await
		.map_err(map_error)?;

		Ok(row.into())
	}

	async fn update_category(&self, id: Uuid, patch: &CategoryPatch) -> Result<Option<Category>> {
		let row = sqlx::query_as::<_, CategoryRow>(&format!(
			r"
				UPDATE category
				SET name = COALESCE($2, name),
					slug = COALESCE($3, slug),
					description = CASE WHEN $4 THEN $5 ELSE description END,
					updated_at = now()
				WHERE id = $1
				RETURNING {CATEGORY_COLUMNS}
			"
		))
		.bind(id)
		.bind(&patch.name)
		.bind(&patch.slug)
		.bind(patch.description.is_some())
		.bind(patch.description.clone().flatten())
		.fetch_optional(&self.pool)
		.await
		.map_err(map_error)?;

		Ok(row.map(Category::from))
	}

	async fn delete_category(&self, id: Uuid) -> Result<bool> {
		let deleted = sqlx::query("DELETE FROM category WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(deleted.rows_affected() > 0)
	}

	async fn record_view(&self, slug: &str) -> Result<Option<i64>> {
		Ok(sqlx::query_scalar(
			r"
				INSERT INTO post_interaction (post_id, views)
				SELECT id, 1 FROM post WHERE slug = $1 AND status = 'published'
				ON CONFLICT (post_id) DO UPDATE
				SET views = post_interaction.views + 1, updated_at = now()
				RETURNING views
			",
		)
		.bind(slug)
		.fetch_optional(&self.pool)
		.await?)
	}

	async fn record_like(&self, slug: &str, like: bool) -> Result<Option<i64>> {
		let delta: i64 = if like { 1 } else { -1 };

		Ok(sqlx::query_scalar(
			r"
				INSERT INTO post_interaction (post_id, likes)
				SELECT id, GREATEST($2::BIGINT, 0) FROM post WHERE slug = $1 AND status = 'published'
				ON CONFLICT (post_id) DO UPDATE
				SET likes = GREATEST(post_interaction.likes + $2::BIGINT, 0), updated_at = now()
				RETURNING likes
			",
		)
		.bind(slug)
		.bind(delta)
		.fetch_optional(&self.pool)
		.await?)
	}
}
