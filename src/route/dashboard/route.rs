use axum::extract::State;
use macros::route;
use uuid::Uuid;

use crate::{
	content::{slug, Lifecycle},
	extract::{Admin, Json, Path, Query},
	mdx,
	model::{Category, DashboardStats, Post},
	openapi::tag,
	store::{constraint, CategoryPatch, NewCategory, PostFilter, PostKey, PostOrder, StoreError},
	AppState, SharedStore,
};

use super::{model, Error, RouteError};

fn category_error(error: StoreError) -> RouteError {
	match error {
		StoreError::Conflict(ref c) if c == constraint::CATEGORY_SLUG => Error::CategoryTaken.into(),
		error => error.into(),
	}
}

/// Get all posts
/// Returns a paginated response of every post, drafts included,
/// most recently edited first.
#[route(tag = tag::DASHBOARD)]
pub async fn get_posts(
	State(store): State<SharedStore>,
	_: Admin,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<Vec<Post>>, RouteError> {
	let filter = PostFilter {
		order: PostOrder::Updated,
		..PostFilter::default()
	}
	.page(paginate.limit(), paginate.offset());

	Ok(Json(store.list_posts(&filter).await?))
}

/// Get single post
/// Returns a post by its unique id, whatever its status.
#[route(tag = tag::DASHBOARD)]
pub async fn get_post(
	State(store): State<SharedStore>,
	_: Admin,
	Path(input): Path<model::IdInput>,
) -> Result<Json<Post>, RouteError> {
	let post = store
		.find_post(PostKey::Id(input.id))
		.await?
		.ok_or(Error::UnknownPost(input.id))?;

	Ok(Json(post))
}

/// Save post
/// Creates a post when no `id` is given, otherwise updates the post in place.
/// The content must compile as MDX, and published posts need a title of at
/// least 4 characters and content of at least 10.
#[route(tag = tag::DASHBOARD)]
pub async fn save_post(
	State(state): State<AppState>,
	Admin(session): Admin,
	Json(input): Json<model::PostInput>,
) -> Result<Json<Post>, RouteError> {
	let lifecycle = Lifecycle::new(state.store.as_ref(), state.config.seed_interactions);
	let post = lifecycle.save(&session.profile, input).await?;

	Ok(Json(post))
}

/// Delete post
/// Deletes a post by its unique id, along with its views and likes.
#[route(tag = tag::DASHBOARD)]
pub async fn delete_post(
	State(state): State<AppState>,
	_: Admin,
	Path(input): Path<model::IdInput>,
) -> Result<(), RouteError> {
	Lifecycle::new(state.store.as_ref(), state.config.seed_interactions)
		.delete(input.id)
		.await?;

	Ok(())
}

/// Get statistics
/// Returns the number of posts by status and the last time any post was edited.
#[route(tag = tag::DASHBOARD)]
pub async fn get_stats(
	State(store): State<SharedStore>,
	_: Admin,
) -> Result<Json<DashboardStats>, RouteError> {
	Ok(Json(store.post_stats().await?))
}

/// Validate MDX
/// Compiles MDX content without saving it and reports the compiler's message
/// when it is invalid.
#[route(tag = tag::DASHBOARD)]
pub async fn validate_mdx(
	_: Admin,
	Json(input): Json<model::MdxInput>,
) -> Json<model::MdxReport> {
	Json(mdx::validate(input.content).await)
}

/// Preview MDX
/// Renders MDX content to HTML the same way published posts are rendered.
#[route(tag = tag::DASHBOARD)]
pub async fn preview_mdx(_: Admin, Json(input): Json<model::MdxInput>) -> Json<model::Rendered> {
	Json(mdx::render::render_owned(input.content).await)
}

/// Create category
/// Creates a new category. Its slug is derived from the name.
#[route(tag = tag::DASHBOARD)]
pub async fn create_category(
	State(store): State<SharedStore>,
	_: Admin,
	Json(input): Json<model::CreateCategory>,
) -> Result<Json<Category>, RouteError> {
	let id = Uuid::new_v4();
	let name = input.name.trim().to_owned();
	let category = store
		.insert_category(&NewCategory {
			id,
			slug: slug::derive(&name, id, "category"),
			name,
			description: model::description(input.description),
		})
		.await
		.map_err(category_error)?;

	tracing::info!(category_id = %category.id, slug = %category.slug, "created category");

	Ok(Json(category))
}

/// Update category
/// Updates the name or description of a category. A new name also changes the
/// slug, and an empty description removes it.
#[route(tag = tag::DASHBOARD)]
pub async fn update_category(
	State(store): State<SharedStore>,
	_: Admin,
	Path(path): Path<model::IdInput>,
	Json(input): Json<model::UpdateCategory>,
) -> Result<Json<Category>, RouteError> {
	let name = input.name.map(|name| name.trim().to_owned());
	let patch = CategoryPatch {
		slug: name.as_deref().map(|name| slug::derive(name, path.id, "category")),
		name,
		description: input.description.map(model::description),
	};

	let category = store
		.update_category(path.id, &patch)
		.await
		.map_err(category_error)?
		.ok_or(Error::UnknownCategory(path.id))?;

	Ok(Json(category))
}

/// Delete category
/// Deletes a category. Posts filed under it are kept without a category.
#[route(tag = tag::DASHBOARD)]
pub async fn delete_category(
	State(store): State<SharedStore>,
	_: Admin,
	Path(input): Path<model::IdInput>,
) -> Result<(), RouteError> {
	if !store.delete_category(input.id).await? {
		return Err(Error::UnknownCategory(input.id).into());
	}

	tracing::info!(category_id = %input.id, "deleted category");

	Ok(())
}
