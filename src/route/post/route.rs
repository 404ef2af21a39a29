use axum::extract::State;
use macros::route;
use rand_core::{OsRng, RngCore};

use crate::{
	content::{LikeError, Tracker, ViewOutcome},
	error::AppError,
	extract::{ClientIp, Json, Path, Query},
	mdx,
	model::Post,
	openapi::tag,
	ratelimit::{Action, Limited},
	store::{PostFilter, PostKey},
	AppState,
};

use super::{model, Error, RouteError};

/// Get published posts
/// Returns a paginated response of published posts, most recently published first.
#[route(tag = tag::POST, limited)]
pub async fn get_posts(
	State(state): State<AppState>,
	ClientIp(ip): ClientIp,
	Query(paginate): Query<model::Paginate>,
) -> Result<Limited<Json<Vec<Post>>>, RouteError> {
	let admission = state.limiter.admit(&ip, Action::ListPosts)?;
	let posts = state
		.store
		.list_posts(&PostFilter::published().page(paginate.limit(), paginate.offset()))
		.await?;

	Ok(Limited(admission, Json(posts)))
}

/// Get single post
/// Returns a published post by its slug, with the content rendered to HTML
/// and a table of contents built from its headings. Drafts are not found here.
#[route(tag = tag::POST, limited)]
pub async fn get_post(
	State(state): State<AppState>,
	ClientIp(ip): ClientIp,
	Path(input): Path<model::SlugInput>,
) -> Result<Limited<Json<model::PostDetail>>, RouteError> {
	let admission = state.limiter.admit(&ip, Action::PostDetail)?;
	let post = state
		.store
		.find_post(PostKey::Slug(&input.slug))
		.await?
		.filter(|post| post.status.is_published())
		.ok_or_else(|| Error::UnknownPost(input.slug))?;

	let rendered = mdx::render::render_owned(post.content.clone()).await;

	Ok(Limited(
		admission,
		Json(model::PostDetail { post, rendered }),
	))
}

/// Get related posts
/// Returns up to six other published posts to read next, picked at random from
/// the most recently published ones.
#[route(tag = tag::POST, limited)]
pub async fn get_related_posts(
	State(state): State<AppState>,
	ClientIp(ip): ClientIp,
	Path(input): Path<model::SlugInput>,
) -> Result<Limited<Json<Vec<Post>>>, RouteError> {
	let admission = state.limiter.admit(&ip, Action::RelatedPosts)?;

	state
		.store
		.find_post(PostKey::Slug(&input.slug))
		.await?
		.filter(|post| post.status.is_published())
		.ok_or_else(|| Error::UnknownPost(input.slug.clone()))?;

	let filter = PostFilter {
		exclude_slug: Some(input.slug),
		..PostFilter::published()
	}
	.page(model::RELATED_POOL, 0);

	let mut posts = state.store.list_posts(&filter).await?;

	shuffle(&mut posts);
	posts.truncate(model::RELATED_LIMIT);

	Ok(Limited(admission, Json(posts)))
}

/// Fisher-Yates over the OS random source.
fn shuffle<T>(items: &mut [T]) {
	for index in (1..items.len()).rev() {
		let other = OsRng.next_u64() % (index as u64 + 1);

		items.swap(index, usize::try_from(other).unwrap_or(index));
	}
}

/// Count a view
/// Counts a view of a published post. This always succeeds, even when the
/// view was throttled or the post does not exist.
#[route(tag = tag::POST)]
pub async fn view_post(
	State(state): State<AppState>,
	ClientIp(ip): ClientIp,
	Path(input): Path<model::SlugInput>,
) {
	let tracker = Tracker::new(state.store.as_ref(), state.limiter.as_ref());

	match tracker.increment_view(&ip, &input.slug).await {
		ViewOutcome::Counted(views) => tracing::debug!(slug = %input.slug, views, "counted view"),
		ViewOutcome::UnknownPost => tracing::debug!(slug = %input.slug, "view of unknown post"),
		ViewOutcome::Throttled | ViewOutcome::Failed => {}
	}
}

/// Like or unlike
/// Adds a like to a published post, or takes one back. The count never goes below zero.
#[route(tag = tag::POST, limited)]
pub async fn like_post(
	State(state): State<AppState>,
	ClientIp(ip): ClientIp,
	Path(input): Path<model::SlugInput>,
	Json(body): Json<model::LikeInput>,
) -> Result<Limited<Json<model::LikeOutput>>, RouteError> {
	let tracker = Tracker::new(state.store.as_ref(), state.limiter.as_ref());

	match tracker.toggle_like(&ip, &input.slug, body.like).await {
		Ok(liked) => Ok(Limited(
			liked.admission,
			Json(model::LikeOutput { likes: liked.likes }),
		)),
		Err(LikeError::RateLimited(admission)) => Err(AppError::RateLimited(admission).into()),
		Err(LikeError::UnknownPost) => Err(Error::UnknownPost(input.slug).into()),
		Err(LikeError::Store(error)) => Err(error.into()),
	}
}
