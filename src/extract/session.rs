use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};
use uuid::Uuid;

use crate::{
	error::RouteError,
	model::Profile,
	openapi::SECURITY_SCHEME_SESSION,
	route::auth,
	session, SharedStore,
};

/// Extracts the session and related profile from the request.
///
/// If it does not exist, a [`auth::Error::NoSessionCookie`] is returned.
/// If the session is invalid, a [`auth::Error::InvalidSessionCookie`] is returned.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.profile);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub profile: Profile,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	SharedStore: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	/// Extracts the session from the request using the session cookie.
	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let cookies = parts
			.headers
			.get_all(header::COOKIE)
			.into_iter()
			.filter_map(|value| value.to_str().ok());

		let session_id = cookies
			.flat_map(cookie::Cookie::split_parse)
			.filter_map(Result::ok)
			.find(|cookie| cookie.name() == session::COOKIE_NAME)
			.ok_or(auth::Error::NoSessionCookie)?;

		let session_id =
			Uuid::parse_str(session_id.value()).map_err(|_| auth::Error::InvalidSessionCookie)?;

		let store = SharedStore::from_ref(state);
		let profile = store
			.find_session_profile(session_id)
			.await?
			.ok_or(auth::Error::InvalidSessionCookie)?;

		Ok(Session {
			id: session_id,
			profile,
		})
	}
}

impl OperationInput for Session {
	/// Operation input for the session extractor.
	///
	/// This adds a session cookie requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.push(
			[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		);
	}
}

/// A session whose profile has the admin role.
///
/// Non-admins are rejected with [`auth::Error::Forbidden`].
#[derive(Debug)]
pub struct Admin(pub Session);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Admin
where
	SharedStore: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let session = Session::from_request_parts(parts, state).await?;

		if !session.profile.is_admin() {
			tracing::debug!(profile_id = %session.profile.id, "admin route refused");
			return Err(auth::Error::Forbidden.into());
		}

		Ok(Self(session))
	}
}

impl OperationInput for Admin {
	fn operation_input(ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		Session::operation_input(ctx, operation);
	}
}
