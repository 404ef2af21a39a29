use aide::OperationOutput;
use axum::{
	body::Body,
	http::{header, HeaderValue, Response},
	response::IntoResponse,
};
use uuid::Uuid;

pub const COOKIE_NAME: &str = "session";

/// Creates a session cookie with no expiry
pub fn create_cookie(session_id: Uuid) -> cookie::Cookie<'static> {
	cookie::Cookie::build((COOKIE_NAME, session_id.to_string()))
		.secure(!cfg!(debug_assertions))
		.http_only(true)
		.same_site(cookie::SameSite::Lax)
		.path("/")
		.into()
}

/// Creates an empty session cookie used to invalidate a previous one
pub fn clear_cookie() -> cookie::Cookie<'static> {
	cookie::Cookie::build(COOKIE_NAME)
		.http_only(true)
		.path("/")
		.max_age(cookie::time::Duration::ZERO)
		.into()
}

/// A response that also sets a cookie.
pub struct SetCookie<T>(pub cookie::Cookie<'static>, pub T);

impl<T: IntoResponse> IntoResponse for SetCookie<T> {
	fn into_response(self) -> Response<Body> {
		let mut response = self.1.into_response();

		if let Ok(value) = HeaderValue::from_str(&self.0.to_string()) {
			response.headers_mut().append(header::SET_COOKIE, value);
		}

		response
	}
}

impl<T: OperationOutput> OperationOutput for SetCookie<T> {
	type Inner = T::Inner;

	fn operation_response(
		ctx: &mut aide::gen::GenContext,
		operation: &mut aide::openapi::Operation,
	) -> Option<aide::openapi::Response> {
		T::operation_response(ctx, operation)
	}

	fn inferred_responses(
		ctx: &mut aide::gen::GenContext,
		operation: &mut aide::openapi::Operation,
	) -> Vec<(Option<u16>, aide::openapi::Response)> {
		T::inferred_responses(ctx, operation)
	}
}
