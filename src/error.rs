use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{ratelimit::Admission, store::StoreError};

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message presented to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A short description of the error.
	pub content: Cow<'a, str>,
	/// The input field the error is attached to, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Additional structured details about the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'a, Map>>,
}

impl<'a> Message<'a> {
	pub fn new(content: impl Into<Cow<'a, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	#[must_use]
	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	#[must_use]
	pub fn detail(mut self, key: &str, value: impl Serialize) -> Self {
		let details = self.details.get_or_insert_with(|| Cow::Owned(Map::new()));

		details
			.to_mut()
			.insert(key.into(), serde_json::to_value(value).unwrap_or_default());
		self
	}
}

/// The body of every error response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorBody<'a> {
	pub success: bool,
	pub errors: Vec<Message<'a>>,
}

fn respond(status: StatusCode, errors: Vec<Message<'_>>) -> Response<Body> {
	(
		status,
		Json(ErrorBody {
			success: false,
			errors,
		}),
	)
		.into_response()
}

/// An error owned by a single group of routes.
///
/// The messages returned by [`ErrorShape::errors`] are sent to the
/// client, so they should not contain sensitive information.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;
	fn errors(&self) -> Vec<Message<'_>>;
}

/// For route groups that only fail with an [`AppError`].
impl ErrorShape for std::convert::Infallible {
	fn status(&self) -> StatusCode {
		match *self {}
	}

	fn errors(&self) -> Vec<Message<'_>> {
		match *self {}
	}
}

/// Rejection of the JSON body extractor.
pub struct JsonRejection(axum_jsonschema::JsonSchemaRejection);

impl std::fmt::Debug for JsonRejection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("JsonRejection")
	}
}

/// Error type shared by the whole application.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("invalid json body")]
	Json(JsonRejection),
	#[error("query error: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("store error: {0}")]
	Store(#[from] StoreError),
	#[error("rate limited")]
	RateLimited(Admission),
}

impl From<axum_jsonschema::JsonSchemaRejection> for AppError {
	fn from(rejection: axum_jsonschema::JsonSchemaRejection) -> Self {
		Self::Json(JsonRejection(rejection))
	}
}

fn validation_messages(errors: &validator::ValidationErrors) -> Vec<Message<'_>> {
	errors
		.field_errors()
		.into_iter()
		.flat_map(|(field, errors)| {
			errors.iter().map(move |error| {
				let message = Message::new(
					error
						.message
						.as_ref()
						.map_or_else(|| error.code.to_string(), ToString::to_string),
				)
				.field(field.to_string());

				if error.params.is_empty() {
					message
				} else {
					error
						.params
						.iter()
						.filter(|(key, _)| *key != "value")
						.fold(message, |message, (key, value)| message.detail(key, value))
				}
			})
		})
		.collect()
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Validation(errors) => {
				respond(StatusCode::BAD_REQUEST, validation_messages(&errors))
			}
			Self::Json(JsonRejection(rejection)) => {
				let status = rejection.into_response().status();

				respond(status, vec![Message::new("invalid_body")])
			}
			Self::Query(rejection) => respond(
				rejection.status(),
				vec![Message::new(rejection.body_text())],
			),
			Self::Path(rejection) => respond(
				rejection.status(),
				vec![Message::new(rejection.body_text())],
			),
			Self::Store(StoreError::Conflict(constraint)) => respond(
				StatusCode::CONFLICT,
				vec![Message::new("conflict").detail("constraint", constraint)],
			),
			Self::Store(StoreError::MissingReference(constraint)) => respond(
				StatusCode::UNPROCESSABLE_ENTITY,
				vec![Message::new("missing_reference").detail("constraint", constraint)],
			),
			Self::Store(error) => {
				tracing::error!(%error, "store failure");

				respond(StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
			}
			Self::RateLimited(admission) => {
				let mut response = respond(
					StatusCode::TOO_MANY_REQUESTS,
					vec![Message::new("Too many requests, try again shortly.")],
				);

				admission.apply(response.headers_mut());
				response
			}
		}
	}
}

impl OperationOutput for AppError {
	type Inner = ErrorBody<'static>;
}

/// The error returned by route handlers: either the route group's own
/// error or one shared by the whole application.
#[derive(Debug)]
pub enum RouteError<T> {
	Route(T),
	App(AppError),
}

impl<T: ErrorShape> From<T> for RouteError<T> {
	fn from(error: T) -> Self {
		Self::Route(error)
	}
}

impl<T> From<AppError> for RouteError<T> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<T> From<StoreError> for RouteError<T> {
	fn from(error: StoreError) -> Self {
		Self::App(error.into())
	}
}

impl<T> From<validator::ValidationErrors> for RouteError<T> {
	fn from(errors: validator::ValidationErrors) -> Self {
		Self::App(errors.into())
	}
}

impl<T: ErrorShape> IntoResponse for RouteError<T> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Route(error) => {
				let status = error.status();

				if status.is_server_error() {
					tracing::error!(%error, "route failure");
				}

				respond(status, error.errors())
			}
			Self::App(error) => error.into_response(),
		}
	}
}

impl<T> OperationOutput for RouteError<T> {
	type Inner = ErrorBody<'static>;
}

#[cfg(test)]
mod test {
	use validator::{ValidationError, ValidationErrors};

	use super::*;

	#[test]
	fn test_validation_messages_carry_field() {
		let mut errors = ValidationErrors::new();
		let mut error = ValidationError::new("length");

		error.message = Some("Title is required".into());
		errors.add("title", error);

		let messages = validation_messages(&errors);

		assert_eq!(messages.len(), 1);
		assert_eq!(messages[0].content, "Title is required");
		assert_eq!(messages[0].field.as_deref(), Some("title"));
	}

	#[test]
	fn test_message_details() {
		let message = Message::new("conflict").detail("constraint", "post_slug_key");
		let details = message.details.expect("details are set");

		assert_eq!(details["constraint"], "post_slug_key");
	}
}
