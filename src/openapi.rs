use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json, session};

pub const SECURITY_SCHEME_SESSION: &str = "Session";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const POST: &str = "Post";
	pub const CATEGORY: &str = "Category";
	pub const DASHBOARD: &str = "Dashboard";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Inkpress Open API")
		.summary("Publishing and reader interactions for an MDX blog")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::AUTH.into(),
			description: Some("Accounts, sessions and profiles".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Published posts, views, likes and search".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::CATEGORY.into(),
			description: Some("Browsing posts by category".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::DASHBOARD.into(),
			description: Some("Content management, admins only".into()),
			..Default::default()
		})
		.security_scheme(
			SECURITY_SCHEME_SESSION,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Cookie,
				name: session::COOKIE_NAME.into(),
				description: Some("A user session cookie".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::ErrorBody<'static>>, _>(|res| {
			res.example(error::ErrorBody {
				success: false,
				errors: vec![error::Message::new("error message")
					.field("optional field")
					.detail("key", "value")],
			})
		})
}
