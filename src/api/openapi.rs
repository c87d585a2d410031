use utoipa::openapi::{
    security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Components, InfoBuilder, OpenApiBuilder, Tag,
};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::handlers::{auth, health, pantry};

/// Generate the `OpenAPI` document from the same wiring that serves traffic.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and documented.
pub(crate) fn api_router() -> OpenApiRouter {
    let mut users_tag = Tag::new("users");
    users_tag.description = Some("Registration, login, and credential recovery".to_string());

    let mut pantry_tag = Tag::new("pantry");
    pantry_tag.description = Some("Per-user perishable item inventory".to_string());

    let mut openapi = cargo_openapi();
    openapi.tags = Some(vec![users_tag, pantry_tag]);
    openapi
        .components
        .get_or_insert_with(Components::default)
        .add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );

    OpenApiRouter::with_openapi(openapi)
        .routes(routes!(health::health))
        .routes(routes!(auth::register::register))
        .routes(routes!(auth::login::login))
        .routes(routes!(auth::logout::logout))
        .routes(routes!(auth::recovery::forget_password))
        .routes(routes!(auth::recovery::reset_password))
        .routes(routes!(auth::recovery::reset_security_answer))
        .routes(routes!(pantry::get_pantry))
        .routes(routes!(pantry::get_expiring))
        .routes(routes!(pantry::post_item))
        .routes(routes!(pantry::get_item, pantry::put_item, pantry::delete_item))
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    let info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(Some(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    OpenApiBuilder::new().info(info).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_carries_cargo_metadata() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn every_surface_route_is_documented() {
        let spec = openapi();
        let paths = &spec.paths.paths;
        for path in [
            "/health",
            "/users/register",
            "/users/login",
            "/users/logout",
            "/users/forget_password",
            "/users/reset_password",
            "/users/reset_security_answer",
            "/pantry",
            "/pantry/expiring",
            "/pantry/item",
            "/pantry/{item}",
        ] {
            assert!(paths.contains_key(path), "missing path: {path}");
        }
    }
}
