//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification of the REST API.

use crate::web::auth::{
    self, LoginRequest, LogoutRequest, RegisterRequest, UserResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::session_handler,
    ),
    components(
        schemas(RegisterRequest, LoginRequest, LogoutRequest, UserResponse)
    ),
    tags(
        (name = "Neiji API", description = "Account endpoints of the Neiji wellness app. The conversations run over the `/ws` WebSocket.")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_account_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/register",
            "/auth/login",
            "/auth/logout",
            "/auth/session/{device_id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
