use crate::{
    config::DocsConfig,
    endpoint::{Auth, Endpoint, KeyValue, ResourceRef, ResponseExample},
    resolver::TransformerRegistry,
};
use serde_json::{json, Map, Value};

/// Turn a `json!` object literal into a body map
#[allow(dead_code)]
pub fn body(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Configuration used across generator tests
#[allow(dead_code)]
pub fn create_test_config() -> DocsConfig {
    DocsConfig::new("Test API", "1.0.0")
        .with_description("A test API for documentation synthesis")
        .with_base_url("http://localhost:8000")
        .add_versioned_host("v1", "base_url_v1")
}

/// Transformers used by the resolver and merge tests
#[allow(dead_code)]
pub fn create_test_registry() -> TransformerRegistry {
    TransformerRegistry::new()
        .with_text(
            "app::http::resources::UserResource",
            r#"{
                'id' => self.id,
                'name' => self.name,
                'email' => self.email,
                'posts' => PostResource::collection(self.posts),
            }"#,
        )
        .with_text(
            "app::http::resources::PostResource",
            "{ 'id' => self.id, 'title' => self.title, 'published_at' => self.published_at }",
        )
}

/// `GET /v1/users/{id}` with an explicit success response and no auth
#[allow(dead_code)]
pub fn create_user_show() -> Endpoint {
    Endpoint::new("Show user", "get", "/v1/users/{id}")
        .with_folder("Users")
        .with_response(ResponseExample::new(
            "Success",
            200,
            json!({ "id": 1, "name": "John" }),
        ))
}

/// Endpoints as a declarative collector would produce them
#[allow(dead_code)]
pub fn create_declared_endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::new("Request OTP", "POST", "api/auth/otp/")
            .with_folder("Auth / OTP")
            .with_order(1)
            .with_body(body(json!({ "phone": "+1234567890" }))),
        Endpoint::new("List users", "GET", "/api/users")
            .with_folder("Users")
            .with_description("Paginated list of users")
            .with_query_param(KeyValue::new("page", "1")),
        Endpoint::new("Show profile", "GET", "/api/profile")
            .with_folder("Account")
            .with_resource(ResourceRef::new("UserResource")),
    ]
}

/// Endpoints as a route-table introspection would produce them
#[allow(dead_code)]
pub fn create_introspected_endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::new("api.users.index", "GET", "/api/users/")
            .with_middleware(["auth:sanctum"])
            .with_response(ResponseExample::new("OK", 200, json!([]))),
        Endpoint::new("api.auth.otp.verify", "POST", "/api/auth/otp/verify")
            .with_folder("Auth/OTP")
            .with_body(body(json!({ "code": "123456" }))),
        Endpoint::new("api.profile", "GET", "/api/profile")
            .with_middleware(["auth"])
            .with_auth(Auth::Bearer {
                token: "{{auth_token}}".to_string(),
            }),
    ]
}
