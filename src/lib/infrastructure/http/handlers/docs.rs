//! API documentation.

use axum::{response::Html, Json};
use utoipa::OpenApi;

use crate::infrastructure::http::open_api::ApiDocs;

/// Stoplight API documentation.
pub async fn stoplight() -> Html<String> {
    Html(
        r#"
<html lang="en">
<head>
    <title>Email Relay API</title>
    <script src="https://unpkg.com/@stoplight/elements/web-components.min.js"></script>
    <link rel="stylesheet" href="https://unpkg.com/@stoplight/elements/styles.min.css">
</head>
<body>
    <main role="main">
        <elements-api apiDescriptionUrl="/api-docs/openapi.json" router="hash" />
    </main>
</body>
</html>
"#
        .to_string(),
    )
}

/// The OpenAPI document
pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDocs::openapi())
}
