//! Request extractors that reject with [`ApiError`].
//!
//! axum's stock `Path` and `Json` rejections are plain text; these wrappers
//! keep every 4xx in the `{code, message, details}` shape.

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use inventron_core::ItemId;
use serde::de::DeserializeOwned;

/// Extractor for the `:id` segment of item routes.
///
/// ```rust,ignore
/// async fn get_item(ItemPath(id): ItemPath) -> ApiResult<Json<InventoryItem>> { ... }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ItemPath(pub ItemId);

#[async_trait]
impl<S> FromRequestParts<S> for ItemPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<i64> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                ApiError::invalid_input(format!("Invalid item id in '{}': {}", parts.uri.path(), e))
            })?;
        Ok(ItemPath(ItemId::new(raw)))
    }
}

/// JSON body extractor whose rejection is an `INVALID_INPUT` error.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::invalid_input(rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use axum::{
        body::Body,
        http::{header, Request as HttpRequest, StatusCode},
        routing::{get, post},
        Router,
    };
    use inventron_core::ItemFields;
    use tower::ServiceExt;

    fn test_app() -> Router {
        Router::new()
            .route(
                "/items/:id",
                get(|ItemPath(id): ItemPath| async move { id.to_string() }),
            )
            .route(
                "/items",
                post(|JsonBody(fields): JsonBody<ItemFields>| async move {
                    fields.item_name.unwrap_or_default().to_string()
                }),
            )
    }

    async fn body_json(response: axum::response::Response) -> Result<serde_json::Value, String> {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        serde_json::from_slice(&bytes).map_err(|e| e.to_string())
    }

    #[tokio::test]
    async fn test_numeric_id_is_extracted() -> Result<(), String> {
        let request = HttpRequest::builder()
            .uri("/items/42")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let response = test_app().oneshot(request).await.map_err(|e| e.to_string())?;
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_invalid_input() -> Result<(), String> {
        let request = HttpRequest::builder()
            .uri("/items/abc")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let response = test_app().oneshot(request).await.map_err(|e| e.to_string())?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await?;
        assert_eq!(json["code"], "INVALID_INPUT");
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_input() -> Result<(), String> {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/items")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .map_err(|e| e.to_string())?;
        let response = test_app().oneshot(request).await.map_err(|e| e.to_string())?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await?;
        assert_eq!(json["code"], serde_json::json!(ErrorCode::InvalidInput));
        Ok(())
    }

    #[tokio::test]
    async fn test_wrongly_typed_fields_reach_the_handler() -> Result<(), String> {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/items")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"item_name": 12345, "item_quantity": "abc"}"#))
            .map_err(|e| e.to_string())?;
        let response = test_app().oneshot(request).await.map_err(|e| e.to_string())?;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        assert_eq!(&bytes[..], b"12345");
        Ok(())
    }
}
