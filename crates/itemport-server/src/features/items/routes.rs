use crate::api::response::ErrorResponse;
use crate::features::FeatureState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::{
    commands::{CreateItemCommand, CreateItemError},
    queries::{ListItemsError, ListItemsQuery},
};

pub fn items_routes() -> Router<FeatureState> {
    Router::new().route("/items", get(list_items).post(create_item))
}

#[tracing::instrument(skip(state))]
async fn list_items(State(state): State<FeatureState>) -> Result<Response, ItemsApiError> {
    let items = super::queries::list::handle(state.items.as_ref(), ListItemsQuery).await?;

    if items.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    Ok((StatusCode::OK, Json(items)).into_response())
}

#[tracing::instrument(skip(state, command))]
async fn create_item(
    State(state): State<FeatureState>,
    Json(command): Json<CreateItemCommand>,
) -> Result<Response, ItemsApiError> {
    let item = super::commands::create::handle(state.items.as_ref(), command).await?;
    Ok((StatusCode::CREATED, Json(item)).into_response())
}

#[derive(Debug, thiserror::Error)]
enum ItemsApiError {
    #[error(transparent)]
    List(#[from] ListItemsError),
    #[error(transparent)]
    Create(#[from] CreateItemError),
}

impl IntoResponse for ItemsApiError {
    fn into_response(self) -> Response {
        let message = match self {
            ItemsApiError::List(ref e) => {
                tracing::error!(error = %e, "Failed to list items");
                "Failed to fetch items"
            },
            ItemsApiError::Create(ref e) => {
                tracing::error!(error = %e, "Failed to create item");
                "Failed to create item"
            },
        };

        let error = ErrorResponse::new("STORE_ERROR", message);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
    }
}
