//! Request handlers
//!
//! Each mutating handler does its own full load, edit and save of the
//! collection. Nothing coordinates concurrent requests.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use bookshelf_core::{collection, Book};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

const NOT_FOUND: &str = "Book not found";

/// Body of `POST /book`
///
/// Any other fields (such as `author`) are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CreateBookRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub isbn: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of `PUT /book/{id}`
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub blob_token_set: bool,
}

/// ISBNs are often sent as JSON numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}

/// GET /books/{status}
pub async fn list_by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state
        .repository
        .load_all()
        .await
        .map_err(ApiError::storage("Failed to load books"))?;

    let matching = collection::with_status(&books, &status);
    debug!("{} of {} books have status {:?}", matching.len(), books.len(), status);
    Ok(Json(matching))
}

/// POST /book
pub async fn create_book(
    State(state): State<AppState>,
    payload: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<Json<Book>, ApiError> {
    let Json(request) = payload?;

    let metadata = state
        .resolver
        .resolve(request.isbn.as_deref(), request.title.as_deref())
        .await
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    let mut books = state
        .repository
        .load_all()
        .await
        .map_err(ApiError::storage("Failed to save book"))?;

    let book = Book::new(state.ids.next_id(), metadata, request.status.as_deref());
    collection::append(&mut books, book.clone());

    state
        .repository
        .save_all(&books)
        .await
        .map_err(ApiError::storage("Failed to save book"))?;

    info!("Added book {} {:?} to {}", book.id, book.title, book.status);
    Ok(Json(book))
}

/// PUT /book/{id}
///
/// An unknown id is a 404 whatever the body holds.
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Book>, ApiError> {
    let mut books = state
        .repository
        .load_all()
        .await
        .map_err(ApiError::storage("Storage operation failed"))?;

    if collection::find_by_id(&books, &id).is_none() {
        return Err(ApiError::NotFound(NOT_FOUND));
    }

    let Json(request) = payload?;
    let status = request
        .status
        .ok_or_else(|| ApiError::BadRequest("Missing status".to_string()))?;

    let updated = collection::update_status(&mut books, &id, &status)
        .cloned()
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    state
        .repository
        .save_all(&books)
        .await
        .map_err(ApiError::storage("Storage operation failed"))?;

    info!("Moved book {} to {}", updated.id, updated.status);
    Ok(Json(updated))
}

/// DELETE /book/{id}
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let mut books = state
        .repository
        .load_all()
        .await
        .map_err(ApiError::storage("Storage operation failed"))?;

    let removed = collection::remove(&mut books, &id).ok_or(ApiError::NotFound(NOT_FOUND))?;

    state
        .repository
        .save_all(&books)
        .await
        .map_err(ApiError::storage("Storage operation failed"))?;

    info!("Deleted book {} {:?}", removed.id, removed.title);
    Ok(Json(DeleteResponse { success: true }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        blob_token_set: state.blob_token_set,
    })
}

/// Unknown paths
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found")
}
