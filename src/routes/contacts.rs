/**
 * Contact Routes
 * Per-user contact CRUD, union filtering and upcoming-birthday search
 */
use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::net::SocketAddr;

use crate::auth::roles::{authorize, DELETE_ROLES, MODIFY_ROLES, READ_ROLES};
use crate::db::models::Contact;
use crate::errors::ApiError;
use crate::repository::contacts::ContactFields;
use crate::routes::auth::authenticate;
use crate::state::AppState;

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

/// GET /api/contacts
pub async fn list_contacts(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    authorize(READ_ROLES, user.role())?;
    state
        .limiter
        .check(&addr.ip().to_string(), "/api/contacts")
        .await?;

    let contacts = state
        .contacts
        .list(
            query.limit,
            query.offset,
            query.first_name.as_deref(),
            query.last_name.as_deref(),
            query.email.as_deref(),
            user.id,
        )
        .await?;

    if contacts.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(contacts))
}

/// GET /api/contacts/birthdays
pub async fn upcoming_birthdays(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    authorize(READ_ROLES, user.role())?;
    state
        .limiter
        .check(&addr.ip().to_string(), "/api/contacts/birthdays")
        .await?;

    let contacts = state
        .contacts
        .birthdays(query.limit, query.offset, user.id)
        .await?;

    if contacts.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(contacts))
}

/// GET /api/contacts/{id}
pub async fn get_contact(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(contact_id): Path<i64>,
) -> Result<Json<Contact>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    authorize(READ_ROLES, user.role())?;
    state
        .limiter
        .check(&addr.ip().to_string(), "/api/contacts/{id}")
        .await?;

    let contact = state
        .contacts
        .get_by_id(contact_id, user.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(contact))
}

/// POST /api/contacts
pub async fn create_contact(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<ContactFields>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state, &headers).await?;
    authorize(MODIFY_ROLES, user.role())?;
    state
        .limiter
        .check(&addr.ip().to_string(), "/api/contacts")
        .await?;

    let contact = state.contacts.create(&body, user.id).await?;
    tracing::info!(contact_id = contact.id, user_id = user.id, "contact created");
    Ok((StatusCode::CREATED, Json(contact)))
}

/// PUT /api/contacts/{id} - full replace of every mutable field
pub async fn update_contact(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(contact_id): Path<i64>,
    Json(body): Json<ContactFields>,
) -> Result<Json<Contact>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    authorize(MODIFY_ROLES, user.role())?;
    state
        .limiter
        .check(&addr.ip().to_string(), "/api/contacts/{id}")
        .await?;

    let contact = state
        .contacts
        .update(contact_id, &body, user.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(contact))
}

/// DELETE /api/contacts/{id} - returns the deleted contact
pub async fn delete_contact(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(contact_id): Path<i64>,
) -> Result<Json<Contact>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    authorize(DELETE_ROLES, user.role())?;
    state
        .limiter
        .check(&addr.ip().to_string(), "/api/contacts/{id}")
        .await?;

    let contact = state
        .contacts
        .remove(contact_id, user.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    tracing::info!(contact_id = contact.id, user_id = user.id, "contact deleted");
    Ok(Json(contact))
}
