use atlas_core::core_types::{AssetId, UserId};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::application::ports::repositories::{
    DirectoryRepository, LabelRepository, NodeRepository,
};
use crate::application::use_cases::commands::manage_catalog::{
    AdminUserForm, DomainForm, LabelForm, NodeForm, SystemUserForm,
};
use crate::domain::models::{AdminUser, Domain, Label, Node, SystemUser};
use crate::domain::permission::Operation;
use crate::interface::http::errors::{json_body, ApiError};
use crate::interface::http::state::{AppState, CallerContext};

pub async fn list_nodes(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<Vec<Node>>, ApiError> {
    state.authorize(&caller, Operation::ViewCatalog)?;
    Ok(Json(state.context().node_repo.list().await?))
}

pub async fn create_node(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    form: Result<Json<NodeForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Node>), ApiError> {
    state.authorize(&caller, Operation::ManageCatalog)?;
    let form = json_body(form)?;
    let node = state.manage_catalog_use_case().create_node(&form).await?;
    Ok((StatusCode::CREATED, Json(node)))
}

pub async fn list_labels(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<Vec<Label>>, ApiError> {
    state.authorize(&caller, Operation::ViewCatalog)?;
    Ok(Json(state.context().label_repo.list().await?))
}

pub async fn create_label(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    form: Result<Json<LabelForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Label>), ApiError> {
    state.authorize(&caller, Operation::ManageCatalog)?;
    let form = json_body(form)?;
    let label = state.manage_catalog_use_case().create_label(&form).await?;
    Ok((StatusCode::CREATED, Json(label)))
}

pub async fn list_system_users(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<Vec<SystemUser>>, ApiError> {
    state.authorize(&caller, Operation::ViewCatalog)?;
    Ok(Json(state.context().directory_repo.list_system_users().await?))
}

pub async fn create_system_user(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    form: Result<Json<SystemUserForm>, JsonRejection>,
) -> Result<(StatusCode, Json<SystemUser>), ApiError> {
    state.authorize(&caller, Operation::ManageCatalog)?;
    let form = json_body(form)?;
    let user = state
        .manage_catalog_use_case()
        .create_system_user(&form)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_admin_users(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<Vec<AdminUser>>, ApiError> {
    state.authorize(&caller, Operation::ViewCatalog)?;
    Ok(Json(state.context().directory_repo.list_admin_users().await?))
}

pub async fn create_admin_user(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    form: Result<Json<AdminUserForm>, JsonRejection>,
) -> Result<(StatusCode, Json<AdminUser>), ApiError> {
    state.authorize(&caller, Operation::ManageCatalog)?;
    let form = json_body(form)?;
    let user = state
        .manage_catalog_use_case()
        .create_admin_user(&form)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_domains(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<Vec<Domain>>, ApiError> {
    state.authorize(&caller, Operation::ViewCatalog)?;
    Ok(Json(state.context().directory_repo.list_domains().await?))
}

pub async fn create_domain(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    form: Result<Json<DomainForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Domain>), ApiError> {
    state.authorize(&caller, Operation::ManageCatalog)?;
    let form = json_body(form)?;
    let domain = state.manage_catalog_use_case().create_domain(&form).await?;
    Ok((StatusCode::CREATED, Json(domain)))
}

pub async fn grant_asset(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.authorize(&caller, Operation::ManageGrants)?;
    state
        .manage_grants_use_case()
        .grant(&AssetId::from(id), &UserId::from(user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_asset(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.authorize(&caller, Operation::ManageGrants)?;
    state
        .manage_grants_use_case()
        .revoke(&AssetId::from(id), &UserId::from(user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
