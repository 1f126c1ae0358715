use atlas_core::core_types::AssetId;
use atlas_core::error::CoreError;
use atlas_core::{create_success_msg, delete_success_msg, update_success_msg, ASSET_LIST_URL};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::application::forms::AssetSubmission;
use crate::domain::permission::Operation;
use crate::interface::http::errors::{json_body, ApiError};
use crate::interface::http::state::{AppState, CallerContext};
use crate::interface::http::views::{
    page, page_with_status, redirect, ACTION_ASSET_DETAIL, ACTION_ASSET_LIST,
    ACTION_ASSET_USERS, ACTION_CREATE_ASSET, ACTION_DELETE_ASSET, ACTION_UPDATE_ASSET,
    ACTION_USER_ASSETS,
};

#[derive(Debug, Default, Deserialize)]
pub struct CreateFormQuery {
    pub node_id: Option<String>,
}

pub async fn list_assets(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Response, ApiError> {
    state.authorize(&caller, Operation::ListAssets)?;
    let listing = state.browse_assets_use_case().list().await?;
    Ok(page(ACTION_ASSET_LIST, listing).into_response())
}

pub async fn asset_detail(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.authorize(&caller, Operation::ViewAsset)?;
    let detail = state
        .browse_assets_use_case()
        .detail(&AssetId::from(id))
        .await?;
    Ok(page(ACTION_ASSET_DETAIL, detail).into_response())
}

pub async fn asset_users(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.authorize(&caller, Operation::ListAssetUsers)?;
    let users = state
        .browse_assets_use_case()
        .asset_users(&AssetId::from(id))
        .await?;
    Ok(page(ACTION_ASSET_USERS, users).into_response())
}

pub async fn user_assets(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Response, ApiError> {
    state.authorize(&caller, Operation::ListUserAssets)?;
    let current = caller.caller().ok_or(CoreError::Unauthenticated)?;
    let assets = state.browse_assets_use_case().user_assets(current).await?;
    Ok(page(ACTION_USER_ASSETS, assets).into_response())
}

pub async fn create_form(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<CreateFormQuery>,
) -> Result<Response, ApiError> {
    state.authorize(&caller, Operation::CreateAsset)?;
    let view = state
        .asset_forms_use_case()
        .create_form(query.node_id.as_deref())
        .await?;
    Ok(page(ACTION_CREATE_ASSET, view).into_response())
}

pub async fn create_asset(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    submission: Result<Json<AssetSubmission>, JsonRejection>,
) -> Result<Response, ApiError> {
    state.authorize(&caller, Operation::CreateAsset)?;
    let submission = json_body(submission)?;

    match state
        .create_asset_use_case()
        .execute(&submission, caller.display_name())
        .await
    {
        Ok(asset) => Ok(redirect(ASSET_LIST_URL, create_success_msg(&asset.hostname))),
        Err(CoreError::Validation { errors }) => {
            let view = state
                .asset_forms_use_case()
                .rerender(None, submission, errors)
                .await?;
            Ok(page_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                ACTION_CREATE_ASSET,
                view,
            ))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn update_form(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.authorize(&caller, Operation::UpdateAsset)?;
    let view = state
        .asset_forms_use_case()
        .update_form(&AssetId::from(id))
        .await?;
    Ok(page(ACTION_UPDATE_ASSET, view).into_response())
}

pub async fn update_asset(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    submission: Result<Json<AssetSubmission>, JsonRejection>,
) -> Result<Response, ApiError> {
    state.authorize(&caller, Operation::UpdateAsset)?;
    let submission = json_body(submission)?;
    let id = AssetId::from(id);

    match state.update_asset_use_case().execute(&id, &submission).await {
        Ok(asset) => Ok(redirect(ASSET_LIST_URL, update_success_msg(&asset.hostname))),
        Err(CoreError::Validation { errors }) => {
            let view = state
                .asset_forms_use_case()
                .rerender(Some(&id), submission, errors)
                .await?;
            Ok(page_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                ACTION_UPDATE_ASSET,
                view,
            ))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.authorize(&caller, Operation::DeleteAsset)?;
    let asset = state
        .asset_forms_use_case()
        .delete_confirm(&AssetId::from(id))
        .await?;
    Ok(page(ACTION_DELETE_ASSET, serde_json::json!({ "asset": asset })).into_response())
}

pub async fn delete_asset(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.authorize(&caller, Operation::DeleteAsset)?;
    let asset = state
        .delete_asset_use_case()
        .execute(&AssetId::from(id))
        .await?;
    Ok(redirect(ASSET_LIST_URL, delete_success_msg(&asset.hostname)))
}
