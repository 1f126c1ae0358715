use atlas_core::error::CoreError;
use atlas_core::{ASSET_LIST_URL, BULK_UPDATE_SUCCESS_MSG, BULK_UPDATE_URL};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::application::forms::BulkUpdateForm;
use crate::domain::permission::Operation;
use crate::interface::http::errors::{json_body, ApiError};
use crate::interface::http::state::{AppState, CallerContext};
use crate::interface::http::views::{page, page_with_status, redirect, ACTION_BULK_UPDATE};

#[derive(Debug, Default, Deserialize)]
pub struct BulkFormQuery {
    pub spm: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SelectionRequest {
    #[serde(default)]
    pub assets: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub spm: String,
    pub url: String,
}

pub async fn bulk_form(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<BulkFormQuery>,
) -> Result<Response, ApiError> {
    state.authorize(&caller, Operation::BulkUpdateAssets)?;
    let view = state
        .asset_forms_use_case()
        .bulk_form(query.spm.as_deref())
        .await?;
    Ok(page(ACTION_BULK_UPDATE, view).into_response())
}

pub async fn bulk_update(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    form: Result<Json<BulkUpdateForm>, JsonRejection>,
) -> Result<Response, ApiError> {
    state.authorize(&caller, Operation::BulkUpdateAssets)?;
    let form = json_body(form)?;

    match state.bulk_update_use_case().execute(&form).await {
        Ok(_) => Ok(redirect(ASSET_LIST_URL, BULK_UPDATE_SUCCESS_MSG.to_string())),
        Err(CoreError::Validation { errors }) => {
            // 保留提交的资产列表与字段值
            let view = state
                .asset_forms_use_case()
                .render_bulk(form, errors)
                .await?;
            Ok(page_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                ACTION_BULK_UPDATE,
                view,
            ))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn save_selection(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    request: Result<Json<SelectionRequest>, JsonRejection>,
) -> Result<Json<SelectionResponse>, ApiError> {
    state.authorize(&caller, Operation::SaveSelection)?;
    let request = json_body(request)?;
    let token = state
        .save_selection_use_case()
        .execute(&request.assets)
        .await?;
    Ok(Json(SelectionResponse {
        url: format!("{}?spm={}", BULK_UPDATE_URL, token),
        spm: token.into(),
    }))
}
