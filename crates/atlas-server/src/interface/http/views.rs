//! 视图上下文：每个响应都带上所属应用与当前动作
use atlas_core::APP_ASSETS;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub const ACTION_ASSET_LIST: &str = "Asset list";
pub const ACTION_ASSET_DETAIL: &str = "Asset detail";
pub const ACTION_ASSET_USERS: &str = "Asset user list";
pub const ACTION_USER_ASSETS: &str = "My assets";
pub const ACTION_CREATE_ASSET: &str = "Create asset";
pub const ACTION_UPDATE_ASSET: &str = "Update asset";
pub const ACTION_BULK_UPDATE: &str = "Bulk update asset";
pub const ACTION_DELETE_ASSET: &str = "Delete asset";

#[derive(Debug, Serialize)]
pub struct PageContext<T: Serialize> {
    pub app: &'static str,
    pub action: &'static str,
    #[serde(flatten)]
    pub data: T,
}

pub fn page<T: Serialize>(action: &'static str, data: T) -> Json<PageContext<T>> {
    Json(PageContext {
        app: APP_ASSETS,
        action,
        data,
    })
}

/// 以指定状态码返回页面（校验失败时 422）
pub fn page_with_status<T: Serialize>(
    status: StatusCode,
    action: &'static str,
    data: T,
) -> Response {
    (status, page(action, data)).into_response()
}

#[derive(Debug, Serialize)]
pub struct RedirectBody {
    pub message: String,
    pub redirect: String,
}

/// 成功后的 303 跳转，正文携带提示消息
pub fn redirect(location: &str, message: String) -> Response {
    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, location.to_string())],
        Json(RedirectBody {
            message,
            redirect: location.to_string(),
        }),
    )
        .into_response()
}
