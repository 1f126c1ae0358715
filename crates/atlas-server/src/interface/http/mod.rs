pub mod errors;
pub mod handlers;
pub mod state;
pub mod views;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use handlers::{assets, bulk, catalog, health};
pub use state::{AppState, CallerContext};

/// 构建 HTTP 路由；所有接口挂在 /api/v1 下
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/assets",
            get(assets::list_assets).post(assets::create_asset),
        )
        .route(
            "/assets/:id",
            get(assets::asset_detail)
                .put(assets::update_asset)
                .post(assets::update_asset)
                .delete(assets::delete_asset),
        )
        .route("/assets/:id/users", get(assets::asset_users))
        .route("/assets/:id/form", get(assets::update_form))
        .route(
            "/assets/:id/delete",
            get(assets::delete_confirm).post(assets::delete_asset),
        )
        .route(
            "/assets/:id/grants/:user_id",
            put(catalog::grant_asset).delete(catalog::revoke_asset),
        )
        .route("/user/assets", get(assets::user_assets))
        .route("/forms/asset", get(assets::create_form))
        .route("/bulk/assets", get(bulk::bulk_form).post(bulk::bulk_update))
        .route("/selections", post(bulk::save_selection))
        .route(
            "/nodes",
            get(catalog::list_nodes).post(catalog::create_node),
        )
        .route(
            "/labels",
            get(catalog::list_labels).post(catalog::create_label),
        )
        .route(
            "/system-users",
            get(catalog::list_system_users).post(catalog::create_system_user),
        )
        .route(
            "/admin-users",
            get(catalog::list_admin_users).post(catalog::create_admin_user),
        )
        .route(
            "/domains",
            get(catalog::list_domains).post(catalog::create_domain),
        )
        .route("/health", get(health::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(middleware::from_fn_with_state(state.clone(), resolve_caller))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 解析 `Authorization: Bearer <token>`，把调用者放入请求扩展
async fn resolve_caller(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let caller = {
        let token = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        state.context().caller_resolver.resolve(token)
    };
    if let Some(c) = &caller {
        tracing::debug!(user_id = %c.user_id, role = ?c.role, "caller resolved");
    }
    request.extensions_mut().insert(CallerContext(caller));
    next.run(request).await
}
