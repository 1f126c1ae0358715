use atlas_core::error::{CoreError, ValidationErrors};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// 统一错误响应体：{ code, message, hint }
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub hint: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

/// 接口层错误：包装 CoreError 并映射为 HTTP 响应
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        ApiError(error)
    }
}

/// 请求体无法解码时按非字段校验错误处理
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add_non_field(rejection.body_text());
        ApiError(CoreError::Validation { errors })
    }
}

/// 取出 JSON 请求体；处理器须先通过权限闸门再调用
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(ApiError::from)
}

fn build_body(code: &'static str, desc: impl Into<String>, hint: &'static str) -> ErrorBody {
    ErrorBody {
        code,
        message: desc.into(),
        hint,
        errors: None,
    }
}

/// 将 CoreError 映射为状态码与结构化中文信息
pub fn map_core_error(error: CoreError) -> (StatusCode, ErrorBody) {
    match error {
        CoreError::Unauthenticated => (
            StatusCode::UNAUTHORIZED,
            build_body(
                "E_UNAUTHENTICATED",
                "未认证的请求",
                "在 Authorization 头中携带有效的 Bearer 令牌",
            ),
        ),
        CoreError::PermissionDenied { operation } => (
            StatusCode::FORBIDDEN,
            build_body(
                "E_PERMISSION_DENIED",
                format!("权限不足: {}", operation),
                "确认当前用户处于启用状态并具备组织管理员角色",
            ),
        ),
        CoreError::Validation { errors } => {
            let mut body = build_body(
                "E_VALIDATION",
                format!("请求校验失败: {}", errors),
                "按字段错误信息修正提交内容后重试",
            );
            body.errors = Some(errors);
            (StatusCode::UNPROCESSABLE_ENTITY, body)
        }
        CoreError::NotFound {
            entity_type,
            entity_id,
        } => (
            StatusCode::NOT_FOUND,
            build_body(
                "E_NOT_FOUND",
                format!("{} 未找到: {}", entity_type, entity_id),
                "确认 ID 是否正确，或资源是否已被删除",
            ),
        ),
        CoreError::Store { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            build_body(
                "E_STORE",
                format!("存储错误: {}", message),
                "检查数据库文件权限与磁盘空间，事务已回滚",
            ),
        ),
        CoreError::Nats { message } => (
            StatusCode::SERVICE_UNAVAILABLE,
            build_body(
                "E_NATS",
                format!("NATS 错误: {}", message),
                "检查 NATS 连接、JetStream 状态与权限配置",
            ),
        ),
        CoreError::Serialization { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            build_body(
                "E_SERIALIZATION",
                format!("序列化失败: {}", message),
                "检查缓存中的数据格式是否与当前版本一致",
            ),
        ),
        CoreError::Config { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            build_body(
                "E_CONFIG",
                format!("配置错误: {}", message),
                "检查配置文件与环境变量是否正确",
            ),
        ),
        CoreError::Internal { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            build_body(
                "E_INTERNAL",
                format!("内部错误: {}", message),
                "查看服务端日志获取详细信息",
            ),
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = map_core_error(self.0);
        if status.is_server_error() {
            tracing::error!(code = body.code, message = %body.message, "request failed");
        } else {
            tracing::debug!(code = body.code, status = %status, "request rejected");
        }
        (status, Json(body)).into_response()
    }
}
