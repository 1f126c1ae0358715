use crate::domain::permission::Caller;

/// 调用者解析接口：由请求携带的凭据得到调用者身份
pub trait CallerResolver: Send + Sync {
    /// 未知或缺失的凭据返回 None（匿名）
    fn resolve(&self, bearer_token: Option<&str>) -> Option<Caller>;
}
