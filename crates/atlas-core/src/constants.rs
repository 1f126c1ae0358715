// 资产协议表单集合的数量约束
pub const MIN_PROTOCOLS_PER_ASSET: usize = 1;
pub const MAX_PROTOCOLS_PER_ASSET: usize = 5;

pub const MAX_HOSTNAME_LEN: usize = 128;
pub const MAX_COMMENT_LEN: usize = 1024;
pub const MAX_NAME_LEN: usize = 128;

// 节点树：根节点固定键与显示名
pub const ROOT_NODE_KEY: &str = "1";
pub const ROOT_NODE_VALUE: &str = "Default";
pub const NODE_KEY_SEPARATOR: char = ':';

// 选择缓存：键格式 RESOURCE_ID_<spm>
pub const SELECTION_KEY_PREFIX: &str = "RESOURCE_ID_";
pub const DEFAULT_SELECTION_TTL_SEC: u64 = 300;

// JetStream KV（名称中避免使用 '.' 和 '_'）
pub const JS_KV_SELECTIONS: &str = "ATLAS-SELECTIONS";

// 视图上下文中的应用名
pub const APP_ASSETS: &str = "Assets";

// 成功跳转目标
pub const ASSET_LIST_URL: &str = "/api/v1/assets";
pub const BULK_UPDATE_URL: &str = "/api/v1/bulk/assets";

pub const BULK_UPDATE_SUCCESS_MSG: &str = "Bulk update asset success";

/// 生成选择缓存键：RESOURCE_ID_<spm>
pub fn selection_cache_key(spm: &str) -> String {
    format!("{SELECTION_KEY_PREFIX}{spm}")
}

pub fn create_success_msg(name: &str) -> String {
    format!("{name} was created successfully")
}

pub fn update_success_msg(name: &str) -> String {
    format!("{name} was updated successfully")
}

pub fn delete_success_msg(name: &str) -> String {
    format!("{name} was deleted successfully")
}
