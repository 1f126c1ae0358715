//! 资产引用的独立实体：标签、系统用户、管理用户、网域

use atlas_core::core_types::{AdminUserId, DomainId, LabelId, SystemUserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::protocol::ProtocolName;

/// 标签，名称全局唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
    pub value: String,
    pub date_created: DateTime<Utc>,
}

/// 系统用户：登录资产时使用的凭据身份
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemUser {
    pub id: SystemUserId,
    pub name: String,
    pub username: String,
    pub protocol: ProtocolName,
}

/// 管理用户：用于资产管理操作的特权身份
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub name: String,
    pub username: String,
}

/// 网域（网关分组）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub id: DomainId,
    pub name: String,
}
