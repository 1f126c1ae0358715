use atlas_core::core_types::{AdminUserId, AssetId, DomainId, LabelId, NodeId, SystemUserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::protocol::Protocol;

/// 资产平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Platform {
    #[default]
    Linux,
    Unix,
    MacOS,
    BSD,
    Windows,
    Other,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Linux,
        Platform::Unix,
        Platform::MacOS,
        Platform::BSD,
        Platform::Windows,
        Platform::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::Unix => "Unix",
            Platform::MacOS => "MacOS",
            Platform::BSD => "BSD",
            Platform::Windows => "Windows",
            Platform::Other => "Other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown platform: {}", s))
    }
}

/// 资产聚合根
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub hostname: String,
    pub ip: String,
    pub public_ip: Option<String>,
    pub platform: Platform,
    pub is_active: bool,
    pub domain: Option<DomainId>,
    pub admin_user: Option<AdminUserId>,
    /// 1..=5 个协议，按提交顺序
    pub protocols: Vec<Protocol>,
    pub nodes: Vec<NodeId>,
    pub labels: Vec<LabelId>,
    pub system_users: Vec<SystemUserId>,
    pub comment: String,
    pub created_by: Option<String>,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl Asset {
    /// 由校验后的草稿构造新资产
    pub fn from_draft(id: AssetId, draft: AssetDraft, created_by: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            hostname: draft.hostname,
            ip: draft.ip,
            public_ip: draft.public_ip,
            platform: draft.platform,
            is_active: draft.is_active,
            domain: draft.domain,
            admin_user: draft.admin_user,
            protocols: draft.protocols,
            nodes: draft.nodes,
            labels: draft.labels,
            system_users: draft.system_users,
            comment: draft.comment,
            created_by,
            date_created: now,
            date_updated: now,
        }
    }

    /// 整体替换可编辑字段（更新表单语义）
    pub fn apply_draft(&mut self, draft: AssetDraft) {
        self.hostname = draft.hostname;
        self.ip = draft.ip;
        self.public_ip = draft.public_ip;
        self.platform = draft.platform;
        self.is_active = draft.is_active;
        self.domain = draft.domain;
        self.admin_user = draft.admin_user;
        self.protocols = draft.protocols;
        self.nodes = draft.nodes;
        self.labels = draft.labels;
        self.system_users = draft.system_users;
        self.comment = draft.comment;
        self.date_updated = Utc::now();
    }

    /// 批量更新：只覆盖补丁中出现的字段
    pub fn apply_patch(&mut self, patch: &AssetPatch) {
        if let Some(platform) = patch.platform {
            self.platform = platform;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if let Some(admin_user) = &patch.admin_user {
            self.admin_user = Some(admin_user.clone());
        }
        if let Some(domain) = &patch.domain {
            self.domain = Some(domain.clone());
        }
        if let Some(nodes) = &patch.nodes {
            self.nodes = nodes.clone();
        }
        if let Some(labels) = &patch.labels {
            self.labels = labels.clone();
        }
        if let Some(protocols) = &patch.protocols {
            self.protocols = protocols.clone();
        }
        self.date_updated = Utc::now();
    }

    /// 协议的紧凑展示形式，如 `ssh/22 rdp/3389`
    pub fn protocols_display(&self) -> String {
        self.protocols
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn summary(&self) -> AssetSummary {
        AssetSummary {
            id: self.id.clone(),
            hostname: self.hostname.clone(),
            ip: self.ip.clone(),
            platform: self.platform,
            is_active: self.is_active,
            protocols: self.protocols_display(),
        }
    }
}

/// 通过校验的资产写模型（创建/更新共用）
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDraft {
    pub hostname: String,
    pub ip: String,
    pub public_ip: Option<String>,
    pub platform: Platform,
    pub is_active: bool,
    pub domain: Option<DomainId>,
    pub admin_user: Option<AdminUserId>,
    pub protocols: Vec<Protocol>,
    pub nodes: Vec<NodeId>,
    pub labels: Vec<LabelId>,
    pub system_users: Vec<SystemUserId>,
    pub comment: String,
}

/// 批量更新补丁；`None` 表示保持原值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetPatch {
    pub platform: Option<Platform>,
    pub is_active: Option<bool>,
    pub admin_user: Option<AdminUserId>,
    pub domain: Option<DomainId>,
    pub nodes: Option<Vec<NodeId>>,
    pub labels: Option<Vec<LabelId>>,
    pub protocols: Option<Vec<Protocol>>,
}

impl AssetPatch {
    pub fn is_empty(&self) -> bool {
        self == &AssetPatch::default()
    }
}

/// 列表展示用的资产摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSummary {
    pub id: AssetId,
    pub hostname: String,
    pub ip: String,
    pub platform: Platform,
    pub is_active: bool,
    pub protocols: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::protocol::ProtocolName;

    fn draft() -> AssetDraft {
        AssetDraft {
            hostname: "web01".to_string(),
            ip: "10.0.0.1".to_string(),
            public_ip: None,
            platform: Platform::Linux,
            is_active: true,
            domain: None,
            admin_user: None,
            protocols: vec![Protocol::new(ProtocolName::Ssh, 22)],
            nodes: vec![NodeId::from("n-root")],
            labels: vec![],
            system_users: vec![],
            comment: String::new(),
        }
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("windows".parse::<Platform>().unwrap(), Platform::Windows);
        assert_eq!("MacOS".parse::<Platform>().unwrap(), Platform::MacOS);
        assert!("amiga".parse::<Platform>().is_err());
    }

    #[test]
    fn test_from_draft_keeps_fields() {
        let asset = Asset::from_draft(AssetId::from("a-1"), draft(), Some("admin".to_string()));
        assert_eq!(asset.hostname, "web01");
        assert_eq!(asset.protocols_display(), "ssh/22");
        assert_eq!(asset.created_by.as_deref(), Some("admin"));
        assert_eq!(asset.date_created, asset.date_updated);
    }

    #[test]
    fn test_apply_patch_only_touches_given_fields() {
        let mut asset = Asset::from_draft(AssetId::from("a-1"), draft(), None);
        let patch = AssetPatch {
            platform: Some(Platform::Windows),
            protocols: Some(vec![Protocol::new(ProtocolName::Rdp, 3389)]),
            ..Default::default()
        };
        asset.apply_patch(&patch);

        assert_eq!(asset.platform, Platform::Windows);
        assert_eq!(asset.protocols_display(), "rdp/3389");
        assert_eq!(asset.hostname, "web01");
        assert_eq!(asset.nodes, vec![NodeId::from("n-root")]);
    }

    #[test]
    fn test_empty_patch() {
        assert!(AssetPatch::default().is_empty());
        let patch = AssetPatch {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
