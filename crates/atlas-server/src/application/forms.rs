//! 表单与表单集合的显式校验
//!
//! 校验分两步：先做不依赖存储的字段清洗（格式、取值范围、数量），
//! 再由 [`ReferenceValidator`] 核对引用的节点、标签、系统用户等是否存在。
//! 两步的错误累积到同一个 [`ValidationErrors`]，任何写操作之前完成。

use atlas_core::core_types::{AdminUserId, AssetId, DomainId, LabelId, NodeId, SystemUserId};
use atlas_core::error::{CoreError, ValidationErrors};
use atlas_core::{
    MAX_COMMENT_LEN, MAX_HOSTNAME_LEN, MAX_PROTOCOLS_PER_ASSET, MIN_PROTOCOLS_PER_ASSET,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::IpAddr;

use crate::application::ports::repositories::{
    DirectoryRepository, LabelRepository, NodeRepository,
};
use crate::domain::models::{Asset, AssetDraft, AssetPatch, Platform, Protocol, ProtocolName};

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_INVALID_IP: &str = "Enter a valid IPv4 or IPv6 address.";
pub const MSG_INVALID_NUMBER: &str = "Enter a whole number.";
pub const MSG_PORT_RANGE: &str = "Ensure this value is between 1 and 65535.";

fn invalid_choice(value: &str) -> String {
    format!(
        "Select a valid choice. {} is not one of the available choices.",
        value
    )
}

/// 资产主表单
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetForm {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub admin_user: Option<String>,
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub system_users: Vec<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl AssetForm {
    /// 用已持久化的资产填充表单初值
    pub fn from_asset(asset: &Asset) -> Self {
        Self {
            hostname: asset.hostname.clone(),
            ip: asset.ip.clone(),
            public_ip: asset.public_ip.clone(),
            platform: Some(asset.platform.to_string()),
            is_active: Some(asset.is_active),
            domain: asset.domain.as_ref().map(|d| d.to_string()),
            admin_user: asset.admin_user.as_ref().map(|a| a.to_string()),
            nodes: asset.nodes.iter().map(|n| n.to_string()).collect(),
            labels: asset.labels.iter().map(|l| l.to_string()).collect(),
            system_users: asset.system_users.iter().map(|s| s.to_string()).collect(),
            comment: Some(asset.comment.clone()),
        }
    }
}

/// 端口的原始输入，数字与字符串都接受，取值由清洗阶段判断
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortInput {
    Number(serde_json::Number),
    Text(String),
}

impl From<i64> for PortInput {
    fn from(port: i64) -> Self {
        PortInput::Number(port.into())
    }
}

impl PortInput {
    /// 空字符串视为未填写
    fn is_blank(&self) -> bool {
        matches!(self, PortInput::Text(s) if s.trim().is_empty())
    }

    /// 整数值；超出 i64 的整数按 i128 保留以便报告范围错误
    fn integer(&self) -> Option<i128> {
        match self {
            PortInput::Number(n) => n
                .as_i64()
                .map(i128::from)
                .or_else(|| n.as_u64().map(i128::from))
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.is_finite() && f.fract() == 0.0)
                        .map(|f| f as i128)
                }),
            PortInput::Text(s) => s.trim().parse::<i128>().ok(),
        }
    }
}

/// 协议子表单
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub port: Option<PortInput>,
}

impl From<&Protocol> for ProtocolForm {
    fn from(protocol: &Protocol) -> Self {
        Self {
            name: protocol.name.to_string(),
            port: Some(PortInput::from(i64::from(protocol.port))),
        }
    }
}

impl ProtocolForm {
    /// 新建表单时的默认条目
    pub fn default_entry() -> Self {
        Self::from(&Protocol::new(
            ProtocolName::Ssh,
            ProtocolName::Ssh.default_port(),
        ))
    }
}

/// 创建/更新提交：主表单 + 协议表单集合
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetSubmission {
    #[serde(flatten)]
    pub asset: AssetForm,
    #[serde(default)]
    pub protocols: Vec<ProtocolForm>,
}

impl AssetSubmission {
    /// 字段清洗；返回尽力构造的草稿，是否可用以 `errors` 是否为空为准
    pub fn clean(&self, errors: &mut ValidationErrors) -> AssetDraft {
        let form = &self.asset;

        let hostname = form.hostname.trim().to_string();
        if hostname.is_empty() {
            errors.add("hostname", MSG_REQUIRED);
        } else if hostname.chars().count() > MAX_HOSTNAME_LEN {
            errors.add(
                "hostname",
                format!(
                    "Ensure this value has at most {} characters.",
                    MAX_HOSTNAME_LEN
                ),
            );
        } else if hostname.chars().any(char::is_whitespace) {
            errors.add("hostname", "Hostname may not contain whitespace.");
        }

        let ip = form.ip.trim().to_string();
        if ip.is_empty() {
            errors.add("ip", MSG_REQUIRED);
        } else if ip.parse::<IpAddr>().is_err() {
            errors.add("ip", MSG_INVALID_IP);
        }

        let public_ip = non_blank(form.public_ip.as_deref());
        if let Some(value) = &public_ip {
            if value.parse::<IpAddr>().is_err() {
                errors.add("public_ip", MSG_INVALID_IP);
            }
        }

        let platform = clean_platform(form.platform.as_deref(), errors).unwrap_or_default();

        let nodes: Vec<NodeId> = dedup(&form.nodes);
        if nodes.is_empty() {
            errors.add("nodes", MSG_REQUIRED);
        }

        let comment = form.comment.clone().unwrap_or_default();
        if comment.chars().count() > MAX_COMMENT_LEN {
            errors.add(
                "comment",
                format!(
                    "Ensure this value has at most {} characters.",
                    MAX_COMMENT_LEN
                ),
            );
        }

        let protocols = clean_protocols(&self.protocols, "protocols", errors);

        AssetDraft {
            hostname,
            ip,
            public_ip,
            platform,
            is_active: form.is_active.unwrap_or(true),
            domain: non_blank(form.domain.as_deref()).map(DomainId::from),
            admin_user: non_blank(form.admin_user.as_deref()).map(AdminUserId::from),
            protocols,
            nodes,
            labels: dedup(&form.labels),
            system_users: dedup(&form.system_users),
            comment,
        }
    }
}

/// 批量更新表单：目标资产 + 需要覆盖的字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkUpdateForm {
    #[serde(default)]
    pub assets: Vec<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub admin_user: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub nodes: Option<Vec<String>>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub protocols: Option<Vec<ProtocolForm>>,
}

impl BulkUpdateForm {
    /// 以预选资产初始化（GET 预填）
    pub fn with_assets(assets: &[AssetId]) -> Self {
        Self {
            assets: assets.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }
    }

    /// 字段清洗，返回目标资产与补丁
    pub fn clean(&self, errors: &mut ValidationErrors) -> (Vec<AssetId>, AssetPatch) {
        let assets: Vec<AssetId> = dedup(&self.assets);
        if assets.is_empty() {
            errors.add("assets", MSG_REQUIRED);
        }

        let platform = clean_platform(self.platform.as_deref(), errors);

        let nodes = self.nodes.as_ref().map(|nodes| {
            let nodes: Vec<NodeId> = dedup(nodes);
            if nodes.is_empty() {
                errors.add("nodes", "An asset must belong to at least one node.");
            }
            nodes
        });

        let protocols = self
            .protocols
            .as_ref()
            .map(|forms| clean_protocols(forms, "protocols", errors));

        let patch = AssetPatch {
            platform,
            is_active: self.is_active,
            admin_user: non_blank(self.admin_user.as_deref()).map(AdminUserId::from),
            domain: non_blank(self.domain.as_deref()).map(DomainId::from),
            nodes,
            labels: self.labels.as_ref().map(|labels| dedup(labels)),
            protocols,
        };
        (assets, patch)
    }
}

/// 清洗协议表单集合：数量 1..=5，逐条校验名称与端口
pub fn clean_protocols(
    forms: &[ProtocolForm],
    field: &str,
    errors: &mut ValidationErrors,
) -> Vec<Protocol> {
    if forms.len() < MIN_PROTOCOLS_PER_ASSET {
        errors.add(
            field,
            format!(
                "Please submit {} or more protocols.",
                MIN_PROTOCOLS_PER_ASSET
            ),
        );
    }
    if forms.len() > MAX_PROTOCOLS_PER_ASSET {
        errors.add(
            field,
            format!(
                "Please submit {} or fewer protocols.",
                MAX_PROTOCOLS_PER_ASSET
            ),
        );
    }

    let mut protocols = Vec::with_capacity(forms.len());
    for (i, form) in forms.iter().enumerate() {
        let name_field = format!("{}[{}].name", field, i);
        let port_field = format!("{}[{}].port", field, i);

        let name = if form.name.trim().is_empty() {
            errors.add(name_field, MSG_REQUIRED);
            None
        } else {
            match form.name.parse::<ProtocolName>() {
                Ok(name) => Some(name),
                Err(_) => {
                    errors.add(name_field, invalid_choice(&form.name));
                    None
                }
            }
        };

        let port = match form.port.as_ref().filter(|p| !p.is_blank()) {
            None => {
                errors.add(port_field, MSG_REQUIRED);
                None
            }
            Some(raw) => match raw.integer() {
                Some(port) if (1..=65535).contains(&port) => Some(port as u16),
                Some(_) => {
                    errors.add(port_field, MSG_PORT_RANGE);
                    None
                }
                None => {
                    errors.add(port_field, MSG_INVALID_NUMBER);
                    None
                }
            },
        };

        if let (Some(name), Some(port)) = (name, port) {
            protocols.push(Protocol::new(name, port));
        }
    }
    protocols
}

fn clean_platform(value: Option<&str>, errors: &mut ValidationErrors) -> Option<Platform> {
    let value = non_blank(value)?;
    match value.parse::<Platform>() {
        Ok(platform) => Some(platform),
        Err(_) => {
            errors.add("platform", invalid_choice(&value));
            None
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 去空白、去重并保持提交顺序
fn dedup<T: From<String> + Eq + std::hash::Hash + Clone>(values: &[String]) -> Vec<T> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| T::from(v.to_string()))
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// 引用校验：核对表单引用的实体是否存在
pub struct ReferenceValidator<'a> {
    pub nodes: &'a dyn NodeRepository,
    pub labels: &'a dyn LabelRepository,
    pub directory: &'a dyn DirectoryRepository,
}

impl<'a> ReferenceValidator<'a> {
    pub async fn check_nodes(
        &self,
        ids: &[NodeId],
        errors: &mut ValidationErrors,
    ) -> Result<(), CoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let existing = self.nodes.existing_ids(ids).await?;
        report_missing("nodes", ids, &existing, errors);
        Ok(())
    }

    pub async fn check_labels(
        &self,
        ids: &[LabelId],
        errors: &mut ValidationErrors,
    ) -> Result<(), CoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let existing = self.labels.existing_ids(ids).await?;
        report_missing("labels", ids, &existing, errors);
        Ok(())
    }

    pub async fn check_system_users(
        &self,
        ids: &[SystemUserId],
        errors: &mut ValidationErrors,
    ) -> Result<(), CoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let existing = self.directory.existing_system_user_ids(ids).await?;
        report_missing("system_users", ids, &existing, errors);
        Ok(())
    }

    pub async fn check_admin_user(
        &self,
        id: Option<&AdminUserId>,
        errors: &mut ValidationErrors,
    ) -> Result<(), CoreError> {
        if let Some(id) = id {
            if !self.directory.admin_user_exists(id).await? {
                errors.add("admin_user", invalid_choice(id.as_str()));
            }
        }
        Ok(())
    }

    pub async fn check_domain(
        &self,
        id: Option<&DomainId>,
        errors: &mut ValidationErrors,
    ) -> Result<(), CoreError> {
        if let Some(id) = id {
            if !self.directory.domain_exists(id).await? {
                errors.add("domain", invalid_choice(id.as_str()));
            }
        }
        Ok(())
    }

    /// 草稿中全部引用
    pub async fn check_draft(
        &self,
        draft: &AssetDraft,
        errors: &mut ValidationErrors,
    ) -> Result<(), CoreError> {
        self.check_nodes(&draft.nodes, errors).await?;
        self.check_labels(&draft.labels, errors).await?;
        self.check_system_users(&draft.system_users, errors).await?;
        self.check_admin_user(draft.admin_user.as_ref(), errors)
            .await?;
        self.check_domain(draft.domain.as_ref(), errors).await
    }

    /// 补丁中出现的引用
    pub async fn check_patch(
        &self,
        patch: &AssetPatch,
        errors: &mut ValidationErrors,
    ) -> Result<(), CoreError> {
        if let Some(nodes) = &patch.nodes {
            self.check_nodes(nodes, errors).await?;
        }
        if let Some(labels) = &patch.labels {
            self.check_labels(labels, errors).await?;
        }
        self.check_admin_user(patch.admin_user.as_ref(), errors)
            .await?;
        self.check_domain(patch.domain.as_ref(), errors).await
    }
}

fn report_missing<T: std::fmt::Display + Eq + std::hash::Hash>(
    field: &str,
    ids: &[T],
    existing: &HashSet<T>,
    errors: &mut ValidationErrors,
) {
    for id in ids.iter().filter(|id| !existing.contains(*id)) {
        errors.add(field, invalid_choice(&id.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol(name: &str, port: i64) -> ProtocolForm {
        ProtocolForm {
            name: name.to_string(),
            port: Some(port.into()),
        }
    }

    fn submission(protocols: Vec<ProtocolForm>) -> AssetSubmission {
        AssetSubmission {
            asset: AssetForm {
                hostname: "web01".to_string(),
                ip: "10.0.0.1".to_string(),
                nodes: vec!["n-1".to_string()],
                ..Default::default()
            },
            protocols,
        }
    }

    #[test]
    fn test_valid_submission_cleans_into_draft() {
        let mut errors = ValidationErrors::new();
        let draft = submission(vec![protocol("ssh", 22), protocol("rdp", 3389)]).clean(&mut errors);

        assert!(errors.is_empty(), "{errors}");
        assert_eq!(draft.hostname, "web01");
        assert_eq!(draft.platform, Platform::Linux);
        assert!(draft.is_active);
        assert_eq!(draft.protocols.len(), 2);
        assert_eq!(draft.nodes, vec![NodeId::from("n-1")]);
    }

    #[test]
    fn test_protocol_count_bounds() {
        let mut errors = ValidationErrors::new();
        submission(vec![]).clean(&mut errors);
        assert!(errors.has_field("protocols"));

        let mut errors = ValidationErrors::new();
        submission((0..6).map(|i| protocol("ssh", 22 + i)).collect()).clean(&mut errors);
        assert_eq!(
            errors.field("protocols"),
            &["Please submit 5 or fewer protocols.".to_string()]
        );

        let mut errors = ValidationErrors::new();
        submission((0..5).map(|i| protocol("ssh", 22 + i)).collect()).clean(&mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_protocol_entries_validated_individually() {
        let mut errors = ValidationErrors::new();
        let draft = submission(vec![
            protocol("ssh", 22),
            protocol("gopher", 70),
            protocol("rdp", 70000),
            ProtocolForm {
                name: "vnc".to_string(),
                port: None,
            },
        ])
        .clean(&mut errors);

        assert!(errors.has_field("protocols[1].name"));
        assert!(errors.has_field("protocols[2].port"));
        assert_eq!(errors.field("protocols[3].port"), &[MSG_REQUIRED.to_string()]);
        assert!(!errors.has_field("protocols[0].name"));
        assert_eq!(draft.protocols.len(), 1);
    }

    #[test]
    fn test_primary_form_errors_accumulate() {
        let mut errors = ValidationErrors::new();
        AssetSubmission {
            asset: AssetForm {
                hostname: "  ".to_string(),
                ip: "300.1.1.1".to_string(),
                public_ip: Some("nope".to_string()),
                platform: Some("Amiga".to_string()),
                ..Default::default()
            },
            protocols: vec![],
        }
        .clean(&mut errors);

        for field in ["hostname", "ip", "public_ip", "platform", "nodes", "protocols"] {
            assert!(errors.has_field(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_blank_optional_references_are_none() {
        let mut sub = submission(vec![protocol("ssh", 22)]);
        sub.asset.admin_user = Some("  ".to_string());
        sub.asset.domain = Some(String::new());
        sub.asset.labels = vec!["l-1".to_string(), "l-1".to_string(), " ".to_string()];

        let mut errors = ValidationErrors::new();
        let draft = sub.clean(&mut errors);
        assert!(errors.is_empty());
        assert!(draft.admin_user.is_none());
        assert!(draft.domain.is_none());
        assert_eq!(draft.labels, vec![LabelId::from("l-1")]);
    }

    #[test]
    fn test_bulk_form_requires_assets() {
        let mut errors = ValidationErrors::new();
        let (assets, patch) = BulkUpdateForm::default().clean(&mut errors);
        assert!(assets.is_empty());
        assert!(patch.is_empty());
        assert!(errors.has_field("assets"));
    }

    #[test]
    fn test_bulk_form_builds_patch() {
        let form = BulkUpdateForm {
            assets: vec!["a-1".to_string(), "a-2".to_string()],
            platform: Some("windows".to_string()),
            nodes: Some(vec![]),
            protocols: Some(vec![protocol("rdp", 3389)]),
            ..Default::default()
        };
        let mut errors = ValidationErrors::new();
        let (assets, patch) = form.clean(&mut errors);

        assert_eq!(assets.len(), 2);
        assert_eq!(patch.platform, Some(Platform::Windows));
        assert_eq!(patch.protocols.as_ref().map(Vec::len), Some(1));
        assert!(errors.has_field("nodes"));
        assert!(!errors.has_field("assets"));
    }

    #[test]
    fn test_submission_accepts_flat_json() {
        let raw = serde_json::json!({
            "hostname": "web01",
            "ip": "10.0.0.1",
            "nodes": ["n-1"],
            "protocols": [{"name": "ssh", "port": 22}]
        });
        let sub: AssetSubmission = serde_json::from_value(raw).unwrap();
        assert_eq!(sub.asset.hostname, "web01");
        assert_eq!(sub.protocols, vec![protocol("ssh", 22)]);
    }

    #[test]
    fn test_loosely_typed_ports_become_field_errors() {
        let raw = r#"{
            "hostname": "web01",
            "ip": "10.0.0.1",
            "nodes": ["n-1"],
            "protocols": [
                {"name": "ssh", "port": "22"},
                {"name": "rdp", "port": "abc"},
                {"name": "vnc", "port": 70000000000000000000},
                {"name": "telnet", "port": ""},
                {"name": "ssh", "port": 22.5}
            ]
        }"#;
        let sub: AssetSubmission = serde_json::from_str(raw).unwrap();

        let mut errors = ValidationErrors::new();
        let draft = sub.clean(&mut errors);

        assert!(!errors.has_field("protocols[0].port"));
        assert_eq!(
            errors.field("protocols[1].port"),
            &[MSG_INVALID_NUMBER.to_string()]
        );
        assert_eq!(errors.field("protocols[2].port"), &[MSG_PORT_RANGE.to_string()]);
        assert_eq!(errors.field("protocols[3].port"), &[MSG_REQUIRED.to_string()]);
        assert_eq!(
            errors.field("protocols[4].port"),
            &[MSG_INVALID_NUMBER.to_string()]
        );
        assert_eq!(draft.protocols, vec![Protocol::new(ProtocolName::Ssh, 22)]);
    }
}
