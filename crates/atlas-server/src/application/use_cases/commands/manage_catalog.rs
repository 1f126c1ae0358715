use std::sync::Arc;

use atlas_core::core_types::NodeId;
use atlas_core::error::{CoreError, ValidationErrors};
use atlas_core::MAX_NAME_LEN;
use serde::{Deserialize, Serialize};

use crate::application::ports::repositories::{
    DirectoryRepository, LabelRepository, NodeRepository,
};
use crate::domain::models::{AdminUser, Domain, Label, Node, ProtocolName, SystemUser};

pub const MSG_LABEL_TAKEN: &str = "Label with this name already exists.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeForm {
    /// 父节点，缺省为根节点
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemUserForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminUserForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainForm {
    #[serde(default)]
    pub name: String,
}

/// 资产引用目录的维护：节点、标签、系统用户、管理用户、网域
pub struct ManageCatalogUseCase {
    node_repo: Arc<dyn NodeRepository>,
    label_repo: Arc<dyn LabelRepository>,
    directory_repo: Arc<dyn DirectoryRepository>,
}

impl ManageCatalogUseCase {
    pub fn new(
        node_repo: Arc<dyn NodeRepository>,
        label_repo: Arc<dyn LabelRepository>,
        directory_repo: Arc<dyn DirectoryRepository>,
    ) -> Self {
        Self {
            node_repo,
            label_repo,
            directory_repo,
        }
    }

    pub async fn create_node(&self, form: &NodeForm) -> Result<Node, CoreError> {
        let mut errors = ValidationErrors::new();
        let value = required_name(&form.value, "value", &mut errors);

        let parent = match form.parent.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(raw) => match self.node_repo.find(&NodeId::from(raw)).await? {
                Some(node) => Some(node),
                None => {
                    errors.add(
                        "parent",
                        format!(
                            "Select a valid choice. {} is not one of the available choices.",
                            raw
                        ),
                    );
                    None
                }
            },
            None => Some(self.node_repo.ensure_root().await?),
        };
        errors.into_result()?;

        let parent = parent.ok_or_else(|| CoreError::internal("parent node unresolved"))?;
        let node = self.node_repo.create_child(&parent.id, &value).await?;
        tracing::info!(node_id = %node.id, key = %node.key, "node created");
        Ok(node)
    }

    pub async fn create_label(&self, form: &LabelForm) -> Result<Label, CoreError> {
        let mut errors = ValidationErrors::new();
        let name = required_name(&form.name, "name", &mut errors);
        if !name.is_empty() && self.label_repo.find_by_name(&name).await?.is_some() {
            errors.add("name", MSG_LABEL_TAKEN);
        }
        errors.into_result()?;

        let label = self.label_repo.create(&name, form.value.trim()).await?;
        tracing::info!(label_id = %label.id, name = %label.name, "label created");
        Ok(label)
    }

    pub async fn create_system_user(&self, form: &SystemUserForm) -> Result<SystemUser, CoreError> {
        let mut errors = ValidationErrors::new();
        let name = required_name(&form.name, "name", &mut errors);
        let username = required_name(&form.username, "username", &mut errors);
        let protocol = match form.protocol.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            None => ProtocolName::Ssh,
            Some(raw) => raw.parse::<ProtocolName>().unwrap_or_else(|_| {
                errors.add(
                    "protocol",
                    format!(
                        "Select a valid choice. {} is not one of the available choices.",
                        raw
                    ),
                );
                ProtocolName::Ssh
            }),
        };
        errors.into_result()?;

        self.directory_repo
            .create_system_user(&name, &username, protocol)
            .await
    }

    pub async fn create_admin_user(&self, form: &AdminUserForm) -> Result<AdminUser, CoreError> {
        let mut errors = ValidationErrors::new();
        let name = required_name(&form.name, "name", &mut errors);
        let username = required_name(&form.username, "username", &mut errors);
        errors.into_result()?;

        self.directory_repo.create_admin_user(&name, &username).await
    }

    pub async fn create_domain(&self, form: &DomainForm) -> Result<Domain, CoreError> {
        let mut errors = ValidationErrors::new();
        let name = required_name(&form.name, "name", &mut errors);
        errors.into_result()?;

        self.directory_repo.create_domain(&name).await
    }
}

fn required_name(raw: &str, field: &str, errors: &mut ValidationErrors) -> String {
    let value = raw.trim().to_string();
    if value.is_empty() {
        errors.add(field, "This field is required.");
    } else if value.chars().count() > MAX_NAME_LEN {
        errors.add(
            field,
            format!("Ensure this value has at most {} characters.", MAX_NAME_LEN),
        );
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::SqliteStore;

    fn use_case(store: &Arc<SqliteStore>) -> ManageCatalogUseCase {
        ManageCatalogUseCase::new(store.clone(), store.clone(), store.clone())
    }

    #[tokio::test]
    async fn test_duplicate_label_name_rejected() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let uc = use_case(&store);
        let form = LabelForm {
            name: "env".to_string(),
            value: "prod".to_string(),
        };
        uc.create_label(&form).await.unwrap();

        match uc.create_label(&form).await.unwrap_err() {
            CoreError::Validation { errors } => {
                assert_eq!(errors.field("name"), &[MSG_LABEL_TAKEN.to_string()])
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_node_defaults_to_root_parent() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let uc = use_case(&store);

        let first = uc
            .create_node(&NodeForm {
                parent: None,
                value: "prod".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(first.key, "1:1");

        let nested = uc
            .create_node(&NodeForm {
                parent: Some(first.id.to_string()),
                value: "web".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(nested.key, "1:1:1");
        assert_eq!(nested.parent_key(), Some("1:1"));
    }

    #[tokio::test]
    async fn test_unknown_parent_rejected() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let err = use_case(&store)
            .create_node(&NodeForm {
                parent: Some("nowhere".to_string()),
                value: "x".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_system_user_protocol_validated() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let uc = use_case(&store);
        let user = uc
            .create_system_user(&SystemUserForm {
                name: "ops".to_string(),
                username: "root".to_string(),
                protocol: Some("RDP".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(user.protocol, ProtocolName::Rdp);

        assert!(uc
            .create_system_user(&SystemUserForm {
                name: "bad".to_string(),
                username: "x".to_string(),
                protocol: Some("ftp".to_string()),
            })
            .await
            .is_err());
    }
}
