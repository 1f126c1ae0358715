//! 权限模型：调用者、能力与每个操作声明的能力要求

use atlas_core::core_types::{Role, UserId};
use atlas_core::error::CoreError;
use serde::{Deserialize, Serialize};

/// 已解析的调用者身份
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// 能力
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// 已认证且处于有效状态的用户
    ValidUser,
    /// 组织管理员
    OrgAdmin,
}

/// 控制器对外暴露的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListAssets,
    ViewAsset,
    ListAssetUsers,
    ListUserAssets,
    CreateAsset,
    UpdateAsset,
    BulkUpdateAssets,
    DeleteAsset,
    SaveSelection,
    ManageGrants,
    ViewCatalog,
    ManageCatalog,
}

impl Operation {
    /// 操作所需的能力集合（全部满足才放行）
    pub fn required_capabilities(&self) -> &'static [Capability] {
        match self {
            Operation::ViewAsset | Operation::ListUserAssets | Operation::ViewCatalog => {
                &[Capability::ValidUser]
            }
            Operation::ListAssets
            | Operation::ListAssetUsers
            | Operation::CreateAsset
            | Operation::UpdateAsset
            | Operation::BulkUpdateAssets
            | Operation::DeleteAsset
            | Operation::SaveSelection
            | Operation::ManageGrants
            | Operation::ManageCatalog => &[Capability::OrgAdmin],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ListAssets => "list_assets",
            Operation::ViewAsset => "view_asset",
            Operation::ListAssetUsers => "list_asset_users",
            Operation::ListUserAssets => "list_user_assets",
            Operation::CreateAsset => "create_asset",
            Operation::UpdateAsset => "update_asset",
            Operation::BulkUpdateAssets => "bulk_update_assets",
            Operation::DeleteAsset => "delete_asset",
            Operation::SaveSelection => "save_selection",
            Operation::ManageGrants => "manage_grants",
            Operation::ViewCatalog => "view_catalog",
            Operation::ManageCatalog => "manage_catalog",
        }
    }
}

/// 权限闸门
pub trait PermissionGate: Send + Sync {
    /// 校验调用者是否具备全部所需能力
    fn check(&self, caller: Option<&Caller>, required: &[Capability]) -> Result<(), CoreError>;
}

/// 基于角色的默认实现
#[derive(Debug, Default, Clone)]
pub struct RolePermissionGate;

impl PermissionGate for RolePermissionGate {
    fn check(&self, caller: Option<&Caller>, required: &[Capability]) -> Result<(), CoreError> {
        let caller = caller.ok_or(CoreError::Unauthenticated)?;
        for capability in required {
            let granted = match capability {
                Capability::ValidUser => caller.is_active,
                Capability::OrgAdmin => caller.is_active && caller.is_admin(),
            };
            if !granted {
                return Err(CoreError::permission_denied(format!(
                    "{:?} required for user {}",
                    capability, caller.user_id
                )));
            }
        }
        Ok(())
    }
}

/// 分发前的统一闸门：按操作声明的能力校验调用者
pub fn authorize(
    gate: &dyn PermissionGate,
    caller: Option<&Caller>,
    operation: Operation,
) -> Result<(), CoreError> {
    gate.check(caller, operation.required_capabilities())
        .map_err(|e| match e {
            CoreError::PermissionDenied { operation: detail } => CoreError::PermissionDenied {
                operation: format!("{} ({})", operation.as_str(), detail),
            },
            other => other,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role, is_active: bool) -> Caller {
        Caller {
            user_id: UserId::from("u-1"),
            name: "tester".to_string(),
            role,
            is_active,
        }
    }

    #[test]
    fn test_anonymous_is_unauthenticated() {
        let gate = RolePermissionGate;
        let err = authorize(&gate, None, Operation::ViewAsset).unwrap_err();
        assert!(matches!(err, CoreError::Unauthenticated));
    }

    #[test]
    fn test_admin_passes_everything() {
        let gate = RolePermissionGate;
        let admin = caller(Role::Admin, true);
        for op in [
            Operation::ListAssets,
            Operation::CreateAsset,
            Operation::BulkUpdateAssets,
            Operation::DeleteAsset,
            Operation::ViewAsset,
            Operation::ListUserAssets,
        ] {
            assert!(authorize(&gate, Some(&admin), op).is_ok(), "{:?}", op);
        }
    }

    #[test]
    fn test_user_denied_admin_operations() {
        let gate = RolePermissionGate;
        let user = caller(Role::User, true);
        for op in [
            Operation::ListAssets,
            Operation::CreateAsset,
            Operation::UpdateAsset,
            Operation::BulkUpdateAssets,
            Operation::DeleteAsset,
        ] {
            let err = authorize(&gate, Some(&user), op).unwrap_err();
            match err {
                CoreError::PermissionDenied { operation } => {
                    assert!(operation.starts_with(op.as_str()))
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
        assert!(authorize(&gate, Some(&user), Operation::ViewAsset).is_ok());
        assert!(authorize(&gate, Some(&user), Operation::ListUserAssets).is_ok());
    }

    #[test]
    fn test_inactive_user_is_not_valid() {
        let gate = RolePermissionGate;
        let inactive_admin = caller(Role::Admin, false);
        assert!(authorize(&gate, Some(&inactive_admin), Operation::ViewAsset).is_err());
        assert!(authorize(&gate, Some(&inactive_admin), Operation::ListAssets).is_err());
    }
}
