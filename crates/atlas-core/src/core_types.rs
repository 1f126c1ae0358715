use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into,
            Serialize, Deserialize, Default,
        )]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn generate() -> Self {
                Self(uuid::Uuid::now_v7().to_string())
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// 资产 ID
    AssetId
);
string_id!(
    /// 节点 ID
    NodeId
);
string_id!(LabelId);
string_id!(SystemUserId);
string_id!(AdminUserId);
string_id!(DomainId);
string_id!(
    /// 控制台用户 ID（由外部身份系统分配）
    UserId
);
string_id!(
    /// 批量选择令牌（spm）
    SelectionToken
);

/// 控制台角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 组织管理员
    Admin,
    #[default]
    User,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod asset_id_tests {
        use super::*;

        #[test]
        fn test_new_from_str() {
            let id = AssetId::new("asset-001");
            assert_eq!(id.as_str(), "asset-001");
        }

        #[test]
        fn test_generate_is_unique() {
            let id1 = AssetId::generate();
            let id2 = AssetId::generate();
            assert_ne!(id1, id2);
        }

        #[test]
        fn test_generate_is_valid_uuid() {
            let id = AssetId::generate();
            assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
        }

        #[test]
        fn test_display() {
            let id = AssetId::new("web01");
            assert_eq!(format!("{}", id), "web01");
        }

        #[test]
        fn test_serializes_as_plain_string() {
            let id = AssetId::new("a-1");
            assert_eq!(serde_json::to_string(&id).unwrap(), "\"a-1\"");
            let back: AssetId = serde_json::from_str("\"a-1\"").unwrap();
            assert_eq!(back, id);
        }
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn test_into_string() {
        let token = SelectionToken::from("spm-1");
        let raw: String = token.into();
        assert_eq!(raw, "spm-1");
    }

    #[test]
    fn test_ids_order_lexically() {
        let mut ids = vec![NodeId::from("1:2"), NodeId::from("1"), NodeId::from("1:1")];
        ids.sort();
        assert_eq!(ids, vec![NodeId::from("1"), NodeId::from("1:1"), NodeId::from("1:2")]);
    }
}
