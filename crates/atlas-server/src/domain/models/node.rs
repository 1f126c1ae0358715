use atlas_core::core_types::NodeId;
use atlas_core::{NODE_KEY_SEPARATOR, ROOT_NODE_KEY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 资产树节点
///
/// 父子关系编码在 `key` 中：根节点为 `1`，子节点为 `<父键>:<序号>`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub key: String,
    pub value: String,
    /// 已分配的最后一个子节点序号
    pub child_mark: u32,
    pub date_created: DateTime<Utc>,
}

impl Node {
    pub fn is_root(&self) -> bool {
        self.key == ROOT_NODE_KEY
    }

    /// 父节点键；根节点没有父节点
    pub fn parent_key(&self) -> Option<&str> {
        self.key
            .rsplit_once(NODE_KEY_SEPARATOR)
            .map(|(parent, _)| parent)
    }

    /// 层级深度，根为 1
    pub fn level(&self) -> usize {
        self.key.split(NODE_KEY_SEPARATOR).count()
    }

    /// 下一个子节点的键
    pub fn next_child_key(&self) -> String {
        format!("{}{}{}", self.key, NODE_KEY_SEPARATOR, self.child_mark + 1)
    }
}
