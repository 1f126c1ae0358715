use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use atlas_core::core_types::{
    AdminUserId, AssetId, DomainId, LabelId, NodeId, SystemUserId, UserId,
};
use atlas_core::error::CoreError;
use atlas_core::{ROOT_NODE_KEY, ROOT_NODE_VALUE};
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::schema;
use super::utils::{map_sql_err, map_unique_err};
use crate::application::ports::repositories::{
    AssetRepository, DirectoryRepository, LabelRepository, NodeRepository,
};
use crate::domain::models::{
    AdminUser, Asset, AssetDraft, AssetPatch, Domain, Label, Node, Platform, Protocol,
    ProtocolName, SystemUser,
};

const MSG_HOSTNAME_TAKEN: &str = "Asset with this hostname already exists.";
const MSG_NAME_TAKEN: &str = "An entry with this name already exists.";

const ASSET_COLUMNS: &str = "id, hostname, ip, public_ip, platform, is_active, domain_id, \
     admin_user_id, comment, created_by, date_created, date_updated";
const NODE_COLUMNS: &str = "id, key, value, child_mark, date_created";

/// 基于 SQLite 的关系存储，实现全部仓储接口
///
/// 连接由互斥锁保护；闭包同步执行，锁不会跨越 `.await`。
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).map_err(|e| {
            CoreError::store(format!("failed to open sqlite {}: {}", path.display(), e))
        })?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;",
        )
        .map_err(|e| CoreError::store(format!("pragma error: {}", e)))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CoreError::store(format!("failed to open in-memory sqlite: {}", e)))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| CoreError::store(format!("pragma error: {}", e)))?;
        Self::init(conn)
    }

    fn init(mut conn: Connection) -> Result<Self, CoreError> {
        schema::migrate(&mut conn).map_err(map_sql_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, CoreError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| CoreError::store(format!("store lock poisoned: {}", e)))?;
        f(&mut conn)
    }

    /// 协议行总数（运维排查与测试使用）
    pub fn protocol_row_count(&self) -> Result<usize, CoreError> {
        self.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM asset_protocols", [], |row| row.get(0))
                .map_err(map_sql_err)?;
            Ok(count as usize)
        })
    }
}

// --- 行映射 ---

fn conversion_err(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn asset_from_row(row: &Row<'_>) -> rusqlite::Result<Asset> {
    let platform: String = row.get(4)?;
    Ok(Asset {
        id: AssetId::from(row.get::<_, String>(0)?),
        hostname: row.get(1)?,
        ip: row.get(2)?,
        public_ip: row.get(3)?,
        platform: platform
            .parse::<Platform>()
            .map_err(|e| conversion_err(4, e))?,
        is_active: row.get(5)?,
        domain: row.get::<_, Option<String>>(6)?.map(DomainId::from),
        admin_user: row.get::<_, Option<String>>(7)?.map(AdminUserId::from),
        protocols: Vec::new(),
        nodes: Vec::new(),
        labels: Vec::new(),
        system_users: Vec::new(),
        comment: row.get(8)?,
        created_by: row.get(9)?,
        date_created: row.get(10)?,
        date_updated: row.get(11)?,
    })
}

fn node_from_row(row: &Row<'_>) -> rusqlite::Result<Node> {
    Ok(Node {
        id: NodeId::from(row.get::<_, String>(0)?),
        key: row.get(1)?,
        value: row.get(2)?,
        child_mark: row.get(3)?,
        date_created: row.get(4)?,
    })
}

fn label_from_row(row: &Row<'_>) -> rusqlite::Result<Label> {
    Ok(Label {
        id: LabelId::from(row.get::<_, String>(0)?),
        name: row.get(1)?,
        value: row.get(2)?,
        date_created: row.get(3)?,
    })
}

fn system_user_from_row(row: &Row<'_>) -> rusqlite::Result<SystemUser> {
    let protocol: String = row.get(3)?;
    Ok(SystemUser {
        id: SystemUserId::from(row.get::<_, String>(0)?),
        name: row.get(1)?,
        username: row.get(2)?,
        protocol: protocol
            .parse::<ProtocolName>()
            .map_err(|e| conversion_err(3, e))?,
    })
}

// --- 资产读写 ---

fn read_asset(conn: &Connection, id: &AssetId) -> rusqlite::Result<Option<Asset>> {
    let asset = conn
        .query_row(
            &format!("SELECT {} FROM assets WHERE id = ?1", ASSET_COLUMNS),
            params![id.as_str()],
            asset_from_row,
        )
        .optional()?;
    match asset {
        Some(mut asset) => {
            load_relations(conn, &mut asset)?;
            Ok(Some(asset))
        }
        None => Ok(None),
    }
}

fn read_assets(conn: &Connection, sql: &str, param: Option<&str>) -> rusqlite::Result<Vec<Asset>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = match param {
        Some(p) => stmt.query_map(params![p], asset_from_row)?,
        None => stmt.query_map([], asset_from_row)?,
    };
    let mut assets = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    for asset in assets.iter_mut() {
        load_relations(conn, asset)?;
    }
    Ok(assets)
}

fn load_relations(conn: &Connection, asset: &mut Asset) -> rusqlite::Result<()> {
    let id = asset.id.as_str();

    let mut stmt = conn.prepare(
        "SELECT name, port FROM asset_protocols WHERE asset_id = ?1 ORDER BY position",
    )?;
    asset.protocols = stmt
        .query_map(params![id], |row| {
            let name: String = row.get(0)?;
            let name = name
                .parse::<ProtocolName>()
                .map_err(|e| conversion_err(0, e))?;
            Ok(Protocol::new(name, row.get(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    asset.nodes = read_links(conn, "asset_nodes", "node_id", id)?;
    asset.labels = read_links(conn, "asset_labels", "label_id", id)?;
    asset.system_users = read_links(conn, "asset_system_users", "system_user_id", id)?;
    Ok(())
}

fn read_links<T: From<String>>(
    conn: &Connection,
    table: &str,
    column: &str,
    asset_id: &str,
) -> rusqlite::Result<Vec<T>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} WHERE asset_id = ?1 ORDER BY position",
        column, table
    ))?;
    let ids = stmt
        .query_map(params![asset_id], |row| row.get::<_, String>(0))?
        .map(|r| r.map(T::from))
        .collect::<rusqlite::Result<Vec<T>>>()?;
    Ok(ids)
}

fn update_asset_row(conn: &Connection, asset: &Asset) -> Result<usize, CoreError> {
    conn.execute(
        "UPDATE assets SET hostname = ?2, ip = ?3, public_ip = ?4, platform = ?5, is_active = ?6, \
         domain_id = ?7, admin_user_id = ?8, comment = ?9, date_updated = ?10 WHERE id = ?1",
        params![
            asset.id.as_str(),
            asset.hostname,
            asset.ip,
            asset.public_ip,
            asset.platform.as_str(),
            asset.is_active,
            asset.domain.as_ref().map(|d| d.as_str()),
            asset.admin_user.as_ref().map(|a| a.as_str()),
            asset.comment,
            asset.date_updated,
        ],
    )
    .map_err(|e| map_unique_err(e, "hostname", MSG_HOSTNAME_TAKEN))
}

/// 整体替换资产的协议集合与全部关联
fn replace_relations(conn: &Connection, asset: &Asset) -> rusqlite::Result<()> {
    let id = asset.id.as_str();

    conn.execute("DELETE FROM asset_protocols WHERE asset_id = ?1", params![id])?;
    {
        let mut stmt = conn.prepare(
            "INSERT INTO asset_protocols (asset_id, position, name, port) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (position, protocol) in asset.protocols.iter().enumerate() {
            stmt.execute(params![
                id,
                position as i64,
                protocol.name.as_str(),
                protocol.port
            ])?;
        }
    }

    replace_links(conn, "asset_nodes", "node_id", id, &asset.nodes)?;
    replace_links(conn, "asset_labels", "label_id", id, &asset.labels)?;
    replace_links(
        conn,
        "asset_system_users",
        "system_user_id",
        id,
        &asset.system_users,
    )?;
    Ok(())
}

fn replace_links<T: AsRef<str>>(
    conn: &Connection,
    table: &str,
    column: &str,
    asset_id: &str,
    ids: &[T],
) -> rusqlite::Result<()> {
    conn.execute(
        &format!("DELETE FROM {} WHERE asset_id = ?1", table),
        params![asset_id],
    )?;
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} (asset_id, {}, position) VALUES (?1, ?2, ?3)",
        table, column
    ))?;
    for (position, link) in ids.iter().enumerate() {
        stmt.execute(params![asset_id, link.as_ref(), position as i64])?;
    }
    Ok(())
}

fn existing_in<T>(conn: &Connection, table: &str, ids: &[T]) -> rusqlite::Result<HashSet<T>>
where
    T: AsRef<str> + Clone + Eq + std::hash::Hash,
{
    let mut stmt = conn.prepare(&format!("SELECT 1 FROM {} WHERE id = ?1", table))?;
    let mut found = HashSet::new();
    for id in ids {
        if stmt.exists(params![id.as_ref()])? {
            found.insert(id.clone());
        }
    }
    Ok(found)
}

fn asset_not_found(id: &AssetId) -> CoreError {
    CoreError::not_found("Asset", id)
}

#[async_trait]
impl AssetRepository for SqliteStore {
    async fn create(
        &self,
        draft: AssetDraft,
        created_by: Option<String>,
    ) -> Result<Asset, CoreError> {
        let asset = Asset::from_draft(AssetId::generate(), draft, created_by);
        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(map_sql_err)?;
            tx.execute(
                &format!(
                    "INSERT INTO assets ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    ASSET_COLUMNS
                ),
                params![
                    asset.id.as_str(),
                    asset.hostname,
                    asset.ip,
                    asset.public_ip,
                    asset.platform.as_str(),
                    asset.is_active,
                    asset.domain.as_ref().map(|d| d.as_str()),
                    asset.admin_user.as_ref().map(|a| a.as_str()),
                    asset.comment,
                    asset.created_by,
                    asset.date_created,
                    asset.date_updated,
                ],
            )
            .map_err(|e| map_unique_err(e, "hostname", MSG_HOSTNAME_TAKEN))?;
            replace_relations(&tx, &asset).map_err(map_sql_err)?;
            tx.commit().map_err(map_sql_err)
        })?;
        Ok(asset)
    }

    async fn update(&self, id: &AssetId, draft: AssetDraft) -> Result<Asset, CoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(map_sql_err)?;
            let mut asset = read_asset(&tx, id)
                .map_err(map_sql_err)?
                .ok_or_else(|| asset_not_found(id))?;
            asset.apply_draft(draft);
            update_asset_row(&tx, &asset)?;
            replace_relations(&tx, &asset).map_err(map_sql_err)?;
            tx.commit().map_err(map_sql_err)?;
            Ok(asset)
        })
    }

    async fn bulk_update(&self, ids: &[AssetId], patch: &AssetPatch) -> Result<usize, CoreError> {
        self.with_conn(|conn| {
            // 任一步失败时事务随 tx 释放而回滚
            let tx = conn.transaction().map_err(map_sql_err)?;
            for id in ids {
                let mut asset = read_asset(&tx, id)
                    .map_err(map_sql_err)?
                    .ok_or_else(|| asset_not_found(id))?;
                asset.apply_patch(patch);
                update_asset_row(&tx, &asset)?;
                replace_relations(&tx, &asset).map_err(map_sql_err)?;
            }
            tx.commit().map_err(map_sql_err)?;
            Ok(ids.len())
        })
    }

    async fn delete(&self, id: &AssetId) -> Result<Asset, CoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(map_sql_err)?;
            let asset = read_asset(&tx, id)
                .map_err(map_sql_err)?
                .ok_or_else(|| asset_not_found(id))?;
            tx.execute("DELETE FROM assets WHERE id = ?1", params![id.as_str()])
                .map_err(map_sql_err)?;
            tx.commit().map_err(map_sql_err)?;
            Ok(asset)
        })
    }

    async fn get(&self, id: &AssetId) -> Result<Asset, CoreError> {
        self.with_conn(|conn| {
            read_asset(conn, id)
                .map_err(map_sql_err)?
                .ok_or_else(|| asset_not_found(id))
        })
    }

    async fn list(&self) -> Result<Vec<Asset>, CoreError> {
        self.with_conn(|conn| {
            read_assets(
                conn,
                &format!("SELECT {} FROM assets ORDER BY hostname", ASSET_COLUMNS),
                None,
            )
            .map_err(map_sql_err)
        })
    }

    async fn list_granted(&self, user_id: &UserId) -> Result<Vec<Asset>, CoreError> {
        self.with_conn(|conn| {
            read_assets(
                conn,
                &format!(
                    "SELECT {} FROM assets WHERE id IN \
                     (SELECT asset_id FROM asset_grants WHERE user_id = ?1) ORDER BY hostname",
                    ASSET_COLUMNS
                ),
                Some(user_id.as_str()),
            )
            .map_err(map_sql_err)
        })
    }

    async fn hostname_taken(
        &self,
        hostname: &str,
        exclude: Option<&AssetId>,
    ) -> Result<bool, CoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM assets WHERE hostname = ?1 AND id != ?2)",
                params![hostname, exclude.map(|id| id.as_str()).unwrap_or("")],
                |row| row.get(0),
            )
            .map_err(map_sql_err)
        })
    }

    async fn existing_ids(&self, ids: &[AssetId]) -> Result<HashSet<AssetId>, CoreError> {
        self.with_conn(|conn| existing_in(conn, "assets", ids).map_err(map_sql_err))
    }

    async fn grant(&self, id: &AssetId, user_id: &UserId) -> Result<(), CoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO asset_grants (asset_id, user_id) VALUES (?1, ?2)",
                params![id.as_str(), user_id.as_str()],
            )
            .map_err(map_sql_err)?;
            Ok(())
        })
    }

    async fn revoke(&self, id: &AssetId, user_id: &UserId) -> Result<(), CoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM asset_grants WHERE asset_id = ?1 AND user_id = ?2",
                params![id.as_str(), user_id.as_str()],
            )
            .map_err(map_sql_err)?;
            Ok(())
        })
    }
}

fn read_nodes(conn: &Connection, sql: &str, param: Option<&str>) -> rusqlite::Result<Vec<Node>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = match param {
        Some(p) => stmt.query_map(params![p], node_from_row)?,
        None => stmt.query_map([], node_from_row)?,
    };
    rows.collect()
}

fn find_node(conn: &Connection, column: &str, value: &str) -> rusqlite::Result<Option<Node>> {
    conn.query_row(
        &format!("SELECT {} FROM nodes WHERE {} = ?1", NODE_COLUMNS, column),
        params![value],
        node_from_row,
    )
    .optional()
}

#[async_trait]
impl NodeRepository for SqliteStore {
    async fn ensure_root(&self) -> Result<Node, CoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(map_sql_err)?;
            if let Some(root) = find_node(&tx, "key", ROOT_NODE_KEY).map_err(map_sql_err)? {
                return Ok(root);
            }
            let root = Node {
                id: NodeId::generate(),
                key: ROOT_NODE_KEY.to_string(),
                value: ROOT_NODE_VALUE.to_string(),
                child_mark: 0,
                date_created: Utc::now(),
            };
            tx.execute(
                &format!("INSERT INTO nodes ({}) VALUES (?1, ?2, ?3, ?4, ?5)", NODE_COLUMNS),
                params![
                    root.id.as_str(),
                    root.key,
                    root.value,
                    root.child_mark,
                    root.date_created
                ],
            )
            .map_err(map_sql_err)?;
            tx.commit().map_err(map_sql_err)?;
            tracing::info!(node_id = %root.id, "root node created");
            Ok(root)
        })
    }

    async fn find(&self, id: &NodeId) -> Result<Option<Node>, CoreError> {
        self.with_conn(|conn| find_node(conn, "id", id.as_str()).map_err(map_sql_err))
    }

    async fn list(&self) -> Result<Vec<Node>, CoreError> {
        self.with_conn(|conn| {
            read_nodes(
                conn,
                &format!("SELECT {} FROM nodes ORDER BY key", NODE_COLUMNS),
                None,
            )
            .map_err(map_sql_err)
        })
    }

    async fn list_by_key_desc(&self) -> Result<Vec<Node>, CoreError> {
        self.with_conn(|conn| {
            read_nodes(
                conn,
                &format!("SELECT {} FROM nodes ORDER BY key DESC", NODE_COLUMNS),
                None,
            )
            .map_err(map_sql_err)
        })
    }

    async fn list_without_asset(&self, asset_id: &AssetId) -> Result<Vec<Node>, CoreError> {
        self.with_conn(|conn| {
            read_nodes(
                conn,
                &format!(
                    "SELECT {} FROM nodes WHERE id NOT IN \
                     (SELECT node_id FROM asset_nodes WHERE asset_id = ?1) ORDER BY key",
                    NODE_COLUMNS
                ),
                Some(asset_id.as_str()),
            )
            .map_err(map_sql_err)
        })
    }

    async fn create_child(&self, parent: &NodeId, value: &str) -> Result<Node, CoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(map_sql_err)?;
            let parent = find_node(&tx, "id", parent.as_str())
                .map_err(map_sql_err)?
                .ok_or_else(|| CoreError::not_found("Node", parent))?;

            let child = Node {
                id: NodeId::generate(),
                key: parent.next_child_key(),
                value: value.to_string(),
                child_mark: 0,
                date_created: Utc::now(),
            };
            tx.execute(
                "UPDATE nodes SET child_mark = child_mark + 1 WHERE id = ?1",
                params![parent.id.as_str()],
            )
            .map_err(map_sql_err)?;
            tx.execute(
                &format!("INSERT INTO nodes ({}) VALUES (?1, ?2, ?3, ?4, ?5)", NODE_COLUMNS),
                params![
                    child.id.as_str(),
                    child.key,
                    child.value,
                    child.child_mark,
                    child.date_created
                ],
            )
            .map_err(map_sql_err)?;
            tx.commit().map_err(map_sql_err)?;
            Ok(child)
        })
    }

    async fn existing_ids(&self, ids: &[NodeId]) -> Result<HashSet<NodeId>, CoreError> {
        self.with_conn(|conn| existing_in(conn, "nodes", ids).map_err(map_sql_err))
    }
}

#[async_trait]
impl LabelRepository for SqliteStore {
    async fn list(&self) -> Result<Vec<Label>, CoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, name, value, date_created FROM labels ORDER BY name")
                .map_err(map_sql_err)?;
            let labels = stmt
                .query_map([], label_from_row)
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(map_sql_err)?;
            Ok(labels)
        })
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Label>, CoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, value, date_created FROM labels WHERE name = ?1",
                params![name],
                label_from_row,
            )
            .optional()
            .map_err(map_sql_err)
        })
    }

    async fn create(&self, name: &str, value: &str) -> Result<Label, CoreError> {
        let label = Label {
            id: LabelId::generate(),
            name: name.to_string(),
            value: value.to_string(),
            date_created: Utc::now(),
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO labels (id, name, value, date_created) VALUES (?1, ?2, ?3, ?4)",
                params![label.id.as_str(), label.name, label.value, label.date_created],
            )
            .map_err(|e| map_unique_err(e, "name", MSG_NAME_TAKEN))?;
            Ok(())
        })?;
        Ok(label)
    }

    async fn existing_ids(&self, ids: &[LabelId]) -> Result<HashSet<LabelId>, CoreError> {
        self.with_conn(|conn| existing_in(conn, "labels", ids).map_err(map_sql_err))
    }
}

#[async_trait]
impl DirectoryRepository for SqliteStore {
    async fn list_system_users(&self) -> Result<Vec<SystemUser>, CoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, name, username, protocol FROM system_users ORDER BY name")
                .map_err(map_sql_err)?;
            let users = stmt
                .query_map([], system_user_from_row)
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(map_sql_err)?;
            Ok(users)
        })
    }

    async fn list_system_users_of(
        &self,
        asset_id: &AssetId,
    ) -> Result<Vec<SystemUser>, CoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT s.id, s.name, s.username, s.protocol FROM system_users s \
                     JOIN asset_system_users a ON a.system_user_id = s.id \
                     WHERE a.asset_id = ?1 ORDER BY a.position",
                )
                .map_err(map_sql_err)?;
            let users = stmt
                .query_map(params![asset_id.as_str()], system_user_from_row)
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(map_sql_err)?;
            Ok(users)
        })
    }

    async fn list_admin_users(&self) -> Result<Vec<AdminUser>, CoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, name, username FROM admin_users ORDER BY name")
                .map_err(map_sql_err)?;
            let users = stmt
                .query_map([], |row| {
                    Ok(AdminUser {
                        id: AdminUserId::from(row.get::<_, String>(0)?),
                        name: row.get(1)?,
                        username: row.get(2)?,
                    })
                })
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(map_sql_err)?;
            Ok(users)
        })
    }

    async fn list_domains(&self) -> Result<Vec<Domain>, CoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, name FROM domains ORDER BY name")
                .map_err(map_sql_err)?;
            let domains = stmt
                .query_map([], |row| {
                    Ok(Domain {
                        id: DomainId::from(row.get::<_, String>(0)?),
                        name: row.get(1)?,
                    })
                })
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(map_sql_err)?;
            Ok(domains)
        })
    }

    async fn create_system_user(
        &self,
        name: &str,
        username: &str,
        protocol: ProtocolName,
    ) -> Result<SystemUser, CoreError> {
        let user = SystemUser {
            id: SystemUserId::generate(),
            name: name.to_string(),
            username: username.to_string(),
            protocol,
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO system_users (id, name, username, protocol) VALUES (?1, ?2, ?3, ?4)",
                params![
                    user.id.as_str(),
                    user.name,
                    user.username,
                    user.protocol.as_str()
                ],
            )
            .map_err(|e| map_unique_err(e, "name", MSG_NAME_TAKEN))?;
            Ok(())
        })?;
        Ok(user)
    }

    async fn create_admin_user(
        &self,
        name: &str,
        username: &str,
    ) -> Result<AdminUser, CoreError> {
        let user = AdminUser {
            id: AdminUserId::generate(),
            name: name.to_string(),
            username: username.to_string(),
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO admin_users (id, name, username) VALUES (?1, ?2, ?3)",
                params![user.id.as_str(), user.name, user.username],
            )
            .map_err(|e| map_unique_err(e, "name", MSG_NAME_TAKEN))?;
            Ok(())
        })?;
        Ok(user)
    }

    async fn create_domain(&self, name: &str) -> Result<Domain, CoreError> {
        let domain = Domain {
            id: DomainId::generate(),
            name: name.to_string(),
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO domains (id, name) VALUES (?1, ?2)",
                params![domain.id.as_str(), domain.name],
            )
            .map_err(|e| map_unique_err(e, "name", MSG_NAME_TAKEN))?;
            Ok(())
        })?;
        Ok(domain)
    }

    async fn existing_system_user_ids(
        &self,
        ids: &[SystemUserId],
    ) -> Result<HashSet<SystemUserId>, CoreError> {
        self.with_conn(|conn| existing_in(conn, "system_users", ids).map_err(map_sql_err))
    }

    async fn admin_user_exists(&self, id: &AdminUserId) -> Result<bool, CoreError> {
        self.with_conn(|conn| {
            Ok(existing_in(conn, "admin_users", std::slice::from_ref(id))
                .map_err(map_sql_err)?
                .contains(id))
        })
    }

    async fn domain_exists(&self, id: &DomainId) -> Result<bool, CoreError> {
        self.with_conn(|conn| {
            Ok(existing_in(conn, "domains", std::slice::from_ref(id))
                .map_err(map_sql_err)?
                .contains(id))
        })
    }
}
