use rusqlite::Connection;

/// 版本化迁移，版本号写入 `PRAGMA user_version`
const MIGRATIONS: &[(i64, &str)] = &[(
    1,
    r#"
CREATE TABLE IF NOT EXISTS nodes (
    id           TEXT PRIMARY KEY,
    key          TEXT NOT NULL UNIQUE,
    value        TEXT NOT NULL,
    child_mark   INTEGER NOT NULL DEFAULT 0,
    date_created TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS labels (
    id           TEXT PRIMARY KEY,
    name         TEXT NOT NULL UNIQUE,
    value        TEXT NOT NULL DEFAULT '',
    date_created TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS admin_users (
    id       TEXT PRIMARY KEY,
    name     TEXT NOT NULL UNIQUE,
    username TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS domains (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS system_users (
    id       TEXT PRIMARY KEY,
    name     TEXT NOT NULL UNIQUE,
    username TEXT NOT NULL,
    protocol TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS assets (
    id            TEXT PRIMARY KEY,
    hostname      TEXT NOT NULL UNIQUE,
    ip            TEXT NOT NULL,
    public_ip     TEXT,
    platform      TEXT NOT NULL,
    is_active     INTEGER NOT NULL DEFAULT 1,
    domain_id     TEXT REFERENCES domains(id) ON DELETE SET NULL,
    admin_user_id TEXT REFERENCES admin_users(id) ON DELETE SET NULL,
    comment       TEXT NOT NULL DEFAULT '',
    created_by    TEXT,
    date_created  TEXT NOT NULL,
    date_updated  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS asset_protocols (
    asset_id TEXT NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    name     TEXT NOT NULL,
    port     INTEGER NOT NULL CHECK (port BETWEEN 1 AND 65535),
    PRIMARY KEY (asset_id, position)
);

CREATE TABLE IF NOT EXISTS asset_nodes (
    asset_id TEXT NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
    node_id  TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    PRIMARY KEY (asset_id, node_id)
);

CREATE TABLE IF NOT EXISTS asset_labels (
    asset_id TEXT NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
    label_id TEXT NOT NULL REFERENCES labels(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    PRIMARY KEY (asset_id, label_id)
);

CREATE TABLE IF NOT EXISTS asset_system_users (
    asset_id       TEXT NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
    system_user_id TEXT NOT NULL REFERENCES system_users(id) ON DELETE CASCADE,
    position       INTEGER NOT NULL,
    PRIMARY KEY (asset_id, system_user_id)
);

CREATE TABLE IF NOT EXISTS asset_grants (
    asset_id TEXT NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
    user_id  TEXT NOT NULL,
    PRIMARY KEY (asset_id, user_id)
);

CREATE INDEX IF NOT EXISTS idx_asset_nodes_node ON asset_nodes(node_id);
CREATE INDEX IF NOT EXISTS idx_asset_grants_user ON asset_grants(user_id);
"#,
)];

/// 依次应用尚未执行的迁移，每个版本一个事务
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<()> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for (version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
        tracing::info!(version, "applied store migration");
    }
    Ok(())
}
