//! DuckDB store for the catalog and per-player progress.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use arrow::array::{Array, BooleanArray, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use arsenal_core::{
    CatalogEntry, CatalogItem, CatalogSnapshot, Category, CombatStats, IntrinsicsState,
    LoadoutAssignment, MasteryRecord, NodeCompletionRecord, NodeEntry, Platform, Player,
    StarChartNode,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use duckdb::{Connection, params};
use tracing::{debug, info};

use crate::{CatalogStore, ProgressStore, StoreError};

const SCHEMA: &str = "
CREATE SEQUENCE IF NOT EXISTS catalog_item_ids START 1;
CREATE SEQUENCE IF NOT EXISTS star_chart_node_ids START 1;
CREATE SEQUENCE IF NOT EXISTS player_ids START 1;

CREATE TABLE IF NOT EXISTS catalog_meta (
    id INTEGER PRIMARY KEY,
    version BIGINT NOT NULL
);
INSERT INTO catalog_meta VALUES (1, 0) ON CONFLICT DO NOTHING;

CREATE TABLE IF NOT EXISTS catalog_items (
    id BIGINT PRIMARY KEY DEFAULT nextval('catalog_item_ids'),
    natural_key VARCHAR NOT NULL UNIQUE,
    name VARCHAR NOT NULL,
    category VARCHAR NOT NULL,
    progression_cap BIGINT NOT NULL,
    is_premium_variant BOOLEAN NOT NULL
);

CREATE TABLE IF NOT EXISTS star_chart_nodes (
    id BIGINT PRIMARY KEY DEFAULT nextval('star_chart_node_ids'),
    natural_key VARCHAR NOT NULL UNIQUE,
    name VARCHAR NOT NULL,
    region VARCHAR NOT NULL,
    fixed_reward BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS players (
    id BIGINT PRIMARY KEY DEFAULT nextval('player_ids'),
    natural_id VARCHAR NOT NULL,
    platform VARCHAR NOT NULL,
    display_name VARCHAR,
    last_sync_micros BIGINT,
    UNIQUE (natural_id, platform)
);

CREATE TABLE IF NOT EXISTS mastery_records (
    player_id BIGINT NOT NULL,
    item_id BIGINT NOT NULL,
    xp BIGINT NOT NULL,
    mastery_rank BIGINT NOT NULL,
    fired BIGINT,
    hits BIGINT,
    kills BIGINT,
    headshots BIGINT,
    equip_time BIGINT,
    assists BIGINT,
    PRIMARY KEY (player_id, item_id)
);

CREATE TABLE IF NOT EXISTS loadouts (
    player_id BIGINT PRIMARY KEY,
    frame_id BIGINT,
    primary_id BIGINT,
    secondary_id BIGINT,
    melee_id BIGINT,
    focus VARCHAR
);

CREATE TABLE IF NOT EXISTS intrinsics (
    player_id BIGINT PRIMARY KEY,
    railjack BIGINT NOT NULL,
    drifter BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS node_completions (
    player_id BIGINT NOT NULL,
    node_id BIGINT NOT NULL,
    steel_path BOOLEAN NOT NULL,
    completes BIGINT NOT NULL,
    PRIMARY KEY (player_id, node_id, steel_path)
);
";

/// DuckDB store for the canonical catalog and per-player progress.
///
/// Unique constraints mirror the record keys: catalog rows on natural key,
/// mastery on `(player_id, item_id)`, node completions on
/// `(player_id, node_id, steel_path)`. Every write is an
/// `INSERT … ON CONFLICT DO UPDATE`, so repeated syncs converge.
///
/// Reads go through Arrow record batches and are decoded column by column.
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
pub struct DuckStore {
    conn: Mutex<Connection>,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened arsenal database");
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Other("duckdb connection lock poisoned".into()))
    }

    fn query(
        &self,
        sql: &str,
        params: impl duckdb::Params,
    ) -> Result<Vec<RecordBatch>, StoreError> {
        let conn = self.conn()?;
        query_batches(&conn, sql, params)
    }

    /// Current catalog version.
    pub fn catalog_version(&self) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        read_catalog_version(&conn)
    }

    /// Number of rows in `table`.
    pub fn count_table(&self, table: &str) -> Result<usize, StoreError> {
        let sql = format!("SELECT count(*)::BIGINT AS cnt FROM {table}");
        let batches = self.query(&sql, [])?;
        let batch = batches.first().ok_or(StoreError::NoResults)?;
        let col = int_col(batch, "cnt")?;
        Ok(col.value(0) as usize)
    }

    fn bump_catalog_version(conn: &Connection) -> Result<u64, StoreError> {
        conn.execute("UPDATE catalog_meta SET version = version + 1 WHERE id = 1", [])?;
        let version: i64 =
            conn.query_row("SELECT version FROM catalog_meta WHERE id = 1", [], |row| row.get(0))?;
        to_u64("version", version)
    }

    fn decode_players(batches: &[RecordBatch]) -> Result<Vec<Player>, StoreError> {
        let mut players = Vec::new();
        for batch in batches {
            let id = int_col(batch, "id")?;
            let natural_id = str_col(batch, "natural_id")?;
            let platform = str_col(batch, "platform")?;
            let display_name = str_col(batch, "display_name")?;
            let last_sync = int_col(batch, "last_sync_micros")?;
            for row in 0..batch.num_rows() {
                let platform = platform
                    .value(row)
                    .parse::<Platform>()
                    .map_err(|e| invalid("platform", e.0))?;
                let last_sync = match opt_int(last_sync, row) {
                    Some(micros) => Some(
                        DateTime::<Utc>::from_timestamp_micros(micros)
                            .ok_or_else(|| invalid("last_sync_micros", micros))?,
                    ),
                    None => None,
                };
                players.push(Player {
                    id: id.value(row),
                    natural_id: natural_id.value(row).to_string(),
                    platform,
                    display_name: opt_str(display_name, row),
                    last_sync,
                });
            }
        }
        Ok(players)
    }

    fn find_player(
        &self,
        natural_id: &str,
        platform: Platform,
    ) -> Result<Option<Player>, StoreError> {
        let batches = self.query(
            "SELECT id, natural_id, platform, display_name, last_sync_micros
             FROM players WHERE natural_id = ? AND platform = ?",
            params![natural_id, platform.as_str()],
        )?;
        Ok(Self::decode_players(&batches)?.into_iter().next())
    }

    fn update_player(
        &self,
        sql: &str,
        params: impl duckdb::Params,
        player_id: i64,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(sql, params)?;
        if changed == 0 {
            return Err(StoreError::PlayerNotFound(player_id));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for DuckStore {
    async fn upsert_items(&self, items: &[CatalogItem]) -> Result<u64, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO catalog_items
                    (natural_key, name, category, progression_cap, is_premium_variant)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT (natural_key) DO UPDATE SET
                    name = excluded.name,
                    category = excluded.category,
                    progression_cap = excluded.progression_cap,
                    is_premium_variant = excluded.is_premium_variant",
            )?;
            for item in items {
                stmt.execute(params![
                    item.natural_key,
                    item.name,
                    item.category.as_str(),
                    i64::from(item.progression_cap),
                    item.is_premium_variant,
                ])?;
            }
        }
        let version = Self::bump_catalog_version(&tx)?;
        tx.commit()?;
        info!(count = items.len(), version, "upserted catalog items");
        Ok(version)
    }

    async fn upsert_nodes(&self, nodes: &[StarChartNode]) -> Result<u64, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO star_chart_nodes (natural_key, name, region, fixed_reward)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT (natural_key) DO UPDATE SET
                    name = excluded.name,
                    region = excluded.region,
                    fixed_reward = excluded.fixed_reward",
            )?;
            for node in nodes {
                stmt.execute(params![
                    node.natural_key,
                    node.name,
                    node.region,
                    to_i64(node.fixed_reward),
                ])?;
            }
        }
        let version = Self::bump_catalog_version(&tx)?;
        tx.commit()?;
        info!(count = nodes.len(), version, "upserted star chart nodes");
        Ok(version)
    }

    async fn load_catalog(&self) -> Result<CatalogSnapshot, StoreError> {
        // Version and rows are read in one transaction under one lock, so a
        // concurrent upsert lands either wholly before or wholly after.
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let version = read_catalog_version(&tx)?;
        let items = decode_items(&query_batches(
            &tx,
            "SELECT id, natural_key, name, category, progression_cap, is_premium_variant
             FROM catalog_items",
            [],
        )?)?;
        let nodes = decode_nodes(&query_batches(
            &tx,
            "SELECT id, natural_key, name, region, fixed_reward FROM star_chart_nodes",
            [],
        )?)?;
        tx.commit()?;

        debug!(version, items = items.len(), nodes = nodes.len(), "loaded catalog");
        Ok(CatalogSnapshot::new(version, items, nodes))
    }
}

#[async_trait]
impl ProgressStore for DuckStore {
    async fn register_player(
        &self,
        natural_id: &str,
        platform: Platform,
    ) -> Result<Player, StoreError> {
        {
            let conn = self.conn()?;
            conn.execute(
                "INSERT INTO players (natural_id, platform) VALUES (?, ?)
                 ON CONFLICT (natural_id, platform) DO NOTHING",
                params![natural_id, platform.as_str()],
            )?;
        }
        self.find_player(natural_id, platform)?
            .ok_or(StoreError::NoResults)
    }

    async fn player(&self, player_id: i64) -> Result<Option<Player>, StoreError> {
        let batches = self.query(
            "SELECT id, natural_id, platform, display_name, last_sync_micros
             FROM players WHERE id = ?",
            [player_id],
        )?;
        Ok(Self::decode_players(&batches)?.into_iter().next())
    }

    async fn upsert_mastery(&self, records: &[MasteryRecord]) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO mastery_records
                    (player_id, item_id, xp, mastery_rank, fired, hits, kills, headshots, equip_time, assists)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT (player_id, item_id) DO UPDATE SET
                    xp = excluded.xp,
                    mastery_rank = excluded.mastery_rank,
                    fired = excluded.fired,
                    hits = excluded.hits,
                    kills = excluded.kills,
                    headshots = excluded.headshots,
                    equip_time = excluded.equip_time,
                    assists = excluded.assists",
            )?;
            for r in records {
                let s = &r.stats;
                stmt.execute(params![
                    r.player_id,
                    r.item_id,
                    to_i64(r.xp),
                    i64::from(r.rank),
                    s.fired.map(to_i64),
                    s.hits.map(to_i64),
                    s.kills.map(to_i64),
                    s.headshots.map(to_i64),
                    s.equip_time.map(to_i64),
                    s.assists.map(to_i64),
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    async fn replace_loadout(&self, loadout: &LoadoutAssignment) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO loadouts (player_id, frame_id, primary_id, secondary_id, melee_id, focus)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (player_id) DO UPDATE SET
                frame_id = excluded.frame_id,
                primary_id = excluded.primary_id,
                secondary_id = excluded.secondary_id,
                melee_id = excluded.melee_id,
                focus = excluded.focus",
            params![
                loadout.player_id,
                loadout.frame_id,
                loadout.primary_id,
                loadout.secondary_id,
                loadout.melee_id,
                loadout.focus,
            ],
        )?;
        Ok(())
    }

    async fn replace_intrinsics(&self, intrinsics: &IntrinsicsState) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO intrinsics (player_id, railjack, drifter) VALUES (?, ?, ?)
             ON CONFLICT (player_id) DO UPDATE SET
                railjack = excluded.railjack,
                drifter = excluded.drifter",
            params![
                intrinsics.player_id,
                i64::from(intrinsics.railjack),
                i64::from(intrinsics.drifter),
            ],
        )?;
        Ok(())
    }

    async fn upsert_node_completions(
        &self,
        completions: &[NodeCompletionRecord],
    ) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO node_completions (player_id, node_id, steel_path, completes)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT (player_id, node_id, steel_path) DO UPDATE SET
                    completes = excluded.completes",
            )?;
            for c in completions {
                stmt.execute(params![
                    c.player_id,
                    c.node_id,
                    c.steel_path,
                    i64::from(c.completes)
                ])?;
            }
        }
        tx.commit()?;
        Ok(completions.len())
    }

    async fn update_last_sync(&self, player_id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.update_player(
            "UPDATE players SET last_sync_micros = ? WHERE id = ?",
            params![at.timestamp_micros(), player_id],
            player_id,
        )
    }

    async fn update_display_name(&self, player_id: i64, name: &str) -> Result<(), StoreError> {
        self.update_player(
            "UPDATE players SET display_name = ? WHERE id = ?",
            params![name, player_id],
            player_id,
        )
    }

    async fn mastery_records(&self, player_id: i64) -> Result<Vec<MasteryRecord>, StoreError> {
        let batches = self.query(
            "SELECT player_id, item_id, xp, mastery_rank, fired, hits, kills, headshots, equip_time, assists
             FROM mastery_records WHERE player_id = ? ORDER BY item_id",
            [player_id],
        )?;
        let mut records = Vec::new();
        for batch in &batches {
            let player = int_col(batch, "player_id")?;
            let item = int_col(batch, "item_id")?;
            let xp = int_col(batch, "xp")?;
            let rank = int_col(batch, "mastery_rank")?;
            let fired = int_col(batch, "fired")?;
            let hits = int_col(batch, "hits")?;
            let kills = int_col(batch, "kills")?;
            let headshots = int_col(batch, "headshots")?;
            let equip_time = int_col(batch, "equip_time")?;
            let assists = int_col(batch, "assists")?;
            for row in 0..batch.num_rows() {
                records.push(MasteryRecord {
                    player_id: player.value(row),
                    item_id: item.value(row),
                    xp: to_u64("xp", xp.value(row))?,
                    rank: to_u32("mastery_rank", rank.value(row))?,
                    stats: CombatStats {
                        fired: opt_u64("fired", fired, row)?,
                        hits: opt_u64("hits", hits, row)?,
                        kills: opt_u64("kills", kills, row)?,
                        headshots: opt_u64("headshots", headshots, row)?,
                        equip_time: opt_u64("equip_time", equip_time, row)?,
                        assists: opt_u64("assists", assists, row)?,
                    },
                });
            }
        }
        Ok(records)
    }

    async fn node_completions(
        &self,
        player_id: i64,
    ) -> Result<Vec<NodeCompletionRecord>, StoreError> {
        let batches = self.query(
            "SELECT player_id, node_id, steel_path, completes
             FROM node_completions WHERE player_id = ? ORDER BY node_id, steel_path",
            [player_id],
        )?;
        let mut completions = Vec::new();
        for batch in &batches {
            let player = int_col(batch, "player_id")?;
            let node = int_col(batch, "node_id")?;
            let steel = bool_col(batch, "steel_path")?;
            let completes = int_col(batch, "completes")?;
            for row in 0..batch.num_rows() {
                completions.push(NodeCompletionRecord {
                    player_id: player.value(row),
                    node_id: node.value(row),
                    steel_path: steel.value(row),
                    completes: to_u32("completes", completes.value(row))?,
                });
            }
        }
        Ok(completions)
    }

    async fn loadout(&self, player_id: i64) -> Result<Option<LoadoutAssignment>, StoreError> {
        let batches = self.query(
            "SELECT player_id, frame_id, primary_id, secondary_id, melee_id, focus
             FROM loadouts WHERE player_id = ?",
            [player_id],
        )?;
        let Some(batch) = batches.iter().find(|b| b.num_rows() > 0) else {
            return Ok(None);
        };
        let frame = int_col(batch, "frame_id")?;
        let primary = int_col(batch, "primary_id")?;
        let secondary = int_col(batch, "secondary_id")?;
        let melee = int_col(batch, "melee_id")?;
        let focus = str_col(batch, "focus")?;
        Ok(Some(LoadoutAssignment {
            player_id: int_col(batch, "player_id")?.value(0),
            frame_id: opt_int(frame, 0),
            primary_id: opt_int(primary, 0),
            secondary_id: opt_int(secondary, 0),
            melee_id: opt_int(melee, 0),
            focus: opt_str(focus, 0),
        }))
    }

    async fn intrinsics(&self, player_id: i64) -> Result<Option<IntrinsicsState>, StoreError> {
        let batches = self.query(
            "SELECT player_id, railjack, drifter FROM intrinsics WHERE player_id = ?",
            [player_id],
        )?;
        let Some(batch) = batches.iter().find(|b| b.num_rows() > 0) else {
            return Ok(None);
        };
        Ok(Some(IntrinsicsState {
            player_id: int_col(batch, "player_id")?.value(0),
            railjack: to_u32("railjack", int_col(batch, "railjack")?.value(0))?,
            drifter: to_u32("drifter", int_col(batch, "drifter")?.value(0))?,
        }))
    }
}

fn query_batches(
    conn: &Connection,
    sql: &str,
    params: impl duckdb::Params,
) -> Result<Vec<RecordBatch>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let batches: Vec<RecordBatch> = stmt.query_arrow(params)?.collect();
    Ok(batches)
}

fn read_catalog_version(conn: &Connection) -> Result<u64, StoreError> {
    let batches = query_batches(conn, "SELECT version FROM catalog_meta WHERE id = 1", [])?;
    let batch = batches
        .iter()
        .find(|b| b.num_rows() > 0)
        .ok_or(StoreError::NoResults)?;
    to_u64("version", int_col(batch, "version")?.value(0))
}

fn decode_items(batches: &[RecordBatch]) -> Result<Vec<CatalogEntry>, StoreError> {
    let mut items = Vec::new();
    for batch in batches {
        let id = int_col(batch, "id")?;
        let key = str_col(batch, "natural_key")?;
        let name = str_col(batch, "name")?;
        let category = str_col(batch, "category")?;
        let cap = int_col(batch, "progression_cap")?;
        let premium = bool_col(batch, "is_premium_variant")?;
        for row in 0..batch.num_rows() {
            let category = category
                .value(row)
                .parse::<Category>()
                .map_err(|e| invalid("category", e.0))?;
            items.push(CatalogEntry {
                id: id.value(row),
                item: CatalogItem {
                    natural_key: key.value(row).to_string(),
                    name: name.value(row).to_string(),
                    category,
                    progression_cap: to_u32("progression_cap", cap.value(row))?,
                    is_premium_variant: premium.value(row),
                },
            });
        }
    }
    Ok(items)
}

fn decode_nodes(batches: &[RecordBatch]) -> Result<Vec<NodeEntry>, StoreError> {
    let mut nodes = Vec::new();
    for batch in batches {
        let id = int_col(batch, "id")?;
        let key = str_col(batch, "natural_key")?;
        let name = str_col(batch, "name")?;
        let region = str_col(batch, "region")?;
        let reward = int_col(batch, "fixed_reward")?;
        for row in 0..batch.num_rows() {
            nodes.push(NodeEntry {
                id: id.value(row),
                node: StarChartNode {
                    natural_key: key.value(row).to_string(),
                    name: name.value(row).to_string(),
                    region: region.value(row).to_string(),
                    fixed_reward: to_u64("fixed_reward", reward.value(row))?,
                },
            });
        }
    }
    Ok(nodes)
}

// ── Column decoding ──

fn column<'a, A: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a A, StoreError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<A>())
        .ok_or_else(|| StoreError::Other(format!("column {name} missing or not the expected type")))
}

fn int_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array, StoreError> {
    column::<Int64Array>(batch, name)
}

fn str_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, StoreError> {
    column::<StringArray>(batch, name)
}

fn bool_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a BooleanArray, StoreError> {
    column::<BooleanArray>(batch, name)
}

fn opt_int(col: &Int64Array, row: usize) -> Option<i64> {
    col.is_valid(row).then(|| col.value(row))
}

fn opt_str(col: &StringArray, row: usize) -> Option<String> {
    col.is_valid(row).then(|| col.value(row).to_string())
}

fn opt_u64(column: &'static str, col: &Int64Array, row: usize) -> Result<Option<u64>, StoreError> {
    opt_int(col, row).map(|v| to_u64(column, v)).transpose()
}

fn invalid(column: &'static str, value: impl ToString) -> StoreError {
    StoreError::InvalidValue {
        column,
        value: value.to_string(),
    }
}

fn to_u64(column: &'static str, value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| invalid(column, value))
}

fn to_u32(column: &'static str, value: i64) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| invalid(column, value))
}

/// Values beyond `i64::MAX` are stored saturated.
fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn item(key: &str, category: Category, cap: u32) -> CatalogItem {
        CatalogItem {
            natural_key: key.into(),
            name: key.rsplit('/').next().unwrap_or(key).into(),
            category,
            progression_cap: cap,
            is_premium_variant: false,
        }
    }

    fn node(key: &str, region: &str, reward: u64) -> StarChartNode {
        StarChartNode {
            natural_key: key.into(),
            name: key.into(),
            region: region.into(),
            fixed_reward: reward,
        }
    }

    #[test]
    fn open_in_memory_creates_schema() {
        let store = DuckStore::open().unwrap();
        assert_eq!(store.count_table("catalog_items").unwrap(), 0);
        assert_eq!(store.count_table("node_completions").unwrap(), 0);
        assert_eq!(store.catalog_version().unwrap(), 0);
    }

    #[tokio::test]
    async fn catalog_upsert_and_load() {
        let store = DuckStore::open().unwrap();
        let v1 = store
            .upsert_items(&[
                item("/Lotus/Powersuits/Excalibur/Excalibur", Category::Warframe, 30),
                item("/Lotus/Weapons/Tenno/Rifle/Rifle", Category::Primary, 30),
            ])
            .await
            .unwrap();
        let v2 = store
            .upsert_items(&[item("/Lotus/Weapons/Tenno/Rifle/Rifle", Category::Primary, 40)])
            .await
            .unwrap();
        let v3 = store
            .upsert_nodes(&[node("SolNode27", "Earth", 24)])
            .await
            .unwrap();
        assert!(v1 < v2 && v2 < v3);

        let catalog = store.load_catalog().await.unwrap();
        assert_eq!(catalog.version(), v3);
        assert_eq!(catalog.item_count(), 2);
        assert_eq!(catalog.node_count(), 1);
        let rifle = catalog
            .item_by_natural_key("/Lotus/Weapons/Tenno/Rifle/Rifle")
            .unwrap();
        assert_eq!(rifle.item.progression_cap, 40);
        assert_eq!(rifle.item.category, Category::Primary);
        assert_eq!(catalog.node_by_natural_key("SolNode27").unwrap().node.fixed_reward, 24);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn catalog_snapshot_version_matches_rows_under_concurrent_upserts() {
        let store = Arc::new(DuckStore::open().unwrap());
        let writer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for i in 0..25 {
                    let key = format!("/Lotus/Weapons/Tenno/Rifle/Rifle{i}");
                    store
                        .upsert_items(&[item(&key, Category::Primary, 30)])
                        .await
                        .unwrap();
                }
            })
        };

        // Each upsert adds one new item and bumps the version once.
        while !writer.is_finished() {
            let catalog = store.load_catalog().await.unwrap();
            assert_eq!(catalog.item_count() as u64, catalog.version());
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();

        let catalog = store.load_catalog().await.unwrap();
        assert_eq!(catalog.version(), 25);
        assert_eq!(catalog.item_count(), 25);
    }

    #[tokio::test]
    async fn player_registration_and_updates() {
        let store = DuckStore::open().unwrap();
        let player = store.register_player("tenno", Platform::Pc).await.unwrap();
        let again = store.register_player("tenno", Platform::Pc).await.unwrap();
        assert_eq!(player.id, again.id);
        assert!(player.last_sync.is_none());

        let at = DateTime::<Utc>::from_timestamp_micros(1_760_000_000_000_000).unwrap();
        store.update_last_sync(player.id, at).await.unwrap();
        store.update_display_name(player.id, "Tenno123").await.unwrap();

        let stored = store.player(player.id).await.unwrap().unwrap();
        assert_eq!(stored.last_sync, Some(at));
        assert_eq!(stored.display_name.as_deref(), Some("Tenno123"));

        let missing = store.update_display_name(999, "ghost").await;
        assert!(matches!(missing, Err(StoreError::PlayerNotFound(999))));
        assert!(store.player(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mastery_upsert_overwrites_every_field() {
        let store = DuckStore::open().unwrap();
        let first = MasteryRecord {
            player_id: 1,
            item_id: 5,
            xp: 112_500,
            rank: 15,
            stats: CombatStats {
                kills: Some(10),
                fired: Some(100),
                ..CombatStats::default()
            },
        };
        store.upsert_mastery(&[first]).await.unwrap();

        let second = MasteryRecord {
            player_id: 1,
            item_id: 5,
            xp: 450_000,
            rank: 30,
            stats: CombatStats::default(),
        };
        store.upsert_mastery(&[second.clone()]).await.unwrap();

        assert_eq!(store.count_table("mastery_records").unwrap(), 1);
        assert_eq!(store.mastery_records(1).await.unwrap(), vec![second]);
    }

    #[tokio::test]
    async fn loadout_and_intrinsics_replace() {
        let store = DuckStore::open().unwrap();
        assert!(store.loadout(1).await.unwrap().is_none());
        assert!(store.intrinsics(1).await.unwrap().is_none());

        let mut loadout = LoadoutAssignment {
            player_id: 1,
            frame_id: Some(3),
            primary_id: Some(4),
            secondary_id: None,
            melee_id: None,
            focus: Some("Zenurik".into()),
        };
        store.replace_loadout(&loadout).await.unwrap();
        loadout.frame_id = None;
        loadout.focus = None;
        store.replace_loadout(&loadout).await.unwrap();
        assert_eq!(store.loadout(1).await.unwrap(), Some(loadout));

        let intrinsics = IntrinsicsState {
            player_id: 1,
            railjack: 60,
            drifter: 45,
        };
        store.replace_intrinsics(&intrinsics).await.unwrap();
        assert_eq!(store.intrinsics(1).await.unwrap(), Some(intrinsics));
    }

    #[tokio::test]
    async fn node_completions_keep_modes_apart() {
        let store = DuckStore::open().unwrap();
        let rows = [
            NodeCompletionRecord {
                player_id: 1,
                node_id: 8,
                steel_path: false,
                completes: 5,
            },
            NodeCompletionRecord {
                player_id: 1,
                node_id: 8,
                steel_path: true,
                completes: 5,
            },
        ];
        store.upsert_node_completions(&rows).await.unwrap();
        store.upsert_node_completions(&rows).await.unwrap();
        assert_eq!(store.node_completions(1).await.unwrap(), rows.to_vec());
    }

    #[tokio::test]
    async fn persistent_reopen_keeps_data() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("arsenal.duckdb");

        let store = DuckStore::open_persistent(&db_path).unwrap();
        assert!(db_path.exists());
        store
            .upsert_items(&[item("/Lotus/Weapons/Tenno/Rifle/Rifle", Category::Primary, 30)])
            .await
            .unwrap();
        let player = store.register_player("tenno", Platform::Xbox).await.unwrap();
        drop(store);

        let store = DuckStore::open_persistent(&db_path).unwrap();
        let catalog = store.load_catalog().await.unwrap();
        assert_eq!(catalog.item_count(), 1);
        assert_eq!(catalog.version(), 1);
        let stored = store.player(player.id).await.unwrap().unwrap();
        assert_eq!(stored.platform, Platform::Xbox);
    }
}
