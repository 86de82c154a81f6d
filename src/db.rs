use anyhow::Result;
use rusqlite::Connection;

pub const DEFAULT_DB_PATH: &str = "data/azure_pricing.sqlite";

/// One normalized virtual-machine SKU, the pipeline's output row.
/// `gpus` and the derived RAM figures are always numeric (0 when none);
/// prices stay absent when the source carried no usable value.
#[derive(Debug, Clone, PartialEq)]
pub struct SkuRow {
    pub name: Option<String>,
    pub region: String,
    pub cpus: Option<f64>,
    pub ram_gb: f64,
    pub storage: Option<String>,
    pub gpus: u32,
    pub gpu_name: Option<String>,
    pub gpu_ram_gb: f64,
    pub price_hr: Option<f64>,
    pub spot_hr: Option<f64>,
}

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(dir) = std::path::Path::new(path).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS skus (
            id          INTEGER PRIMARY KEY,
            region      TEXT NOT NULL,
            name        TEXT,
            cpus        REAL,
            ram_gb      REAL NOT NULL DEFAULT 0,
            storage     TEXT,
            gpus        INTEGER NOT NULL DEFAULT 0,
            gpu_name    TEXT,
            gpu_ram_gb  REAL NOT NULL DEFAULT 0,
            price_hr    REAL,
            spot_hr     REAL,
            fetched_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(region, name)
        );
        CREATE INDEX IF NOT EXISTS idx_skus_region ON skus(region);
        CREATE INDEX IF NOT EXISTS idx_skus_gpus ON skus(gpus);
        ",
    )?;
    Ok(())
}

// ── Catalog ──

/// Write one run's catalog. Re-running a region replaces its previous
/// snapshot row-by-row via the (region, name) key.
pub fn save_catalog(conn: &Connection, rows: &[SkuRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO skus
             (region, name, cpus, ram_gb, storage, gpus, gpu_name, gpu_ram_gb, price_hr, spot_hr)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        for r in rows {
            count += stmt.execute(rusqlite::params![
                r.region, r.name, r.cpus, r.ram_gb, r.storage, r.gpus,
                r.gpu_name, r.gpu_ram_gb, r.price_hr, r.spot_hr,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn fetch_catalog(
    conn: &Connection,
    region: Option<&str>,
    gpus_only: bool,
    limit: usize,
) -> Result<Vec<SkuRow>> {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(r) = region {
        conditions.push(format!("region = ?{}", params.len() + 1));
        params.push(Box::new(r.to_string()));
    }
    if gpus_only {
        conditions.push("gpus > 0".to_string());
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT name, region, cpus, ram_gb, storage, gpus, gpu_name, gpu_ram_gb, price_hr, spot_hr
         FROM skus{}
         ORDER BY region, name
         LIMIT {}",
        where_clause, limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(SkuRow {
                name: row.get(0)?,
                region: row.get(1)?,
                cpus: row.get(2)?,
                ram_gb: row.get(3)?,
                storage: row.get(4)?,
                gpus: row.get(5)?,
                gpu_name: row.get(6)?,
                gpu_ram_gb: row.get(7)?,
                price_hr: row.get(8)?,
                spot_hr: row.get(9)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub regions: usize,
    pub with_gpu: usize,
    pub priced: usize,
    pub spot_priced: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM skus", [], |r| r.get(0))?;
    let regions: usize =
        conn.query_row("SELECT COUNT(DISTINCT region) FROM skus", [], |r| r.get(0))?;
    let with_gpu: usize =
        conn.query_row("SELECT COUNT(*) FROM skus WHERE gpus > 0", [], |r| r.get(0))?;
    let priced: usize = conn.query_row(
        "SELECT COUNT(*) FROM skus WHERE price_hr IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let spot_priced: usize = conn.query_row(
        "SELECT COUNT(*) FROM skus WHERE spot_hr IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        total,
        regions,
        with_gpu,
        priced,
        spot_priced,
    })
}

// ── Tests ──
