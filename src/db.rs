use std::path::Path;

use rusqlite::Connection;

use crate::error::{EhfError, Result};
use crate::parser::extract::charges::{Charge, ChargeStatus, SubCharge};
use crate::parser::{DocumentBundle, Summary};

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| EhfError::Io {
            path: dir.display().to_string(),
            source,
        })?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            name                  TEXT PRIMARY KEY,
            formality_count       INTEGER NOT NULL,
            table_count           INTEGER NOT NULL,
            flux_table_count      INTEGER NOT NULL,
            lot_count             INTEGER NOT NULL,
            owner_count           INTEGER NOT NULL,
            charge_count          INTEGER NOT NULL,
            active_charge_count   INTEGER NOT NULL,
            radiated_charge_count INTEGER NOT NULL,
            bundle                TEXT NOT NULL,
            processed_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS owner_properties (
            id          INTEGER PRIMARY KEY,
            document    TEXT NOT NULL REFERENCES documents(name),
            owner       TEXT NOT NULL,
            birth_date  TEXT,
            owner_id    TEXT,
            commune     TEXT,
            address     TEXT,
            lot         TEXT NOT NULL,
            volume      TEXT,
            right_type  TEXT NOT NULL,
            act_date    TEXT NOT NULL,
            pages       TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_owner_props_document ON owner_properties(document);
        CREATE INDEX IF NOT EXISTS idx_owner_props_owner ON owner_properties(owner);

        CREATE TABLE IF NOT EXISTS charges (
            id                  INTEGER PRIMARY KEY,
            document            TEXT NOT NULL REFERENCES documents(name),
            start_page          INTEGER NOT NULL,
            end_page            INTEGER NOT NULL,
            title               TEXT,
            status              TEXT NOT NULL CHECK(status IN ('ACTIVE','RADIATED')),
            has_total_radiation BOOLEAN NOT NULL,
            sub_charges         TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_charges_document ON charges(document);
        ",
    )?;
    Ok(())
}

// ── Saving ──

/// Store one processed document, replacing whatever was stored under its name.
pub fn save_bundle(conn: &Connection, bundle: &DocumentBundle) -> Result<()> {
    let bundle_json = serde_json::to_string(bundle)?;
    let s = &bundle.summary;

    let tx = conn.unchecked_transaction()?;
    {
        tx.execute("DELETE FROM owner_properties WHERE document = ?1", [&bundle.name])?;
        tx.execute("DELETE FROM charges WHERE document = ?1", [&bundle.name])?;
        tx.execute("DELETE FROM documents WHERE name = ?1", [&bundle.name])?;

        tx.execute(
            "INSERT INTO documents
             (name, formality_count, table_count, flux_table_count, lot_count, owner_count,
              charge_count, active_charge_count, radiated_charge_count, bundle)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                bundle.name, s.formality_count, s.table_count, s.flux_table_count, s.lot_count,
                s.owner_count, s.charge_count, s.active_charge_count, s.radiated_charge_count,
                bundle_json,
            ],
        )?;

        let mut o_stmt = tx.prepare(
            "INSERT INTO owner_properties
             (document, owner, birth_date, owner_id, commune, address, lot, volume,
              right_type, act_date, pages)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;
        for lot in bundle.lots.values() {
            o_stmt.execute(rusqlite::params![
                bundle.name,
                lot.owner,
                lot.birth_date,
                lot.owner_id,
                lot.commune,
                lot.address,
                lot.lot.to_string(),
                lot.volume,
                lot.right_type,
                lot.act_date.format("%d/%m/%Y").to_string(),
                lot.pages,
            ])?;
        }

        let mut c_stmt = tx.prepare(
            "INSERT INTO charges
             (document, start_page, end_page, title, status, has_total_radiation, sub_charges)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for c in bundle.active_charges.iter().chain(&bundle.radiated_charges) {
            c_stmt.execute(rusqlite::params![
                bundle.name,
                c.start_page,
                c.end_page,
                c.title,
                c.status.as_str(),
                c.has_total_radiation,
                serde_json::to_string(&c.sub_charges)?,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Queries ──

pub struct OwnerPropertyRow {
    pub owner: String,
    pub birth_date: Option<String>,
    pub owner_id: Option<String>,
    pub commune: Option<String>,
    pub address: Option<String>,
    pub lot: String,
    pub volume: Option<String>,
    pub right_type: String,
    pub act_date: String,
    pub pages: String,
}

pub struct DocumentRow {
    pub name: String,
    pub summary: Summary,
    pub processed_at: String,
}

fn ensure_document(conn: &Connection, name: &str) -> Result<()> {
    let count: usize = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE name = ?1",
        [name],
        |r| r.get(0),
    )?;
    if count == 0 {
        return Err(EhfError::DocumentNotFound(name.to_string()));
    }
    Ok(())
}

pub fn fetch_owners(conn: &Connection, name: &str) -> Result<Vec<OwnerPropertyRow>> {
    ensure_document(conn, name)?;
    let mut stmt = conn.prepare(
        "SELECT owner, birth_date, owner_id, commune, address, lot, volume,
                right_type, act_date, pages
         FROM owner_properties
         WHERE document = ?1
         ORDER BY owner, id",
    )?;
    let rows = stmt
        .query_map([name], |row| {
            Ok(OwnerPropertyRow {
                owner: row.get(0)?,
                birth_date: row.get(1)?,
                owner_id: row.get(2)?,
                commune: row.get(3)?,
                address: row.get(4)?,
                lot: row.get(5)?,
                volume: row.get(6)?,
                right_type: row.get(7)?,
                act_date: row.get(8)?,
                pages: row.get(9)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn fetch_charges(conn: &Connection, name: &str) -> Result<Vec<Charge>> {
    ensure_document(conn, name)?;
    let mut stmt = conn.prepare(
        "SELECT start_page, end_page, title, status, has_total_radiation, sub_charges
         FROM charges
         WHERE document = ?1
         ORDER BY start_page",
    )?;
    let raw = stmt
        .query_map([name], |row| {
            Ok((
                row.get::<_, usize>(0)?,
                row.get::<_, usize>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, bool>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(start_page, end_page, title, status, has_total_radiation, sub_charges)| -> Result<Charge> {
            let sub_charges: Vec<SubCharge> = serde_json::from_str(&sub_charges)?;
            Ok(Charge {
                start_page,
                end_page,
                title,
                sub_charges,
                has_total_radiation,
                status: if status == ChargeStatus::Radiated.as_str() {
                    ChargeStatus::Radiated
                } else {
                    ChargeStatus::Active
                },
            })
        })
        .collect()
}

pub fn list_documents(conn: &Connection) -> Result<Vec<DocumentRow>> {
    let mut stmt = conn.prepare(
        "SELECT name, formality_count, table_count, flux_table_count, lot_count, owner_count,
                charge_count, active_charge_count, radiated_charge_count, processed_at
         FROM documents
         ORDER BY name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(DocumentRow {
                name: row.get(0)?,
                summary: Summary {
                    formality_count: row.get(1)?,
                    table_count: row.get(2)?,
                    flux_table_count: row.get(3)?,
                    lot_count: row.get(4)?,
                    owner_count: row.get(5)?,
                    charge_count: row.get(6)?,
                    active_charge_count: row.get(7)?,
                    radiated_charge_count: row.get(8)?,
                },
                processed_at: row.get(9)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
