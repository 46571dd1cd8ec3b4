use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{debug, warn};

use crate::categorizer::FALLBACK_CATEGORY;
use crate::error::{Result, TrackError};
use crate::models::{CategoryRule, Transaction, TransactionDraft};

pub const DB_FILE: &str = "swisstrack.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    amount_cents INTEGER NOT NULL,
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    trans_type TEXT NOT NULL,
    installments INTEGER NOT NULL DEFAULT 1,
    payment_method TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
);

CREATE INDEX IF NOT EXISTS idx_transactions_created_at ON transactions(created_at);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL,
    keywords TEXT NOT NULL DEFAULT '',
    budget_cents INTEGER NOT NULL DEFAULT 0,
    alert_threshold INTEGER NOT NULL DEFAULT 70,
    priority INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const DEFAULT_MONTHLY_BUDGET_CENTS: i64 = 500_000;

const MONTHLY_BUDGET_KEY: &str = "monthly_budget_cents";
const HOURLY_WAGE_KEY: &str = "hourly_wage_cents";

// (name, keywords, budget_cents) in matching priority order. Narrow
// behavioral buckets sit above the generic ones.
pub const DEFAULT_CATEGORIES: &[(&str, &str, i64)] = &[
    ("Pets", "bravecto,simparic,nexgard,ração,veterinario,vet,vacina,banho,tosa,petshop,pet", 30_000),
    ("Meta Suíça", "alemão,goethe,italki,preply,professor,aula,curso,traducao,validacao,diploma,apostila,euro,wise,cambio,passagem,suíça,zurique,berna", 100_000),
    ("Tech/Simulação", "vatsim,ivao,navigraph,sayintentions,msfs,x-plane,simulador,nvidia,rtx,gpu,steam,aws,ec2,s3,host,dominio", 50_000),
    ("Moto/Hobby", "harley,davidson,oficina,peça,pneu,revisao,capacete,luva,jaqueta,oleo,veleiro,marina,barco,sailing", 50_000),
    ("Plantão/Rua", "qrf,plantao,ifood,delivery,hamburguer,coxinha,quilo,cafezinho,maquina,lanche,subway,mcdonalds,bk,pizza,dominos,refri", 30_000),
    ("Social/Lazer", "restaurante,oliva,jp,boi,jantar,almoço,rodizio,sushi,outback,bar,cerveja,chopp,vinho,date,cinema,ingresso,show,formatura", 50_000),
    ("Transporte", "uber,99,taxi,onibus,metro,combustivel,posto,ipva,pedagio,multa,semparar,seguro", 80_000),
    ("Saúde", "farmacia,drogaria,remedio,exame,consulta,psicologo,terapia,academia,suplemento,whey,creatina,gympass,nutri,nutricionista,personal,treino,remo,fut,futevolei,jiu,jiujitsu", 40_000),
    ("Casa", "aluguel,condominio,luz,agua,internet,claro,iptu,faxina,diarista,dora,rivaldo,eletricista,encanador,getninja,conserto", 200_000),
    ("Mercado", "mercado,padaria,pepe,açougue,feira,sacolão,horti,carrefour,pão,leite,fruta,arroz,feijão,compra,semanal,mensal,assai,atacadão,sams,hiperideal,redemix", 100_000),
];

const FALLBACK_BUDGET_CENTS: i64 = 50_000;

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    sync_default_categories(conn)?;
    conn.execute(
        "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
        rusqlite::params![MONTHLY_BUDGET_KEY, DEFAULT_MONTHLY_BUDGET_CENTS.to_string()],
    )?;
    Ok(())
}

/// Upsert the built-in category list. Keywords and priority are refreshed;
/// budgets and thresholds the user already edited are left alone.
pub fn sync_default_categories(conn: &Connection) -> Result<()> {
    for (priority, (name, keywords, budget)) in DEFAULT_CATEGORIES.iter().enumerate() {
        conn.execute(
            "INSERT INTO categories (name, keywords, budget_cents, priority) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(name) DO UPDATE SET keywords = excluded.keywords, priority = excluded.priority",
            rusqlite::params![name, keywords, budget, priority as i64],
        )?;
    }
    conn.execute(
        "INSERT OR IGNORE INTO categories (name, keywords, budget_cents, priority) VALUES (?1, '', ?2, ?3)",
        rusqlite::params![FALLBACK_CATEGORY, FALLBACK_BUDGET_CENTS, DEFAULT_CATEGORIES.len() as i64],
    )?;
    debug!(count = DEFAULT_CATEGORIES.len(), "default categories synced");
    Ok(())
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    Ok(conn
        .query_row("SELECT value FROM settings WHERE key = ?1", [key], |r| r.get(0))
        .optional()?)
}

fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        [key, value],
    )?;
    Ok(())
}

fn get_cents_setting(conn: &Connection, key: &str) -> Result<Option<i64>> {
    let Some(raw) = get_setting(conn, key)? else {
        return Ok(None);
    };
    match raw.trim().parse::<i64>() {
        Ok(v) => Ok(Some(v)),
        Err(_) => {
            warn!(key, value = %raw, "ignoring malformed setting");
            Ok(None)
        }
    }
}

pub fn get_monthly_budget(conn: &Connection) -> Result<i64> {
    Ok(get_cents_setting(conn, MONTHLY_BUDGET_KEY)?.unwrap_or(DEFAULT_MONTHLY_BUDGET_CENTS))
}

pub fn set_monthly_budget(conn: &Connection, cents: i64) -> Result<()> {
    set_setting(conn, MONTHLY_BUDGET_KEY, &cents.to_string())
}

/// Net hourly wage in minor units; `None` when never configured.
pub fn get_hourly_wage(conn: &Connection) -> Result<Option<i64>> {
    Ok(get_cents_setting(conn, HOURLY_WAGE_KEY)?.filter(|w| *w > 0))
}

pub fn set_hourly_wage(conn: &Connection, cents: i64) -> Result<()> {
    set_setting(conn, HOURLY_WAGE_KEY, &cents.to_string())
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Rules in matching priority order.
pub fn list_category_rules(conn: &Connection) -> Result<Vec<CategoryRule>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, keywords, budget_cents, alert_threshold FROM categories \
         ORDER BY priority ASC, id ASC",
    )?;
    let rules = stmt
        .query_map([], |row| {
            let keywords: String = row.get(2)?;
            Ok(CategoryRule {
                id: row.get(0)?,
                name: row.get(1)?,
                keywords: split_keywords(&keywords),
                budget_cents: row.get(3)?,
                alert_threshold: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rules)
}

pub fn update_category_budget(
    conn: &Connection,
    name: &str,
    budget_cents: i64,
    alert_threshold: Option<i64>,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE categories SET budget_cents = ?1, alert_threshold = COALESCE(?2, alert_threshold) \
         WHERE name = ?3",
        rusqlite::params![budget_cents, alert_threshold, name],
    )?;
    if updated == 0 {
        return Err(TrackError::UnknownCategory(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

const TRANSACTION_COLUMNS: &str =
    "id, amount_cents, description, category, trans_type, installments, payment_method, created_at";

/// Stored timestamps normally use `TIMESTAMP_FORMAT`, but rows written by
/// other tools may carry a `T` separator or an offset.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for fmt in [TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .or_else(|| chrono::DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z").ok())
        .map(|dt| dt.naive_local())
}

fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    let direction: String = row.get(4)?;
    let installments: i64 = row.get(5)?;
    let created_at: String = row.get(7)?;
    let timestamp = parse_timestamp(&created_at).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Text,
            format!("unparsable timestamp '{created_at}'").into(),
        )
    })?;
    Ok(Transaction {
        id: row.get(0)?,
        amount_cents: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        direction: direction.parse().unwrap_or_default(),
        installments: u32::try_from(installments.max(1)).unwrap_or(1),
        payment_method: row.get::<_, Option<String>>(6)?.filter(|m| !m.is_empty()),
        created_at: timestamp,
    })
}

pub fn insert_transaction(
    conn: &Connection,
    draft: &TransactionDraft,
    created_at: NaiveDateTime,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO transactions (amount_cents, description, category, trans_type, installments, payment_method, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            draft.amount_cents,
            draft.description,
            draft.category,
            draft.direction.as_str(),
            draft.installments.max(1),
            draft.payment_method,
            created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_transaction(conn: &Connection, id: i64) -> Result<Transaction> {
    let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1");
    conn.query_row(&sql, [id], row_to_transaction)
        .optional()?
        .ok_or(TrackError::NotFound(id))
}

pub fn update_transaction(conn: &Connection, id: i64, draft: &TransactionDraft) -> Result<()> {
    let updated = conn.execute(
        "UPDATE transactions SET amount_cents = ?1, description = ?2, category = ?3, trans_type = ?4, \
         installments = ?5, payment_method = ?6 WHERE id = ?7",
        rusqlite::params![
            draft.amount_cents,
            draft.description,
            draft.category,
            draft.direction.as_str(),
            draft.installments.max(1),
            draft.payment_method,
            id,
        ],
    )?;
    if updated == 0 {
        return Err(TrackError::NotFound(id));
    }
    Ok(())
}

pub fn delete_transaction(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn.execute("DELETE FROM transactions WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(TrackError::NotFound(id));
    }
    Ok(())
}

/// Transactions for one calendar month, most recent first.
pub fn list_month_transactions(conn: &Connection, year: i32, month: u32) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions \
         WHERE created_at LIKE ?1 ORDER BY datetime(created_at) DESC, id DESC"
    );
    let prefix = format!("{year:04}-{month:02}%");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([prefix], row_to_transaction)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_all_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY datetime(created_at) DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], row_to_transaction)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use chrono::NaiveDate;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn draft(amount_cents: i64, description: &str, category: &str) -> TransactionDraft {
        TransactionDraft {
            amount_cents,
            description: description.to_string(),
            category: category.to_string(),
            direction: Direction::Debit,
            installments: 1,
            payment_method: None,
        }
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["transactions", "categories", "settings"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
        let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |r| r.get(0)).unwrap();
        assert_eq!(count as usize, DEFAULT_CATEGORIES.len() + 1);
    }

    #[test]
    fn test_rules_come_back_in_priority_order() {
        let (_dir, conn) = test_db();
        let names: Vec<String> = list_category_rules(&conn).unwrap().into_iter().map(|r| r.name).collect();
        let plantao = names.iter().position(|n| n == "Plantão/Rua").unwrap();
        let mercado = names.iter().position(|n| n == "Mercado").unwrap();
        assert!(plantao < mercado);
        assert_eq!(names.first().map(String::as_str), Some("Pets"));
        assert_eq!(names.last().map(String::as_str), Some(FALLBACK_CATEGORY));
    }

    #[test]
    fn test_sync_preserves_user_budget() {
        let (_dir, conn) = test_db();
        update_category_budget(&conn, "Mercado", 123_400, Some(90)).unwrap();
        sync_default_categories(&conn).unwrap();
        let mercado = list_category_rules(&conn)
            .unwrap()
            .into_iter()
            .find(|r| r.name == "Mercado")
            .unwrap();
        assert_eq!(mercado.budget_cents, 123_400);
        assert_eq!(mercado.alert_threshold, 90);
        assert!(mercado.keywords.contains(&"padaria".to_string()));
    }

    #[test]
    fn test_update_unknown_category_fails() {
        let (_dir, conn) = test_db();
        let err = update_category_budget(&conn, "Nope", 100, None).unwrap_err();
        assert!(matches!(err, TrackError::UnknownCategory(_)));
    }

    #[test]
    fn test_budget_and_wage_settings() {
        let (_dir, conn) = test_db();
        assert_eq!(get_monthly_budget(&conn).unwrap(), DEFAULT_MONTHLY_BUDGET_CENTS);
        assert_eq!(get_hourly_wage(&conn).unwrap(), None);
        set_monthly_budget(&conn, 750_000).unwrap();
        set_hourly_wage(&conn, 8_000).unwrap();
        assert_eq!(get_monthly_budget(&conn).unwrap(), 750_000);
        assert_eq!(get_hourly_wage(&conn).unwrap(), Some(8_000));
    }

    #[test]
    fn test_month_listing_is_most_recent_first() {
        let (_dir, conn) = test_db();
        insert_transaction(&conn, &draft(100, "a", "Other"), at(2025, 3, 2, 9)).unwrap();
        insert_transaction(&conn, &draft(200, "b", "Other"), at(2025, 3, 20, 9)).unwrap();
        insert_transaction(&conn, &draft(300, "c", "Other"), at(2025, 4, 1, 9)).unwrap();
        insert_transaction(&conn, &draft(400, "d", "Other"), at(2025, 3, 11, 9)).unwrap();

        let march: Vec<String> = list_month_transactions(&conn, 2025, 3)
            .unwrap()
            .into_iter()
            .map(|t| t.description)
            .collect();
        assert_eq!(march, vec!["b", "d", "a"]);
        assert_eq!(list_all_transactions(&conn).unwrap().len(), 4);
    }

    #[test]
    fn test_month_listing_orders_mixed_timestamp_formats() {
        let (_dir, conn) = test_db();
        let insert = "INSERT INTO transactions (amount_cents, description, category, trans_type, installments, created_at) \
                      VALUES (?1, ?2, 'Other', 'Debit', 1, ?3)";
        conn.execute(insert, rusqlite::params![100, "night", "2025-04-07 21:00:00"]).unwrap();
        conn.execute(insert, rusqlite::params![200, "morning", "2025-04-07T08:00:00"]).unwrap();
        conn.execute(insert, rusqlite::params![300, "later", "2025-04-08T07:30:00"]).unwrap();

        let rows = list_month_transactions(&conn, 2025, 4).unwrap();
        let order: Vec<&str> = rows.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(order, vec!["later", "night", "morning"]);

        let all = list_all_transactions(&conn).unwrap();
        assert_eq!(all[1].description, "night");
    }

    #[test]
    fn test_transaction_crud() {
        let (_dir, conn) = test_db();
        let mut d = draft(1550, "padaria", "Mercado");
        d.payment_method = Some("nubank".to_string());
        d.direction = Direction::Credit;
        let id = insert_transaction(&conn, &d, at(2025, 5, 5, 8)).unwrap();

        let t = get_transaction(&conn, id).unwrap();
        assert_eq!(t.amount_cents, 1550);
        assert_eq!(t.direction, Direction::Credit);
        assert_eq!(t.payment_method.as_deref(), Some("nubank"));
        assert_eq!(t.created_at, at(2025, 5, 5, 8));

        d.amount_cents = 2000;
        update_transaction(&conn, id, &d).unwrap();
        assert_eq!(get_transaction(&conn, id).unwrap().amount_cents, 2000);

        delete_transaction(&conn, id).unwrap();
        assert!(matches!(get_transaction(&conn, id), Err(TrackError::NotFound(_))));
        assert!(matches!(delete_transaction(&conn, id), Err(TrackError::NotFound(_))));
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = at(2026, 1, 18, 21);
        assert_eq!(parse_timestamp("2026-01-18 21:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-01-18T21:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-01-18T21:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("garbage"), None);
    }
}
