use std::io::Write;
use std::path::PathBuf;

use tracing::info;

use crate::cli::open_db;
use crate::db::{self, TIMESTAMP_FORMAT};
use crate::error::Result;
use crate::fmt::decimal;
use crate::models::Transaction;
use crate::settings::get_data_dir;

const HEADER: [&str; 8] = [
    "ID",
    "Date",
    "Description",
    "Category",
    "Type",
    "Amount",
    "Method",
    "Installments",
];

fn default_path() -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    get_data_dir()
        .join("exports")
        .join(format!("swisstrack-{date}.csv"))
}

pub fn write_csv<W: Write>(writer: W, rows: &[Transaction]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for t in rows {
        wtr.write_record([
            t.id.to_string(),
            t.created_at.format(TIMESTAMP_FORMAT).to_string(),
            t.description.clone(),
            t.category.clone(),
            t.direction.to_string(),
            decimal(t.amount_cents),
            t.payment_method.clone().unwrap_or_default(),
            t.installments.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn run(output: Option<String>) -> Result<()> {
    let conn = open_db()?;
    let rows = db::list_all_transactions(&conn)?;

    let path = output.map(PathBuf::from).unwrap_or_else(default_path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    write_csv(std::fs::File::create(&path)?, &rows)?;
    info!(path = %path.display(), rows = rows.len(), "export written");
    println!("Wrote {} transaction(s) to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use chrono::NaiveDate;

    #[test]
    fn test_write_csv_quotes_descriptions() {
        let rows = vec![Transaction {
            id: 7,
            amount_cents: 30_000,
            description: "compras, supermercado".to_string(),
            category: "Mercado".to_string(),
            direction: Direction::Credit,
            installments: 3,
            payment_method: Some("nubank".to_string()),
            created_at: NaiveDate::from_ymd_opt(2025, 3, 4)
                .unwrap()
                .and_hms_opt(18, 30, 0)
                .unwrap(),
        }];
        let mut buf = Vec::new();
        write_csv(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ID,Date,Description,Category,Type,Amount,Method,Installments"
        );
        assert_eq!(
            lines.next().unwrap(),
            "7,2025-03-04 18:30:00,\"compras, supermercado\",Mercado,Credit,300.00,nubank,3"
        );
    }
}
