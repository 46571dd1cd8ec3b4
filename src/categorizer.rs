use rusqlite::Connection;
use tracing::{debug, info};

use crate::db::list_category_rules;
use crate::error::Result;
use crate::models::CategoryRule;

pub const FALLBACK_CATEGORY: &str = "Other";

fn matches(description_lower: &str, keyword: &str) -> bool {
    let keyword = keyword.trim().to_lowercase();
    !keyword.is_empty() && description_lower.contains(&keyword)
}

/// First rule (in slice order) with a keyword contained in the description.
pub fn find_category<'a>(description: &str, rules: &'a [CategoryRule]) -> Option<&'a str> {
    let desc_lower = description.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| matches(&desc_lower, k)))
        .map(|rule| rule.name.as_str())
}

pub fn match_category(description: &str, rules: &[CategoryRule]) -> String {
    find_category(description, rules)
        .unwrap_or(FALLBACK_CATEGORY)
        .to_string()
}

/// Re-run keyword matching on transactions left in a legacy bucket (or with
/// no category at all). Returns how many transactions changed category.
pub fn recategorize_legacy(conn: &Connection, legacy: &[String]) -> Result<usize> {
    let rules: Vec<CategoryRule> = list_category_rules(conn)?
        .into_iter()
        .filter(|r| !legacy.contains(&r.name))
        .collect();

    let mut stmt = conn.prepare("SELECT id, description, category FROM transactions")?;
    let candidates: Vec<(i64, String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut changed = 0usize;
    for (id, description, current) in &candidates {
        if !current.is_empty() && !legacy.contains(current) {
            continue;
        }
        let Some(new_category) = find_category(description, &rules) else {
            debug!(id, %description, "no rule matched legacy transaction");
            continue;
        };
        if new_category != current {
            conn.execute(
                "UPDATE transactions SET category = ?1 WHERE id = ?2",
                rusqlite::params![new_category, id],
            )?;
            changed += 1;
        }
    }

    info!(changed, scanned = candidates.len(), "legacy recategorization finished");
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db, insert_transaction};
    use crate::models::{Direction, TransactionDraft};

    fn rules() -> Vec<CategoryRule> {
        vec![
            CategoryRule::new("Plantão/Rua", &["ifood", "delivery", "pizza"], 30000),
            CategoryRule::new("Mercado", &["mercado", "padaria", "compra"], 100000),
        ]
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![
            CategoryRule::new("Pets", &["vet"], 0),
            CategoryRule::new("General", &["vet market"], 0),
        ];
        assert_eq!(match_category("vet bill", &rules), "Pets");
        assert_eq!(match_category("vet market run", &rules), "Pets");
    }

    #[test]
    fn test_order_controls_priority() {
        let rules = vec![
            CategoryRule::new("General", &["market"], 0),
            CategoryRule::new("Pets", &["vet market"], 0),
        ];
        assert_eq!(match_category("vet market run", &rules), "General");
    }

    #[test]
    fn test_substring_not_whole_word() {
        assert_eq!(match_category("compras supermercado", &rules()), "Mercado");
    }

    #[test]
    fn test_case_insensitive_both_sides() {
        let rules = vec![CategoryRule::new("Plantão/Rua", &["QRF"], 0)];
        assert_eq!(match_category("lanche qrf", &rules), "Plantão/Rua");
        assert_eq!(match_category("IFOOD", &self::rules()), "Plantão/Rua");
    }

    #[test]
    fn test_fallback_when_no_match() {
        assert_eq!(match_category("random vendor", &rules()), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_empty_rules_fall_back() {
        assert_eq!(match_category("ifood", &[]), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_blank_keywords_ignored() {
        let rules = vec![CategoryRule::new("Broken", &["", "  "], 0)];
        assert_eq!(match_category("anything", &rules), FALLBACK_CATEGORY);
    }

    fn insert(conn: &Connection, description: &str, category: &str) {
        let draft = TransactionDraft {
            amount_cents: 1000,
            description: description.to_string(),
            category: category.to_string(),
            direction: Direction::Debit,
            installments: 1,
            payment_method: None,
        };
        let at = chrono::NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        insert_transaction(conn, &draft, at).unwrap();
    }

    #[test]
    fn test_recategorize_legacy_moves_only_legacy_rows() {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        insert(&conn, "ifood jantar", "Alimentação");
        insert(&conn, "padaria", "");
        insert(&conn, "coisa estranha", "Alimentação");
        insert(&conn, "ifood", "Social/Lazer");

        let legacy = vec!["Alimentação".to_string()];
        let changed = recategorize_legacy(&conn, &legacy).unwrap();
        assert_eq!(changed, 2);

        let cats: Vec<String> = conn
            .prepare("SELECT category FROM transactions ORDER BY id")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(cats, vec!["Plantão/Rua", "Mercado", "Alimentação", "Social/Lazer"]);
    }
}
