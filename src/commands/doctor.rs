// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

/// Findings as `(issue, detail)` pairs; empty when the ledger is consistent.
pub fn check(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut rows = Vec::new();

    // 1) Installment rows whose parent row is gone
    let mut stmt = conn.prepare(
        "SELECT t.id, t.parent_transaction_id FROM transactions t
         WHERE t.installment_number IS NOT NULL
           AND (t.parent_transaction_id IS NULL
                OR NOT EXISTS (SELECT 1 FROM transactions p WHERE p.id=t.parent_transaction_id))
         ORDER BY t.id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let parent: Option<i64> = r.get(1)?;
        let detail = match parent {
            Some(p) => format!("#{} points at missing #{}", id, p),
            None => format!("#{} has no parent", id),
        };
        rows.push(("orphan_installment".to_string(), detail));
    }

    // 2) Groups with a different number of rows than announced
    let mut stmt = conn.prepare(
        "SELECT parent_transaction_id, COUNT(*), MAX(total_installments) FROM transactions
         WHERE parent_transaction_id IS NOT NULL
         GROUP BY parent_transaction_id
         HAVING COUNT(*) != MAX(total_installments) OR MIN(total_installments) != MAX(total_installments)
         ORDER BY parent_transaction_id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let parent: i64 = r.get(0)?;
        let count: i64 = r.get(1)?;
        let total: i64 = r.get(2)?;
        rows.push((
            "incomplete_group".to_string(),
            format!("group #{} has {} of {} installments", parent, count, total),
        ));
    }

    // 3) Amounts that are not positive cent values
    let mut stmt = conn.prepare("SELECT 'expense', id, amount FROM transactions UNION ALL SELECT 'income', id, amount FROM movements")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let table: String = r.get(0)?;
        let id: i64 = r.get(1)?;
        let raw: String = r.get(2)?;
        let ok = raw
            .parse::<Decimal>()
            .map(|d| crate::ledger::validate_amount(d).is_ok())
            .unwrap_or(false);
        if !ok {
            rows.push(("bad_amount".to_string(), format!("{} #{}: '{}'", table, id, raw)));
        }
    }

    // 4) Expenses whose type or category was removed
    let mut stmt = conn.prepare(
        "SELECT t.id FROM transactions t
         LEFT JOIN entry_types et ON et.id=t.type_id
         LEFT JOIN categories c ON c.id=t.category_id
         WHERE et.id IS NULL OR c.id IS NULL ORDER BY t.id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        rows.push(("dangling_reference".to_string(), format!("expense #{}", id)));
    }

    Ok(rows)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let issues = check(conn)?;
    if issues.is_empty() {
        println!("doctor: no issues found");
    } else {
        tracing::warn!(count = issues.len(), "doctor found issues");
        let rows = issues.into_iter().map(|(i, d)| vec![i, d]).collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
