// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{EntryKind, Period};
use anyhow::{Context, Result};
use chrono::{Datelike, Months, NaiveDate};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::{Decimal, RoundingStrategy};

pub const DEFAULT_CURRENCY: &str = "BRL";

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("static color pattern"));

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Parses `YYYY-MM` into `(year, month)`.
pub fn parse_month(s: &str) -> Result<(i32, u32)> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok((first.year(), first.month()))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Rounds to whole cents, halves away from zero.
pub fn round_cents(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// True when the amount carries no more than two fractional digits.
pub fn has_cent_precision(d: Decimal) -> bool {
    d.normalize().scale() <= 2
}

/// Adds calendar months, clamping to the last day of the target month
/// (Jan 31 + 1 month is Feb 28/29).
pub fn add_calendar_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

pub fn month_start(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    month_start(year, month)
        .and_then(|first| add_calendar_months(first, 1))
        .and_then(|next| next.pred_opt())
}

pub fn is_hex_color(s: &str) -> bool {
    HEX_COLOR.is_match(s)
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Value of an argument clap marks as required or defaulted.
pub fn arg_str<'a>(m: &'a clap::ArgMatches, id: &str) -> Result<&'a str> {
    m.get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("Missing argument '{}'", id))
}

/// `--flag on|off` as an optional override.
pub fn switch_arg(m: &clap::ArgMatches, id: &str) -> Option<bool> {
    m.get_one::<String>(id).map(|s| s == "on")
}

/// Reporting window from `--month` or `--from/--to`, else the month of `today`.
/// A lone `--from` runs to `today`; a lone `--to` starts at the first of its month.
pub fn resolve_period(m: &clap::ArgMatches, today: NaiveDate) -> Result<Period> {
    if let Some(month) = m.get_one::<String>("month") {
        let (y, mo) = parse_month(month)?;
        return Ok(Period::month(y, mo)?);
    }
    let from = m.get_one::<String>("from").map(|s| parse_date(s)).transpose()?;
    let to = m.get_one::<String>("to").map(|s| parse_date(s)).transpose()?;
    let period = match (from, to) {
        (None, None) => Period::current_month(today),
        (Some(start), None) => Period::new(start, today.max(start))?,
        (None, Some(end)) => Period::new(end.with_day(1).unwrap_or(end), end)?,
        (Some(start), Some(end)) => Period::new(start, end)?,
    };
    Ok(period)
}

pub fn id_for_account(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name.trim()], |r| r.get(0))
        .with_context(|| format!("Account '{}' not found", name.trim()))?;
    Ok(id)
}

pub fn id_for_member(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM members WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name.trim()], |r| r.get(0))
        .with_context(|| format!("Member '{}' not found", name.trim()))?;
    Ok(id)
}

pub fn id_for_category(conn: &Connection, name: &str, kind: EntryKind) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE name=?1 AND kind=?2")?;
    let id: i64 = stmt
        .query_row(params![name.trim(), kind.as_str()], |r| r.get(0))
        .with_context(|| format!("{} category '{}' not found", kind, name.trim()))?;
    Ok(id)
}

pub fn id_for_type(conn: &Connection, name: &str, kind: EntryKind) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM entry_types WHERE name=?1 AND kind=?2")?;
    let id: i64 = stmt
        .query_row(params![name.trim(), kind.as_str()], |r| r.get(0))
        .with_context(|| format!("{} type '{}' not found", kind, name.trim()))?;
    Ok(id)
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Display currency; amounts themselves are currency-less.
pub fn get_currency(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, "currency")?.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn add_months_clamps_to_month_end() {
        assert_eq!(add_calendar_months(d(2024, 1, 31), 1), Some(d(2024, 2, 29)));
        assert_eq!(add_calendar_months(d(2023, 1, 31), 1), Some(d(2023, 2, 28)));
        assert_eq!(add_calendar_months(d(2024, 1, 31), 2), Some(d(2024, 3, 31)));
        assert_eq!(add_calendar_months(d(2024, 11, 15), 3), Some(d(2025, 2, 15)));
        assert_eq!(add_calendar_months(d(2024, 5, 20), 0), Some(d(2024, 5, 20)));
    }

    #[test]
    fn round_cents_is_half_up() {
        let r = |s: &str| round_cents(Decimal::from_str(s).unwrap()).to_string();
        assert_eq!(r("0.125"), "0.13");
        assert_eq!(r("0.124"), "0.12");
        assert_eq!(r("33.335"), "33.34");
        assert_eq!(r("10"), "10");
    }

    #[test]
    fn cent_precision_ignores_trailing_zeros() {
        assert!(has_cent_precision(Decimal::from_str("12.500").unwrap()));
        assert!(has_cent_precision(Decimal::from_str("12").unwrap()));
        assert!(!has_cent_precision(Decimal::from_str("12.345").unwrap()));
    }

    #[test]
    fn month_bounds() {
        assert_eq!(month_end(2024, 2), Some(d(2024, 2, 29)));
        assert_eq!(month_end(2025, 12), Some(d(2025, 12, 31)));
        assert_eq!(month_start(2025, 13), None);
        assert_eq!(parse_month(" 2025-08 ").unwrap(), (2025, 8));
        assert!(parse_month("2025-13").is_err());
    }

    #[test]
    fn hex_colors() {
        assert!(is_hex_color("#ef4444"));
        assert!(!is_hex_color("ef4444"));
        assert!(!is_hex_color("#ef44"));
    }
}
