use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{Connection, params, types::FromSql};

const TIME_COLUMN: &str = "timestamp";

pub fn col_avg_for_value(
    conn: &Connection,
    table: &str,
    value_col: &str,
    filter_col: &str,
    filter_value: i64,
    start_ts: NaiveDateTime,
    end_ts: NaiveDateTime,
    ignore_zero: bool,
) -> Result<Option<f64>> {
    aggregate(
        conn,
        "AVG",
        table,
        value_col,
        filter_col,
        filter_value,
        start_ts,
        end_ts,
        ignore_zero,
    )
}

pub fn col_min_for_value(
    conn: &Connection,
    table: &str,
    value_col: &str,
    filter_col: &str,
    filter_value: i64,
    start_ts: NaiveDateTime,
    end_ts: NaiveDateTime,
    ignore_zero: bool,
) -> Result<Option<i64>> {
    aggregate(
        conn,
        "MIN",
        table,
        value_col,
        filter_col,
        filter_value,
        start_ts,
        end_ts,
        ignore_zero,
    )
}

pub fn col_max_for_value(
    conn: &Connection,
    table: &str,
    value_col: &str,
    filter_col: &str,
    filter_value: i64,
    start_ts: NaiveDateTime,
    end_ts: NaiveDateTime,
    ignore_zero: bool,
) -> Result<Option<i64>> {
    aggregate(
        conn,
        "MAX",
        table,
        value_col,
        filter_col,
        filter_value,
        start_ts,
        end_ts,
        ignore_zero,
    )
}

// Table and column names always come from crate constants, never caller input.
// Range is start-inclusive, end-exclusive; ignore_zero drops samples recorded
// as zero, which the device writes when it has no reading.
fn aggregate<T: FromSql>(
    conn: &Connection,
    function: &str,
    table: &str,
    value_col: &str,
    filter_col: &str,
    filter_value: i64,
    start_ts: NaiveDateTime,
    end_ts: NaiveDateTime,
    ignore_zero: bool,
) -> Result<Option<T>> {
    let zero_filter = if ignore_zero {
        format!(" AND {value_col} > 0")
    } else {
        String::new()
    };

    let sql = format!(
        "SELECT {function}({value_col}) FROM {table}
         WHERE {filter_col} = ?1 AND {TIME_COLUMN} >= ?2 AND {TIME_COLUMN} < ?3{zero_filter}"
    );

    conn.query_row(&sql, params![filter_value, start_ts, end_ts], |row| {
        row.get(0)
    })
    .with_context(|| format!("Failed to compute {function} of {table}.{value_col}"))
}
