use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{Connection, params};
use serde::Serialize;

use super::stats;

pub const TABLE_NAME: &str = "intensity_hr";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntensityHrSample {
    pub timestamp: NaiveDateTime,
    pub intensity: i64,
    pub heart_rate: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntensityHrStats {
    pub inactive_hr_avg: Option<f64>,
    pub inactive_hr_min: Option<i64>,
    pub inactive_hr_max: Option<i64>,
}

// Samples are written once per monitored timestamp and never updated, so a
// duplicate timestamp surfaces the primary key violation instead of overwriting.
pub fn insert(conn: &Connection, sample: &IntensityHrSample) -> Result<()> {
    conn.execute(
        "INSERT INTO intensity_hr (timestamp, intensity, heart_rate) VALUES (?1, ?2, ?3)",
        params![sample.timestamp, sample.intensity, sample.heart_rate],
    )
    .context("Failed to insert intensity heart rate sample")?;

    Ok(())
}

pub fn get_stats(
    conn: &Connection,
    start_ts: NaiveDateTime,
    end_ts: NaiveDateTime,
) -> Result<IntensityHrStats> {
    Ok(IntensityHrStats {
        inactive_hr_avg: stats::col_avg_for_value(
            conn,
            TABLE_NAME,
            "heart_rate",
            "intensity",
            0,
            start_ts,
            end_ts,
            true,
        )?,
        inactive_hr_min: stats::col_min_for_value(
            conn,
            TABLE_NAME,
            "heart_rate",
            "intensity",
            0,
            start_ts,
            end_ts,
            true,
        )?,
        inactive_hr_max: stats::col_max_for_value(
            conn,
            TABLE_NAME,
            "heart_rate",
            "intensity",
            0,
            start_ts,
            end_ts,
            true,
        )?,
    })
}
