use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

use super::queries;

const METRIC_COLUMNS: [&str; 21] = [
    "hr_avg",
    "hr_min",
    "hr_max",
    "rhr_avg",
    "rhr_min",
    "rhr_max",
    "inactive_hr_avg",
    "inactive_hr_min",
    "inactive_hr_max",
    "weight_avg",
    "weight_min",
    "weight_max",
    "stress_avg",
    "calories_avg",
    "steps",
    "floors",
    "sleep_avg_secs",
    "rem_sleep_avg_secs",
    "intensity_time_secs",
    "moderate_activity_time_secs",
    "vigorous_activity_time_secs",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Years,
    Months,
    Weeks,
    Days,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryRow {
    pub first_day: NaiveDate,
    pub hr_avg: Option<f64>,
    pub hr_min: Option<i64>,
    pub hr_max: Option<i64>,
    pub rhr_avg: Option<f64>,
    pub rhr_min: Option<i64>,
    pub rhr_max: Option<i64>,
    pub inactive_hr_avg: Option<f64>,
    pub inactive_hr_min: Option<i64>,
    pub inactive_hr_max: Option<i64>,
    pub weight_avg: Option<f64>,
    pub weight_min: Option<f64>,
    pub weight_max: Option<f64>,
    pub stress_avg: Option<f64>,
    pub calories_avg: Option<f64>,
    pub steps: Option<i64>,
    pub floors: Option<f64>,
    pub sleep_avg_secs: Option<i64>,
    pub rem_sleep_avg_secs: Option<i64>,
    pub intensity_time_secs: Option<i64>,
    pub moderate_activity_time_secs: Option<i64>,
    pub vigorous_activity_time_secs: Option<i64>,
}

impl SummaryRow {
    pub fn empty(first_day: NaiveDate) -> Self {
        Self {
            first_day,
            ..Self::default()
        }
    }
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Years, Period::Months, Period::Weeks, Period::Days];

    pub fn table_name(self) -> &'static str {
        match self {
            Period::Years => "years_summary",
            Period::Months => "months_summary",
            Period::Weeks => "weeks_summary",
            Period::Days => "days_summary",
        }
    }

    pub fn view_name(self) -> &'static str {
        match self {
            Period::Years => "years_summary_view",
            Period::Months => "months_summary_view",
            Period::Weeks => "weeks_summary_view",
            Period::Days => "days_summary_view",
        }
    }

    pub fn key_column(self) -> &'static str {
        match self {
            Period::Days => "day",
            _ => "first_day",
        }
    }

    pub fn create_view(self, conn: &Connection) -> Result<()> {
        conn.execute(&queries::drop_view_sql(self.view_name()), [])
            .with_context(|| format!("Failed to drop view {}", self.view_name()))?;
        conn.execute(&queries::create_view_sql(self), [])
            .with_context(|| format!("Failed to create view {}", self.view_name()))?;

        Ok(())
    }

    pub fn upsert(self, conn: &Connection, row: &SummaryRow) -> Result<()> {
        conn.execute(
            &self.upsert_sql(),
            params![
                row.first_day,
                row.hr_avg,
                row.hr_min,
                row.hr_max,
                row.rhr_avg,
                row.rhr_min,
                row.rhr_max,
                row.inactive_hr_avg,
                row.inactive_hr_min,
                row.inactive_hr_max,
                row.weight_avg,
                row.weight_min,
                row.weight_max,
                row.stress_avg,
                row.calories_avg,
                row.steps,
                row.floors,
                row.sleep_avg_secs,
                row.rem_sleep_avg_secs,
                row.intensity_time_secs,
                row.moderate_activity_time_secs,
                row.vigorous_activity_time_secs,
            ],
        )
        .with_context(|| format!("Failed to upsert {} row", self.table_name()))?;

        Ok(())
    }

    pub fn row_for(self, conn: &Connection, date: NaiveDate) -> Result<Option<SummaryRow>> {
        conn.query_row(
            &format!(
                "{select} WHERE {key} = ?1",
                select = self.select_sql(),
                key = self.key_column()
            ),
            params![date],
            row_from_sql,
        )
        .optional()
        .with_context(|| format!("Failed to query {} row", self.table_name()))
    }

    pub fn rows_between(
        self,
        conn: &Connection,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SummaryRow>> {
        let mut statement = conn.prepare(&format!(
            "{select} WHERE {key} >= ?1 AND {key} <= ?2 ORDER BY {key} ASC",
            select = self.select_sql(),
            key = self.key_column()
        ))?;

        let rows = statement
            .query_map(params![from, to], row_from_sql)?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to query {} rows", self.table_name()))?;

        Ok(rows)
    }

    fn select_sql(self) -> String {
        format!(
            "SELECT {key}, {columns} FROM {table}",
            key = self.key_column(),
            columns = METRIC_COLUMNS.join(", "),
            table = self.table_name()
        )
    }

    fn upsert_sql(self) -> String {
        let placeholders = (2..=METRIC_COLUMNS.len() + 1)
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let updates = METRIC_COLUMNS
            .iter()
            .map(|column| format!("{column}=excluded.{column}"))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "INSERT INTO {table} ({key}, {columns}) VALUES (?1, {placeholders})
             ON CONFLICT({key})
             DO UPDATE SET {updates}",
            table = self.table_name(),
            key = self.key_column(),
            columns = METRIC_COLUMNS.join(", "),
        )
    }
}

fn row_from_sql(row: &Row) -> rusqlite::Result<SummaryRow> {
    Ok(SummaryRow {
        first_day: row.get(0)?,
        hr_avg: row.get(1)?,
        hr_min: row.get(2)?,
        hr_max: row.get(3)?,
        rhr_avg: row.get(4)?,
        rhr_min: row.get(5)?,
        rhr_max: row.get(6)?,
        inactive_hr_avg: row.get(7)?,
        inactive_hr_min: row.get(8)?,
        inactive_hr_max: row.get(9)?,
        weight_avg: row.get(10)?,
        weight_min: row.get(11)?,
        weight_max: row.get(12)?,
        stress_avg: row.get(13)?,
        calories_avg: row.get(14)?,
        steps: row.get(15)?,
        floors: row.get(16)?,
        sleep_avg_secs: row.get(17)?,
        rem_sleep_avg_secs: row.get(18)?,
        intensity_time_secs: row.get(19)?,
        moderate_activity_time_secs: row.get(20)?,
        vigorous_activity_time_secs: row.get(21)?,
    })
}
