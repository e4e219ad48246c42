pub mod intensity;
pub mod periods;
pub mod queries;
pub mod stats;
pub mod version;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::Config;

pub use intensity::{IntensityHrSample, IntensityHrStats};
pub use periods::{Period, SummaryRow};
pub use version::SchemaError;

pub const DB_NAME: &str = "garmin_summary";
pub const DB_VERSION: u32 = 7;

pub const SUMMARY_TABLE_VERSION: u32 = 1;
pub const PERIOD_TABLE_VERSION: u32 = 4;
pub const PERIOD_VIEW_VERSION: u32 = 4;
pub const INTENSITY_HR_TABLE_VERSION: u32 = 1;

const REGISTERED_TABLES: [(&str, u32); 6] = [
    ("summary", SUMMARY_TABLE_VERSION),
    ("years_summary", PERIOD_TABLE_VERSION),
    ("months_summary", PERIOD_TABLE_VERSION),
    ("weeks_summary", PERIOD_TABLE_VERSION),
    ("days_summary", PERIOD_TABLE_VERSION),
    ("intensity_hr", INTENSITY_HR_TABLE_VERSION),
];

#[derive(Debug)]
pub struct SummaryDb {
    conn: Connection,
}

impl SummaryDb {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;

        let database = Self { conn };
        database.check_versions()?;
        database.init_schema()?;
        database.refresh_views()?;
        info!(path = %path.display(), version = DB_VERSION, "summary database opened");

        Ok(database)
    }

    pub fn open_default() -> Result<Self> {
        let config = Config::load()?;
        Self::open(&config.summary_db_path())
    }

    // Version gate. Runs before any table is touched; a stored version that
    // differs from the registered one aborts the open, migration is the
    // embedding application's problem.
    fn check_versions(&self) -> Result<()> {
        self.conn
            .execute(queries::CREATE_VERSION, [])
            .context("Failed to create version table")?;

        version::check_version(&self.conn, DB_NAME, DB_VERSION)?;
        for (table, expected) in REGISTERED_TABLES {
            version::check_version(&self.conn, table, expected)?;
        }

        Ok(())
    }

    fn init_schema(&self) -> Result<()> {
        queries::schema_statements().iter().try_for_each(|statement| {
            self.conn
                .execute(statement, [])
                .context("Failed to initialize schema")
                .map(|_| ())
        })
    }

    // Views carry their own version record; a stale one is dropped and
    // rebuilt with the current definition instead of aborting the open.
    fn refresh_views(&self) -> Result<()> {
        for period in Period::ALL {
            let stored = version::stored_version(&self.conn, period.view_name())?;
            if stored != Some(PERIOD_VIEW_VERSION) {
                period.create_view(&self.conn)?;
                version::stamp_version(&self.conn, period.view_name(), PERIOD_VIEW_VERSION)?;
                info!(view = period.view_name(), "summary view created");
            }
        }

        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO summary (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key)
                 DO UPDATE SET value=excluded.value",
                params![key, value],
            )
            .with_context(|| format!("Failed to set summary value for {key}"))?;

        Ok(())
    }

    pub fn value_of(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM summary WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read summary value for {key}"))
    }

    pub fn int_value_of(&self, key: &str) -> Result<Option<i64>> {
        self.value_of(key)?
            .map(|value| {
                value.parse::<i64>().with_context(|| {
                    format!("Summary value for {key} is not an integer: {value}")
                })
            })
            .transpose()
    }

    pub fn float_value_of(&self, key: &str) -> Result<Option<f64>> {
        self.value_of(key)?
            .map(|value| {
                value
                    .parse::<f64>()
                    .with_context(|| format!("Summary value for {key} is not a number: {value}"))
            })
            .transpose()
    }

    pub fn upsert_summary(&self, period: Period, row: &SummaryRow) -> Result<()> {
        period.upsert(&self.conn, row)
    }

    pub fn summary_for(&self, period: Period, date: NaiveDate) -> Result<Option<SummaryRow>> {
        period.row_for(&self.conn, date)
    }

    pub fn summaries_between(
        &self,
        period: Period,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SummaryRow>> {
        period.rows_between(&self.conn, from, to)
    }

    pub fn create_view(&self, period: Period) -> Result<()> {
        period.create_view(&self.conn)
    }

    pub fn insert_intensity_hr(&self, sample: &IntensityHrSample) -> Result<()> {
        intensity::insert(&self.conn, sample)
    }

    pub fn intensity_hr_stats(
        &self,
        start_ts: NaiveDateTime,
        end_ts: NaiveDateTime,
    ) -> Result<IntensityHrStats> {
        intensity::get_stats(&self.conn, start_ts, end_ts)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DB_NAME, DB_VERSION, IntensityHrSample, PERIOD_TABLE_VERSION, PERIOD_VIEW_VERSION,
        SchemaError, SummaryDb, version,
    };
    use chrono::NaiveDate;
    use rusqlite::{Connection, params};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn scratch_db() -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("garmin_summary.db");
        (dir, path)
    }

    #[test]
    fn open_stamps_database_and_table_versions() {
        let (_dir, path) = scratch_db();

        let db = SummaryDb::open(&path).expect("open");
        assert_eq!(
            version::stored_version(db.connection(), DB_NAME).expect("db version"),
            Some(DB_VERSION)
        );
        assert_eq!(
            version::stored_version(db.connection(), "weeks_summary").expect("table version"),
            Some(PERIOD_TABLE_VERSION)
        );
        drop(db);

        SummaryDb::open(&path).expect("reopen with matching versions");
    }

    #[test]
    fn stale_db_version_fails_before_any_query() {
        let (_dir, path) = scratch_db();

        drop(SummaryDb::open(&path).expect("initial open"));

        let conn = Connection::open(&path).expect("raw open");
        conn.execute(
            "UPDATE _version SET version = 3 WHERE key = ?1",
            params![DB_NAME],
        )
        .expect("tamper version");
        drop(conn);

        let error = SummaryDb::open(&path).expect_err("version mismatch");
        assert_eq!(
            error.downcast_ref::<SchemaError>(),
            Some(&SchemaError::VersionMismatch {
                name: DB_NAME.to_string(),
                found: 3,
                expected: DB_VERSION,
            })
        );
    }

    #[test]
    fn stale_table_version_fails_fast() {
        let (_dir, path) = scratch_db();

        drop(SummaryDb::open(&path).expect("initial open"));

        let conn = Connection::open(&path).expect("raw open");
        conn.execute(
            "UPDATE _version SET version = 9 WHERE key = 'days_summary'",
            [],
        )
        .expect("tamper version");
        drop(conn);

        let error = SummaryDb::open(&path).expect_err("table version mismatch");
        assert!(error.downcast_ref::<SchemaError>().is_some());
    }

    #[test]
    fn stale_view_is_rebuilt_instead_of_failing() {
        let (_dir, path) = scratch_db();

        drop(SummaryDb::open(&path).expect("initial open"));

        let conn = Connection::open(&path).expect("raw open");
        conn.execute(
            "UPDATE _version SET version = 1 WHERE key = 'years_summary_view'",
            [],
        )
        .expect("tamper view version");
        drop(conn);

        let db = SummaryDb::open(&path).expect("reopen rebuilds view");
        assert_eq!(
            version::stored_version(db.connection(), "years_summary_view").expect("view version"),
            Some(PERIOD_VIEW_VERSION)
        );
    }

    #[test]
    fn summary_values_upsert_and_parse() {
        let (_dir, path) = scratch_db();
        let db = SummaryDb::open(&path).expect("open");

        db.set_value("total_activities", "123").expect("set");
        db.set_value("total_activities", "456").expect("replace");
        db.set_value("avg_weight", "81.5").expect("set float");

        assert_eq!(
            db.value_of("total_activities").expect("read"),
            Some("456".to_string())
        );
        assert_eq!(db.int_value_of("total_activities").expect("int"), Some(456));
        assert_eq!(db.float_value_of("avg_weight").expect("float"), Some(81.5));
        assert_eq!(db.value_of("missing").expect("read missing"), None);
        assert!(db.int_value_of("avg_weight").is_err());
    }

    #[test]
    fn intensity_stats_through_the_handle() {
        let (_dir, path) = scratch_db();
        let db = SummaryDb::open(&path).expect("open");

        let base = NaiveDate::from_ymd_opt(2023, 6, 5)
            .expect("valid date")
            .and_hms_opt(12, 0, 0)
            .expect("valid time");

        for (offset, intensity, heart_rate) in [(0, 0, 50), (60, 0, 70), (120, 4, 160)] {
            db.insert_intensity_hr(&IntensityHrSample {
                timestamp: base + chrono::Duration::seconds(offset),
                intensity,
                heart_rate,
            })
            .expect("insert sample");
        }

        let stats = db
            .intensity_hr_stats(base, base + chrono::Duration::hours(1))
            .expect("stats");
        assert_eq!(stats.inactive_hr_avg, Some(60.0));
        assert_eq!(stats.inactive_hr_min, Some(50));
        assert_eq!(stats.inactive_hr_max, Some(70));
    }
}
