use super::periods::Period;

pub const CREATE_VERSION: &str = r#"
CREATE TABLE IF NOT EXISTS _version (
  key     TEXT PRIMARY KEY,
  version INTEGER NOT NULL
);
"#;

pub const CREATE_SUMMARY: &str = r#"
CREATE TABLE IF NOT EXISTS summary (
  key   TEXT PRIMARY KEY,
  value TEXT NOT NULL
);
"#;

pub const CREATE_INTENSITY_HR: &str = r#"
CREATE TABLE IF NOT EXISTS intensity_hr (
  timestamp  DATETIME PRIMARY KEY,
  intensity  INTEGER NOT NULL,
  heart_rate INTEGER NOT NULL
);
"#;

pub const INDEX_INTENSITY_HR: &str =
    "CREATE INDEX IF NOT EXISTS idx_intensity_hr_intensity ON intensity_hr(intensity, timestamp);";

const SUMMARY_COLUMNS: &str = "\
  hr_avg                       REAL,
  hr_min                       INTEGER,
  hr_max                       INTEGER,
  rhr_avg                      REAL,
  rhr_min                      INTEGER,
  rhr_max                      INTEGER,
  inactive_hr_avg              REAL,
  inactive_hr_min              INTEGER,
  inactive_hr_max              INTEGER,
  weight_avg                   REAL,
  weight_min                   REAL,
  weight_max                   REAL,
  stress_avg                   REAL,
  calories_avg                 REAL,
  steps                        INTEGER,
  floors                       REAL,
  sleep_avg_secs               INTEGER,
  rem_sleep_avg_secs           INTEGER,
  intensity_time_secs          INTEGER,
  moderate_activity_time_secs  INTEGER,
  vigorous_activity_time_secs  INTEGER";

pub fn create_period_table_sql(period: Period) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n  {key:<29}DATE PRIMARY KEY,\n{SUMMARY_COLUMNS}\n);",
        table = period.table_name(),
        key = period.key_column(),
    )
}

pub fn drop_view_sql(view: &str) -> String {
    format!("DROP VIEW IF EXISTS {view};")
}

pub fn create_view_sql(period: Period) -> String {
    let key = period.key_column();
    format!(
        "CREATE VIEW {view} AS
SELECT
  {key},
  ROUND(hr_avg, 1) AS hr_avg,
  hr_min,
  hr_max,
  ROUND(rhr_avg, 1) AS rhr_avg,
  rhr_min,
  rhr_max,
  ROUND(inactive_hr_avg, 1) AS inactive_hr_avg,
  inactive_hr_min,
  inactive_hr_max,
  ROUND(weight_avg, 1) AS weight_avg,
  ROUND(weight_min, 1) AS weight_min,
  ROUND(weight_max, 1) AS weight_max,
  ROUND(stress_avg, 1) AS stress_avg,
  ROUND(calories_avg, 0) AS calories_avg,
  steps,
  floors,
  sleep_avg_secs,
  rem_sleep_avg_secs,
  intensity_time_secs,
  moderate_activity_time_secs,
  vigorous_activity_time_secs
FROM {table}
ORDER BY {key} DESC;",
        view = period.view_name(),
        table = period.table_name(),
    )
}

pub fn schema_statements() -> Vec<String> {
    let mut statements = vec![
        CREATE_SUMMARY.to_string(),
        CREATE_INTENSITY_HR.to_string(),
        INDEX_INTENSITY_HR.to_string(),
    ];
    statements.extend(Period::ALL.iter().map(|period| create_period_table_sql(*period)));
    statements
}
