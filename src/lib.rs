pub mod config;
pub mod db;

pub use config::Config;
pub use db::{
    DB_NAME, DB_VERSION, IntensityHrSample, IntensityHrStats, Period, SchemaError, SummaryDb,
    SummaryRow,
};
