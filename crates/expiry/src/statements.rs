//! SQL text for classifying and repairing external tables.
//!
//! `transient_lastDdlTime` is the Hive table property Redshift exposes in
//! `SVV_EXTERNAL_TABLES.parameters`; it holds epoch **seconds**.

/// Catalog property holding the table's last DDL time.
pub const LAST_DDL_TIME_PROPERTY: &str = "transient_lastDdlTime";

/// Matches a DDL time that casts cleanly to `bigint`.
const EPOCH_SECONDS_PATTERN: &str = "^[0-9]+$";

fn last_ddl_time() -> String {
    format!("json_extract_path_text(parameters, '{LAST_DDL_TIME_PROPERTY}', TRUE)")
}

/// Tables whose recorded DDL time is more than `expiry_seconds` in the past.
///
/// Only numeric DDL times are cast; anything else is left to
/// [`invalid_tables_query`].
pub fn expired_tables_query(schema: &str, expiry_seconds: u64) -> String {
    let ddl_time = last_ddl_time();
    format!(
        "SELECT tablename \
         FROM SVV_EXTERNAL_TABLES \
         WHERE schemaname = '{schema}' \
         AND {ddl_time} ~ '{EPOCH_SECONDS_PATTERN}' \
         AND {ddl_time}::bigint < (EXTRACT(EPOCH FROM GETDATE()) - {expiry_seconds})"
    )
}

/// Tables with a missing or non-numeric DDL time, with their backing location.
pub fn invalid_tables_query(schema: &str) -> String {
    let ddl_time = last_ddl_time();
    format!(
        "SELECT tablename, location \
         FROM SVV_EXTERNAL_TABLES \
         WHERE schemaname = '{schema}' \
         AND ({ddl_time} IS NULL OR {ddl_time} !~ '{EPOCH_SECONDS_PATTERN}')"
    )
}

pub fn drop_table(schema: &str, table: &str) -> String {
    format!("DROP TABLE IF EXISTS {schema}.{table};")
}

/// Record `created_epoch_millis` as the table's DDL time, truncated to seconds.
pub fn set_last_ddl_time(schema: &str, table: &str, created_epoch_millis: i64) -> String {
    let seconds = created_epoch_millis.div_euclid(1000);
    format!(
        "ALTER TABLE {schema}.{table} SET TABLE PROPERTIES ('{LAST_DDL_TIME_PROPERTY}'='{seconds}');"
    )
}
