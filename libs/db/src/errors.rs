//! Backend-neutral classification of store errors.

use sea_orm::{DbErr, SqlErr};

/// SQLSTATE / extended codes for unique violations
/// (Postgres 23505, SQLite 2067 and 1555 for primary keys).
pub fn is_unique_violation_code(code: &str) -> bool {
    matches!(code, "23505" | "2067" | "1555")
}

pub fn is_seaorm_unique_violation(err: &DbErr) -> bool {
    if let Some(SqlErr::UniqueConstraintViolation(_)) = err.sql_err() {
        return true;
    }
    let msg = err.to_string().to_lowercase();
    msg.contains("unique constraint") || msg.contains("duplicate key")
}

/// Walk an `anyhow` chain (as returned by repositories) looking for a
/// unique violation raised by the store.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|e| e.downcast_ref::<DbErr>())
        .any(is_seaorm_unique_violation)
}
