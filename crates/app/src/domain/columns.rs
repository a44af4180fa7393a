//! Column conversions shared by the repositories.

use sqlx::{Row, postgres::PgRow};

/// Read a non-negative `INTEGER` column as a `u32` count.
pub(crate) fn try_get_count(row: &PgRow, col: &str) -> Result<u32, sqlx::Error> {
    let count: i32 = row.try_get(col)?;

    u32::try_from(count).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

/// Convert a `u32` count into the `INTEGER` representation used for binds.
pub(crate) fn count_to_i32(count: u32, col: &str) -> Result<i32, sqlx::Error> {
    i32::try_from(count).map_err(|e| sqlx::Error::Encode(format!("{col}: {e}").into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_beyond_integer_range_are_rejected() {
        assert!(count_to_i32(u32::MAX, "stock").is_err());
        assert!(matches!(count_to_i32(5, "stock"), Ok(5)));
    }
}
