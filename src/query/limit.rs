//! Row-cap rewriting of user SQL.

/// Normalizes `sql` and, when `cap_rows` is set, bounds its result size.
///
/// The statement is trimmed. If capping is requested and the text contains
/// no "limit" anywhere (case-insensitive), one trailing `;` is removed and
/// `LIMIT <row_limit>;` is appended on a new line. Any occurrence counts, so
/// a column named `speed_limit` also suppresses the cap.
pub fn apply_row_limit(sql: &str, cap_rows: bool, row_limit: usize) -> String {
    let trimmed = sql.trim();

    if !cap_rows || trimmed.to_lowercase().contains("limit") {
        return trimmed.to_string();
    }

    let body = trimmed.strip_suffix(';').unwrap_or(trimmed);
    format!("{body}\nLIMIT {row_limit};")
}
