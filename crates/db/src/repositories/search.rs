//! Case-insensitive substring search helpers shared by the listing queries.

use sea_orm::{
    ColumnTrait,
    sea_query::{Expr, Func, SimpleExpr},
};

/// Build a `LIKE` pattern matching `term` anywhere, lowercased, with `%`, `_`
/// and `\` escaped. Returns `None` for a blank term.
#[must_use]
pub fn contains_pattern(term: &str) -> Option<String> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }

    let escaped = term
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}

/// `LOWER(table.column) LIKE pattern`.
pub fn icontains<C: ColumnTrait>(column: C, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column.as_column_ref()))).like(pattern)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern() {
        assert_eq!(contains_pattern("Rust").unwrap(), "%rust%");
        assert_eq!(contains_pattern("  tokio  ").unwrap(), "%tokio%");
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("50%_off").unwrap(), "%50\\%\\_off%");
    }

    #[test]
    fn test_contains_pattern_blank() {
        assert!(contains_pattern("").is_none());
        assert!(contains_pattern("   ").is_none());
    }
}
