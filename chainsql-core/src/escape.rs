//! Text escaping for embedded literals and LIKE patterns

/// Backslash-escape single quotes, double quotes, backslashes and NUL bytes.
///
/// This is the escaping MySQL applies to string literals in its default
/// `sql_mode` (no `NO_BACKSLASH_ESCAPES`).
pub fn add_slashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    for ch in text.chars() {
        match ch {
            '\'' | '"' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '\0' => out.push_str("\\0"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape `text` and wrap it in single quotes
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", add_slashes(text))
}

/// Where to put the `%` wildcard in a LIKE pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LikeSide {
    /// No wildcard, only escaping
    #[default]
    None,
    /// `%text`
    Left,
    /// `text%`
    Right,
    /// `%text%`
    Both,
}

/// Build a LIKE pattern: escape `%` and `_` in `text`, then add wildcards.
///
/// The result is meant to be bound as a parameter:
///
/// ```
/// use chainsql_core::{like_pattern, LikeSide, Query};
///
/// let mut query = Query::new();
/// query
///     .select_all()
///     .from("users")
///     .where_("name LIKE ?", like_pattern("50%_off", LikeSide::Both));
/// assert_eq!(query.params()[0].as_str(), Some("%50\\%\\_off%"));
/// ```
pub fn like_pattern(text: &str, side: LikeSide) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    for ch in text.chars() {
        if ch == '%' || ch == '_' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }

    match side {
        LikeSide::None => escaped,
        LikeSide::Left => format!("%{escaped}"),
        LikeSide::Right => format!("{escaped}%"),
        LikeSide::Both => format!("%{escaped}%"),
    }
}
