//! SQL identifier quoting.

/// Quote a SQL identifier using ANSI double-quoting.
///
/// Embedded double-quotes are escaped by doubling them (`"` → `""`), which
/// makes any input string safe to splice into SQL text as an identifier.
///
/// # Examples
///
/// ```
/// use siderite_core::quote_ident;
///
/// assert_eq!(quote_ident("track"), "\"track\"");
/// assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
/// assert_eq!(quote_ident("select"), "\"select\""); // SQL keyword
/// ```
#[inline]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// The namespace qualifier SQLite uses for temporary tables.
#[inline]
pub const fn temp_namespace() -> &'static str {
    "temp"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple() {
        assert_eq!(quote_ident("track"), "\"track\"");
    }

    #[test]
    fn embedded_quote_is_doubled() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_ident("\""), "\"\"\"\"");
    }

    #[test]
    fn keywords_and_spaces_are_safe() {
        assert_eq!(quote_ident("from"), "\"from\"");
        assert_eq!(quote_ident("first name"), "\"first name\"");
    }

    #[test]
    fn injection_attempt_stays_one_identifier() {
        let malicious = "t\"; DROP TABLE secrets; --";
        let quoted = quote_ident(malicious);
        assert_eq!(quoted, "\"t\"\"; DROP TABLE secrets; --\"");
        assert_eq!(quoted.matches('"').count(), 4);
    }
}
