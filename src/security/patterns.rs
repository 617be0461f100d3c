//! Injection deny-lists.
//!
//! Compiled once at first use. Every free-text request field is screened
//! against both tables before business logic sees it. The tables are
//! intentionally blunt: a match rejects the request outright rather than
//! attempting to sanitize.

use std::sync::LazyLock;

use regex::Regex;

/// A labelled deny-list entry. The label is what reaches audit logs; the
/// raw input is never echoed back to the caller.
pub struct DenyPattern {
    pub label: &'static str,
    pub regex: Regex,
}

fn pattern(label: &'static str, source: &str) -> DenyPattern {
    DenyPattern {
        label,
        // Table entries are static literals; a malformed one is a
        // programming error caught by the tests below.
        regex: Regex::new(source).expect("invalid deny-list pattern"),
    }
}

/// SQL-injection shapes: statement keywords followed by whitespace or an
/// opening paren, quote/comment sequences, classic tautologies, and stored
/// procedure prefixes.
pub static SQL_PATTERNS: LazyLock<Vec<DenyPattern>> = LazyLock::new(|| {
    vec![
        pattern(
            "sql-keyword",
            r"(?i)\b(select|insert|update|delete|drop|union|alter|create|truncate)[\s(]",
        ),
        pattern("sql-comment", r"(--|/\*|\*/)"),
        pattern("sql-quote-break", r"(?i)'\s*(or|and|;|=|--)"),
        pattern(
            "sql-tautology",
            r#"(?i)\b(or|and)\s+(\d+\s*=\s*\d+|'[^']*'\s*=\s*'[^']*'|"[^"]*"\s*=\s*"[^"]*")"#,
        ),
        pattern("sql-stored-procedure", r"(?i)\b(exec(ute)?\s|xp_\w+|sp_\w+)"),
    ]
});

/// Script-injection shapes: script/iframe tags, executable URL schemes,
/// and inline event-handler attributes.
pub static XSS_PATTERNS: LazyLock<Vec<DenyPattern>> = LazyLock::new(|| {
    vec![
        pattern("xss-script-tag", r"(?i)<\s*/?\s*script\b"),
        pattern("xss-iframe-tag", r"(?i)<\s*/?\s*iframe\b"),
        pattern("xss-javascript-scheme", r"(?i)javascript\s*:"),
        pattern("xss-vbscript-scheme", r"(?i)vbscript\s*:"),
        pattern("xss-data-html-scheme", r"(?i)data\s*:\s*text/html"),
        pattern("xss-event-handler", r"(?i)\bon[a-z]+\s*="),
    ]
});

/// First matching SQL-injection pattern label, if any.
pub fn match_sql(input: &str) -> Option<&'static str> {
    SQL_PATTERNS
        .iter()
        .find(|p| p.regex.is_match(input))
        .map(|p| p.label)
}

/// First matching script-injection pattern label, if any.
pub fn match_xss(input: &str) -> Option<&'static str> {
    XSS_PATTERNS
        .iter()
        .find(|p| p.regex.is_match(input))
        .map(|p| p.label)
}

/// Deny-list sizes, reported by the security posture health check.
pub fn table_sizes() -> (usize, usize) {
    (SQL_PATTERNS.len(), XSS_PATTERNS.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_compile() {
        let (sql, xss) = table_sizes();
        assert!(sql >= 5);
        assert!(xss >= 6);
    }

    #[test]
    fn test_sql_keyword_positions() {
        for input in [
            "SELECT * FROM users",
            "payload; DROP TABLE commitments",
            "1 UNION (select password)",
        ] {
            assert!(match_sql(input).is_some(), "should match: {input}");
        }
    }

    #[test]
    fn test_sql_tautologies_and_comments() {
        assert_eq!(match_sql("x' OR '1'='1"), Some("sql-quote-break"));
        assert!(match_sql("admin'--").is_some());
        assert!(match_sql("value OR 1=1").is_some());
        assert!(match_sql("/* bypass */").is_some());
        assert!(match_sql("EXEC xp_cmdshell").is_some());
    }

    #[test]
    fn test_xss_shapes() {
        for input in [
            "<script>alert(1)</script>",
            "< IFRAME src=x>",
            "javascript:alert(1)",
            "vbscript:msgbox",
            "data:text/html;base64,xx",
            "<img src=x onerror=alert(1)>",
        ] {
            assert!(match_xss(input).is_some(), "should match: {input}");
        }
    }

    #[test]
    fn test_benign_text_passes() {
        for input in [
            "Morning run at the park",
            "Selected the premium plan",
            "update: all good",
            "latitude 52.1, longitude 4.3",
        ] {
            assert!(match_sql(input).is_none(), "false positive sql: {input}");
            assert!(match_xss(input).is_none(), "false positive xss: {input}");
        }
    }
}
