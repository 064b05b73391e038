use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(?:```|~~~).*?(?:```|~~~|\z)").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`\n]*`").unwrap());
static BLOCK_QUOTE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*>.*$").unwrap());
static WHITESPACE_WITH_NEWLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\r]*\n\s*").unwrap());
static HORIZONTAL_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\r\f\v]+").unwrap());
static ANY_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Prepares a conclusion for mention classification.
///
/// Quoted and code context is removed so that pasted log lines or quoted alert
/// text never count as the agent's own claim. Whitespace runs collapse to a
/// single space, or a single newline when the run spans lines; newlines stay
/// as clause breaks.
pub fn normalize_conclusion(text: &str) -> String {
    let text = text.replace(['\u{2019}', '\u{2018}'], "'");
    let text = FENCED_CODE.replace_all(&text, " ");
    let text = BLOCK_QUOTE_LINE.replace_all(&text, "");
    let text = INLINE_CODE.replace_all(&text, " ");
    let text = WHITESPACE_WITH_NEWLINE.replace_all(&text, "\n");
    let text = HORIZONTAL_WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Lowercase, quotes stripped, whitespace collapsed. Used for substring
/// comparisons between free-form strings (queries, evidence items).
pub fn normalize_for_match(text: &str) -> String {
    let lowered = text.to_lowercase();
    let unquoted: String = lowered
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '`' | '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}'))
        .collect();
    ANY_WHITESPACE
        .replace_all(&unquoted, " ")
        .trim()
        .to_string()
}

/// Either string contains the other. Empty strings never match.
pub fn overlaps(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_code_and_quotes() {
        let text = "Checked logs:\n```\nERROR dns timeout\n```\n> alert: dns failure\nThe cause was `dns` misconfig in the pool.";
        let out = normalize_conclusion(text);
        assert!(!out.contains("ERROR"));
        assert!(!out.contains("alert"));
        assert!(!out.contains("`"));
        assert_eq!(out, "Checked logs:\nThe cause was misconfig in the pool.");
    }

    #[test]
    fn unterminated_fence_strips_to_end() {
        assert_eq!(normalize_conclusion("before ```rust\nfn x() {}"), "before");
    }

    #[test]
    fn collapses_whitespace_but_keeps_line_breaks() {
        assert_eq!(normalize_conclusion("a   b\t c\n\n\n  d"), "a b c\nd");
    }

    #[test]
    fn match_normalization() {
        assert_eq!(
            normalize_for_match("  Service:\"Checkout\"   AND\nlevel:ERROR "),
            "service:checkout and level:error"
        );
        assert!(overlaps("service:checkout", "service:checkout and level:error"));
        assert!(!overlaps("", "anything"));
    }
}
