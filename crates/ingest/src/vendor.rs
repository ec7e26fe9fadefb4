use std::sync::OnceLock;

use regex::Regex;

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_check_marker, r"\bCHECK\s*#");
re!(re_zelle_payee, r"(?i)ZELLE\s+PAYMENT\s+TO\s+(.+?)(\s+\d+|$)");
re!(re_ach_originator, r"(?i)ORIG\s+CO\s+NAME\s*:\s*(.+?)(\s+ORIG|\s+ID:|\s+DESC|$)");
re!(re_token, r"[A-Za-z0-9&'\-]+");

const MAX_LABEL_CHARS: usize = 60;

/// Derive a short vendor label from a free-text bank description.
///
/// Rules fire in order, first hit wins: check-number marker, Zelle payee,
/// ACH originator, then a first-three-tokens fallback. Payee and originator
/// names keep the source casing; the fallback works on the uppercased text.
pub fn extract_vendor_name(description: &str) -> Option<String> {
    let upper = description.to_uppercase();
    let upper = upper.trim();

    if re_check_marker().is_match(upper) {
        return Some("CHECK".to_string());
    }

    if let Some(caps) = re_zelle_payee().captures(description) {
        return Some(truncate_chars(caps[1].trim(), MAX_LABEL_CHARS));
    }

    if let Some(caps) = re_ach_originator().captures(description) {
        let name = caps[1].trim();
        if name.is_empty() {
            return None;
        }
        return Some(truncate_chars(name, MAX_LABEL_CHARS));
    }

    let tokens: Vec<&str> = re_token()
        .find_iter(upper)
        .take(3)
        .map(|m| m.as_str())
        .collect();
    if tokens.is_empty() {
        return None;
    }
    Some(truncate_chars(&tokens.join(" "), MAX_LABEL_CHARS))
}

/// Truncate by character count, not bytes.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
