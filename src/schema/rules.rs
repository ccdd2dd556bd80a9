// Reusable field rules.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_EMAIL_LEN: usize = 254;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").expect("email regex")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9 +()\-]{8,20}$").expect("phone regex"));

static INSTAGRAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._]{1,30}$").expect("instagram regex"));

pub fn is_email(s: &str) -> bool {
    s.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(s)
}

pub fn is_phone(s: &str) -> bool {
    PHONE_RE.is_match(s) && s.chars().filter(char::is_ascii_digit).count() >= 8
}

pub fn is_instagram_handle(s: &str) -> bool {
    INSTAGRAM_RE.is_match(s)
}

/// Absolute http(s) URL with a host.
pub fn is_http_url(s: &str) -> bool {
    match url::Url::parse(s) {
        Ok(u) => matches!(u.scheme(), "http" | "https") && u.host_str().is_some(),
        Err(_) => false,
    }
}

/// Length in characters, not bytes.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

pub fn len_between(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&char_len(s))
}

/// Trims in place; empty strings become `None`.
pub fn trim_opt(v: &mut Option<String>) {
    if let Some(s) = v.take() {
        let t = s.trim();
        if !t.is_empty() {
            *v = Some(t.to_string());
        }
    }
}

pub fn trim(v: &mut String) {
    let t = v.trim();
    if t.len() != v.len() {
        *v = t.to_string();
    }
}

/// Trims every item, dropping empty ones and duplicates (first wins).
pub fn trim_list(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    let cleaned: Vec<String> = items
        .drain(..)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect();
    *items = cleaned;
}
