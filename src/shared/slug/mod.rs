//! Slug helpers shared by events, agents and revista posts.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_SLUG_LEN: usize = 80;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug regex"));

fn fold(c: char) -> Option<&'static str> {
    Some(match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'é' | 'è' | 'ê' | 'ë' => "e",
        'í' | 'ì' | 'î' | 'ï' => "i",
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => "o",
        'ú' | 'ù' | 'û' | 'ü' => "u",
        'ç' => "c",
        'ñ' => "n",
        'ý' | 'ÿ' => "y",
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        _ => return None,
    })
}

/// Turns free text into a URL slug: `"Festival de São João!"` → `"festival-de-sao-joao"`.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        let piece: Option<std::borrow::Cow<'static, str>> = if c.is_ascii_alphanumeric() {
            Some(c.to_string().into())
        } else {
            fold(c).map(Into::into)
        };

        match piece {
            Some(p) => {
                if pending_dash && !out.is_empty() {
                    out.push('-');
                }
                pending_dash = false;
                out.push_str(&p);
            }
            None => pending_dash = true,
        }
    }

    if out.len() > MAX_SLUG_LEN {
        out.truncate(MAX_SLUG_LEN);
        while out.ends_with('-') {
            out.pop();
        }
    }
    out
}

pub fn is_valid_slug(s: &str) -> bool {
    s.len() <= MAX_SLUG_LEN && SLUG_RE.is_match(s)
}

/// Longest prefix of `s` within `max` bytes, without a trailing dash.
fn stem(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].trim_end_matches('-')
}

/// Returns `base` if free, otherwise the first free `base-N` with N starting at 2.
/// The base is shortened so that `base-N` stays within [`MAX_SLUG_LEN`].
pub fn unique_slug<F>(base: &str, is_taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    if !is_taken(base) {
        return base.to_string();
    }
    let mut n = 2usize;
    loop {
        let suffix = format!("-{}", n);
        let candidate = format!(
            "{}{}",
            stem(base, MAX_SLUG_LEN.saturating_sub(suffix.len())),
            suffix
        );
        if !is_taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
