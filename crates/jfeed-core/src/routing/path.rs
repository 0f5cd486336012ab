//! Request path classification for the redirect middleware.
//!
//! Classification is purely syntactic; whether an entity exists is decided by
//! the [`Resolver`](super::Resolver).

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static ARCHIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/archive/(\d{4})(?:/(\d{1,2})(?:/(\d{1,2}))?)?$")
        .expect("archive regex must compile")
});

/// Prefixes that never reach the middleware logic.
const BYPASS_PREFIXES: &[&str] = &["/api/", "/_next/", "/static/"];
const BYPASS_EXACT: &[&str] = &["/", "/api", "/health"];

/// First segments the site owns; these get case normalization.
const SECTIONS: &[&str] = &["article", "news", "author", "tag", "category", "archive"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePath {
    /// Static assets, API calls, the home page.
    Bypass,
    /// Same resource under a normalized spelling.
    Normalize(String),
    /// Syntactically impossible resource (non-numeric id, bad date, bad escape).
    Invalid,
    Article {
        id: u64,
        slug: Option<String>,
        /// `/news/{id}`, `/{id}` or `/category/{slug}/{id}`.
        legacy: bool,
    },
    Author(String),
    Tag(String),
    Category(String),
    Archive {
        year: i32,
        month: Option<u32>,
        day: Option<u32>,
    },
    Other,
}

pub fn classify(path: &str) -> RoutePath {
    if path.is_empty() || BYPASS_EXACT.contains(&path) {
        return RoutePath::Bypass;
    }
    if BYPASS_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return RoutePath::Bypass;
    }
    if path
        .rsplit('/')
        .next()
        .is_some_and(|last| last.contains('.'))
    {
        return RoutePath::Bypass;
    }

    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        return RoutePath::Normalize(if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        });
    }

    let raw: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let first = raw.first().copied().unwrap_or_default();

    let owned_section =
        SECTIONS.contains(&first.to_ascii_lowercase().as_str()) || is_numeric(first);
    if owned_section {
        if let Some(lowered) = lowercase_outside_escapes(path) {
            return RoutePath::Normalize(lowered);
        }
    }

    if first == "archive" {
        return classify_archive(path);
    }

    let mut segments = Vec::with_capacity(raw.len());
    for segment in &raw {
        match urlencoding::decode(segment) {
            Ok(decoded) => segments.push(decoded.into_owned()),
            Err(_) => return RoutePath::Invalid,
        }
    }
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    match segments.as_slice() {
        ["article", id] => article(id, None, false),
        ["article", id, slug] => article(id, Some(*slug), false),
        ["news", id] => article(id, None, true),
        [id] if is_numeric(id) => article(id, None, true),
        ["category", _, id] if is_numeric(id) => article(id, None, true),
        ["author", slug] if !slug.is_empty() => RoutePath::Author(slug.to_string()),
        ["tag", slug] if !slug.is_empty() => RoutePath::Tag(slug.to_string()),
        ["category", slug] if !slug.is_empty() => RoutePath::Category(slug.to_string()),
        ["article" | "author" | "tag" | "category" | "news", ..] => RoutePath::Invalid,
        _ => RoutePath::Other,
    }
}

fn article(id: &str, slug: Option<&str>, legacy: bool) -> RoutePath {
    if !is_numeric(id) {
        return RoutePath::Invalid;
    }
    match id.parse::<u64>() {
        Ok(id) => RoutePath::Article {
            id,
            slug: slug.filter(|s| !s.is_empty()).map(str::to_string),
            legacy,
        },
        Err(_) => RoutePath::Invalid,
    }
}

fn classify_archive(path: &str) -> RoutePath {
    let Some(caps) = ARCHIVE_RE.captures(path) else {
        return RoutePath::Invalid;
    };

    let year_str = &caps[1];
    let month_str = caps.get(2).map(|m| m.as_str());
    let day_str = caps.get(3).map(|m| m.as_str());

    let Ok(year) = year_str.parse::<i32>() else {
        return RoutePath::Invalid;
    };
    let month = month_str.and_then(|m| m.parse::<u32>().ok());
    let day = day_str.and_then(|d| d.parse::<u32>().ok());

    let valid = match (month, day) {
        (None, _) => true,
        (Some(m), None) => (1..=12).contains(&m),
        (Some(m), Some(d)) => NaiveDate::from_ymd_opt(year, m, d).is_some(),
    };
    if !valid {
        return RoutePath::Invalid;
    }

    let padded = month_str.map_or(true, |m| m.len() == 2) && day_str.map_or(true, |d| d.len() == 2);
    if !padded {
        return RoutePath::Normalize(archive_path(year, month, day));
    }

    RoutePath::Archive { year, month, day }
}

pub fn archive_path(year: i32, month: Option<u32>, day: Option<u32>) -> String {
    match (month, day) {
        (Some(m), Some(d)) => format!("/archive/{year:04}/{m:02}/{d:02}"),
        (Some(m), None) => format!("/archive/{year:04}/{m:02}"),
        _ => format!("/archive/{year:04}"),
    }
}

/// Percent-encode each segment of a decoded path for use in a `Location` header.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Lower-case ASCII letters, leaving the hex digits of `%XX` escapes alone.
fn lowercase_outside_escapes(path: &str) -> Option<String> {
    let mut out = String::with_capacity(path.len());
    let mut escape_left = 0;
    let mut changed = false;

    for c in path.chars() {
        if escape_left > 0 {
            escape_left -= 1;
            out.push(c);
        } else if c == '%' {
            escape_left = 2;
            out.push(c);
        } else if c.is_ascii_uppercase() {
            changed = true;
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }

    changed.then_some(out)
}
