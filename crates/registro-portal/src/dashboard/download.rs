use std::sync::OnceLock;

use regex::Regex;

use crate::matching::fold_diacritics;

const UPLOAD_SEGMENT: &str = "/upload/";
const STALE_FLAG_PATTERN: &str = r"/upload/fl_attachment:[^/]*/";

static STALE_FLAG_REGEX: OnceLock<Regex> = OnceLock::new();

fn stale_flag_regex() -> &'static Regex {
    STALE_FLAG_REGEX.get_or_init(|| {
        Regex::new(STALE_FLAG_PATTERN).expect("STALE_FLAG_PATTERN is a valid regex pattern")
    })
}

/// Save-as name restricted to `[A-Za-z0-9._-]`, always ending in `.pdf`.
pub fn sanitize_file_name(desired: &str) -> String {
    let folded = fold_diacritics(desired.trim());
    let mut sanitized: String = folded
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        sanitized.push_str("documento");
    }
    if !sanitized.to_ascii_lowercase().ends_with(".pdf") {
        sanitized.push_str(".pdf");
    }
    sanitized
}

/// Rewrites a stored asset URL into an HTTPS raw-file link that downloads as `desired_name`.
///
/// Returns `None` for a missing URL. URLs without exactly one `/upload/` segment after the
/// scheme, resource-type and stale-flag rewrites are returned exactly as given.
pub fn build_download_url(raw_url: Option<&str>, desired_name: &str) -> Option<String> {
    let raw_url = raw_url.map(str::trim).filter(|url| !url.is_empty())?;

    let mut url = match raw_url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => raw_url.to_string(),
    };
    url = url.replace("/image/upload/", "/raw/upload/");
    url = stale_flag_regex()
        .replace_all(&url, UPLOAD_SEGMENT)
        .into_owned();

    let parts: Vec<&str> = url.split(UPLOAD_SEGMENT).collect();
    let [head, tail] = parts.as_slice() else {
        return Some(raw_url.to_string());
    };

    let file_name = sanitize_file_name(desired_name);
    Some(format!("{head}/upload/fl_attachment:{file_name}/{tail}"))
}
