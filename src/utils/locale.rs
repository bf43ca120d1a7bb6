use axum::http::{header::ACCEPT_LANGUAGE, HeaderMap};

pub const DEFAULT_LANGUAGE: &str = "en";

/// First language tag of `Accept-Language`, lowercased, without its quality.
pub fn language_from_headers(headers: &HeaderMap) -> String {
    headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|tag| tag.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .filter(|tag| !tag.is_empty() && tag != "*")
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

/// Locale tag understood by the SumUp card widget.
pub fn sumup_locale(language: &str) -> &'static str {
    match language {
        "de" | "de-informal" => "de-DE",
        "fr" => "fr-FR",
        _ => "en-GB",
    }
}
