//! Loose URL checks shared with the URL resource activity.
//!
//! These only catch egregious typos. They are not an RFC 3986 grammar and
//! not a security boundary: opaque schemes such as `mailto:` or
//! `javascript:` pass untouched.

use once_cell::sync::Lazy;
use regex::Regex;

use super::strings::{StringKey, StringTable};

static RECOGNISED_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(/|https?:|ftp:)").expect("recognised prefix regex"));
static AUTHORITY_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z]+://([^:@\s]+:[^@\s]+@)?[^ @]+(:[0-9]+)?(/[^#]*)?(#.*)?$")
        .expect("authority url regex")
});
static GENERIC_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z]+://.+$").expect("generic url regex"));
static SCHEME_AUTHORITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z]+://").expect("scheme authority regex"));
static WEB_SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(https?|ftp):").expect("web scheme regex"));
static OPAQUE_SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z]+:").expect("opaque scheme regex"));

/// Weak syntactic check of an absolute URL.
pub fn is_valid_url(url: &str) -> bool {
    if RECOGNISED_PREFIX_RE.is_match(url) {
        AUTHORITY_URL_RE.is_match(url)
    } else {
        GENERIC_URL_RE.is_match(url)
    }
}

/// How [`validate_url`] classified its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlShape {
    ServerRelative,
    Web,
    Opaque,
    Bare,
}

pub fn classify(url: &str) -> UrlShape {
    if url.starts_with('/') {
        UrlShape::ServerRelative
    } else if SCHEME_AUTHORITY_RE.is_match(url) || WEB_SCHEME_RE.is_match(url) {
        UrlShape::Web
    } else if OPAQUE_SCHEME_RE.is_match(url) {
        UrlShape::Opaque
    } else {
        UrlShape::Bare
    }
}

/// Returns the translated "invalid URL" message, or `None` when the value is
/// acceptable.
///
/// A bare value is never stored as a relative link. It is accepted only if
/// prefixing `http://` yields something [`is_valid_url`] accepts, because the
/// link is displayed from several different pages.
pub fn validate_url(url: &str, strings: &StringTable) -> Option<String> {
    let valid = match classify(url) {
        UrlShape::ServerRelative | UrlShape::Opaque => true,
        UrlShape::Web => is_valid_url(url),
        UrlShape::Bare => is_valid_url(&format!("http://{url}")),
    };

    if valid {
        None
    } else {
        Some(strings.translate(StringKey::InvalidUrl))
    }
}
