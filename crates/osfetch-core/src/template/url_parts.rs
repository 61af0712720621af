//! `Base` and `Extension` template fields derived from a URL.

/// Everything after the last `/` of `url`. Empty when the URL ends in `/`.
pub fn url_base(url: &str) -> &str {
    match url.rfind('/') {
        Some(i) => &url[i + 1..],
        None => url,
    }
}

/// Suffix of `base` starting at the last `.`, or empty if there is none.
pub fn base_extension(base: &str) -> &str {
    match base.rfind('.') {
        Some(i) => &base[i..],
        None => "",
    }
}
