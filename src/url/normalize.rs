use crate::{UrlError, UrlResult};
use url::Url;

/// Query parameters that never change which resource an address names
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes a raw link into a canonical address
///
/// # Normalization Steps
///
/// 1. Parse the URL, resolving it against `base` when given
/// 2. Require a host
/// 3. Remove the fragment (everything after #)
/// 4. Remove tracking query parameters (`utm_*`, `fbclid`, ...)
/// 5. Remove an empty query string (trailing ?)
///
/// Host lowercasing, default-port removal and dot-segment removal are done
/// by the `url` parser itself. Scheme checks are left to [`AddressScheme`].
///
/// [`AddressScheme`]: crate::url::AddressScheme
///
/// # Examples
///
/// ```
/// use linkweave::url::normalize_address;
///
/// let address = normalize_address("https://EXAMPLE.com/a/../page#top", None).unwrap();
/// assert_eq!(address.as_str(), "https://example.com/page");
/// ```
pub fn normalize_address(raw: &str, base: Option<&Url>) -> UrlResult<Url> {
    let raw = raw.trim();
    let mut url = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    }
    .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    Ok(url)
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
