// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Hostname used for scraper lookup: lower-cased, leading `www.` removed.
///
/// # Examples
/// ```
/// use race_scraper::utils::url::site_host;
///
/// assert_eq!(
///     site_host("https://WWW.Bouttime.co.za/results"),
///     Some("bouttime.co.za".to_string())
/// );
/// ```
pub fn site_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host.is_empty() {
        return None;
    }
    Some(host.to_string())
}

/// First non-blank value of a query parameter, matched exactly.
///
/// A parameter present with an empty value counts as absent.
pub fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}

/// `scheme://host[:port]` of a URL.
pub fn origin(url: &Url) -> String {
    let mut origin = format!("{}://{}", url.scheme(), url.host_str().unwrap_or(""));
    if let Some(port) = url.port() {
        origin.push_str(&format!(":{port}"));
    }
    origin
}

/// Merge query parameters into a URL.
///
/// Existing keys are replaced at their original position, new keys are
/// appended in the given order, and pairs with a blank value are dropped.
pub fn merge_query(url: &Url, params: &[(&str, String)]) -> Url {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    for (key, value) in params {
        match pairs.iter().position(|(k, _)| k == key) {
            Some(first) => {
                pairs[first].1 = value.clone();
                let mut index = 0;
                pairs.retain(|(k, _)| {
                    let keep = index <= first || k != key;
                    index += 1;
                    keep
                });
            }
            None => pairs.push((key.to_string(), value.clone())),
        }
    }

    let mut merged = url.clone();
    merged.set_query(None);
    if !pairs.is_empty() {
        merged.query_pairs_mut().extend_pairs(pairs);
    }
    merged
}
