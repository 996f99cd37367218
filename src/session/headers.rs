use crate::config::HttpConfig;
use crate::identity::Identity;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, REFERER, USER_AGENT};

/// Navigation headers a desktop Chrome sends on a same-origin document request
const BASE_HEADERS: [(&str, &str); 10] = [
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
    ),
    ("cache-control", "max-age=0"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "same-origin"),
    ("sec-fetch-user", "?1"),
    ("upgrade-insecure-requests", "1"),
    ("dnt", "1"),
    ("pragma", "no-cache"),
    ("priority", "u=0, i"),
];

/// Builds the header set for one attempt
///
/// The user agent comes from `identity` and the `sec-ch-ua-platform` /
/// `sec-ch-ua-mobile` hints are derived from it so the two never disagree.
/// `sec-ch-ua` is only sent for Chromium identities.
/// `x-requested-with` is added on roughly half of the requests.
///
/// # Arguments
///
/// * `identity` - Identity presented on this attempt
/// * `http` - Accept-language and static extra headers
/// * `referer` - Referer to send, usually the item page
/// * `rng` - Random source for the optional headers
pub fn derive_headers<R: Rng + ?Sized>(
    identity: &Identity,
    http: &HttpConfig,
    referer: Option<&str>,
    rng: &mut R,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for (name, value) in BASE_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }

    insert(&mut headers, USER_AGENT, identity.user_agent());
    insert(
        &mut headers,
        HeaderName::from_static("accept-language"),
        &http.accept_language,
    );
    headers.insert(
        "sec-ch-ua-platform",
        HeaderValue::from_static(identity.platform_hint()),
    );
    headers.insert(
        "sec-ch-ua-mobile",
        HeaderValue::from_static(identity.mobile_hint()),
    );
    if let Some(brands) = identity.brand_hint() {
        insert(&mut headers, HeaderName::from_static("sec-ch-ua"), &brands);
    }

    if let Some(referer) = referer {
        insert(&mut headers, REFERER, referer);
    }

    if rng.gen_bool(0.5) {
        headers.insert(
            "x-requested-with",
            HeaderValue::from_static("XMLHttpRequest"),
        );
    }

    for (name, value) in &http.extra_headers {
        match HeaderName::from_bytes(name.as_bytes()) {
            Ok(name) => insert(&mut headers, name, value),
            Err(_) => tracing::warn!("Skipping invalid header name '{}'", name),
        }
    }

    headers
}

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(_) => tracing::warn!("Skipping invalid value for header '{}'", name),
    }
}
