//! Client identity generation
//!
//! An identity is the user-agent string presented on a request together with
//! the coarse platform class it implies. The generator draws candidates from
//! an [`IdentitySource`], rejects any that match the banned-platform keyword
//! set, and falls back to a fixed identity when every draw is rejected.

mod catalog;
mod generator;

pub use catalog::{CatalogSource, BUILTIN_USER_AGENTS};
pub use generator::IdentityGenerator;

use serde::Deserialize;

/// Returned for desktop and random requests when every draw is rejected
pub const FALLBACK_DESKTOP: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15";

/// Returned for mobile requests when every draw is rejected
pub const FALLBACK_MOBILE: &str = "Mozilla/5.0 (Linux; Android 10; SM-G973F) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";

const MOBILE_MARKERS: [&str; 4] = ["Mobile", "Android", "iPhone", "iPad"];

/// Kind of identity a caller asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    /// Any platform that passes the exclusion predicate
    Random,
    /// A macOS desktop browser
    Desktop,
    /// A phone or tablet browser
    Mobile,
}

impl IdentityKind {
    /// Whether a candidate string satisfies this kind
    pub fn accepts(&self, user_agent: &str) -> bool {
        match self {
            IdentityKind::Random => true,
            IdentityKind::Desktop => {
                user_agent.contains("Macintosh") && !user_agent.contains("Mobile")
            }
            IdentityKind::Mobile => MOBILE_MARKERS.iter().any(|m| user_agent.contains(m)),
        }
    }

    pub fn fallback(&self) -> &'static str {
        match self {
            IdentityKind::Mobile => FALLBACK_MOBILE,
            IdentityKind::Random | IdentityKind::Desktop => FALLBACK_DESKTOP,
        }
    }
}

/// Coarse platform class implied by a user-agent string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformClass {
    Desktop,
    Mobile,
    Tablet,
}

impl PlatformClass {
    pub fn from_user_agent(user_agent: &str) -> Self {
        if user_agent.contains("iPad") || user_agent.contains("Tablet") {
            PlatformClass::Tablet
        } else if MOBILE_MARKERS.iter().any(|m| user_agent.contains(m)) {
            PlatformClass::Mobile
        } else {
            PlatformClass::Desktop
        }
    }
}

/// A client identity presented on one request attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_agent: String,
    platform: PlatformClass,
}

impl Identity {
    pub fn new(user_agent: impl Into<String>) -> Self {
        let user_agent = user_agent.into();
        let platform = PlatformClass::from_user_agent(&user_agent);
        Self {
            user_agent,
            platform,
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn platform(&self) -> PlatformClass {
        self.platform
    }

    /// Value for the `sec-ch-ua-platform` client hint, already quoted
    pub fn platform_hint(&self) -> &'static str {
        let ua = self.user_agent.as_str();
        if ua.contains("iPhone") || ua.contains("iPad") {
            "\"iOS\""
        } else if ua.contains("Android") {
            "\"Android\""
        } else if ua.contains("Macintosh") {
            "\"macOS\""
        } else if ua.contains("Linux") {
            "\"Linux\""
        } else {
            "\"macOS\""
        }
    }

    /// Value for the `sec-ch-ua` brand list
    ///
    /// Only Chromium browsers send brand hints, so Safari and Firefox
    /// identities get `None`.
    pub fn brand_hint(&self) -> Option<String> {
        let ua = self.user_agent.as_str();
        if ua.contains("Firefox/") {
            return None;
        }
        let chromium = major_version(ua, "Chrome/")?;
        let (brand, version) = match major_version(ua, "Edg/") {
            Some(edge) => ("Microsoft Edge", edge),
            None => ("Google Chrome", chromium),
        };
        Some(format!(
            "\"Chromium\";v=\"{}\", \"{}\";v=\"{}\", \"Not_A Brand\";v=\"24\"",
            chromium, brand, version
        ))
    }

    /// Value for the `sec-ch-ua-mobile` client hint
    pub fn mobile_hint(&self) -> &'static str {
        let ua = self.user_agent.as_str();
        if ua.contains("iPhone") || (ua.contains("Android") && !ua.contains("iPad")) {
            "?1"
        } else {
            "?0"
        }
    }
}

/// Major version following `marker`, e.g. `131` in `Chrome/131.0.0.0`
fn major_version<'a>(user_agent: &'a str, marker: &str) -> Option<&'a str> {
    let rest = &user_agent[user_agent.find(marker)? + marker.len()..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

/// A provider of candidate user-agent strings
///
/// A draw may fail; the generator counts a failed draw as a used attempt.
pub trait IdentitySource: Send {
    fn draw(&mut self, kind: IdentityKind) -> Option<String>;
}

/// Case-insensitive substring test against the banned keyword set
pub fn is_excluded(user_agent: &str, excluded_keywords: &[String]) -> bool {
    let lowered = user_agent.to_lowercase();
    excluded_keywords
        .iter()
        .any(|k| lowered.contains(&k.to_lowercase()))
}
