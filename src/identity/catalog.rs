//! Built-in catalogue of browser user-agent strings

use super::{IdentityKind, IdentitySource, PlatformClass};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Current browser user agents across the common platforms (updated Nov 2024).
///
/// Windows entries are present on purpose; the exclusion predicate filters them.
pub const BUILTIN_USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36 Edg/130.0.0.0",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    // Chrome on Mac
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    // Firefox on Mac
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
    // Safari on Mac
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
    // Linux desktop
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
    // Android
    "Mozilla/5.0 (Linux; Android 14; SM-S918N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Mobile Safari/537.36",
    // iOS
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPad; CPU OS 17_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Mobile/15E148 Safari/604.1",
];

/// Draws user agents at random from a fixed list
///
/// Desktop draws come from the desktop entries (all operating systems) and
/// mobile draws from the phone and tablet entries, so the caller's exclusion
/// predicate still has work to do.
pub struct CatalogSource {
    desktop: Vec<String>,
    mobile: Vec<String>,
    rng: StdRng,
}

impl CatalogSource {
    /// Creates a source over the given list, or the built-in catalogue when empty
    pub fn new(user_agents: &[String]) -> Self {
        Self::with_rng(user_agents, StdRng::from_entropy())
    }

    pub fn with_rng(user_agents: &[String], rng: StdRng) -> Self {
        let all: Vec<String> = if user_agents.is_empty() {
            BUILTIN_USER_AGENTS.iter().map(|s| s.to_string()).collect()
        } else {
            user_agents.to_vec()
        };

        let (desktop, mobile) = all
            .into_iter()
            .partition(|ua| PlatformClass::from_user_agent(ua) == PlatformClass::Desktop);

        Self {
            desktop,
            mobile,
            rng,
        }
    }

    pub fn builtin() -> Self {
        Self::new(&[])
    }
}

impl IdentitySource for CatalogSource {
    fn draw(&mut self, kind: IdentityKind) -> Option<String> {
        match kind {
            IdentityKind::Desktop => self.desktop.choose(&mut self.rng).cloned(),
            IdentityKind::Mobile => self.mobile.choose(&mut self.rng).cloned(),
            IdentityKind::Random => {
                let total = self.desktop.len() + self.mobile.len();
                if total == 0 {
                    return None;
                }
                let index = self.rng.gen_range(0..total);
                if index < self.desktop.len() {
                    self.desktop.get(index).cloned()
                } else {
                    self.mobile.get(index - self.desktop.len()).cloned()
                }
            }
        }
    }
}
