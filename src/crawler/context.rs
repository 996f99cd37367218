use super::Pacer;
use crate::config::Config;
use crate::identity::{Identity, IdentityGenerator, IdentityKind};
use crate::proxy::ProxyPool;
use crate::state::TimeoutTracker;

/// Mutable state shared by every item of one run
///
/// Holds what outlives a single item: proxy health, the identity in use,
/// the crawl-wide timeout streak and the shutdown-aware pacer.
pub struct CrawlSession {
    pub proxies: ProxyPool,
    pub identities: IdentityGenerator,
    pub timeouts: TimeoutTracker,
    pub pacer: Pacer,
    identity_kind: IdentityKind,
    current_identity: Option<Identity>,
}

impl CrawlSession {
    pub fn new(
        proxies: ProxyPool,
        identities: IdentityGenerator,
        timeouts: TimeoutTracker,
        pacer: Pacer,
    ) -> Self {
        Self {
            proxies,
            identities,
            timeouts,
            pacer,
            identity_kind: IdentityKind::Random,
            current_identity: None,
        }
    }

    /// Builds a session from configuration and a loaded proxy pool
    pub fn from_config(config: &Config, proxies: ProxyPool, pacer: Pacer) -> Self {
        Self::new(
            proxies,
            IdentityGenerator::from_config(&config.identity),
            TimeoutTracker::new(config.cooldown.trigger),
            pacer,
        )
        .with_identity_kind(config.identity.kind)
    }

    pub fn with_identity_kind(mut self, kind: IdentityKind) -> Self {
        self.identity_kind = kind;
        self
    }

    /// The identity in use, created on first call
    pub fn current_identity(&mut self) -> Identity {
        match &self.current_identity {
            Some(identity) => identity.clone(),
            None => self.rotate_identity(),
        }
    }

    /// Draws a fresh identity and makes it current
    pub fn rotate_identity(&mut self) -> Identity {
        let identity = self.identities.next(self.identity_kind);
        tracing::debug!("Using identity {}", identity.user_agent());
        self.current_identity = Some(identity.clone());
        identity
    }

    /// Attempt 1 keeps the current identity; later attempts rotate it
    pub fn identity_for_attempt(&mut self, attempt: u32) -> Identity {
        if attempt <= 1 {
            self.current_identity()
        } else {
            self.rotate_identity()
        }
    }
}
