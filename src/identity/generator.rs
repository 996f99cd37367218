use super::{is_excluded, CatalogSource, Identity, IdentityKind, IdentitySource};
use crate::config::IdentityConfig;

/// Produces identities that never match the excluded platform set
pub struct IdentityGenerator {
    source: Box<dyn IdentitySource>,
    excluded_keywords: Vec<String>,
    max_attempts: u32,
}

impl IdentityGenerator {
    /// Creates a generator over the configured catalogue
    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(
            Box::new(CatalogSource::new(&config.user_agents)),
            config.excluded_keywords.clone(),
            config.max_attempts,
        )
    }

    pub fn new(
        source: Box<dyn IdentitySource>,
        excluded_keywords: Vec<String>,
        max_attempts: u32,
    ) -> Self {
        Self {
            source,
            excluded_keywords,
            max_attempts,
        }
    }

    /// Returns a fresh identity of the requested kind
    ///
    /// Draws up to `max_attempts` candidates. A candidate is accepted when it
    /// passes the exclusion predicate and matches `kind`; a failed draw still
    /// uses up an attempt. When nothing is accepted the fixed fallback for
    /// `kind` is returned.
    pub fn next(&mut self, kind: IdentityKind) -> Identity {
        for attempt in 1..=self.max_attempts {
            let Some(candidate) = self.source.draw(kind) else {
                tracing::debug!("Identity draw {} produced nothing", attempt);
                continue;
            };

            if self.is_excluded(&candidate) {
                tracing::trace!("Rejected excluded identity: {}", candidate);
                continue;
            }

            if !kind.accepts(&candidate) {
                tracing::trace!("Rejected identity not matching {:?}: {}", kind, candidate);
                continue;
            }

            return Identity::new(candidate);
        }

        tracing::debug!(
            "No acceptable {:?} identity after {} draws, using fallback",
            kind,
            self.max_attempts
        );
        Identity::new(kind.fallback())
    }

    pub fn is_excluded(&self, user_agent: &str) -> bool {
        is_excluded(user_agent, &self.excluded_keywords)
    }
}
