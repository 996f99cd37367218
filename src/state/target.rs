use crate::config::TargetConfig;
use crate::InputError;
use url::Url;

/// Pagination counters for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCursor {
    /// Next page to fetch; starts at 1 and never decreases
    pub current_page: u32,

    /// Pages in a row that yielded no records
    pub consecutive_empty_pages: u32,

    /// Network failures seen on this item since its last successful page
    pub consecutive_timeouts: u32,

    /// Same-page proxy changes used during the current empty streak
    pub proxy_change_attempts: u32,
}

impl ItemCursor {
    pub fn new() -> Self {
        Self {
            current_page: 1,
            consecutive_empty_pages: 0,
            consecutive_timeouts: 0,
            proxy_change_attempts: 0,
        }
    }

    /// Records a page that yielded records and moves to the next one
    pub fn record_success(&mut self) {
        self.consecutive_empty_pages = 0;
        self.consecutive_timeouts = 0;
        self.proxy_change_attempts = 0;
        self.current_page += 1;
    }

    /// Records a page that yielded nothing, without moving the cursor
    pub fn record_empty(&mut self) {
        self.consecutive_empty_pages += 1;
    }

    pub fn advance(&mut self) {
        self.current_page += 1;
    }
}

impl Default for ItemCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// An item whose reviews are harvested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetItem {
    /// Stable identifier extracted from the item URL
    pub id: String,

    /// Display name from the target list
    pub name: String,

    /// URL as given in the target list, without fragment
    pub url: String,

    /// Title taken from the first page that yielded records
    pub title: Option<String>,

    pub cursor: ItemCursor,
}

impl TargetItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            title: None,
            cursor: ItemCursor::new(),
        }
    }

    /// Builds an item from a target-list URL
    ///
    /// The URL must be on the storefront's host and contain the item path;
    /// the identifier is the path segment that follows it.
    ///
    /// # Arguments
    ///
    /// * `url` - Item URL from the target list
    /// * `name` - Display name
    /// * `target` - Storefront settings holding the host and item path
    ///
    /// # Returns
    ///
    /// * `Ok(TargetItem)` - The item with its identifier
    /// * `Err(InputError::InvalidTarget)` - The URL is not an item page of the storefront
    pub fn from_url(url: &str, name: &str, target: &TargetConfig) -> Result<Self, InputError> {
        let invalid = |reason: &str| InputError::InvalidTarget {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let mut parsed = Url::parse(url.trim()).map_err(|e| invalid(&e.to_string()))?;
        parsed.set_fragment(None);

        let host = parsed.host_str().ok_or_else(|| invalid("missing host"))?;
        if !host_matches(host, &target.base_url) {
            return Err(invalid("not on the storefront host"));
        }

        let item_path = format!("/{}", target.item_path.trim_matches('/'));
        let rest = parsed
            .path()
            .split_once(&format!("{}/", item_path))
            .map(|(_, rest)| rest)
            .ok_or_else(|| invalid("missing item path"))?;

        let id = rest.split('/').next().unwrap_or_default();
        if id.is_empty() {
            return Err(invalid("empty item identifier"));
        }

        Ok(Self::new(id, name, parsed.as_str()))
    }
}

/// Whether `host` belongs to the storefront at `base_url`
fn host_matches(host: &str, base_url: &str) -> bool {
    let Some(base_host) = Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
    else {
        return false;
    };

    let domain = base_host.strip_prefix("www.").unwrap_or(&base_host);
    host == domain || host.ends_with(&format!(".{}", domain))
}
