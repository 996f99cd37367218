/// Crawl-wide count of consecutive network failures
///
/// Shared by every item in a run. Reaching the trigger asks the fetcher to
/// stand down for a cooldown; any HTTP response clears the count.
#[derive(Debug, Clone)]
pub struct TimeoutTracker {
    consecutive: u32,
    trigger: u32,
    cooldowns: u32,
}

impl TimeoutTracker {
    pub fn new(trigger: u32) -> Self {
        Self {
            consecutive: 0,
            trigger,
            cooldowns: 0,
        }
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    /// Number of cooldowns entered during the run
    pub fn cooldowns(&self) -> u32 {
        self.cooldowns
    }

    /// Counts a timeout or connection failure
    ///
    /// Returns `true` when the trigger is reached and a cooldown is due.
    pub fn record_timeout(&mut self) -> bool {
        self.consecutive += 1;
        self.consecutive >= self.trigger
    }

    /// Clears the count after a response or an unrelated request error
    pub fn reset(&mut self) {
        self.consecutive = 0;
    }

    /// Marks a completed cooldown and clears the count
    pub fn finish_cooldown(&mut self) {
        self.cooldowns += 1;
        self.consecutive = 0;
    }
}
