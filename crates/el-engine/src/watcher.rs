//! Debounced navigation-change detection.
//!
//! The host feeds every mutation batch through `observe_mutation`; a settle
//! event fires once the URL has been quiet for the configured period. The
//! watcher never owns a timer; callers inject `Instant`s, so any timing
//! primitive (and any test clock) drives it.

use std::time::Duration;
use std::time::Instant;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1000);

#[derive(Debug)]
struct PendingSettle {
    url: String,
    deadline: Instant,
}

/// Collapses bursts of in-page navigation into single trailing-edge events.
#[derive(Debug)]
pub struct NavigationWatcher {
    last_seen_url: String,
    pending: Option<PendingSettle>,
    quiet_period: Duration,
}

impl NavigationWatcher {
    pub fn new(initial_url: &str, quiet_period: Duration) -> Self {
        Self {
            last_seen_url: initial_url.to_owned(),
            pending: None,
            quiet_period,
        }
    }

    /// Re-baselines the watcher on `url`, dropping any pending settle.
    pub fn reset(&mut self, url: &str) {
        self.last_seen_url = url.to_owned();
        self.pending = None;
    }

    pub fn last_seen_url(&self) -> &str {
        &self.last_seen_url
    }

    /// Feeds one mutation batch. The last-seen URL updates immediately, so
    /// rapid changes inside the quiet window only move the pending settle to
    /// the newest URL instead of stacking events.
    pub fn observe_mutation(&mut self, current_url: &str, now: Instant) {
        if current_url == self.last_seen_url {
            return;
        }

        self.last_seen_url = current_url.to_owned();
        self.pending = Some(PendingSettle {
            url: current_url.to_owned(),
            deadline: now + self.quiet_period,
        });
    }

    /// Yields at most one settle event per burst, carrying the trailing URL.
    pub fn poll_settled(&mut self, now: Instant) -> Option<String> {
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.deadline <= now)
        {
            return self.pending.take().map(|pending| pending.url);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::NavigationWatcher;
    use std::time::Duration;
    use std::time::Instant;

    const QUIET: Duration = Duration::from_millis(1000);

    #[test]
    fn settles_once_after_the_quiet_period() {
        let start = Instant::now();
        let mut watcher = NavigationWatcher::new("https://example.com/a", QUIET);

        watcher.observe_mutation("https://example.com/b", start);
        assert_eq!(watcher.poll_settled(start + Duration::from_millis(500)), None);

        let settled = watcher.poll_settled(start + QUIET);
        assert_eq!(settled, Some("https://example.com/b".to_owned()));
        assert_eq!(watcher.poll_settled(start + QUIET), None);
    }

    #[test]
    fn burst_of_changes_collapses_to_the_trailing_url() {
        let start = Instant::now();
        let mut watcher = NavigationWatcher::new("https://example.com/a", QUIET);

        watcher.observe_mutation("https://example.com/b", start);
        watcher.observe_mutation("https://example.com/c", start + Duration::from_millis(300));
        watcher.observe_mutation("https://example.com/d", start + Duration::from_millis(600));

        // The middle deadlines never fire.
        assert_eq!(watcher.poll_settled(start + Duration::from_millis(1100)), None);

        let settled = watcher.poll_settled(start + Duration::from_millis(1600));
        assert_eq!(settled, Some("https://example.com/d".to_owned()));
        assert_eq!(
            watcher.poll_settled(start + Duration::from_millis(5000)),
            None
        );
    }

    #[test]
    fn repeated_mutations_without_url_change_do_not_settle() {
        let start = Instant::now();
        let mut watcher = NavigationWatcher::new("https://example.com/a", QUIET);

        watcher.observe_mutation("https://example.com/a", start);
        watcher.observe_mutation("https://example.com/a", start + Duration::from_millis(100));
        assert_eq!(watcher.poll_settled(start + Duration::from_secs(10)), None);
    }

    #[test]
    fn returning_to_the_baseline_url_still_settles() {
        let start = Instant::now();
        let mut watcher = NavigationWatcher::new("https://example.com/a", QUIET);

        watcher.observe_mutation("https://example.com/b", start);
        watcher.observe_mutation("https://example.com/a", start + Duration::from_millis(100));

        let settled = watcher.poll_settled(start + Duration::from_millis(1200));
        assert_eq!(settled, Some("https://example.com/a".to_owned()));
    }

    #[test]
    fn reset_drops_the_pending_settle() {
        let start = Instant::now();
        let mut watcher = NavigationWatcher::new("https://example.com/a", QUIET);

        watcher.observe_mutation("https://example.com/b", start);
        watcher.reset("https://example.com/b");
        assert_eq!(watcher.poll_settled(start + Duration::from_secs(10)), None);
        assert_eq!(watcher.last_seen_url(), "https://example.com/b");
    }
}
