//! Debounced text input
//!
//! Each keystroke returns a [`Ticket`]. The view sleeps for the delay with
//! [`Debounce::wait`] and hands the ticket back to [`Debounce::settle`];
//! only the ticket of the last keystroke yields a value, and only once.

use std::time::Duration;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(600);

/// Identifies one keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone)]
pub struct Debounce {
    value: String,
    delay: Duration,
    latest: u64,
    settled: bool,
}

impl Debounce {
    pub fn new(initial: impl Into<String>, delay: Duration) -> Self {
        Self {
            value: initial.into(),
            delay,
            latest: 0,
            settled: true,
        }
    }

    /// Raw text, for echoing in the input
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Filter derived from the raw text; blank means no filter
    pub fn keyword(&self) -> Option<String> {
        keyword_of(&self.value)
    }

    /// Record a keystroke
    pub fn set(&mut self, value: impl Into<String>) -> Ticket {
        self.value = value.into();
        self.latest += 1;
        self.settled = false;
        Ticket(self.latest)
    }

    /// Replace the text without scheduling anything (e.g. after navigation)
    pub fn reset(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.latest += 1;
        self.settled = true;
    }

    /// The delayed value if `ticket` is still the latest keystroke.
    ///
    /// Outer `None` means nothing to propagate; inner `None` means the
    /// input is blank.
    pub fn settle(&mut self, ticket: Ticket) -> Option<Option<String>> {
        if ticket.0 != self.latest || self.settled {
            return None;
        }
        self.settled = true;
        Some(self.keyword())
    }

    /// Sleep for `delay`, then give the ticket back
    pub async fn wait(delay: Duration, ticket: Ticket) -> Ticket {
        tokio::time::sleep(delay).await;
        ticket
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new("", DEFAULT_DEBOUNCE)
    }
}

fn keyword_of(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_only_last_keystroke_propagates() {
        let debounce = Arc::new(Mutex::new(Debounce::default()));
        let delivered = Arc::new(Mutex::new(Vec::new()));
        let start = Instant::now();

        let mut handles = Vec::new();
        for text in ["s", "sh", "sho", "shoe"] {
            let ticket = debounce.lock().unwrap().set(text);
            let delay = debounce.lock().unwrap().delay();
            let debounce = Arc::clone(&debounce);
            let delivered = Arc::clone(&delivered);
            handles.push(tokio::spawn(async move {
                let ticket = Debounce::wait(delay, ticket).await;
                if let Some(keyword) = debounce.lock().unwrap().settle(ticket) {
                    delivered.lock().unwrap().push((keyword, start.elapsed()));
                }
            }));
            // Let the task arm its timer before the clock moves
            tokio::task::yield_now().await;
            tokio::time::advance(Duration::from_millis(100)).await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let delivered = delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0.as_deref(), Some("shoe"));
        // Last keystroke at 300ms, plus the 600ms delay
        assert_eq!(delivered[0].1, Duration::from_millis(900));
    }

    #[test]
    fn test_settle_only_once() {
        let mut debounce = Debounce::default();
        let ticket = debounce.set("shoe");
        assert_eq!(debounce.settle(ticket), Some(Some("shoe".into())));
        assert_eq!(debounce.settle(ticket), None);
    }

    #[test]
    fn test_blank_input_is_no_filter() {
        let mut debounce = Debounce::new("shoe", DEFAULT_DEBOUNCE);
        let ticket = debounce.set("   ");
        assert_eq!(debounce.value(), "   ");
        assert_eq!(debounce.keyword(), None);
        assert_eq!(debounce.settle(ticket), Some(None));
    }

    #[test]
    fn test_keyword_keeps_surrounding_spaces() {
        let mut debounce = Debounce::default();
        let ticket = debounce.set(" shoe ");
        assert_eq!(debounce.settle(ticket), Some(Some(" shoe ".into())));
    }

    #[test]
    fn test_reset_cancels_pending() {
        let mut debounce = Debounce::default();
        let ticket = debounce.set("sho");
        debounce.reset("boot");
        assert_eq!(debounce.settle(ticket), None);
        assert_eq!(debounce.value(), "boot");
    }
}
