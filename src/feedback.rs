//! Single-slot, auto-expiring notification line.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackMessage {
    pub text: String,
    pub success: bool,
    pub expires_at: Instant,
}

/// Holds at most one message. A new post replaces the current one and restarts the expiry.
#[derive(Debug)]
pub struct FeedbackChannel {
    ttl: Duration,
    current: Option<FeedbackMessage>,
}

impl FeedbackChannel {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    pub fn post(&mut self, text: impl Into<String>, success: bool, now: Instant) {
        self.current = Some(FeedbackMessage {
            text: text.into(),
            success,
            expires_at: now + self.ttl,
        });
    }

    pub fn current(&self, now: Instant) -> Option<&FeedbackMessage> {
        self.current.as_ref().filter(|m| now < m.expires_at)
    }

    /// Drop the message once its time is up. Returns true if something was cleared.
    pub fn expire(&mut self, now: Instant) -> bool {
        match &self.current {
            Some(m) if now >= m.expires_at => {
                self.current = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(5);

    #[test]
    fn message_expires_after_ttl() {
        let t0 = Instant::now();
        let mut ch = FeedbackChannel::new(TTL);
        ch.post("saved", true, t0);

        assert_eq!(ch.current(t0 + Duration::from_secs(4)).map(|m| m.text.as_str()), Some("saved"));
        assert!(ch.current(t0 + TTL).is_none());
        assert!(ch.expire(t0 + TTL));
        assert!(!ch.expire(t0 + TTL));
    }

    #[test]
    fn newer_post_supersedes_and_restarts_expiry() {
        let t0 = Instant::now();
        let mut ch = FeedbackChannel::new(TTL);
        ch.post("A", true, t0);
        let tb = t0 + Duration::from_secs(3);
        ch.post("B", false, tb);

        // A's deadline passes without clearing B.
        let after_a = t0 + TTL + Duration::from_millis(1);
        assert!(!ch.expire(after_a));
        let live = ch.current(after_a).unwrap();
        assert_eq!(live.text, "B");
        assert!(!live.success);
        assert_eq!(live.expires_at, tb + TTL);

        assert!(ch.expire(tb + TTL));
        assert!(ch.current(tb + TTL).is_none());
    }
}
