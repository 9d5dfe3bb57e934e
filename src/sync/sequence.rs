/// Issues sequence numbers for status requests and tells which outcome is current.
///
/// Only the most recently issued request may be applied; a response that arrives after a
/// newer request went out is stale even if the newer one has not answered yet.
#[derive(Debug, Default)]
pub(crate) struct PollSequencer {
    issued: u64,
}

impl PollSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_issue_is_current() {
        let mut seq = PollSequencer::new();
        let first = seq.issue();
        assert!(seq.is_current(first));
        let second = seq.issue();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[test]
    fn nothing_is_current_before_the_first_issue() {
        let seq = PollSequencer::new();
        assert!(!seq.is_current(1));
    }
}
