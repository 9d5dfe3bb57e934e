use crate::model::JobStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Activity {
    Active,
    #[default]
    Inactive,
}

/// Detects the running -> stopped transition that completes a crawl.
#[derive(Debug, Default)]
pub(crate) struct EdgeDetector {
    state: Activity,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn activity(&self) -> Activity {
        self.state
    }

    /// Record one observed status. Returns true when it completes an observed run.
    pub fn observe(&mut self, status: JobStatus) -> bool {
        let (next, fired) = match (self.state, status) {
            (_, JobStatus::Running) => (Activity::Active, false),
            (Activity::Active, JobStatus::Stopped) => (Activity::Inactive, true),
            // Any other status re-enables start, which ends the observed run.
            (Activity::Active, _) => (Activity::Inactive, false),
            (Activity::Inactive, _) => (Activity::Inactive, false),
        };
        self.state = next;
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use JobStatus::*;

    fn fired_at(sequence: &[JobStatus]) -> Vec<usize> {
        let mut detector = EdgeDetector::new();
        sequence
            .iter()
            .enumerate()
            .filter_map(|(i, s)| detector.observe(*s).then_some(i))
            .collect()
    }

    #[test]
    fn fires_once_when_a_run_stops() {
        assert_eq!(fired_at(&[Running, Running, Stopped]), vec![2]);
    }

    #[test]
    fn never_fires_without_a_prior_run() {
        assert_eq!(fired_at(&[Idle, Stopped, Stopped]), Vec::<usize>::new());
    }

    #[test]
    fn does_not_refire_while_sitting_stopped() {
        assert_eq!(fired_at(&[Running, Stopped, Stopped, Stopped]), vec![1]);
    }

    #[test]
    fn fires_again_for_a_new_run() {
        assert_eq!(
            fired_at(&[Running, Stopped, Idle, Running, Stopped]),
            vec![1, 4]
        );
    }

    #[test]
    fn stopping_ends_the_run_without_firing() {
        assert_eq!(fired_at(&[Running, Stopping, Stopped]), Vec::<usize>::new());
        assert_eq!(fired_at(&[Running, Stopping, Stopping, Stopped]), Vec::<usize>::new());
    }

    #[test]
    fn error_or_idle_ends_a_run_without_firing() {
        assert_eq!(fired_at(&[Running, Error, Stopped]), Vec::<usize>::new());
        assert_eq!(fired_at(&[Running, Idle, Stopped]), Vec::<usize>::new());
    }

    #[test]
    fn starts_inactive() {
        let mut detector = EdgeDetector::new();
        assert_eq!(detector.activity(), Activity::Inactive);
        detector.observe(Running);
        assert_eq!(detector.activity(), Activity::Active);
    }
}
