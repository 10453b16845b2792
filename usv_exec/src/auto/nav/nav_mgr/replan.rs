//! Re-plan scheduling

/// When the next global re-plan is due.
///
/// Requests are coalesced, so however many arrive before the re-plan runs only one pass is made,
/// at the earliest time any of them asked for.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplanSchedule {
    due_s: Option<f64>,
}

impl ReplanSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a re-plan `delay_s` after `now_s`.
    ///
    /// Returns false if the request was merged into one already pending.
    pub fn request(&mut self, now_s: f64, delay_s: f64) -> bool {
        let due_s = now_s + delay_s.max(0.0);

        match self.due_s {
            Some(pending_s) => {
                self.due_s = Some(pending_s.min(due_s));
                false
            }
            None => {
                self.due_s = Some(due_s);
                true
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.due_s.is_some()
    }

    /// Returns true, and clears the request, if a re-plan is due at `now_s`.
    pub fn take_due(&mut self, now_s: f64) -> bool {
        match self.due_s {
            Some(due_s) if due_s <= now_s => {
                self.due_s = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.due_s = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_coalescing() {
        let mut sched = ReplanSchedule::new();
        assert!(!sched.is_pending());
        assert!(!sched.take_due(10.0));

        assert!(sched.request(1.0, 2.0));
        assert!(!sched.request(1.5, 5.0));
        assert!(!sched.take_due(2.9));
        assert!(sched.take_due(3.0));

        // Only one pass for both requests
        assert!(!sched.take_due(7.0));

        // An earlier request pulls the pending one forward
        sched.request(0.0, 5.0);
        sched.request(1.0, 0.0);
        assert!(sched.take_due(1.0));

        sched.request(0.0, 0.0);
        sched.clear();
        assert!(!sched.take_due(1.0));
    }
}
