use crate::AccumulatedState;

/// Summary indicator shown in persistent chrome (the extension's toolbar badge).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Empty,
    /// At least one request is in flight.
    Pending,
    Count(usize),
    /// Transient: the last request failed and nothing else is pending.
    Error,
}

impl Badge {
    /// Derive the badge from state: pending wins over count, count over empty.
    pub fn project(state: &AccumulatedState) -> Self {
        if state.is_pending() {
            Badge::Pending
        } else if !state.results.is_empty() {
            Badge::Count(state.results.len())
        } else {
            Badge::Empty
        }
    }

    pub fn text(&self) -> String {
        match self {
            Badge::Empty => String::new(),
            Badge::Pending => "...".to_string(),
            Badge::Count(n) => n.to_string(),
            Badge::Error => "!".to_string(),
        }
    }

    /// Background colour as a CSS hex string.
    pub fn color(&self) -> &'static str {
        match self {
            Badge::Pending => "#4a90e2",
            Badge::Count(n) if *n > 0 => "#4caf50",
            Badge::Empty => "#00000000",
            Badge::Count(_) | Badge::Error => "#f44336",
        }
    }
}

/// Receives badge updates from the coordinator.
pub trait BadgeSink: Send + Sync {
    fn set_badge(&self, badge: Badge);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_takes_priority_over_count() {
        let mut state = AccumulatedState::default();
        assert_eq!(Badge::project(&state), Badge::Empty);
        state.begin_check();
        assert_eq!(Badge::project(&state), Badge::Pending);
        assert_eq!(Badge::project(&state).text(), "...");
    }

    #[test]
    fn text_and_color() {
        assert_eq!(Badge::Count(3).text(), "3");
        assert_eq!(Badge::Count(3).color(), "#4caf50");
        assert_eq!(Badge::Error.text(), "!");
        assert_eq!(Badge::Empty.text(), "");
        assert_eq!(Badge::Pending.color(), "#4a90e2");
    }
}
