//! # Dispatch priority tiers.
//!
//! Handlers registered for one event type are invoked in ascending tier
//! order; within a tier, registration order wins. Priorities only order
//! handlers **inside one manager's collection** — bubbling order between
//! managers is strictly parent before child and never competes with tiers.

use std::fmt;

/// Priority tier of a handler within one event type's collection.
///
/// Ascending invocation order:
/// `First < High < Normal < Low < Last < Watcher`.
///
/// [`Watcher`](Priority::Watcher) is observational: it always runs even when
/// the event was cancelled by an earlier handler, and by convention must not
/// itself cancel the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    /// Runs before everything else (setup, veto-early).
    First = 0,
    /// Runs early.
    High = 1,
    /// Default tier for ordinary domain logic.
    #[default]
    Normal = 2,
    /// Runs late.
    Low = 3,
    /// Runs after every mutating tier.
    Last = 4,
    /// Observational tail: always runs, even for cancelled events.
    Watcher = 5,
}

impl Priority {
    /// All tiers in invocation order.
    pub const ALL: [Priority; 6] = [
        Priority::First,
        Priority::High,
        Priority::Normal,
        Priority::Low,
        Priority::Last,
        Priority::Watcher,
    ];

    /// Numeric sort key (lower runs first).
    pub fn value(self) -> u8 {
        self as u8
    }

    /// True if entries at this tier ignore the event's cancellation flag.
    ///
    /// Only [`Priority::Watcher`] does; other tiers consult the entry's own
    /// `ignore_cancelled` flag.
    pub fn runs_when_cancelled(self) -> bool {
        matches!(self, Priority::Watcher)
    }

    /// Short stable label (snake_case) for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            Priority::First => "first",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
            Priority::Last => "last",
            Priority::Watcher => "watcher",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_sort_in_invocation_order() {
        let mut shuffled = [
            Priority::Watcher,
            Priority::Normal,
            Priority::First,
            Priority::Last,
            Priority::High,
            Priority::Low,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Priority::ALL);
    }

    #[test]
    fn values_are_dense_and_ascending() {
        for (i, p) in Priority::ALL.iter().enumerate() {
            assert_eq!(p.value() as usize, i);
        }
    }

    #[test]
    fn only_watcher_ignores_cancellation_by_tier() {
        for p in Priority::ALL {
            assert_eq!(p.runs_when_cancelled(), p == Priority::Watcher);
        }
    }
}
