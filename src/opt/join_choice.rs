//! Choosing among join strategies by cost.

use std::fmt;

/// The physical join strategies, in tie-break preference order.
///
/// When two strategies cost the same, the one declared first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JoinStrategy {
    Index,
    Merge,
    NestedLoop,
    Hash,
}

impl JoinStrategy {
    /// Every strategy, most preferred first.
    pub const ALL: [JoinStrategy; 4] = [
        JoinStrategy::Index,
        JoinStrategy::Merge,
        JoinStrategy::NestedLoop,
        JoinStrategy::Hash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JoinStrategy::Index => "index",
            JoinStrategy::Merge => "merge",
            JoinStrategy::NestedLoop => "nested-loop",
            JoinStrategy::Hash => "hash",
        }
    }
}

impl fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimated block accesses of a candidate.
///
/// A strategy that cannot be built for a join costs [`Cost::Infinite`],
/// which orders after every finite cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cost {
    Finite(u64),
    Infinite,
}

impl Cost {
    pub fn is_finite(&self) -> bool {
        matches!(self, Cost::Finite(_))
    }
}

impl From<Option<u64>> for Cost {
    fn from(blocks: Option<u64>) -> Self {
        blocks.map_or(Cost::Infinite, Cost::Finite)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cost::Finite(blocks) => write!(f, "{blocks}"),
            Cost::Infinite => f.write_str("inf"),
        }
    }
}

/// Picks the cheapest buildable strategy.
///
/// Among candidates of equal minimum cost the preference order of
/// [`JoinStrategy`] decides. Returns `None` if no candidate has a finite
/// cost.
pub fn choose_join(candidates: &[(JoinStrategy, Cost)]) -> Option<JoinStrategy> {
    candidates
        .iter()
        .filter(|(_, cost)| cost.is_finite())
        .min_by_key(|(strategy, cost)| (*cost, *strategy))
        .map(|(strategy, _)| *strategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn costs(index: Cost, merge: Cost, nested: Cost, hash: Cost) -> Vec<(JoinStrategy, Cost)> {
        JoinStrategy::ALL
            .into_iter()
            .zip([index, merge, nested, hash])
            .collect()
    }

    #[test]
    fn test_strictly_cheapest_wins() {
        use Cost::*;
        let c = costs(Finite(90), Finite(40), Finite(50), Finite(30));
        assert_eq!(choose_join(&c), Some(JoinStrategy::Hash));
        let c = costs(Infinite, Finite(40), Finite(12), Finite(30));
        assert_eq!(choose_join(&c), Some(JoinStrategy::NestedLoop));
    }

    #[test]
    fn test_ties_follow_preference_order() {
        use Cost::*;
        let c = costs(Finite(10), Finite(10), Finite(10), Finite(10));
        assert_eq!(choose_join(&c), Some(JoinStrategy::Index));
        let c = costs(Infinite, Finite(20), Finite(10), Finite(10));
        assert_eq!(choose_join(&c), Some(JoinStrategy::NestedLoop));
        let c = costs(Finite(11), Finite(7), Finite(9), Finite(7));
        assert_eq!(choose_join(&c), Some(JoinStrategy::Merge));
    }

    #[test]
    fn test_input_order_does_not_matter() {
        use Cost::*;
        let mut c = costs(Infinite, Finite(5), Finite(8), Finite(5));
        c.reverse();
        assert_eq!(choose_join(&c), Some(JoinStrategy::Merge));
    }

    #[test]
    fn test_nothing_buildable() {
        let c = costs(Cost::Infinite, Cost::Infinite, Cost::Infinite, Cost::Infinite);
        assert_eq!(choose_join(&c), None);
        assert_eq!(choose_join(&[]), None);
    }

    #[test]
    fn test_cost_ordering() {
        assert!(Cost::Finite(u64::MAX) < Cost::Infinite);
        assert_eq!(Cost::from(None), Cost::Infinite);
        assert_eq!(Cost::from(Some(3)).to_string(), "3");
        assert_eq!(Cost::Infinite.to_string(), "inf");
    }
}
