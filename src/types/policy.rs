//! The combination policy enumeration.
//!
//! A policy selects how a collection of task outcomes folds into one
//! combined result:
//!
//! | Policy | Waits for | Result |
//! |--------|-----------|--------|
//! | `AllSucceed` | every task, or the first rejection | values in input order |
//! | `AllSettle` | every task | outcomes in input order |
//! | `FirstSettle` | the first outcome of any kind | that outcome |
//! | `FirstSucceed` | the first fulfilled value | that value |
//!
//! `FirstSettle` and `FirstSucceed` cannot resolve over an empty
//! collection and fail immediately there; the other two resolve empty.

use core::fmt;
use std::str::FromStr;

/// The combination strategy applied across a task collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Wait for every task; the first rejection fails the combination.
    AllSucceed,
    /// Wait for every task unconditionally; never fails.
    AllSettle,
    /// Resolve with the first outcome, fulfilled or rejected.
    FirstSettle,
    /// Resolve with the first fulfilled value; fail only if all reject.
    FirstSucceed,
}

impl Policy {
    /// All policies, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::AllSucceed,
        Self::AllSettle,
        Self::FirstSettle,
        Self::FirstSucceed,
    ];

    /// Returns a stable, human-readable name for the policy.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AllSucceed => "all-succeed",
            Self::AllSettle => "all-settle",
            Self::FirstSettle => "first-settle",
            Self::FirstSucceed => "first-succeed",
        }
    }

    /// Returns true if the policy always observes every task to completion.
    ///
    /// `FirstSucceed` is not included: it stops observing at the first
    /// fulfilled value even though all rejections are observed on the
    /// all-reject path.
    #[must_use]
    pub const fn waits_for_all(self) -> bool {
        matches!(self, Self::AllSucceed | Self::AllSettle)
    }

    /// Returns true if the policy cannot resolve over an empty collection.
    #[must_use]
    pub const fn requires_tasks(self) -> bool {
        matches!(self, Self::FirstSettle | Self::FirstSucceed)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Policy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "all-succeed" => Ok(Self::AllSucceed),
            "all-settle" => Ok(Self::AllSettle),
            "first-settle" => Ok(Self::FirstSettle),
            "first-succeed" => Ok(Self::FirstSucceed),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_stable() {
        assert_eq!(Policy::AllSucceed.name(), "all-succeed");
        assert_eq!(Policy::AllSettle.name(), "all-settle");
        assert_eq!(Policy::FirstSettle.name(), "first-settle");
        assert_eq!(Policy::FirstSucceed.name(), "first-succeed");
    }

    #[test]
    fn classification() {
        assert!(Policy::AllSucceed.waits_for_all());
        assert!(Policy::AllSettle.waits_for_all());
        assert!(!Policy::FirstSettle.waits_for_all());
        assert!(!Policy::FirstSucceed.waits_for_all());

        assert!(!Policy::AllSucceed.requires_tasks());
        assert!(!Policy::AllSettle.requires_tasks());
        assert!(Policy::FirstSettle.requires_tasks());
        assert!(Policy::FirstSucceed.requires_tasks());
    }

    #[test]
    fn parse_accepts_both_separators() {
        assert_eq!("all-succeed".parse(), Ok(Policy::AllSucceed));
        assert_eq!("ALL_SETTLE".parse(), Ok(Policy::AllSettle));
        assert_eq!("first-settle".parse(), Ok(Policy::FirstSettle));
        assert_eq!("first_succeed".parse(), Ok(Policy::FirstSucceed));
        assert_eq!(Policy::from_str("race"), Err(()));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for policy in Policy::ALL {
            assert_eq!(policy.to_string().parse(), Ok(policy));
        }
    }
}
