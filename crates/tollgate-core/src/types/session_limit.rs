//! Concurrent session limit type.

use serde::{Deserialize, Serialize};

/// Resolved maximum number of concurrent sessions for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionLimit {
    /// A fixed maximum number of concurrent sessions.
    Fixed(u32),
    /// No per-user limit.
    Unlimited,
}

impl SessionLimit {
    /// Whether `active_count` existing sessions leave no room for another one.
    pub fn is_reached_by(&self, active_count: u64) -> bool {
        match self {
            Self::Fixed(max) => active_count >= u64::from(*max),
            Self::Unlimited => false,
        }
    }

    /// How many existing sessions must go so one more fits. Zero when there is room.
    pub fn excess_for_new(&self, active_count: u64) -> u64 {
        match self {
            Self::Fixed(max) => (active_count + 1).saturating_sub(u64::from(*max)),
            Self::Unlimited => 0,
        }
    }

    /// Return the numeric limit, or `None` for unlimited.
    pub fn as_max(&self) -> Option<u32> {
        match self {
            Self::Fixed(max) => Some(*max),
            Self::Unlimited => None,
        }
    }
}

impl From<u32> for SessionLimit {
    /// Convert a `u32` to a `SessionLimit`. `0` means unlimited.
    fn from(value: u32) -> Self {
        if value == 0 {
            Self::Unlimited
        } else {
            Self::Fixed(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_limit() {
        let limit = SessionLimit::Fixed(3);
        assert!(!limit.is_reached_by(2));
        assert!(limit.is_reached_by(3));
        assert!(limit.is_reached_by(4));
    }

    #[test]
    fn test_excess_for_new() {
        let limit = SessionLimit::Fixed(3);
        assert_eq!(limit.excess_for_new(1), 0);
        assert_eq!(limit.excess_for_new(3), 1);
        assert_eq!(limit.excess_for_new(5), 3);
        assert_eq!(SessionLimit::Unlimited.excess_for_new(100), 0);
    }

    #[test]
    fn test_from_u32() {
        assert_eq!(SessionLimit::from(0), SessionLimit::Unlimited);
        assert_eq!(SessionLimit::from(5), SessionLimit::Fixed(5));
    }
}
