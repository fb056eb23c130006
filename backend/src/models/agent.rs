//! Agent model
//!
//! Represents a member of the agent network. Each agent has:
//! - A unique `agent_code` used everywhere as the primary identifier
//! - An optional `referrer_code` pointing at the agent who recruited them
//! - A lifecycle status controlling participation
//!
//! The referrer pointer is the edge of the referral graph. It is set once at
//! registration and never changes afterwards; commission payout walks these
//! pointers upward (see the `referral` module).

use serde::{Deserialize, Serialize};

/// Lifecycle status of an agent.
///
/// Status is informational for commission payout: an inactive or suspended
/// agent still appears in upline chains, and whether their earnings are
/// credited or held is decided by their *wallet* status, not this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Normal participating agent
    Active,

    /// Voluntarily dormant (may be reactivated)
    Inactive,

    /// Administratively suspended
    Suspended,

    /// Permanently decommissioned; never removed from storage
    Terminated,
}

/// A member of the agent network.
///
/// # Example
/// ```
/// use commission_ledger_core_rs::models::agent::{Agent, AgentStatus};
///
/// let root = Agent::new("AG-001".to_string(), None);
/// let child = Agent::new("AG-002".to_string(), Some("AG-001".to_string()));
///
/// assert_eq!(root.referrer_code(), None);
/// assert_eq!(child.referrer_code(), Some("AG-001"));
/// assert_eq!(child.status(), AgentStatus::Active);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent identifier (e.g., "AG-001")
    agent_code: String,

    /// Agent who recruited this one; None for network roots.
    /// Immutable once set.
    referrer_code: Option<String>,

    /// Position in the network at registration time (informational;
    /// payout tiers are computed from the chain walk, not this field)
    tier_level: u8,

    /// Current lifecycle status
    status: AgentStatus,
}

impl Agent {
    /// Create a new active agent.
    ///
    /// # Arguments
    /// * `agent_code` - Unique identifier
    /// * `referrer_code` - Recruiting agent's code, if any
    pub fn new(agent_code: String, referrer_code: Option<String>) -> Self {
        Self {
            agent_code,
            referrer_code,
            tier_level: 1,
            status: AgentStatus::Active,
        }
    }

    /// Set the informational tier level (builder pattern).
    pub fn with_tier_level(mut self, tier_level: u8) -> Self {
        self.tier_level = tier_level;
        self
    }

    /// Get the agent code
    pub fn agent_code(&self) -> &str {
        &self.agent_code
    }

    /// Get the referrer code, if any
    pub fn referrer_code(&self) -> Option<&str> {
        self.referrer_code.as_deref()
    }

    /// Get the informational tier level
    pub fn tier_level(&self) -> u8 {
        self.tier_level
    }

    /// Get the current status
    pub fn status(&self) -> AgentStatus {
        self.status
    }

    /// Check whether the agent is active
    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }

    /// Check whether the agent has been terminated
    pub fn is_terminated(&self) -> bool {
        self.status == AgentStatus::Terminated
    }

    /// Change the lifecycle status.
    ///
    /// Termination should go through the decommission service, which
    /// checks downline and balance constraints first.
    pub fn set_status(&mut self, status: AgentStatus) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_agent_is_active() {
        let agent = Agent::new("AG-001".to_string(), None);

        assert_eq!(agent.agent_code(), "AG-001");
        assert_eq!(agent.referrer_code(), None);
        assert_eq!(agent.tier_level(), 1);
        assert!(agent.is_active());
    }

    #[test]
    fn test_with_tier_level() {
        let agent = Agent::new("AG-002".to_string(), Some("AG-001".to_string()))
            .with_tier_level(3);

        assert_eq!(agent.tier_level(), 3);
        assert_eq!(agent.referrer_code(), Some("AG-001"));
    }

    #[test]
    fn test_status_transitions() {
        let mut agent = Agent::new("AG-001".to_string(), None);

        agent.set_status(AgentStatus::Suspended);
        assert_eq!(agent.status(), AgentStatus::Suspended);
        assert!(!agent.is_active());

        agent.set_status(AgentStatus::Terminated);
        assert!(agent.is_terminated());
    }
}
