//! Agent decommissioning
//!
//! Explicit, auditable removal of an agent from the network. Nothing is
//! ever deleted: the agent becomes Terminated and the wallet Frozen, and
//! the operation refuses to run while anything still depends on the agent.
//! This replaces storage-level cascade deletes, which silently destroyed
//! policies, wallets, and transaction history.

use crate::repo::{AgentRepo, WalletRepo, WithdrawalRepo};
use crate::models::agent::AgentStatus;
use crate::models::wallet::WalletStatus;
use thiserror::Error;

/// Errors from decommissioning
#[derive(Debug, Error, PartialEq)]
pub enum AdminError {
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("agent {0} is already terminated")]
    AlreadyTerminated(String),

    #[error("agent {agent_code} still has {count} non-terminated downline agent(s)")]
    ActiveDownline { agent_code: String, count: usize },

    #[error(
        "agent {agent_code} has outstanding funds: balance {balance}, \
         pending commission {pending_commission}"
    )]
    OutstandingBalance {
        agent_code: String,
        balance: i64,
        pending_commission: i64,
    },

    #[error("agent {agent_code} has {count} open withdrawal request(s)")]
    OpenWithdrawals { agent_code: String, count: usize },
}

/// Decommission an agent.
///
/// Refuses while the agent has a non-terminated downline, a nonzero wallet
/// balance or held commission, or an open withdrawal request. On success
/// the agent is Terminated and the wallet Frozen; every row stays in
/// storage for audit.
pub fn decommission_agent<S: AgentRepo + WalletRepo + WithdrawalRepo>(
    store: &mut S,
    agent_code: &str,
) -> Result<(), AdminError> {
    {
        let agent = store
            .agent(agent_code)
            .ok_or_else(|| AdminError::UnknownAgent(agent_code.to_string()))?;
        if agent.is_terminated() {
            return Err(AdminError::AlreadyTerminated(agent_code.to_string()));
        }
    }

    let downline_count = store
        .downline_of(agent_code)
        .iter()
        .filter(|a| !a.is_terminated())
        .count();
    if downline_count > 0 {
        return Err(AdminError::ActiveDownline {
            agent_code: agent_code.to_string(),
            count: downline_count,
        });
    }

    if let Some(wallet) = store.wallet(agent_code) {
        if wallet.balance() != 0 || wallet.pending_commission() != 0 {
            return Err(AdminError::OutstandingBalance {
                agent_code: agent_code.to_string(),
                balance: wallet.balance(),
                pending_commission: wallet.pending_commission(),
            });
        }
    }

    let open = store.open_withdrawals_for(agent_code).len();
    if open > 0 {
        return Err(AdminError::OpenWithdrawals {
            agent_code: agent_code.to_string(),
            count: open,
        });
    }

    if let Some(agent) = store.agent_mut(agent_code) {
        agent.set_status(AgentStatus::Terminated);
    }
    if let Some(wallet) = store.wallet_mut(agent_code) {
        wallet.set_status(WalletStatus::Frozen);
    }
    Ok(())
}
