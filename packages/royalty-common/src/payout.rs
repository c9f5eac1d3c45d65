use std::collections::HashMap;

use cosmwasm_std::Uint128;

use crate::error::PipelineError;
use crate::types::{Recipient, TokenId};

/// Result of splitting a reward pool across eligible tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayoutPlan {
    pub reward_pool: Uint128,
    pub eligible_tokens: u64,
    pub per_token_share: Uint128,
    /// One entry per distinct address, in order of first appearance.
    pub recipients: Vec<Recipient>,
    pub total: Uint128,
    /// Truncated dust left in the pool; never redistributed.
    pub remainder: Uint128,
}

/// Split `reward_pool` evenly per eligible token and aggregate per owner.
///
/// `per_token_share = floor(reward_pool / eligible.len())`, so the plan total
/// can fall short of the pool by less than one share per token.
pub fn compute_payouts(
    eligible: &[(TokenId, String)],
    reward_pool: Uint128,
) -> Result<PayoutPlan, PipelineError> {
    if eligible.is_empty() {
        return Err(PipelineError::NoEligibleTokens);
    }

    let eligible_tokens = eligible.len() as u64;
    let per_token_share = reward_pool / Uint128::from(eligible_tokens);

    let mut order: Vec<&str> = Vec::new();
    let mut token_counts: HashMap<&str, u64> = HashMap::new();
    for (_, owner) in eligible {
        let count = token_counts.entry(owner.as_str()).or_insert_with(|| {
            order.push(owner.as_str());
            0
        });
        *count += 1;
    }

    let recipients: Vec<Recipient> = order
        .into_iter()
        .map(|addr| Recipient::new(addr, per_token_share * Uint128::from(token_counts[addr])))
        .collect();

    let total: Uint128 = recipients.iter().map(|r| r.amount).sum();

    Ok(PayoutPlan {
        reward_pool,
        eligible_tokens,
        per_token_share,
        recipients,
        total,
        remainder: reward_pool - total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eligible(entries: &[(TokenId, &str)]) -> Vec<(TokenId, String)> {
        entries
            .iter()
            .map(|(id, owner)| (*id, owner.to_string()))
            .collect()
    }

    #[test]
    fn test_even_split_across_owners() {
        let tokens = eligible(&[(1, "terra1x"), (2, "terra1y"), (3, "terra1x"), (4, "terra1x")]);
        let plan = compute_payouts(&tokens, Uint128::new(1_000_000)).unwrap();

        assert_eq!(plan.per_token_share, Uint128::new(250_000));
        assert_eq!(plan.eligible_tokens, 4);
        assert_eq!(
            plan.recipients,
            vec![
                Recipient::new("terra1x", 750_000u128),
                Recipient::new("terra1y", 250_000u128),
            ]
        );
        assert_eq!(plan.total, Uint128::new(1_000_000));
        assert_eq!(plan.remainder, Uint128::zero());
    }

    #[test]
    fn test_truncation_remainder_is_reported() {
        let tokens = eligible(&[(1, "terra1a"), (2, "terra1b"), (3, "terra1c")]);
        let plan = compute_payouts(&tokens, Uint128::new(10)).unwrap();

        assert_eq!(plan.per_token_share, Uint128::new(3));
        assert_eq!(plan.total, Uint128::new(9));
        assert_eq!(plan.remainder, Uint128::new(1));
        assert!(plan.recipients.iter().all(|r| r.amount == Uint128::new(3)));
    }

    #[test]
    fn test_deterministic() {
        let tokens = eligible(&[
            (5, "terra1e"),
            (6, "terra1d"),
            (7, "terra1e"),
            (8, "terra1c"),
            (9, "terra1d"),
        ]);
        let first = compute_payouts(&tokens, Uint128::new(123_456_789)).unwrap();
        for _ in 0..10 {
            assert_eq!(compute_payouts(&tokens, Uint128::new(123_456_789)).unwrap(), first);
        }
        let addrs: Vec<&str> = first.recipients.iter().map(|r| r.addr.as_str()).collect();
        assert_eq!(addrs, vec!["terra1e", "terra1d", "terra1c"]);
    }

    #[test]
    fn test_no_eligible_tokens() {
        let err = compute_payouts(&[], Uint128::new(1_000)).unwrap_err();
        assert_eq!(err, PipelineError::NoEligibleTokens);
    }

    #[test]
    fn test_pool_smaller_than_token_count() {
        let tokens = eligible(&[(1, "terra1a"), (2, "terra1b"), (3, "terra1c")]);
        let plan = compute_payouts(&tokens, Uint128::new(2)).unwrap();
        assert_eq!(plan.per_token_share, Uint128::zero());
        assert_eq!(plan.total, Uint128::zero());
        assert_eq!(plan.remainder, Uint128::new(2));
    }
}
