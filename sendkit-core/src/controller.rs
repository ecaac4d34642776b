//! Fee controller.
//!
//! The only path through which a draft's fee rate may change. Rejections are
//! silent no-ops from the caller's point of view: the draft is simply not
//! replaced, so rapid UI-driven rate changes can never leave it half
//! updated.

use bitcoin::Amount;

use crate::accounting::sum_output_values;
use crate::constants::MIN_FEE_RATE;
use crate::draft::{DraftTransaction, FeeTier, WalletContext};

/// Recompute the draft's fee for `new_rate` sat/vbyte.
///
/// Returns `None`, leaving the caller's draft untouched, when:
/// - the rate is below the 1 sat/vbyte floor,
/// - the recomputed fee equals the current fee (no-op short circuit),
/// - the fee would consume half or more of the wallet balance, or
/// - outputs plus fee would exceed the wallet balance.
///
/// On success the returned draft carries the new rate and fee together;
/// the two are never updated independently.
pub fn recompute_fee(
    draft: &DraftTransaction,
    new_rate: u64,
    ctx: &WalletContext,
) -> Option<DraftTransaction> {
    if new_rate < MIN_FEE_RATE {
        log::debug!("fee change rejected: rate {} below floor", new_rate);
        return None;
    }

    let fee = Amount::from_sat(draft.estimate_vbytes().checked_mul(new_rate)?);
    if fee == draft.fee() {
        return None;
    }

    // Hard safety ceiling: refuse outright, do not just warn.
    if fee.to_sat().checked_mul(2)? >= ctx.balance.to_sat() {
        log::debug!(
            "fee change rejected: fee {} against balance {}",
            fee,
            ctx.balance
        );
        return None;
    }

    let outputs_total = sum_output_values(draft.outputs()).ok()?;
    if outputs_total.checked_add(fee)? > ctx.balance {
        log::debug!(
            "fee change rejected: {} + {} exceeds balance {}",
            outputs_total,
            fee,
            ctx.balance
        );
        return None;
    }

    let mut updated = draft.clone();
    updated.sats_per_vbyte = new_rate;
    updated.fee = fee;
    Some(updated)
}

/// Select a named fee tier, funneling through [`recompute_fee`] so the fee
/// invariant has a single source of truth. On rejection the draft is
/// returned unchanged.
pub fn select_fee_tier(
    draft: &DraftTransaction,
    tier: FeeTier,
    ctx: &WalletContext,
) -> DraftTransaction {
    let rate = tier.rate(&ctx.fee_estimates);
    match recompute_fee(draft, rate, ctx) {
        Some(mut updated) => {
            updated.fee_tier = tier;
            updated
        }
        None => draft.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{AddressType, FeeEstimates, Utxo};
    use bitcoin::{bip32::DerivationPath, Network, Txid};
    use proptest::prelude::*;
    use std::str::FromStr;

    const ADDR: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    fn test_utxo(value: u64) -> Utxo {
        Utxo {
            tx_hash: Txid::from_str(
                "d9b08a9d1698e298b6b1b8f7c64aeb6a4ca99e37b8bdf0c2f70a9e83e1a5ee91",
            )
            .unwrap(),
            tx_pos: 0,
            value: Amount::from_sat(value),
            address: ADDR.to_string(),
            derivation_path: DerivationPath::from_str("m/84'/0'/0'/0/0").unwrap(),
            address_type: AddressType::NativeSegwit,
        }
    }

    fn test_ctx(balance: u64) -> WalletContext {
        WalletContext {
            balance: Amount::from_sat(balance),
            fee_estimates: FeeEstimates {
                fast: 20,
                normal: 5,
                slow: 1,
            },
            network: Network::Bitcoin,
        }
    }

    fn test_draft() -> DraftTransaction {
        let mut draft = DraftTransaction::new();
        draft.add_recipient(ADDR, Amount::from_sat(50_000)).unwrap();
        draft.select_inputs(vec![test_utxo(100_000)]);
        draft
    }

    #[test]
    fn example_scenario_fee_is_110_sats() {
        // Single bech32 input, one bech32 output, 1 sat/vbyte.
        let draft = test_draft();
        assert_eq!(draft.estimate_vbytes(), 110);
        assert_eq!(draft.fee(), Amount::from_sat(110));
    }

    #[test]
    fn rate_and_fee_update_together() {
        let draft = test_draft();
        let updated = recompute_fee(&draft, 5, &test_ctx(100_000)).unwrap();
        assert_eq!(updated.sats_per_vbyte(), 5);
        assert_eq!(updated.fee(), Amount::from_sat(5 * 110));
        // Original draft untouched.
        assert_eq!(draft.sats_per_vbyte(), 1);
        assert_eq!(draft.fee(), Amount::from_sat(110));
    }

    #[test]
    fn rejects_rate_below_floor() {
        let draft = test_draft();
        assert!(recompute_fee(&draft, 0, &test_ctx(100_000)).is_none());
    }

    #[test]
    fn rejects_unchanged_fee() {
        let draft = test_draft();
        // Draft edits already priced it at 1 sat/vbyte.
        assert!(recompute_fee(&draft, 1, &test_ctx(100_000)).is_none());
    }

    #[test]
    fn rejects_fee_at_or_above_half_balance() {
        let draft = test_draft();
        // 110 vbytes at 500 sat/vb is 55_000, exactly half of 110_000.
        assert!(recompute_fee(&draft, 500, &test_ctx(110_000)).is_none());
        // Just below the ceiling passes the ceiling check (and the funds
        // check, with outputs of 50_000).
        assert!(recompute_fee(&draft, 500, &test_ctx(110_001)).is_some());
    }

    #[test]
    fn rejects_insufficient_funds() {
        let draft = test_draft();
        // Outputs 50_000 + fee 550 > balance 50_500, but fee is well below
        // half the balance.
        assert!(recompute_fee(&draft, 5, &test_ctx(50_500)).is_none());
        assert!(recompute_fee(&draft, 5, &test_ctx(50_550)).is_some());
    }

    #[test]
    fn tier_selection_uses_the_same_path() {
        let draft = test_draft();
        let ctx = test_ctx(1_000_000);
        let by_tier = select_fee_tier(&draft, FeeTier::Fast, &ctx);
        let by_rate = recompute_fee(&draft, 20, &ctx).unwrap();
        assert_eq!(by_tier.fee(), by_rate.fee());
        assert_eq!(by_tier.fee_tier(), FeeTier::Fast);
    }

    #[test]
    fn rejected_tier_leaves_draft_unchanged() {
        let draft = test_draft();
        // Tiny balance: every tier is rejected.
        let unchanged = select_fee_tier(&draft, FeeTier::Fast, &test_ctx(1_000));
        assert_eq!(unchanged, draft);
    }

    proptest! {
        #[test]
        fn accepted_fee_always_matches_the_invariant(
            rate in 1u64..10_000,
            balance in 1u64..10_000_000_000,
        ) {
            let draft = test_draft();
            if let Some(updated) = recompute_fee(&draft, rate, &test_ctx(balance)) {
                prop_assert_eq!(
                    updated.fee().to_sat(),
                    updated.estimate_vbytes() * updated.sats_per_vbyte()
                );
            }
        }

        #[test]
        fn fee_never_reaches_half_balance(
            rate in 1u64..10_000,
            balance in 1u64..10_000_000_000,
        ) {
            let draft = test_draft();
            if let Some(updated) = recompute_fee(&draft, rate, &test_ctx(balance)) {
                prop_assert!(updated.fee().to_sat() * 2 < balance);
            }
        }
    }
}
