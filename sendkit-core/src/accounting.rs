//! Monetary value accounting over UTXO and output lists.

use bitcoin::Amount;

use crate::draft::{DraftOutput, Utxo};
use crate::error::{Error, Result};

/// Sum the values selected from `items`.
///
/// An empty list is a valid zero sum; callers rely on this to default
/// missing transaction state to a zero balance. Overflow past the amount
/// range is the only failure.
pub fn sum_values<T>(items: &[T], selector: impl Fn(&T) -> Amount) -> Result<Amount> {
    items.iter().try_fold(Amount::ZERO, |acc, item| {
        acc.checked_add(selector(item)).ok_or(Error::ValueOverflow)
    })
}

/// Total value of a list of UTXOs.
pub fn sum_utxo_values(utxos: &[Utxo]) -> Result<Amount> {
    sum_values(utxos, |utxo| utxo.value)
}

/// Total value of a list of draft outputs.
pub fn sum_output_values(outputs: &[DraftOutput]) -> Result<Amount> {
    sum_values(outputs, |output| output.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_sums_to_zero() {
        assert_eq!(sum_utxo_values(&[]).unwrap(), Amount::ZERO);
        assert_eq!(sum_output_values(&[]).unwrap(), Amount::ZERO);
    }

    #[test]
    fn sums_selected_values() {
        let outputs = vec![
            DraftOutput::to_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", 1_000),
            DraftOutput::to_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", 2_500),
        ];
        assert_eq!(sum_output_values(&outputs).unwrap(), Amount::from_sat(3_500));
    }

    #[test]
    fn overflow_is_an_error() {
        let outputs = vec![
            DraftOutput::to_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", u64::MAX),
            DraftOutput::to_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", u64::MAX),
        ];
        assert!(matches!(
            sum_output_values(&outputs),
            Err(Error::ValueOverflow)
        ));
    }
}
