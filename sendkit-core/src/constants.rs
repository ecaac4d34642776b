/// Conservative estimate returned when the byte-size estimator cannot make
/// sense of its inputs. Fee calculation must never fail mid-flow.
pub const FALLBACK_TX_VBYTES: u64 = 256;

/// Embedded data shorter than this is padded with trailing spaces; some
/// relay and indexing tooling mishandles shorter OP_RETURN payloads.
pub const MIN_DATA_LEN: usize = 5;

/// Standard relay limit for OP_RETURN payloads.
pub const MAX_DATA_LEN: usize = 80;

/// Largest count the estimator accepts (2^53 - 1). Anything above is treated
/// as an internal inconsistency and triggers the fallback estimate.
pub const MAX_SAFE_COUNT: u64 = (1 << 53) - 1;

/// Floor for user-supplied fee rates, in sat/vbyte.
pub const MIN_FEE_RATE: u64 = 1;

/// Largest number of keys in a standard multisig script.
pub const MAX_MULTISIG_KEYS: u8 = 20;
