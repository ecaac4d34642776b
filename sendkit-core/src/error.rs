use bitcoin::Txid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Key material
    #[error("failed to generate master key from seed")]
    SeedDerivation,
    #[error("failed to derive key for input {0}")]
    KeyDerivation(usize),

    // Validation
    #[error("wrong network for address {0}")]
    WrongNetwork(String),
    #[error("unknown address type for {0}")]
    UnknownAddressType(String),
    #[error("output {0} has neither an address nor a script")]
    MissingRecipient(usize),
    #[error("output {0} has both an address and a script")]
    AmbiguousRecipient(usize),
    #[error("output {0} with an address must have a non-zero amount")]
    ZeroValueOutput(usize),
    #[error("data output must have an amount of 0")]
    DataOutputNonZero,
    #[error("cannot embed data of length {len}, max is {max}")]
    DataTooLarge { len: usize, max: usize },
    #[error("value sum overflows the amount range")]
    ValueOverflow,

    // Fee policy
    #[error("insufficient funds")]
    InsufficientFunds,

    // Building
    #[error("no inputs selected")]
    NoInputs,
    #[error("transaction has no outputs")]
    NoRecipients,
    #[error("previous transaction {0} could not be resolved")]
    UnresolvedPrevTx(Txid),
    #[error("selected utxo count does not match transaction input count")]
    InputCountMismatch,
    #[error("input {0} missing witness_utxo in PSBT")]
    MissingWitnessUtxo(usize),
    #[error("input {0} missing non_witness_utxo in PSBT")]
    MissingPrevTx(usize),

    // Signing
    #[error("derived key for input {0} does not match the spent script")]
    ScriptMismatch(usize),

    // Broadcast
    #[error("broadcast returned txid {got}, expected {expected}")]
    TxidMismatch { expected: Txid, got: Txid },

    // Flow
    #[error("{0} is not valid in the current flow state")]
    InvalidFlowState(&'static str),

    // Wrapped external errors
    #[error("sighash: {0}")]
    Sighash(String),
    #[error(transparent)]
    Psbt(#[from] bitcoin::psbt::Error),
    #[error("extract tx: {0}")]
    ExtractTx(String),
    #[error(transparent)]
    Encode(#[from] bitcoin::consensus::encode::Error),
    #[error(transparent)]
    PushBytes(#[from] bitcoin::script::PushBytesError),

    // Address validation
    #[error("address: {0}")]
    Address(String),

    // Backend pass-through for downstream crates
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, Error>;
