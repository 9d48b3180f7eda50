use thiserror::Error;

#[derive(Debug, Error)]
pub enum UnitError {
    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    #[error("Invalid decimal amount: {0:?}")]
    InvalidAmount(String),

    #[error("Fractional component exceeds {decimals} decimals")]
    FractionalOverflow { decimals: u8 },

    #[error("Amount does not fit in 256 bits")]
    Overflow,
}

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("Invalid hex address: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}
