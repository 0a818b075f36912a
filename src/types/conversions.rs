use ethers::types::{Address, U256};
use ethers::utils::format_units;
use std::str::FromStr;

// Token amounts: raw uint256 -> human units, reported as f64
pub fn u256_to_f64(value: U256, decimals: u32) -> Result<f64, ConversionError> {
    let formatted = format_units(value, decimals)
        .map_err(|e| ConversionError::InvalidUnits(e.to_string()))?;
    formatted
        .parse::<f64>()
        .map_err(|e| ConversionError::InvalidUnits(e.to_string()))
}

// Para addresses
pub fn address_to_string(addr: Address) -> String {
    format!("{:?}", addr).to_lowercase()
}

pub fn string_to_address(s: &str) -> Result<Address, ConversionError> {
    Address::from_str(s.trim()).map_err(|e| ConversionError::InvalidAddress(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Invalid token units: {0}")]
    InvalidUnits(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}
