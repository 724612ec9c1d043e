use alloy_primitives::utils::{format_ether, ParseUnits, Unit};
use std::error::Error;
use std::fmt::{Display, Formatter};
use web3::ethabi::ethereum_types::U512;
use web3::types::{Address, U256};

/// Decimal places of Ether, used by the scaler of 512 bit amounts.
pub const ETHER_DECIMALS: usize = 18;

#[derive(Debug, Clone)]
pub struct ConversionError {
    pub msg: String,
}

impl ConversionError {
    pub fn from(msg: String) -> Self {
        Self { msg }
    }
}

impl Display for ConversionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error during conversion: {}", self.msg)
    }
}

impl Error for ConversionError {
    fn description(&self) -> &str {
        "Conversion error"
    }
}

fn to_alloy_u256(value: U256) -> alloy_primitives::U256 {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    alloy_primitives::U256::from_be_bytes(buf)
}

fn from_alloy_u256(value: alloy_primitives::U256) -> U256 {
    U256::from_big_endian(&value.to_be_bytes::<32>())
}

/// `1.500000000` -> `1.5`, `2.000` -> `2`
fn trim_fraction(text: String) -> String {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn format_units(amount: U256, unit: Unit) -> String {
    trim_fraction(ParseUnits::U256(to_alloy_u256(amount)).format_units(unit))
}

pub fn wei_to_ether(amount: U256) -> String {
    trim_fraction(format_ether(to_alloy_u256(amount)))
}

pub fn wei_to_gwei(amount: U256) -> String {
    format_units(amount, Unit::GWEI)
}

/// Digits and fraction of a plain decimal amount, rejecting signs, exponents
/// and more fractional digits than `decimals`.
fn split_decimal(amount: &str, decimals: usize) -> Result<(&str, &str), ConversionError> {
    let (int_part, frac_part) = amount.split_once('.').unwrap_or((amount, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(ConversionError::from(format!(
            "Empty amount: \"{amount}\""
        )));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ConversionError::from(format!(
            "Invalid decimal amount: \"{amount}\""
        )));
    }
    if frac_part.len() > decimals {
        return Err(ConversionError::from(format!(
            "Amount {amount} has more than {decimals} decimal places"
        )));
    }
    Ok((int_part, frac_part))
}

/// Exact conversion of a decimal string into the smallest unit.
pub fn parse_units(amount: &str, unit: Unit) -> Result<U256, ConversionError> {
    let amount = amount.trim();
    split_decimal(amount, unit.get() as usize)?;
    match ParseUnits::parse_units(amount, unit) {
        Ok(ParseUnits::U256(value)) => Ok(from_alloy_u256(value)),
        Ok(ParseUnits::I256(_)) => Err(ConversionError::from(format!(
            "Negative amount: \"{amount}\""
        ))),
        Err(e) => Err(ConversionError::from(format!(
            "Cannot parse amount {amount}: {e}"
        ))),
    }
}

/// Scales an amount of any width (fees, burnt fees and signed savings are
/// 512 bit products) down by `decimals`.
///
/// Works on the decimal representation, so a leading minus sign is kept and
/// nothing is rounded. Trailing zeros of the fraction are dropped.
pub fn format_wide_units<T: Display>(amount: T, decimals: usize) -> String {
    let repr = amount.to_string();
    let (sign, digits) = match repr.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", repr.as_str()),
    };
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return "0".to_string();
    }
    let (int_part, frac_part) = if digits.len() > decimals {
        let split = digits.len() - decimals;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        (
            "0".to_string(),
            format!("{}{}", "0".repeat(decimals - digits.len()), digits),
        )
    };
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        format!("{sign}{int_part}")
    } else {
        format!("{sign}{int_part}.{frac_part}")
    }
}

pub fn wide_wei_to_ether<T: Display>(amount: T) -> String {
    format_wide_units(amount, ETHER_DECIMALS)
}

/// Inverse of [`format_wide_units`] for unsigned amounts up to 512 bits.
pub fn parse_wide_units(amount: &str, decimals: usize) -> Result<U512, ConversionError> {
    let amount = amount.trim();
    let (int_part, frac_part) = split_decimal(amount, decimals)?;
    let digits = format!(
        "{}{}{}",
        int_part,
        frac_part,
        "0".repeat(decimals - frac_part.len())
    );
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U512::zero());
    }
    U512::from_dec_str(digits)
        .map_err(|e| ConversionError::from(format!("Cannot parse amount {amount}: {e:?}")))
}

/// Big endian bytes of the value without leading zeros, zero is empty.
pub fn u256_to_trimmed_be(value: U256) -> Vec<u8> {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    let first = buf.iter().position(|b| *b != 0).unwrap_or(buf.len());
    buf[first..].to_vec()
}

pub fn u256_to_u64(value: U256) -> Result<u64, ConversionError> {
    if value > U256::from(u64::MAX) {
        return Err(ConversionError::from(format!(
            "Value {value} does not fit in 64 bits"
        )));
    }
    Ok(value.low_u64())
}

pub fn u256_to_f64(value: U256) -> f64 {
    if value.bits() <= 128 {
        value.low_u128() as f64
    } else {
        value.to_string().parse().unwrap_or(f64::INFINITY)
    }
}

/// EIP-55 mixed case representation with `0x` prefix.
pub fn to_checksum_address(address: &Address) -> String {
    alloy_primitives::Address::from_slice(address.as_bytes()).to_checksum(None)
}
