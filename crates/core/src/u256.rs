//! U256 Safe Arithmetic Operations.
//!
//! This module contains the safe arithmetic operations for the U256 type.

use alloy_primitives::U256;

use crate::errors::FeeError;

/// Safe addition of two U256 values.
pub fn add(a: U256, b: U256) -> Result<U256, FeeError> {
    a.checked_add(b).ok_or(FeeError::ArithmeticOverflow)
}

/// Safe subtraction of two U256 values.
pub fn sub(a: U256, b: U256) -> Result<U256, FeeError> {
    a.checked_sub(b).ok_or(FeeError::ArithmeticOverflow)
}

/// Safe multiplication of two U256 values.
pub fn mul(a: U256, b: U256) -> Result<U256, FeeError> {
    a.checked_mul(b).ok_or(FeeError::ArithmeticOverflow)
}

/// Safe division of two U256 values.
pub fn div(a: U256, b: U256) -> Result<U256, FeeError> {
    a.checked_div(b).ok_or(FeeError::ArithmeticOverflow)
}

/// Safe sum of a list of U256 values.
pub fn sum<'a>(values: impl IntoIterator<Item = &'a U256>) -> Result<U256, FeeError> {
    values.into_iter().try_fold(U256::ZERO, |acc, value| add(acc, *value))
}
