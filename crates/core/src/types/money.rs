//! Monetary amounts using decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is below zero.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount does not fit the stored precision.
    #[error("amount cannot exceed 9999999999.99")]
    TooLarge,
}

/// A non-negative amount of money with two decimal places.
///
/// Amounts are rounded half away from zero on construction, so
/// `19.995` becomes `20.00`, and never exceed [`Money::MAX`], the largest
/// value a `NUMERIC(12, 2)` column holds. Serialized as a bare JSON number.
///
/// ```
/// use emarket_core::Money;
/// use rust_decimal::Decimal;
///
/// let price = Money::new(Decimal::new(1050, 2)).unwrap();
/// assert_eq!(price.checked_mul(3).unwrap().to_string(), "31.50");
/// assert!(Money::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// `9_999_999_999.99`, i.e. 999 999 999 999 cents.
    pub const MAX: Self = Self(Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2));

    /// Create a new amount, rounding to cents.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] if `amount` is below zero, or
    /// [`MoneyError::TooLarge`] if it rounds to more than [`Money::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if rounded > Self::MAX.0 {
            return Err(MoneyError::TooLarge);
        }
        Ok(Self(rounded))
    }

    /// Create an amount from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by a quantity, returning `None` above [`Money::MAX`].
    #[must_use]
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .and_then(Self::bounded)
    }

    /// Add two amounts, returning `None` above [`Money::MAX`].
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).and_then(Self::bounded)
    }

    fn bounded(amount: Decimal) -> Option<Self> {
        (amount <= Self::MAX.0).then_some(Self(amount))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        Money::new(s.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_new_rejects_negative() {
        assert_eq!(
            Money::new(Decimal::new(-1, 2)),
            Err(MoneyError::Negative)
        );
        assert!(Money::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_max_fits_numeric_12_2() {
        assert_eq!(Money::MAX.to_string(), "9999999999.99");
        assert_eq!(money("9999999999.99"), Money::MAX);
        assert_eq!(
            Money::new("10000000000".parse().unwrap()),
            Err(MoneyError::TooLarge)
        );
        assert_eq!(
            Money::new("9999999999.995".parse().unwrap()),
            Err(MoneyError::TooLarge)
        );
    }

    #[test]
    fn test_new_rounds_to_cents() {
        assert_eq!(money("19.995").to_string(), "20.00");
        assert_eq!(money("19.994").to_string(), "19.99");
        assert_eq!(money("7").to_string(), "7.00");
    }

    #[test]
    fn test_checked_mul() {
        assert_eq!(money("10.00").checked_mul(2), Some(money("20.00")));
        assert_eq!(money("0.10").checked_mul(0), Some(Money::ZERO));
        assert_eq!(money("10.00").checked_mul(2_000_000_000), None);
        assert_eq!(money("0.01").checked_mul(u32::MAX), Some(money("42949672.95")));
    }

    #[test]
    fn test_checked_add_stops_at_max() {
        assert_eq!(Money::MAX.checked_add(Money::ZERO), Some(Money::MAX));
        assert_eq!(Money::MAX.checked_add(money("0.01")), None);
    }

    #[test]
    fn test_sum() {
        let items = [money("1.25"), money("2.50"), money("0.25")];
        assert_eq!(items.iter().sum::<Money>(), money("4.00"));

        let empty: Vec<Money> = Vec::new();
        assert_eq!(empty.into_iter().sum::<Money>(), Money::ZERO);
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(Money::from_cents(1999), money("19.99"));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_value(money("20.00")).unwrap();
        assert_eq!(json, serde_json::json!(20.0));

        let parsed: Money = serde_json::from_str("12.5").unwrap();
        assert_eq!(parsed, money("12.50"));

        assert!(serde_json::from_str::<Money>("-3").is_err());
    }
}
