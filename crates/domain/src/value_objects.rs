//! Self-validating value types.
//!
//! Every constructor either returns a fully valid instance or a
//! [`ValidationError`] naming the violated rule. Derived operations return new
//! instances and never mutate the receiver.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::error::{DimensionMismatchError, ValidationError};

/// Marker trait for value objects: immutable, compared and hashed by value.
pub trait ValueObject: Clone + PartialEq + Eq + std::hash::Hash + fmt::Debug {}

/// Three-letter currency code (e.g., `USD`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    pub const USD: Currency = Currency(*b"USD");
    pub const EUR: Currency = Currency(*b"EUR");
    pub const GBP: Currency = Currency(*b"GBP");

    /// Parses a currency code. Lowercase input is normalized.
    pub fn new(code: &str) -> Result<Self, ValidationError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ValidationError::Required { field: "currency" });
        }
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(ValidationError::invalid_format(
                "currency",
                format!("expected three letters, got {code:?}"),
            ));
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
            bytes[2].to_ascii_uppercase(),
        ]))
    }
}

impl ValueObject for Currency {}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            f.write_char(char::from(b))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({self})")
    }
}

impl TryFrom<String> for Currency {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.to_string()
    }
}

/// A non-negative monetary amount in minor units, bound to a currency.
///
/// [`Money::MAX_AMOUNT_MINOR`] bounds amounts created with [`Money::new`].
/// Results of [`Money::add`] and [`Money::multiply`] may go past it: a line
/// total or an order total is a derived value and is kept exact. Those
/// results saturate at `i64::MAX`, which the order line limits keep out of
/// reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount_minor: i64,
    currency: Currency,
}

impl Money {
    /// Largest amount accepted at construction (ten billion major units).
    pub const MAX_AMOUNT_MINOR: i64 = 1_000_000_000_000;

    /// Creates an amount from minor units (e.g., 1000 = 10.00).
    pub fn new(amount_minor: i64, currency: Currency) -> Result<Self, ValidationError> {
        if !(0..=Self::MAX_AMOUNT_MINOR).contains(&amount_minor) {
            return Err(ValidationError::out_of_range(
                "amount",
                amount_minor,
                0,
                Self::MAX_AMOUNT_MINOR,
            ));
        }
        Ok(Self {
            amount_minor,
            currency,
        })
    }

    /// Returns zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount_minor: 0,
            currency,
        }
    }

    /// Returns the amount in minor units.
    pub fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    /// Returns the currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    /// Adds another amount of the same currency. The result is not capped
    /// at [`Money::MAX_AMOUNT_MINOR`].
    pub fn add(&self, other: &Money) -> Result<Money, DimensionMismatchError> {
        self.ensure_same_currency("add", other)?;
        Ok(Money {
            amount_minor: self.amount_minor.saturating_add(other.amount_minor),
            currency: self.currency,
        })
    }

    /// Multiplies by a quantity. The result is not capped at
    /// [`Money::MAX_AMOUNT_MINOR`].
    pub fn multiply(&self, quantity: Quantity) -> Money {
        Money {
            amount_minor: self
                .amount_minor
                .saturating_mul(i64::from(quantity.get())),
            currency: self.currency,
        }
    }

    /// Sums amounts that must all be in `currency`.
    pub fn sum<'a>(
        currency: Currency,
        amounts: impl IntoIterator<Item = &'a Money>,
    ) -> Result<Money, DimensionMismatchError> {
        amounts
            .into_iter()
            .try_fold(Money::zero(currency), |acc, amount| acc.add(amount))
    }

    fn ensure_same_currency(
        &self,
        operation: &'static str,
        other: &Money,
    ) -> Result<(), DimensionMismatchError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(DimensionMismatchError {
                operation,
                left: self.currency,
                right: other.currency,
            })
        }
    }
}

impl ValueObject for Money {}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02} {}",
            self.amount_minor / 100,
            self.amount_minor % 100,
            self.currency
        )
    }
}

/// A positive, bounded item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 10_000;

    /// Creates a quantity in `MIN..=MAX`.
    pub fn new(value: u32) -> Result<Self, ValidationError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ValidationError::out_of_range(
                "quantity",
                i64::from(value),
                i64::from(Self::MIN),
                i64::from(Self::MAX),
            ));
        }
        Ok(Self(value))
    }

    /// Returns the raw count.
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Combines two quantities; the result must itself be a valid quantity.
    pub fn add(&self, other: Quantity) -> Result<Quantity, ValidationError> {
        Self::new(self.0.saturating_add(other.0))
    }
}

impl ValueObject for Quantity {}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stock keeping unit: uppercase letters, digits, `-` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    pub const MAX_LEN: usize = 32;

    /// Parses a SKU. Lowercase letters are normalized to uppercase.
    pub fn new(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ValidationError::Required { field: "sku" });
        }
        if value.len() > Self::MAX_LEN {
            return Err(ValidationError::invalid_format(
                "sku",
                format!("longer than {} characters", Self::MAX_LEN),
            ));
        }
        if let Some(bad) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(ValidationError::invalid_format(
                "sku",
                format!("unexpected character {bad:?}"),
            ));
        }
        Ok(Self(value.to_ascii_uppercase()))
    }

    /// Returns the SKU as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Sku {}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque customer identifier issued by the customer context.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    pub const MAX_LEN: usize = 64;

    /// Creates a customer ID; surrounding whitespace is trimmed.
    pub fn new(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ValidationError::Required {
                field: "customer_id",
            });
        }
        if value.len() > Self::MAX_LEN {
            return Err(ValidationError::invalid_format(
                "customer_id",
                format!("longer than {} characters", Self::MAX_LEN),
            ));
        }
        if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError::invalid_format(
                "customer_id",
                "must not contain whitespace",
            ));
        }
        Ok(Self(value.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for CustomerId {}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A syntactically valid email address. The domain part is lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub const MAX_LEN: usize = 254;

    pub fn new(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ValidationError::Required { field: "email" });
        }
        if value.len() > Self::MAX_LEN {
            return Err(ValidationError::invalid_format(
                "email",
                format!("longer than {} characters", Self::MAX_LEN),
            ));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(ValidationError::invalid_format(
                "email",
                "must not contain whitespace",
            ));
        }
        let Some((local, domain)) = value.split_once('@') else {
            return Err(ValidationError::invalid_format("email", "missing '@'"));
        };
        if local.is_empty() || domain.contains('@') {
            return Err(ValidationError::invalid_format(
                "email",
                "expected exactly one '@' with a non-empty local part",
            ));
        }
        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
            return Err(ValidationError::invalid_format(
                "email",
                "domain must contain a dot-separated host",
            ));
        }
        Ok(Self(format!("{local}@{}", domain.to_ascii_lowercase())))
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for EmailAddress {}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(minor: i64) -> Money {
        Money::new(minor, Currency::USD).unwrap()
    }

    #[test]
    fn currency_normalizes_case() {
        assert_eq!(Currency::new("usd").unwrap(), Currency::USD);
        assert_eq!(Currency::USD.to_string(), "USD");
    }

    #[test]
    fn currency_rejects_bad_codes() {
        assert_eq!(
            Currency::new("").unwrap_err(),
            ValidationError::Required { field: "currency" }
        );
        assert!(matches!(
            Currency::new("US"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            Currency::new("U5D"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn currency_serializes_as_code() {
        let json = serde_json::to_string(&Currency::EUR).unwrap();
        assert_eq!(json, "\"EUR\"");
        let back: Currency = serde_json::from_str("\"gbp\"").unwrap();
        assert_eq!(back, Currency::GBP);
        assert!(serde_json::from_str::<Currency>("\"EURO\"").is_err());
    }

    #[test]
    fn money_rejects_negative_and_oversized_amounts() {
        assert!(matches!(
            Money::new(-1, Currency::USD),
            Err(ValidationError::OutOfRange { field: "amount", .. })
        ));
        assert!(Money::new(Money::MAX_AMOUNT_MINOR + 1, Currency::USD).is_err());
        assert!(Money::new(Money::MAX_AMOUNT_MINOR, Currency::USD).is_ok());
    }

    #[test]
    fn money_add_returns_new_value() {
        let a = usd(1000);
        let b = usd(500);
        let sum = a.add(&b).unwrap();
        assert_eq!(sum, usd(1500));
        assert_eq!(a, usd(1000));
        assert_eq!(b, usd(500));
    }

    #[test]
    fn money_add_across_currencies_fails() {
        let dollars = usd(1000);
        let euros = Money::new(500, Currency::EUR).unwrap();

        let err = dollars.add(&euros).unwrap_err();
        assert_eq!(err.left, Currency::USD);
        assert_eq!(err.right, Currency::EUR);
    }

    #[test]
    fn money_multiply_and_sum() {
        let unit = usd(1000);
        assert_eq!(unit.multiply(Quantity::new(3).unwrap()), usd(3000));

        let amounts = [usd(100), usd(250), usd(5)];
        assert_eq!(Money::sum(Currency::USD, &amounts).unwrap(), usd(355));
        assert_eq!(
            Money::sum(Currency::EUR, &amounts).unwrap_err().left,
            Currency::EUR
        );
        assert!(Money::sum(Currency::USD, []).unwrap().is_zero());
    }

    #[test]
    fn derived_amounts_stay_exact_above_input_cap() {
        let unit = usd(Money::MAX_AMOUNT_MINOR);

        let line_total = unit.multiply(Quantity::new(Quantity::MAX).unwrap());
        assert_eq!(line_total.amount_minor(), 10_000_000_000_000_000);
        assert!(Money::new(line_total.amount_minor(), Currency::USD).is_err());

        let order_total = Money::sum(Currency::USD, &[line_total, line_total]).unwrap();
        assert_eq!(order_total.amount_minor(), 20_000_000_000_000_000);
    }

    #[test]
    fn money_display() {
        assert_eq!(usd(2000).to_string(), "20.00 USD");
        assert_eq!(usd(5).to_string(), "0.05 USD");
    }

    #[test]
    fn quantity_bounds() {
        assert!(Quantity::new(0).is_err());
        assert!(Quantity::new(Quantity::MAX + 1).is_err());
        assert_eq!(Quantity::new(2).unwrap().get(), 2);
    }

    #[test]
    fn quantity_add_must_stay_in_range() {
        let a = Quantity::new(Quantity::MAX - 1).unwrap();
        assert_eq!(
            a.add(Quantity::new(1).unwrap()).unwrap().get(),
            Quantity::MAX
        );
        assert!(matches!(
            a.add(Quantity::new(2).unwrap()),
            Err(ValidationError::OutOfRange { field: "quantity", .. })
        ));
    }

    #[test]
    fn sku_validation() {
        assert_eq!(Sku::new("sku-1").unwrap(), Sku::new("SKU-1").unwrap());
        assert!(Sku::new("  ").is_err());
        assert!(Sku::new("SKU 1").is_err());
        assert!(Sku::new(&"X".repeat(Sku::MAX_LEN + 1)).is_err());
    }

    #[test]
    fn customer_id_validation() {
        assert_eq!(CustomerId::new(" C1 ").unwrap().as_str(), "C1");
        assert!(CustomerId::new("").is_err());
        assert!(CustomerId::new("C 1").is_err());
    }

    #[test]
    fn email_validation() {
        let email = EmailAddress::new("Jane.Doe@Example.COM").unwrap();
        assert_eq!(email.as_str(), "Jane.Doe@example.com");

        for bad in ["", "no-at-sign", "@example.com", "a@b", "a@@b.com", "a@b..com", "a b@c.com"] {
            assert!(EmailAddress::new(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn equal_inputs_make_interchangeable_values() {
        use std::collections::HashSet;

        let a = Money::new(1999, Currency::new("usd").unwrap()).unwrap();
        let b = Money::new(1999, Currency::USD).unwrap();
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}
