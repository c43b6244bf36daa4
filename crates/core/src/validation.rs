//! Field-level validation of caller input.
//!
//! Checks never short-circuit: every rule runs and every violation is
//! reported together in one [`ValidationError`].

use std::fmt;

use tally_shared::types::{Currency, from_minor_units};
use thiserror::Error;

/// A single violated field constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Name of the offending field.
    pub field: String,
    /// The constraint the field should satisfy.
    pub expected: String,
    /// What was actually supplied.
    pub actual: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field {} should be {}, {} detected",
            self.field, self.expected, self.actual
        )
    }
}

/// Every violation found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// The recorded violations, in check order.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Names of the violated fields, in check order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.field.as_str())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

/// Accumulating validator for identifiers, amounts, and currency codes.
///
/// ```
/// use tally_core::Validator;
///
/// let mut v = Validator::new();
/// v.uid("payer_uid", "").amount(-500);
/// let err = v.finish().unwrap_err();
/// assert_eq!(err.violations().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Validator {
    violations: Vec<FieldViolation>,
}

impl Validator {
    /// Creates a validator with no recorded violations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation for `field`.
    pub fn add_field(
        &mut self,
        field: &str,
        actual: impl Into<String>,
        expected: impl Into<String>,
    ) -> &mut Self {
        self.violations.push(FieldViolation {
            field: field.to_string(),
            expected: expected.into(),
            actual: actual.into(),
        });
        self
    }

    /// Identifiers must be non-empty.
    pub fn uid(&mut self, field: &str, uid: &str) -> &mut Self {
        if uid.is_empty() {
            self.add_field(field, "empty string", "a non-empty string");
        }
        self
    }

    /// Transfer amounts (minor units) must not be negative. Zero is accepted.
    pub fn amount(&mut self, amount: i64) -> &mut Self {
        self.non_negative("amount", amount)
    }

    /// Initial balances (minor units) must not be negative.
    pub fn balance(&mut self, balance: i64) -> &mut Self {
        self.non_negative("balance", balance)
    }

    /// Currency must be the supported code, compared case-insensitively.
    pub fn currency(&mut self, currency: &str) -> &mut Self {
        if currency.parse::<Currency>().is_err() {
            self.add_field("currency", currency, Currency::SUPPORTED.code());
        }
        self
    }

    fn non_negative(&mut self, field: &str, value: i64) -> &mut Self {
        if value < 0 {
            self.add_field(field, from_minor_units(value).to_string(), ">= 0");
        }
        self
    }

    /// Ends the pass.
    ///
    /// # Errors
    ///
    /// Returns every recorded violation if there is at least one.
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                violations: self.violations,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_valid_input_passes() {
        let mut v = Validator::new();
        v.uid("uid", "alice").amount(0).balance(10_000).currency("USD");
        assert!(v.finish().is_ok());
    }

    #[rstest]
    #[case("USD")]
    #[case("usd")]
    #[case("Usd")]
    fn test_currency_case_insensitive(#[case] currency: &str) {
        let mut v = Validator::new();
        v.currency(currency);
        assert!(v.finish().is_ok());
    }

    #[rstest]
    #[case("EUR")]
    #[case("")]
    #[case("USDT")]
    fn test_unsupported_currency(#[case] currency: &str) {
        let mut v = Validator::new();
        v.currency(currency);
        let err = v.finish().unwrap_err();
        assert_eq!(err.fields().collect::<Vec<_>>(), vec!["currency"]);
        assert_eq!(err.violations()[0].expected, "USD");
    }

    #[test]
    fn test_negative_amount_rendered_as_decimal() {
        let mut v = Validator::new();
        v.amount(-250);
        let err = v.finish().unwrap_err();
        assert_eq!(
            err.to_string(),
            "field amount should be >= 0, -2.50 detected"
        );
    }

    #[test]
    fn test_zero_amount_is_accepted() {
        let mut v = Validator::new();
        v.amount(0).balance(0);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_violations_accumulate() {
        let mut v = Validator::new();
        v.amount(-1)
            .uid("payer_uid", "")
            .uid("recipient_uid", "")
            .currency("JPY");
        let err = v.finish().unwrap_err();

        assert_eq!(
            err.fields().collect::<Vec<_>>(),
            vec!["amount", "payer_uid", "recipient_uid", "currency"]
        );
        assert_eq!(err.to_string().matches("; ").count(), 3);
    }
}
