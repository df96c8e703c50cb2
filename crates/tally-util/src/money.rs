//! Fixed-point money arithmetic
//!
//! The wire format and the original data files carry monetary amounts as
//! floating-point dollars. Internally every amount is held as whole
//! cents (`i64`) so that sums reconcile exactly: a grand total equals
//! the sum of its per-location partitions to the cent, with no epsilon.
//! Floats appear only at the boundary, when parsing wire values and when
//! presenting results.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// A monetary amount in minor units (cents).
///
/// Signed: the calculator does not reject negative inputs, it propagates
/// them arithmetically. Validation is a caller concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Convert from floating-point dollars, rounding half away from zero
    /// to the nearest cent. Non-finite values degrade to zero, matching
    /// the permissive treatment of malformed wire data.
    pub fn from_dollars(dollars: f64) -> Self {
        if !dollars.is_finite() {
            return Self::ZERO;
        }
        Self((dollars * 100.0).round() as i64)
    }

    pub fn to_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    /// Renders as dollars with two decimals, e.g. `$120.00` / `-$3.50`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

// On the wire money is a plain JSON number in dollars, the shape every
// existing collaborator produces and consumes.

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_dollars())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dollars = f64::deserialize(deserializer)?;
        Ok(Money::from_dollars(dollars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_round_trips_cents() {
        let m = Money::from_dollars(120.0);
        assert_eq!(m.cents(), 12000);
        assert_eq!(m.to_dollars(), 120.0);

        let m = Money::from_dollars(0.1);
        assert_eq!(m.cents(), 10);
    }

    #[test]
    fn rounding_half_away_from_zero() {
        // 0.125 is exactly representable, so this exercises the
        // half-cent case without float-literal noise
        assert_eq!(Money::from_dollars(0.125).cents(), 13);
        assert_eq!(Money::from_dollars(-0.125).cents(), -13);
        assert_eq!(Money::from_dollars(0.004).cents(), 0);
        assert_eq!(Money::from_dollars(79.166666).cents(), 7917);
    }

    #[test]
    fn non_finite_degrades_to_zero() {
        assert_eq!(Money::from_dollars(f64::NAN), Money::ZERO);
        assert_eq!(Money::from_dollars(f64::INFINITY), Money::ZERO);
        assert_eq!(Money::from_dollars(f64::NEG_INFINITY), Money::ZERO);
    }

    #[test]
    fn arithmetic_is_exact() {
        // 0.1 + 0.2 famously != 0.3 in f64; in cents it is exact.
        let a = Money::from_dollars(0.1);
        let b = Money::from_dollars(0.2);
        assert_eq!(a + b, Money::from_dollars(0.3));

        let total: Money = [a, b, Money::from_dollars(0.3)].iter().sum();
        assert_eq!(total.cents(), 60);
    }

    #[test]
    fn display_formatting() {
        assert_eq!(Money::from_cents(12000).to_string(), "$120.00");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-350).to_string(), "-$3.50");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn serde_as_dollars() {
        let m = Money::from_cents(1250);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "12.5");

        let parsed: Money = serde_json::from_str("20").unwrap();
        assert_eq!(parsed, Money::from_cents(2000));
    }
}
