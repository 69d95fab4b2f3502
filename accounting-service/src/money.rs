// Integer minor-unit money
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use thiserror::Error;

/// Amount in centavos.
///
/// All ledger arithmetic happens on this type; decimals and the `R$ 1.234,56`
/// notation only exist at the boundary ([`Money::parse_brl`],
/// [`Money::from_decimal`], [`Money::format_brl`]). Operator arithmetic
/// saturates so read-side aggregation over dirty data cannot panic; the write
/// path uses the `checked_*` variants and rejects overflow.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Amount is empty")]
    Empty,

    #[error("Malformed amount: {0}")]
    Malformed(String),

    #[error("Amount has sub-cent precision: {0}")]
    Precision(String),

    #[error("Amount exceeds the supported range")]
    Overflow,
}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(units: i64) -> Self {
        Self(units)
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    #[must_use]
    pub fn abs(self) -> Money {
        Money(self.0.saturating_abs())
    }

    /// Convert a decimal amount in reais.
    ///
    /// # Errors
    ///
    /// Rejects amounts with more than two decimal places and amounts outside
    /// the `i64` centavo range.
    pub fn from_decimal(amount: Decimal) -> Result<Money, MoneyError> {
        let scaled = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(MoneyError::Overflow)?;
        if !scaled.fract().is_zero() {
            return Err(MoneyError::Precision(amount.to_string()));
        }
        scaled.to_i64().map(Money).ok_or(MoneyError::Overflow)
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Parse a pt-BR amount such as `R$ 1.234,56`, `1234,5` or `-R$ 10,00`.
    ///
    /// `.` groups thousands and `,` separates centavos.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError`] for empty input, bad digit grouping, more than
    /// two decimal places or overflow.
    pub fn parse_brl(input: &str) -> Result<Money, MoneyError> {
        let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(MoneyError::Empty);
        }

        let (leading_minus, rest) = match compact.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, compact.as_str()),
        };
        let rest = rest.strip_prefix("R$").unwrap_or(rest);
        let (trailing_minus, body) = match rest.strip_prefix('-') {
            Some(body) => (true, body),
            None => (false, rest),
        };
        if leading_minus && trailing_minus {
            return Err(MoneyError::Malformed(input.to_string()));
        }
        if body.is_empty() {
            return Err(MoneyError::Empty);
        }

        let (integer, fraction) = body.rsplit_once(',').unwrap_or((body, ""));
        if integer.is_empty() || !grouping_is_valid(integer) {
            return Err(MoneyError::Malformed(input.to_string()));
        }
        if !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(MoneyError::Malformed(input.to_string()));
        }

        let reais: i64 = integer
            .replace('.', "")
            .parse()
            .map_err(|_| MoneyError::Overflow)?;
        let centavos: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| MoneyError::Malformed(input.to_string()))? * 10,
            2 => fraction.parse().map_err(|_| MoneyError::Malformed(input.to_string()))?,
            _ => return Err(MoneyError::Precision(input.to_string())),
        };

        let total = reais
            .checked_mul(100)
            .and_then(|value| value.checked_add(centavos))
            .ok_or(MoneyError::Overflow)?;

        if leading_minus || trailing_minus {
            total.checked_neg().map(Money).ok_or(MoneyError::Overflow)
        } else {
            Ok(Money(total))
        }
    }

    /// Render as `R$ 1.234,56` (`-R$ 1.234,56` when negative)
    pub fn format_brl(self) -> String {
        let magnitude = self.0.unsigned_abs();
        let reais = (magnitude / 100).to_string();
        let centavos = magnitude % 100;

        let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
        for (i, digit) in reais.chars().enumerate() {
            if i > 0 && (reais.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(digit);
        }

        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{sign}R$ {grouped},{centavos:02}")
    }

    /// `self` as a percentage of `whole`, two decimal places.
    ///
    /// A zero denominator yields zero instead of failing.
    pub fn percentage_of(self, whole: Money) -> Decimal {
        if whole.is_zero() {
            return Decimal::ZERO;
        }
        Decimal::from(self.0)
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|scaled| scaled.checked_div(Decimal::from(whole.0)))
            .map_or(Decimal::ZERO, |ratio| ratio.round_dp(2))
    }
}

fn grouping_is_valid(integer: &str) -> bool {
    if !integer.contains('.') {
        return integer.chars().all(|c| c.is_ascii_digit());
    }
    integer.split('.').enumerate().all(|(i, group)| {
        let width_ok = if i == 0 {
            (1..=3).contains(&group.len())
        } else {
            group.len() == 3
        };
        width_ok && group.chars().all(|c| c.is_ascii_digit())
    })
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
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
