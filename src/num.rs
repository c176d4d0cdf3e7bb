//! Fixed-precision decimal arithmetic.
//!
//! All of the geometry in this crate is computed with [`ExactNumber`], a
//! decimal with a big-integer mantissa that is rounded (half away from zero)
//! to [`SIGNIFICANT_DIGITS`] digits after every operation. The point isn't
//! really exactness (division and square roots still round), but
//! determinism: every operation is correctly rounded, so computing
//! `a.intersection(b)` and `b.intersection(a)` can't disagree because of
//! the vagaries of binary floating-point.

use std::cmp::Ordering;
use std::str::FromStr;

use malachite::num::arithmetic::traits::{FloorSqrt, Pow};
use malachite::num::logic::traits::SignificantBits;
use malachite::Integer;

/// The number of significant decimal digits kept by every [`ExactNumber`].
pub const SIGNIFICANT_DIGITS: u64 = 50;

fn zero_int() -> Integer {
    Integer::from(0u32)
}

fn pow10(exp: u64) -> Integer {
    Integer::from(10u32).pow(exp)
}

fn is_negative(m: &Integer) -> bool {
    *m < zero_int()
}

fn abs_int(m: &Integer) -> Integer {
    if is_negative(m) {
        -m.clone()
    } else {
        m.clone()
    }
}

/// The number of decimal digits in `|m|`.
fn digit_count(m: &Integer) -> u64 {
    let bits = m.significant_bits();
    if bits == 0 {
        return 1;
    }
    // `|m|` is at least `2^(bits - 1)` and less than ten times that, so the
    // estimate is either right or one short.
    let estimate = ((bits - 1) as f64 * std::f64::consts::LOG10_2) as u64 + 1;
    if abs_int(m) >= pow10(estimate) {
        estimate + 1
    } else {
        estimate
    }
}

/// Divides `n` by the positive `d`, rounding half away from zero.
fn div_round_half_up(n: &Integer, d: &Integer) -> Integer {
    let a = abs_int(n);
    let mut q = &a / d;
    let r = &a - &q * d;
    if r * Integer::from(2u32) >= *d {
        q += Integer::from(1u32);
    }
    if is_negative(n) {
        -q
    } else {
        q
    }
}

/// A decimal number with [`SIGNIFICANT_DIGITS`] digits of precision.
///
/// The value is `mantissa * 10^exponent`. We keep the representation
/// normalized (the mantissa has no trailing zeros, and zero is stored as
/// `0 * 10^0`) so that the derived `Eq` and `Hash` agree with numeric
/// equality.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ExactNumber {
    mantissa: Integer,
    exponent: i64,
}

/// The error returned when trying to build an [`ExactNumber`] from an
/// infinite or NaN float.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
#[error("{0} is not a finite number")]
pub struct NonFiniteError(pub f64);

impl ExactNumber {
    /// Zero.
    pub fn zero() -> Self {
        ExactNumber {
            mantissa: zero_int(),
            exponent: 0,
        }
    }

    fn from_parts(mantissa: Integer, exponent: i64) -> Self {
        let mut ret = ExactNumber { mantissa, exponent };
        ret.round_to_precision();
        ret.normalize();
        ret
    }

    fn round_to_precision(&mut self) {
        let digits = digit_count(&self.mantissa);
        if digits > SIGNIFICANT_DIGITS {
            let shift = digits - SIGNIFICANT_DIGITS;
            self.mantissa = div_round_half_up(&self.mantissa, &pow10(shift));
            self.exponent += shift as i64;
        }
    }

    fn normalize(&mut self) {
        if self.mantissa == zero_int() {
            self.exponent = 0;
            return;
        }
        let ten = Integer::from(10u32);
        while &self.mantissa % &ten == zero_int() {
            self.mantissa /= &ten;
            self.exponent += 1;
        }
    }

    /// Returns the two mantissas, scaled to a common exponent.
    fn aligned(&self, other: &Self) -> (Integer, Integer, i64) {
        let exp = self.exponent.min(other.exponent);
        let a = &self.mantissa * pow10((self.exponent - exp) as u64);
        let b = &other.mantissa * pow10((other.exponent - exp) as u64);
        (a, b, exp)
    }

    /// Is this exactly zero?
    pub fn is_zero(&self) -> bool {
        self.mantissa == zero_int()
    }

    /// Is this strictly less than zero?
    pub fn is_negative(&self) -> bool {
        is_negative(&self.mantissa)
    }

    /// The sign of this number, as -1, 0, or 1.
    pub fn signum(&self) -> i32 {
        match self.mantissa.cmp(&zero_int()) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }

    /// The absolute value.
    pub fn abs(&self) -> Self {
        ExactNumber {
            mantissa: abs_int(&self.mantissa),
            exponent: self.exponent,
        }
    }

    /// The square root, correctly rounded.
    ///
    /// # Panics
    ///
    /// Panics if `self` is negative.
    pub fn sqrt(&self) -> Self {
        assert!(!self.is_negative(), "square root of negative number {self}");
        if self.is_zero() {
            return Self::zero();
        }

        // Scale the mantissa so that it has an even exponent and enough digits
        // for the root to have a couple of guard digits.
        let wanted = 2 * (SIGNIFICANT_DIGITS + 2);
        let digits = digit_count(&self.mantissa);
        let mut scale = wanted.saturating_sub(digits) as i64;
        if (self.exponent - scale) % 2 != 0 {
            scale += 1;
        }
        let scaled = &self.mantissa * pow10(scale as u64);
        let root = scaled.clone().floor_sqrt();
        // A sticky digit records whether the root was inexact, so that the final
        // rounding can't be fooled by a truncated ...5.
        let sticky = if &root * &root == scaled { 0u32 } else { 1u32 };
        let mantissa = root * Integer::from(10u32) + Integer::from(sticky);
        Self::from_parts(mantissa, (self.exponent - scale) / 2 - 1)
    }

    /// Converts to the nearest `f64`.
    pub fn to_f64(&self) -> f64 {
        format!("{}e{}", self.mantissa, self.exponent)
            .parse()
            .unwrap_or(f64::NAN)
    }
}

impl TryFrom<f64> for ExactNumber {
    type Error = NonFiniteError;

    /// Converts a float through its shortest round-trip decimal representation,
    /// so that `0.1` becomes exactly one tenth.
    fn try_from(x: f64) -> Result<Self, Self::Error> {
        if !x.is_finite() {
            return Err(NonFiniteError(x));
        }
        if x == 0.0 {
            return Ok(Self::zero());
        }
        // `{:e}` gives something like "-1.2345e-7".
        let repr = format!("{x:e}");
        let (digits, exp) = repr.split_once('e').ok_or(NonFiniteError(x))?;
        let exp: i64 = exp.parse().map_err(|_| NonFiniteError(x))?;
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        let mantissa = Integer::from_str(&format!("{int_part}{frac_part}"))
            .map_err(|_| NonFiniteError(x))?;
        Ok(Self::from_parts(mantissa, exp - frac_part.len() as i64))
    }
}

impl From<i64> for ExactNumber {
    fn from(x: i64) -> Self {
        Self::from_parts(Integer::from(x), 0)
    }
}

impl Ord for ExactNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let sign_cmp = self.signum().cmp(&other.signum());
        if sign_cmp != Ordering::Equal || self.exponent == other.exponent {
            return sign_cmp.then_with(|| self.mantissa.cmp(&other.mantissa));
        }
        let (a, b, _) = self.aligned(other);
        a.cmp(&b)
    }
}

impl PartialOrd for ExactNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Debug for ExactNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::fmt::Display for ExactNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.exponent >= 0 {
            return write!(f, "{}{}", self.mantissa, "0".repeat(self.exponent as usize));
        }
        let sign = if self.is_negative() { "-" } else { "" };
        let digits = abs_int(&self.mantissa).to_string();
        let frac_len = (-self.exponent) as usize;
        if digits.len() > frac_len {
            let (int_part, frac_part) = digits.split_at(digits.len() - frac_len);
            write!(f, "{sign}{int_part}.{frac_part}")
        } else {
            write!(f, "{sign}0.{}{digits}", "0".repeat(frac_len - digits.len()))
        }
    }
}

impl<'a> std::ops::Add<&'a ExactNumber> for &'a ExactNumber {
    type Output = ExactNumber;

    fn add(self, rhs: &'a ExactNumber) -> ExactNumber {
        let (a, b, exp) = self.aligned(rhs);
        ExactNumber::from_parts(a + b, exp)
    }
}

impl std::ops::Add<ExactNumber> for &ExactNumber {
    type Output = ExactNumber;

    fn add(self, rhs: ExactNumber) -> ExactNumber {
        self + &rhs
    }
}

impl<'a> std::ops::Sub<&'a ExactNumber> for &'a ExactNumber {
    type Output = ExactNumber;

    fn sub(self, rhs: &'a ExactNumber) -> ExactNumber {
        let (a, b, exp) = self.aligned(rhs);
        ExactNumber::from_parts(a - b, exp)
    }
}

impl<'a> std::ops::Mul<&'a ExactNumber> for &'a ExactNumber {
    type Output = ExactNumber;

    fn mul(self, rhs: &'a ExactNumber) -> ExactNumber {
        ExactNumber::from_parts(
            &self.mantissa * &rhs.mantissa,
            self.exponent + rhs.exponent,
        )
    }
}

impl<'a> std::ops::Div<&'a ExactNumber> for &'a ExactNumber {
    type Output = ExactNumber;

    /// # Panics
    ///
    /// Panics on division by zero.
    fn div(self, rhs: &'a ExactNumber) -> ExactNumber {
        assert!(!rhs.is_zero(), "division of {self} by zero");
        // Scale the numerator so that the truncated quotient has at least one
        // guard digit, and then add a sticky digit for the remainder.
        let num_digits = digit_count(&self.mantissa) as i64;
        let den_digits = digit_count(&rhs.mantissa) as i64;
        let scale = (SIGNIFICANT_DIGITS as i64 + 2 + den_digits - num_digits).max(0);
        let num = abs_int(&self.mantissa) * pow10(scale as u64);
        let den = abs_int(&rhs.mantissa);
        let q = &num / &den;
        let sticky = if &q * &den == num { 0u32 } else { 1u32 };
        let mut mantissa = q * Integer::from(10u32) + Integer::from(sticky);
        if self.is_negative() != rhs.is_negative() {
            mantissa = -mantissa;
        }
        ExactNumber::from_parts(mantissa, self.exponent - rhs.exponent - scale - 1)
    }
}

impl std::ops::Neg for &ExactNumber {
    type Output = ExactNumber;

    fn neg(self) -> ExactNumber {
        ExactNumber {
            mantissa: -self.mantissa.clone(),
            exponent: self.exponent,
        }
    }
}

macro_rules! forward_owned_binop {
    ($tr:ident, $method:ident) => {
        impl std::ops::$tr<ExactNumber> for ExactNumber {
            type Output = ExactNumber;

            fn $method(self, rhs: ExactNumber) -> ExactNumber {
                std::ops::$tr::$method(&self, &rhs)
            }
        }

        impl<'a> std::ops::$tr<&'a ExactNumber> for ExactNumber {
            type Output = ExactNumber;

            fn $method(self, rhs: &'a ExactNumber) -> ExactNumber {
                std::ops::$tr::$method(&self, rhs)
            }
        }
    };
}

forward_owned_binop!(Add, add);
forward_owned_binop!(Sub, sub);
forward_owned_binop!(Mul, mul);
forward_owned_binop!(Div, div);

impl std::ops::Neg for ExactNumber {
    type Output = ExactNumber;

    fn neg(self) -> ExactNumber {
        -&self
    }
}

/// How close two numbers need to be before we consider them equal.
///
/// Every primitive that needs a tolerance takes one of these explicitly;
/// there is no global precision setting. The default is exact comparison.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Precision {
    epsilon: Option<ExactNumber>,
}

impl Precision {
    /// Exact comparisons: two numbers are equal only if they're identical.
    pub fn exact() -> Self {
        Precision { epsilon: None }
    }

    /// Numbers within `epsilon` of one another compare equal.
    pub fn with_epsilon(epsilon: ExactNumber) -> Self {
        Precision {
            epsilon: Some(epsilon.abs()),
        }
    }

    /// The active epsilon, if there is one.
    pub fn epsilon(&self) -> Option<&ExactNumber> {
        self.epsilon.as_ref()
    }

    /// Compares two numbers, treating them as equal if they're within epsilon.
    ///
    /// This is not transitive, so don't sort with it.
    pub fn compare(&self, a: &ExactNumber, b: &ExactNumber) -> Ordering {
        if let Some(eps) = &self.epsilon {
            if (b - a).abs() <= *eps {
                return Ordering::Equal;
            }
        }
        a.cmp(b)
    }
}
