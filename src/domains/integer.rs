use std::{
    fmt::{Display, Formatter},
    ops::{Add, Div, Mul, Neg},
};

use rug::{Complete, Integer as MultiPrecisionInteger};

use crate::utils;

use super::rational::Rational;

/// An exact integer that is machine-sized until a result no longer fits.
///
/// All arithmetic is checked: a result that overflows an `i64` widens to a
/// multi-precision integer, and wide results that fit again are demoted, so
/// equal values always compare equal.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Integer {
    Natural(i64),
    Large(MultiPrecisionInteger),
}

impl Integer {
    pub const fn zero() -> Integer {
        Integer::Natural(0)
    }

    pub const fn one() -> Integer {
        Integer::Natural(1)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        match self {
            Integer::Natural(n) => *n == 0,
            Integer::Large(_) => false,
        }
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        match self {
            Integer::Natural(n) => *n < 0,
            Integer::Large(r) => *r < 0,
        }
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        match self {
            Integer::Natural(n) => *n > 0,
            Integer::Large(r) => *r > 0,
        }
    }

    pub fn abs(&self) -> Integer {
        match self {
            Integer::Natural(n) => {
                if let Some(n) = n.checked_abs() {
                    Integer::Natural(n)
                } else {
                    Integer::Large(MultiPrecisionInteger::from(*n).abs())
                }
            }
            Integer::Large(r) => Integer::Large(r.clone().abs()),
        }
    }

    /// The non-negative greatest common divisor, with `gcd(0, n) = |n|`.
    pub fn gcd(&self, b: &Integer) -> Integer {
        match (self, b) {
            (Integer::Natural(n1), Integer::Natural(n2)) => {
                let gcd = utils::gcd_signed(*n1, *n2);
                if gcd <= i64::MAX as u64 {
                    Integer::Natural(gcd as i64)
                } else {
                    // gcd(i64::MIN, i64::MIN)
                    Integer::Large(MultiPrecisionInteger::from(gcd))
                }
            }
            (Integer::Natural(n1), Integer::Large(r2))
            | (Integer::Large(r2), Integer::Natural(n1)) => {
                Integer::from(MultiPrecisionInteger::from(*n1).gcd(r2))
            }
            (Integer::Large(r1), Integer::Large(r2)) => Integer::from(r1.clone().gcd(r2)),
        }
    }

    /// The least common multiple, computed as `(a / gcd) * b` so it carries
    /// the sign of the product `a * b`.
    pub fn lcm(&self, b: &Integer) -> Integer {
        let g = self.gcd(b);
        if g.is_zero() {
            Integer::zero()
        } else {
            &(self / &g) * b
        }
    }

    pub fn to_rational(&self) -> Rational {
        match self {
            Integer::Natural(n) => Rational::Natural(*n, 1),
            Integer::Large(r) => Rational::Large(r.into()),
        }
    }
}

impl From<i64> for Integer {
    #[inline]
    fn from(value: i64) -> Self {
        Integer::Natural(value)
    }
}

impl From<u64> for Integer {
    #[inline]
    fn from(value: u64) -> Self {
        if value <= i64::MAX as u64 {
            Integer::Natural(value as i64)
        } else {
            Integer::Large(MultiPrecisionInteger::from(value))
        }
    }
}

impl From<MultiPrecisionInteger> for Integer {
    /// Convert from a multi-precision integer, downcasting when the value
    /// fits in the machine-sized representation.
    #[inline]
    fn from(n: MultiPrecisionInteger) -> Self {
        if let Some(n) = n.to_i64() {
            Integer::Natural(n)
        } else {
            Integer::Large(n)
        }
    }
}

impl std::fmt::Debug for Integer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Natural(n) => Display::fmt(n, f),
            Self::Large(n) => Display::fmt(n, f),
        }
    }
}

impl Display for Integer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Natural(n) => Display::fmt(n, f),
            Self::Large(n) => Display::fmt(n, f),
        }
    }
}

impl<'a, 'b> Add<&'b Integer> for &'a Integer {
    type Output = Integer;

    fn add(self, rhs: &'b Integer) -> Integer {
        match (self, rhs) {
            (Integer::Natural(n1), Integer::Natural(n2)) => {
                if let Some(num) = n1.checked_add(*n2) {
                    Integer::Natural(num)
                } else {
                    Integer::Large(MultiPrecisionInteger::from(*n1) + *n2)
                }
            }
            (Integer::Natural(n1), Integer::Large(r2))
            | (Integer::Large(r2), Integer::Natural(n1)) => Integer::from((*n1 + r2).complete()),
            (Integer::Large(r1), Integer::Large(r2)) => Integer::from((r1 + r2).complete()),
        }
    }
}

impl<'a, 'b> Mul<&'b Integer> for &'a Integer {
    type Output = Integer;

    fn mul(self, rhs: &'b Integer) -> Integer {
        match (self, rhs) {
            (Integer::Natural(n1), Integer::Natural(n2)) => {
                if let Some(num) = n1.checked_mul(*n2) {
                    Integer::Natural(num)
                } else {
                    Integer::Large(MultiPrecisionInteger::from(*n1) * *n2)
                }
            }
            (Integer::Natural(n1), Integer::Large(r2))
            | (Integer::Large(r2), Integer::Natural(n1)) => Integer::from((*n1 * r2).complete()),
            (Integer::Large(r1), Integer::Large(r2)) => Integer::from((r1 * r2).complete()),
        }
    }
}

impl<'a, 'b> Div<&'b Integer> for &'a Integer {
    type Output = Integer;

    fn div(self, rhs: &'b Integer) -> Integer {
        match (self, rhs) {
            (Integer::Natural(n1), Integer::Natural(n2)) => {
                if let Some(num) = n1.checked_div(*n2) {
                    Integer::Natural(num)
                } else {
                    Integer::Large(MultiPrecisionInteger::from(*n1) / *n2)
                }
            }
            (Integer::Natural(n1), Integer::Large(r2)) => Integer::from((*n1 / r2).complete()),
            (Integer::Large(r1), Integer::Natural(n2)) => Integer::from((r1 / *n2).complete()),
            (Integer::Large(r1), Integer::Large(r2)) => Integer::from((r1 / r2).complete()),
        }
    }
}

impl Add<Integer> for Integer {
    type Output = Integer;

    #[inline]
    fn add(self, rhs: Integer) -> Integer {
        &self + &rhs
    }
}

impl Mul<Integer> for Integer {
    type Output = Integer;

    #[inline]
    fn mul(self, rhs: Integer) -> Integer {
        &self * &rhs
    }
}

impl Div<Integer> for Integer {
    type Output = Integer;

    #[inline]
    fn div(self, rhs: Integer) -> Integer {
        &self / &rhs
    }
}

impl Neg for Integer {
    type Output = Integer;

    fn neg(self) -> Self::Output {
        match self {
            Integer::Natural(n) => {
                if let Some(neg) = n.checked_neg() {
                    Integer::Natural(neg)
                } else {
                    Integer::Large(MultiPrecisionInteger::from(n).neg())
                }
            }
            Integer::Large(r) => Integer::from(-r),
        }
    }
}

impl<'a> Neg for &'a Integer {
    type Output = Integer;

    fn neg(self) -> Self::Output {
        match self {
            Integer::Natural(n) => {
                if let Some(neg) = n.checked_neg() {
                    Integer::Natural(neg)
                } else {
                    Integer::Large(MultiPrecisionInteger::from(*n).neg())
                }
            }
            Integer::Large(r) => Integer::from(r.clone().neg()),
        }
    }
}
