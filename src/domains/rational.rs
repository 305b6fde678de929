use std::{
    fmt::{Display, Formatter},
    ops::{Add, Mul, Neg},
};

use rug::{Complete, Rational as MultiPrecisionRational};

use crate::utils;

use super::integer::Integer;

/// An exact fraction, always in lowest terms with a positive denominator.
///
/// Every constructor and operation re-establishes that invariant, and results
/// that fit back into the machine-sized representation are demoted.
#[derive(Clone, PartialEq, Eq)]
pub enum Rational {
    Natural(i64, i64),
    Large(MultiPrecisionRational),
}

impl Rational {
    /// Create a reduced fraction with a positive denominator.
    ///
    /// # Panics
    ///
    /// Panics when `den` is zero.
    pub fn new(num: i64, den: i64) -> Rational {
        assert!(den != 0, "fraction with zero denominator");

        let g = utils::gcd_signed(num, den);
        if g > i64::MAX as u64 {
            // num == den == i64::MIN
            return Rational::from_large(MultiPrecisionRational::from((num, den)));
        }

        let (num, den) = (num / g as i64, den / g as i64);
        if den > 0 {
            Rational::Natural(num, den)
        } else if let (Some(num), Some(den)) = (num.checked_neg(), den.checked_neg()) {
            Rational::Natural(num, den)
        } else {
            Rational::from_large(MultiPrecisionRational::from((num, den)))
        }
    }

    pub const fn zero() -> Rational {
        Rational::Natural(0, 1)
    }

    pub const fn one() -> Rational {
        Rational::Natural(1, 1)
    }

    /// Convert from a multi-precision rational, downcasting when both parts
    /// fit in the machine-sized representation.
    fn from_large(r: MultiPrecisionRational) -> Rational {
        if let (Some(num), Some(den)) = (r.numer().to_i64(), r.denom().to_i64()) {
            Rational::Natural(num, den)
        } else {
            Rational::Large(r)
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        matches!(self, Rational::Natural(0, _))
    }

    pub fn numerator(&self) -> Integer {
        match self {
            Rational::Natural(num, _) => Integer::Natural(*num),
            Rational::Large(r) => Integer::from(r.numer().clone()),
        }
    }

    /// The reduced denominator, always positive.
    pub fn denominator(&self) -> Integer {
        match self {
            Rational::Natural(_, den) => Integer::Natural(*den),
            Rational::Large(r) => Integer::from(r.denom().clone()),
        }
    }

    /// The multiplicative inverse.
    ///
    /// # Panics
    ///
    /// Panics when `self` is zero.
    pub fn inv(&self) -> Rational {
        assert!(!self.is_zero(), "inverse of zero");
        match self {
            Rational::Natural(num, den) => {
                if *num < 0 {
                    if let (Some(num), Some(den)) = (den.checked_neg(), num.checked_neg()) {
                        Rational::Natural(num, den)
                    } else {
                        Rational::from_large(MultiPrecisionRational::from((*num, *den)).recip())
                    }
                } else {
                    Rational::Natural(*den, *num)
                }
            }
            Rational::Large(r) => Rational::from_large(r.clone().recip()),
        }
    }
}

impl From<i64> for Rational {
    #[inline]
    fn from(value: i64) -> Self {
        Rational::Natural(value, 1)
    }
}

impl std::fmt::Debug for Rational {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Rational {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rational::Natural(num, den) => {
                if *den == 1 {
                    Display::fmt(num, f)
                } else {
                    f.write_fmt(format_args!("{}/{}", num, den))
                }
            }
            Rational::Large(r) => Display::fmt(r, f),
        }
    }
}

impl<'a, 'b> Add<&'b Rational> for &'a Rational {
    type Output = Rational;

    fn add(self, rhs: &'b Rational) -> Rational {
        match (self, rhs) {
            (Rational::Natural(n1, d1), Rational::Natural(n2, d2)) => {
                // cross-multiply over the lcm of the denominators
                let g = utils::gcd_signed(*d1, *d2) as i64;
                if let Some(lcm) = d2.checked_mul(d1 / g) {
                    if let (Some(a1), Some(a2)) =
                        (n1.checked_mul(lcm / d1), n2.checked_mul(lcm / d2))
                    {
                        if let Some(num) = a1.checked_add(a2) {
                            return Rational::new(num, lcm);
                        }
                    }
                }
                Rational::from_large(
                    MultiPrecisionRational::from((*n1, *d1))
                        + MultiPrecisionRational::from((*n2, *d2)),
                )
            }
            (Rational::Natural(n, d), Rational::Large(r))
            | (Rational::Large(r), Rational::Natural(n, d)) => {
                Rational::from_large(MultiPrecisionRational::from((*n, *d)) + r)
            }
            (Rational::Large(r1), Rational::Large(r2)) => {
                Rational::from_large((r1 + r2).complete())
            }
        }
    }
}

impl<'a, 'b> Mul<&'b Rational> for &'a Rational {
    type Output = Rational;

    fn mul(self, rhs: &'b Rational) -> Rational {
        match (self, rhs) {
            (Rational::Natural(n1, d1), Rational::Natural(n2, d2)) => {
                // cancel across the diagonal before multiplying
                let g1 = utils::gcd_signed(*n1, *d2) as i64;
                let g2 = utils::gcd_signed(*d1, *n2) as i64;

                match (n1 / g1).checked_mul(n2 / g2) {
                    Some(num) => match (d1 / g2).checked_mul(d2 / g1) {
                        Some(den) => Rational::Natural(num, den),
                        None => Rational::from_large(
                            MultiPrecisionRational::from((*n1, *d1))
                                * MultiPrecisionRational::from((*n2, *d2)),
                        ),
                    },
                    None => Rational::from_large(
                        MultiPrecisionRational::from((*n1, *d1))
                            * MultiPrecisionRational::from((*n2, *d2)),
                    ),
                }
            }
            (Rational::Natural(n, d), Rational::Large(r))
            | (Rational::Large(r), Rational::Natural(n, d)) => {
                Rational::from_large(MultiPrecisionRational::from((*n, *d)) * r)
            }
            (Rational::Large(r1), Rational::Large(r2)) => {
                Rational::from_large((r1 * r2).complete())
            }
        }
    }
}

impl Add<Rational> for Rational {
    type Output = Rational;

    #[inline]
    fn add(self, rhs: Rational) -> Rational {
        &self + &rhs
    }
}

impl Mul<Rational> for Rational {
    type Output = Rational;

    #[inline]
    fn mul(self, rhs: Rational) -> Rational {
        &self * &rhs
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Self::Output {
        match self {
            Rational::Natural(num, den) => {
                if let Some(num) = num.checked_neg() {
                    Rational::Natural(num, den)
                } else {
                    Rational::from_large(-MultiPrecisionRational::from((num, den)))
                }
            }
            Rational::Large(r) => Rational::from_large(-r),
        }
    }
}

impl<'a> Neg for &'a Rational {
    type Output = Rational;

    #[inline]
    fn neg(self) -> Self::Output {
        self.clone().neg()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_reduces_and_normalizes_sign() {
        assert_eq!(Rational::new(4, -6), Rational::Natural(-2, 3));
        assert_eq!(Rational::new(-4, -6), Rational::Natural(2, 3));
        assert_eq!(Rational::new(0, -5), Rational::Natural(0, 1));
    }

    #[test]
    fn add_stays_reduced() {
        let a = Rational::new(1, 6);
        let b = Rational::new(1, 3);
        assert_eq!(&a + &b, Rational::Natural(1, 2));
    }

    #[test]
    fn mul_cancels_before_multiplying() {
        let a = Rational::new(2, 9);
        let b = Rational::new(3, 4);
        assert_eq!(&a * &b, Rational::Natural(1, 6));
    }

    #[test]
    fn inv_keeps_denominator_positive() {
        assert_eq!(Rational::new(-2, 3).inv(), Rational::Natural(-3, 2));
        assert_eq!(Rational::new(2, 3).inv(), Rational::Natural(3, 2));
    }

    #[test]
    fn overflow_promotes_and_demotes() {
        let a = Rational::Natural(i64::MAX, 1);
        let b = Rational::Natural(i64::MAX, 1);
        let sum = &a + &b;
        assert!(matches!(sum, Rational::Large(_)));

        let back = &sum * &Rational::new(1, 2);
        assert_eq!(back, Rational::Natural(i64::MAX, 1));
    }
}
