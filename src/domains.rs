//! Exact arithmetic value types.
//!
//! Both types keep a machine-sized representation for as long as the value
//! fits and switch to a multi-precision `rug` representation when it does not,
//! so no operation ever wraps or loses precision:
//! - [Integer](integer::Integer) backs the conservation matrix and the final
//!   coefficients,
//! - [Rational](rational::Rational) backs the back-substitution values and is
//!   kept in lowest terms with a positive denominator after every operation.
pub mod integer;
pub mod rational;
