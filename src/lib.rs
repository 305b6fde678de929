//! Exact chemical-equation balancing.
//!
//! `chembal` parses chemical formulas into element counts, assembles the
//! homogeneous linear system expressing atom conservation and solves it
//! exactly: fraction-free Gaussian elimination over the integers, rational
//! back-substitution with the single free variable fixed to one, and a final
//! rescaling to the smallest vector of positive integer coefficients.
//!
//! For example:
//!
//! ```
//! use chembal::balance;
//!
//! fn main() {
//!     let coefficients = balance(&["C3H8", "O2"], &["CO2", "H2O"]).unwrap();
//!     let printed: Vec<String> = coefficients.iter().map(|c| c.to_string()).collect();
//!     assert_eq!(printed, ["1", "5", "3", "4"]);
//! }
//! ```
//!
//! Arithmetic never wraps: machine-sized values widen to multi-precision
//! integers and rationals when a result no longer fits, so every reported
//! balance is exact. A call either returns one strictly positive coefficient
//! per formula or fails as a whole; there are no partial results.

pub mod balance;
pub mod domains;
pub mod matrix;
pub mod parser;
pub mod utils;

pub use balance::{balance, solve, BalanceError, Side, UnbalanceableError};
pub use domains::{integer::Integer, rational::Rational};
pub use parser::{parse, Composition, InvalidFormulaError, Symbol};
