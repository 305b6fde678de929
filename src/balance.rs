//! Equation balancing: conservation-matrix assembly, back-substitution and
//! integer rescaling.

use std::fmt::{Display, Formatter};

use ahash::{HashMap, HashMapExt};
use tracing::debug;

use crate::{
    domains::{integer::Integer, rational::Rational},
    matrix::Matrix,
    parser::{self, Composition, InvalidFormulaError, Symbol},
};

/// The side of the equation a formula appears on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Reactant,
    Product,
}

impl Side {
    /// The sign of this side's contribution to atom conservation.
    #[inline]
    pub fn factor(&self) -> i64 {
        match self {
            Side::Reactant => 1,
            Side::Product => -1,
        }
    }
}

/// The term sequence admits no valid coefficient assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnbalanceableError {
    /// No row with a non-zero entry in the second-to-last column: the system
    /// has no designated free variable and degenerates to the trivial
    /// solution.
    NoFreeVariable,
    /// A variable required during back-substitution never received a value
    /// (rank deficiency beyond the single expected free variable).
    UnsolvedVariable { column: u32 },
    /// A zero diagonal entry where back-substitution has to divide.
    ZeroPivot { row: u32 },
    /// A finalized coefficient came out zero or negative.
    NonPositiveCoefficient { column: u32 },
}

impl Display for UnbalanceableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UnbalanceableError::NoFreeVariable => {
                f.write_str("system has no free variable to fix")
            }
            UnbalanceableError::UnsolvedVariable { column } => {
                f.write_fmt(format_args!("no value for formula term {}", column))
            }
            UnbalanceableError::ZeroPivot { row } => {
                f.write_fmt(format_args!("zero pivot in row {}", row))
            }
            UnbalanceableError::NonPositiveCoefficient { column } => f.write_fmt(format_args!(
                "coefficient of formula term {} is not positive",
                column
            )),
        }
    }
}

impl std::error::Error for UnbalanceableError {}

/// Error from [balance]: either a formula failed to parse or the equation
/// cannot be balanced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceError {
    InvalidFormula(InvalidFormulaError),
    Unbalanceable(UnbalanceableError),
}

impl Display for BalanceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BalanceError::InvalidFormula(e) => Display::fmt(e, f),
            BalanceError::Unbalanceable(e) => Display::fmt(e, f),
        }
    }
}

impl std::error::Error for BalanceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BalanceError::InvalidFormula(e) => Some(e),
            BalanceError::Unbalanceable(e) => Some(e),
        }
    }
}

impl From<InvalidFormulaError> for BalanceError {
    fn from(e: InvalidFormulaError) -> Self {
        BalanceError::InvalidFormula(e)
    }
}

impl From<UnbalanceableError> for BalanceError {
    fn from(e: UnbalanceableError) -> Self {
        BalanceError::Unbalanceable(e)
    }
}

/// Build the conservation matrix: one row per element in first-seen order,
/// one column per term, entries `count * sign`.
fn assemble(terms: &[(Composition, Side)]) -> Matrix {
    let mut row_of: HashMap<Symbol, u32> = HashMap::new();
    let mut order: Vec<Symbol> = Vec::new();
    for (composition, _) in terms {
        for (symbol, _) in composition.iter() {
            if !row_of.contains_key(symbol) {
                row_of.insert(Symbol::from(symbol), order.len() as u32);
                order.push(Symbol::from(symbol));
            }
        }
    }

    let mut matrix = Matrix::new(order.len() as u32, terms.len() as u32);
    for (col, (composition, side)) in terms.iter().enumerate() {
        for (symbol, count) in composition.iter() {
            let entry = &Integer::from(count) * &Integer::from(side.factor());
            matrix[(row_of[symbol], col as u32)] = entry;
        }
    }

    debug!(elements = ?order, terms = terms.len(), "assembled conservation matrix");
    matrix
}

/// Solve the reduced homogeneous system with the designated free variable
/// fixed to 1, producing one exact value per column.
fn back_substitute(matrix: &Matrix) -> Result<HashMap<u32, Rational>, UnbalanceableError> {
    let (nrows, ncols) = matrix.shape;
    if nrows == 0 || ncols < 2 {
        return Err(UnbalanceableError::NoFreeVariable);
    }

    // the last row still touching the second-to-last column designates the
    // free variable
    let start = u32::min(ncols - 1, nrows - 1);
    let base = (0..=start)
        .rev()
        .find(|&r| !matrix[(r, ncols - 2)].is_zero())
        .ok_or(UnbalanceableError::NoFreeVariable)?;

    debug!(base, "fixing free variable to 1");

    let mut values: HashMap<u32, Rational> = HashMap::new();
    values.insert(base + 1, Rational::one());

    for i in (0..=base).rev() {
        let mut value = Rational::zero();
        for n in i + 1..ncols {
            let known = values
                .get(&n)
                .ok_or(UnbalanceableError::UnsolvedVariable { column: n })?;
            let scaled = &(-&matrix[(i, n)]).to_rational() * known;
            value = &value + &scaled;
        }

        let diagonal = &matrix[(i, i)];
        if diagonal.is_zero() {
            return Err(UnbalanceableError::ZeroPivot { row: i });
        }
        values.insert(i, &value * &diagonal.to_rational().inv());
    }

    if !values.contains_key(&(ncols - 1)) {
        return Err(UnbalanceableError::UnsolvedVariable { column: ncols - 1 });
    }

    Ok(values)
}

/// Rescale the exact values to the smallest vector of positive integers.
fn scale_to_integers(
    values: &HashMap<u32, Rational>,
    ncols: u32,
) -> Result<Vec<Integer>, UnbalanceableError> {
    let mut multiple = Integer::one();
    for col in 0..ncols {
        let value = values
            .get(&col)
            .ok_or(UnbalanceableError::UnsolvedVariable { column: col })?;
        multiple = multiple.lcm(&value.denominator());
    }

    let mut coefficients = Vec::with_capacity(ncols as usize);
    for col in 0..ncols {
        let value = &values[&col];
        let coefficient = &(&value.numerator() * &multiple) / &value.denominator();
        if !coefficient.is_positive() {
            return Err(UnbalanceableError::NonPositiveCoefficient { column: col });
        }
        coefficients.push(coefficient);
    }

    Ok(coefficients)
}

/// Balance a sequence of signed formula terms.
///
/// Returns one strictly positive integer coefficient per term, in term order,
/// scaled so the coefficients share no common factor.
pub fn solve(terms: &[(Composition, Side)]) -> Result<Vec<Integer>, UnbalanceableError> {
    let mut matrix = assemble(terms);
    matrix.row_reduce();
    debug!("echelon form: {}", matrix);

    let values = back_substitute(&matrix)?;
    scale_to_integers(&values, matrix.shape.1)
}

/// Balance a chemical equation given its reactant and product formulas.
///
/// Coefficients come back in input order, reactants first:
///
/// ```
/// use chembal::balance;
///
/// let coefficients = balance(&["Fe", "O2"], &["Fe2O3"]).unwrap();
/// assert_eq!(coefficients, [4i64.into(), 3i64.into(), 2i64.into()]);
/// ```
pub fn balance(reactants: &[&str], products: &[&str]) -> Result<Vec<Integer>, BalanceError> {
    let mut terms = Vec::with_capacity(reactants.len() + products.len());
    for formula in reactants {
        terms.push((parser::parse(formula)?, Side::Reactant));
    }
    for formula in products {
        terms.push((parser::parse(formula)?, Side::Product));
    }

    Ok(solve(&terms)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(formula: &str, side: Side) -> (Composition, Side) {
        (parser::parse(formula).unwrap(), side)
    }

    #[test]
    fn assemble_orders_rows_by_first_seen_element() {
        let terms = [
            term("H2", Side::Reactant),
            term("O2", Side::Reactant),
            term("H2O", Side::Product),
        ];
        let m = assemble(&terms);

        assert_eq!(m.shape, (2, 3));
        // H row
        assert_eq!(m[(0, 0)], Integer::from(2i64));
        assert_eq!(m[(0, 1)], Integer::zero());
        assert_eq!(m[(0, 2)], Integer::from(-2i64));
        // O row
        assert_eq!(m[(1, 0)], Integer::zero());
        assert_eq!(m[(1, 1)], Integer::from(2i64));
        assert_eq!(m[(1, 2)], Integer::from(-1i64));
    }

    #[test]
    fn water_formation() {
        let terms = [
            term("H2", Side::Reactant),
            term("O2", Side::Reactant),
            term("H2O", Side::Product),
        ];
        let coefficients = solve(&terms).unwrap();
        assert_eq!(coefficients, [2i64.into(), 1i64.into(), 2i64.into()]);
    }

    #[test]
    fn solve_is_deterministic() {
        let terms = [
            term("C3H8", Side::Reactant),
            term("O2", Side::Reactant),
            term("CO2", Side::Product),
            term("H2O", Side::Product),
        ];
        let first = solve(&terms).unwrap();
        for _ in 0..10 {
            assert_eq!(solve(&terms).unwrap(), first);
        }
    }

    #[test]
    fn disjoint_elements_are_unbalanceable() {
        let terms = [term("H2", Side::Reactant), term("O2", Side::Product)];
        assert_eq!(
            solve(&terms),
            Err(UnbalanceableError::NonPositiveCoefficient { column: 0 })
        );
    }

    #[test]
    fn missing_free_variable_is_reported() {
        let terms = [term("H2O", Side::Reactant)];
        assert_eq!(solve(&terms), Err(UnbalanceableError::NoFreeVariable));
        assert_eq!(solve(&[]), Err(UnbalanceableError::NoFreeVariable));
    }

    #[test]
    fn rank_deficient_system_is_reported() {
        // carbon and oxygen balance but nitrogen floats free alongside the
        // designated free variable
        let terms = [
            term("C", Side::Reactant),
            term("O2", Side::Reactant),
            term("CO2", Side::Product),
            term("N2", Side::Product),
        ];
        assert_eq!(
            solve(&terms),
            Err(UnbalanceableError::UnsolvedVariable { column: 3 })
        );
    }

    #[test]
    fn parse_failure_propagates_through_balance() {
        assert_eq!(
            balance(&["(H2O"], &["H2O"]),
            Err(BalanceError::InvalidFormula(
                InvalidFormulaError::UnterminatedGroup
            ))
        );
    }
}
