//! Chemical formula parsing.

use std::fmt::{Display, Formatter};

use smallvec::SmallVec;
use smartstring::{LazyCompact, SmartString};

/// An element symbol: one uppercase letter followed by lowercase letters,
/// e.g. `H` or `Na`.
pub type Symbol = SmartString<LazyCompact>;

/// Malformed formula string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidFormulaError {
    /// A `)` without a matching `(`.
    UnmatchedParenthesis,
    /// A `(` whose group is never closed.
    UnterminatedGroup,
    /// An atom count or group multiplier does not fit in 64 bits.
    CountOverflow,
}

impl Display for InvalidFormulaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidFormulaError::UnmatchedParenthesis => f.write_str("unmatched ')' in formula"),
            InvalidFormulaError::UnterminatedGroup => f.write_str("unterminated '(' in formula"),
            InvalidFormulaError::CountOverflow => f.write_str("atom count too large"),
        }
    }
}

impl std::error::Error for InvalidFormulaError {}

/// The element counts of one formula, in first-seen order.
///
/// The order matters: it determines the row order of the conservation matrix
/// and therefore has to be reproducible.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Composition {
    elements: SmallVec<[(Symbol, u64); 8]>,
}

impl Composition {
    pub fn new() -> Composition {
        Composition {
            elements: SmallVec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The count for `symbol`, 0 if the element does not occur.
    pub fn get(&self, symbol: &str) -> u64 {
        self.elements
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.elements.iter().map(|(s, c)| (s.as_str(), *c))
    }

    fn add(&mut self, symbol: Symbol, count: u64) -> Result<(), InvalidFormulaError> {
        for (s, c) in &mut self.elements {
            if *s == symbol {
                *c = c
                    .checked_add(count)
                    .ok_or(InvalidFormulaError::CountOverflow)?;
                return Ok(());
            }
        }
        self.elements.push((symbol, count));
        Ok(())
    }
}

/// Parse a chemical formula into its element counts.
///
/// Handles multi-letter symbols (`Na`), multi-digit subscripts (`C6H12O6`)
/// and nested parenthesized groups with integer multipliers (`Al2(SO4)3`,
/// `Ca(Al(OH)4)2`). Bytes that are not ASCII letters, digits or parentheses
/// are skipped, so `"H2 O"` parses like `"H2O"`.
pub fn parse(formula: &str) -> Result<Composition, InvalidFormulaError> {
    let (_, composition) = parse_scope(formula.as_bytes(), false)?;
    Ok(composition)
}

/// Parse one parenthesized scope. Returns the accumulated counts together
/// with the number of bytes consumed up to, but not including, the closing
/// `)` (the full input length for the outermost scope).
fn parse_scope(input: &[u8], nested: bool) -> Result<(usize, Composition), InvalidFormulaError> {
    let mut elements = Composition::new();
    let mut name = Symbol::new();

    let mut i = 0;
    while i < input.len() {
        match input[i] {
            b'(' => {
                flush(&mut elements, &mut name, 1)?;

                let (consumed, group) = parse_scope(&input[i + 1..], true)?;
                i += consumed + 2;

                let (multiplier, digits) = read_number(&input[i..])?;
                i += digits;

                let multiplier = multiplier.unwrap_or(1);
                for (symbol, count) in group.elements {
                    let scaled = count
                        .checked_mul(multiplier)
                        .ok_or(InvalidFormulaError::CountOverflow)?;
                    elements.add(symbol, scaled)?;
                }
            }
            b')' => {
                if !nested {
                    return Err(InvalidFormulaError::UnmatchedParenthesis);
                }
                flush(&mut elements, &mut name, 1)?;
                return Ok((i, elements));
            }
            c @ b'A'..=b'Z' => {
                flush(&mut elements, &mut name, 1)?;
                name.push(c as char);
                i += 1;
            }
            c @ b'a'..=b'z' => {
                name.push(c as char);
                i += 1;
            }
            b'0'..=b'9' => {
                let (count, digits) = read_number(&input[i..])?;
                flush(&mut elements, &mut name, count.unwrap_or(1))?;
                i += digits;
            }
            _ => {
                // whitespace and stray symbols are skipped
                i += 1;
            }
        }
    }

    flush(&mut elements, &mut name, 1)?;
    if nested {
        return Err(InvalidFormulaError::UnterminatedGroup);
    }
    Ok((input.len(), elements))
}

/// Record the buffered symbol with the given count; a no-op when no symbol is
/// buffered.
fn flush(
    elements: &mut Composition,
    name: &mut Symbol,
    count: u64,
) -> Result<(), InvalidFormulaError> {
    if name.is_empty() {
        return Ok(());
    }
    let symbol = std::mem::take(name);
    elements.add(symbol, count)
}

/// Read a contiguous digit run. Returns `None` and zero length when the input
/// does not start with a digit.
fn read_number(input: &[u8]) -> Result<(Option<u64>, usize), InvalidFormulaError> {
    let mut value: u64 = 0;
    let mut len = 0;
    while len < input.len() && input[len].is_ascii_digit() {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((input[len] - b'0') as u64))
            .ok_or(InvalidFormulaError::CountOverflow)?;
        len += 1;
    }
    if len == 0 {
        Ok((None, 0))
    } else {
        Ok((Some(value), len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(formula: &str) -> Vec<(String, u64)> {
        parse(formula)
            .unwrap()
            .iter()
            .map(|(s, c)| (s.to_string(), c))
            .collect()
    }

    #[test]
    fn plain_formula() {
        assert_eq!(counts("H2O"), [("H".to_string(), 2), ("O".to_string(), 1)]);
    }

    #[test]
    fn multi_letter_symbols() {
        assert_eq!(
            counts("NaCl"),
            [("Na".to_string(), 1), ("Cl".to_string(), 1)]
        );
    }

    #[test]
    fn multi_digit_subscripts() {
        assert_eq!(
            counts("C6H12O6"),
            [
                ("C".to_string(), 6),
                ("H".to_string(), 12),
                ("O".to_string(), 6)
            ]
        );
    }

    #[test]
    fn group_multiplier_distributes() {
        assert_eq!(
            counts("Mg(OH)2"),
            [
                ("Mg".to_string(), 1),
                ("O".to_string(), 2),
                ("H".to_string(), 2)
            ]
        );
    }

    #[test]
    fn sibling_groups_merge() {
        assert_eq!(
            counts("Al2(SO4)3"),
            [
                ("Al".to_string(), 2),
                ("S".to_string(), 3),
                ("O".to_string(), 12)
            ]
        );
    }

    #[test]
    fn nested_groups_compose() {
        assert_eq!(
            counts("Ca(Al(OH)4)2"),
            [
                ("Ca".to_string(), 1),
                ("Al".to_string(), 2),
                ("O".to_string(), 8),
                ("H".to_string(), 8)
            ]
        );
    }

    #[test]
    fn group_without_multiplier() {
        assert_eq!(
            counts("(NH4)Cl"),
            [
                ("N".to_string(), 1),
                ("H".to_string(), 4),
                ("Cl".to_string(), 1)
            ]
        );
    }

    #[test]
    fn repeated_element_sums() {
        assert_eq!(
            counts("CH3COOH"),
            [("C".to_string(), 2), ("H".to_string(), 4), ("O".to_string(), 2)]
        );
    }

    #[test]
    fn stray_bytes_are_skipped() {
        assert_eq!(counts("H2 O"), counts("H2O"));
        assert_eq!(counts("H2*O"), counts("H2O"));
    }

    #[test]
    fn unmatched_close_fails() {
        assert_eq!(
            parse(")"),
            Err(InvalidFormulaError::UnmatchedParenthesis)
        );
        assert_eq!(
            parse("H2O)"),
            Err(InvalidFormulaError::UnmatchedParenthesis)
        );
    }

    #[test]
    fn unterminated_group_fails() {
        assert_eq!(parse("(H2O"), Err(InvalidFormulaError::UnterminatedGroup));
        assert_eq!(
            parse("Mg(OH"),
            Err(InvalidFormulaError::UnterminatedGroup)
        );
        assert_eq!(
            parse("Ca(Al(OH)4"),
            Err(InvalidFormulaError::UnterminatedGroup)
        );
    }

    #[test]
    fn count_overflow_fails() {
        assert_eq!(
            parse("H99999999999999999999"),
            Err(InvalidFormulaError::CountOverflow)
        );
    }

    #[test]
    fn empty_formula_is_empty() {
        assert!(parse("").unwrap().is_empty());
    }
}
