//! Coercion of raw spreadsheet cells into the three shapes the records use.
//!
//! A hand-maintained sheet mixes typed values with numbers typed in as text,
//! so every coercion accepts every representation and only fails when the
//! value really can't be read as the target type.
use crate::Cell;
use std::fmt;
use std::num::{ParseFloatError, ParseIntError};

#[derive(Debug, Clone, PartialEq)]
pub enum CellError {
    /// Text that doesn't follow the target's numeric grammar.
    MalformedInteger(String, ParseIntError),
    MalformedDecimal(String, ParseFloatError),
    /// A representation no coercion knows about (an empty cell).
    Unsupported { target: &'static str },
    /// A number that doesn't fit a count (negative, or too large).
    OutOfRange(i64),
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellError::MalformedInteger(text, e) => {
                write!(f, "failed to parse {text:?} into an integer: {e}")
            }
            CellError::MalformedDecimal(text, e) => {
                write!(f, "failed to parse {text:?} into a decimal: {e}")
            }
            CellError::Unsupported { target } => {
                write!(f, "unsupported cell type for conversion to {target}")
            }
            CellError::OutOfRange(value) => write!(f, "{value} is not a valid count"),
        }
    }
}

impl std::error::Error for CellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CellError::MalformedInteger(_, e) => Some(e),
            CellError::MalformedDecimal(_, e) => Some(e),
            CellError::Unsupported { .. } | CellError::OutOfRange(_) => None,
        }
    }
}

/// Decimals truncate toward zero; booleans read as `0`.
pub fn to_int(cell: &Cell) -> Result<i64, CellError> {
    match cell {
        Cell::Text(text) => text
            .parse::<i64>()
            .map_err(|e| CellError::MalformedInteger(text.clone(), e)),
        Cell::Integer(i) => Ok(*i),
        Cell::Decimal(d) => Ok(d.trunc() as i64),
        Cell::Boolean(_) => Ok(0),
        Cell::Empty => Err(CellError::Unsupported { target: "integer" }),
    }
}

/// An integer that must also be a non-negative count.
pub fn to_count(cell: &Cell) -> Result<u32, CellError> {
    let value = to_int(cell)?;
    u32::try_from(value).map_err(|_| CellError::OutOfRange(value))
}

/// Booleans read as `0.0`.
pub fn to_float(cell: &Cell) -> Result<f64, CellError> {
    match cell {
        Cell::Text(text) => text
            .parse::<f64>()
            .map_err(|e| CellError::MalformedDecimal(text.clone(), e)),
        Cell::Integer(i) => Ok(*i as f64),
        Cell::Decimal(d) => Ok(*d),
        Cell::Boolean(_) => Ok(0.0),
        Cell::Empty => Err(CellError::Unsupported { target: "decimal" }),
    }
}

/// Numbers render as whole numbers (decimals truncated), booleans as `"true"`/`"false"`.
pub fn to_string(cell: &Cell) -> Result<String, CellError> {
    match cell {
        Cell::Text(text) => Ok(text.clone()),
        Cell::Integer(i) => Ok(i.to_string()),
        Cell::Decimal(d) => Ok((d.trunc() as i64).to_string()),
        Cell::Boolean(b) => Ok(b.to_string()),
        Cell::Empty => Err(CellError::Unsupported { target: "string" }),
    }
}
