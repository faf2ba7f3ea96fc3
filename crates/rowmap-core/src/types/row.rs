use super::mapper::FromColumn;
use super::value::Value;
use crate::errors::TypeMappingError;

/// Positional reader over one fetched row
///
/// Generated `from_row` code reads fields in declared column order; the
/// reader enforces that the row has exactly that many columns.
#[derive(Debug)]
pub struct RowReader {
    values: std::vec::IntoIter<Value>,
    len: usize,
    position: usize,
}

impl RowReader {
    pub fn new(values: Vec<Value>) -> Self {
        let len = values.len();
        Self {
            values: values.into_iter(),
            len,
            position: 0,
        }
    }

    /// Read the next column as `T`
    ///
    /// # Errors
    ///
    /// `ColumnCount` when the row is exhausted, or the conversion error of `T`.
    pub fn read<T: FromColumn>(&mut self) -> Result<T, TypeMappingError> {
        let value = self.values.next().ok_or(TypeMappingError::ColumnCount {
            expected: self.position + 1,
            actual: self.len,
        })?;
        self.position += 1;
        T::from_column(value)
    }

    /// Number of columns not yet read
    pub fn remaining(&self) -> usize {
        self.len - self.position
    }

    /// Assert every column was consumed
    ///
    /// # Errors
    ///
    /// `ColumnCount` when columns remain unread.
    pub fn finish(self) -> Result<(), TypeMappingError> {
        if self.position == self.len {
            Ok(())
        } else {
            Err(TypeMappingError::ColumnCount {
                expected: self.position,
                actual: self.len,
            })
        }
    }
}
