//! Dense cell storage in the precision of the tensor's value type
//!
//! [`CellValues`] holds a flat array of either `f64` or `f32`. All reads and
//! writes go through `f64`; writes to `f32` storage round to nearest.

use std::fmt;
use std::slice;

use mixten_core::ValueType;
use scirs2_core::numeric::Float;

/// A primitive cell value type
pub trait CellValue: Float + fmt::Debug + Send + Sync + 'static {
    /// The tensor value type stored with this primitive
    const VALUE_TYPE: ValueType;

    fn from_double(value: f64) -> Self;

    fn to_double(self) -> f64;
}

impl CellValue for f64 {
    const VALUE_TYPE: ValueType = ValueType::Double;

    #[inline]
    fn from_double(value: f64) -> Self {
        value
    }

    #[inline]
    fn to_double(self) -> f64 {
        self
    }
}

impl CellValue for f32 {
    const VALUE_TYPE: ValueType = ValueType::Float;

    #[inline]
    fn from_double(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn to_double(self) -> f64 {
        f64::from(self)
    }
}

/// `value` rounded to the precision of `value_type`
#[inline]
pub fn round_to(value_type: ValueType, value: f64) -> f64 {
    match value_type {
        ValueType::Double => value,
        ValueType::Float => f32::from_double(value).to_double(),
    }
}

/// Flat dense storage
#[derive(Debug, Clone, PartialEq)]
pub enum CellValues {
    Double(Vec<f64>),
    Float(Vec<f32>),
}

impl CellValues {
    /// `len` zeros of `value_type`
    pub fn zeros(value_type: ValueType, len: usize) -> Self {
        match value_type {
            ValueType::Double => CellValues::Double(zeros(len)),
            ValueType::Float => CellValues::Float(zeros(len)),
        }
    }

    /// Store `values` in the precision of `value_type`
    pub fn from_doubles(value_type: ValueType, values: Vec<f64>) -> Self {
        match value_type {
            ValueType::Double => CellValues::Double(values),
            ValueType::Float => CellValues::Float(convert(&values)),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            CellValues::Double(_) => f64::VALUE_TYPE,
            CellValues::Float(_) => f32::VALUE_TYPE,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CellValues::Double(v) => v.len(),
            CellValues::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        match self {
            CellValues::Double(v) => v.get(index).copied(),
            CellValues::Float(v) => v.get(index).map(|x| x.to_double()),
        }
    }

    /// Overwrite the value at `index`; `false` if it is out of range
    #[inline]
    pub(crate) fn set(&mut self, index: usize, value: f64) -> bool {
        match self {
            CellValues::Double(v) => store(v, index, value),
            CellValues::Float(v) => store(v, index, value),
        }
    }

    /// Values in storage order
    pub fn iter(&self) -> Values<'_> {
        match self {
            CellValues::Double(v) => Values::Double(v.iter()),
            CellValues::Float(v) => Values::Float(v.iter()),
        }
    }

    /// These values converted to `value_type`
    pub fn cast(&self, value_type: ValueType) -> CellValues {
        match (self, value_type) {
            (CellValues::Double(v), ValueType::Float) => CellValues::Float(convert(v)),
            (CellValues::Float(v), ValueType::Double) => CellValues::Double(convert(v)),
            _ => self.clone(),
        }
    }

    pub fn to_doubles(&self) -> Vec<f64> {
        self.iter().collect()
    }
}

fn zeros<T: CellValue>(len: usize) -> Vec<T> {
    vec![T::zero(); len]
}

fn convert<S: CellValue, T: CellValue>(values: &[S]) -> Vec<T> {
    values.iter().map(|&v| T::from_double(v.to_double())).collect()
}

#[inline]
fn store<T: CellValue>(values: &mut [T], index: usize, value: f64) -> bool {
    match values.get_mut(index) {
        Some(slot) => {
            *slot = T::from_double(value);
            true
        }
        None => false,
    }
}

/// Iterator over [`CellValues`] as `f64`
#[derive(Debug, Clone)]
pub enum Values<'a> {
    Double(slice::Iter<'a, f64>),
    Float(slice::Iter<'a, f32>),
}

impl Iterator for Values<'_> {
    type Item = f64;

    #[inline]
    fn next(&mut self) -> Option<f64> {
        match self {
            Values::Double(it) => it.next().copied(),
            Values::Float(it) => it.next().map(|x| x.to_double()),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Values::Double(it) => it.size_hint(),
            Values::Float(it) => it.size_hint(),
        }
    }
}

impl ExactSizeIterator for Values<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_storage_rounds() {
        let mut values = CellValues::zeros(ValueType::Float, 2);
        assert!(values.set(1, 0.1));
        assert_eq!(values.get(1), Some(f64::from(0.1f32)));
        assert_eq!(values.get(1), Some(round_to(ValueType::Float, 0.1)));
        assert!(!values.set(2, 1.0));
        assert_eq!(values.get(2), None);
    }

    #[test]
    fn test_cast() {
        let doubles = CellValues::from_doubles(ValueType::Double, vec![1.5, 2.0]);
        let floats = doubles.cast(ValueType::Float);
        assert_eq!(floats.value_type(), ValueType::Float);
        assert_eq!(floats.to_doubles(), vec![1.5, 2.0]);
        assert_eq!(floats.iter().len(), 2);
    }
}
