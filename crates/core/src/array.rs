//! Array: a shared, flagged sequence of cells
//!
//! Blocks, groups, paths, function bodies, and context var-lists are all
//! views into an `Array`. Arrays are shared via `Rc` with interior
//! mutability; the flags gate what mutation is allowed while the array may
//! be executing on the frame stack.
//!
//! Reads past the tail return `None` rather than failing: an array that
//! was truncated behind an in-flight index must read as end-of-stream, not
//! crash the evaluator.

use crate::error::{Error, ErrorKind};
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Growth is forbidden (the backing storage may not move).
pub const FIXED_SIZE: u8 = 1 << 0;
/// All mutation is forbidden. Set by reification and by hosts that hand
/// the evaluator an array they keep reading.
pub const LOCKED: u8 = 1 << 1;
/// Unset cells are legal content (function frames, reduce output).
pub const VOIDS_LEGAL: u8 = 1 << 2;
/// This array is a context's variable list.
pub const VARLIST: u8 = 1 << 3;

#[derive(Debug, Default)]
pub struct Array {
    cells: RefCell<Vec<Value>>,
    flags: Cell<u8>,
}

impl Array {
    pub fn new(cells: Vec<Value>) -> Array {
        Array {
            cells: RefCell::new(cells),
            flags: Cell::new(0),
        }
    }

    /// Fresh shared array.
    pub fn rc(cells: Vec<Value>) -> Rc<Array> {
        Rc::new(Array::new(cells))
    }

    pub fn len(&self) -> usize {
        self.cells.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags.get() & flag != 0
    }

    pub fn set_flag(&self, flag: u8) {
        self.flags.set(self.flags.get() | flag);
    }

    /// Mark read-only.
    pub fn lock(&self) {
        self.set_flag(LOCKED);
    }

    /// Cell at `index`, or None at-or-past the tail.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.cells.borrow().get(index).cloned()
    }

    /// Overwrite a cell in place.
    pub fn set(&self, index: usize, value: Value) -> Result<(), Error> {
        if self.has_flag(LOCKED) {
            return Err(ErrorKind::Locked.into());
        }
        let mut cells = self.cells.borrow_mut();
        match cells.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::misc("write past tail of series")),
        }
    }

    /// Binding maintenance write: rebinding a word does not change what the
    /// array says, so it bypasses the lock flag. Out-of-range writes are
    /// silently dropped (the array may have been truncated meanwhile).
    pub fn update_binding(&self, index: usize, value: Value) {
        let mut cells = self.cells.borrow_mut();
        if let Some(slot) = cells.get_mut(index) {
            *slot = value;
        }
    }

    pub fn push(&self, value: Value) -> Result<(), Error> {
        if self.has_flag(LOCKED) || self.has_flag(FIXED_SIZE) {
            return Err(ErrorKind::Locked.into());
        }
        self.cells.borrow_mut().push(value);
        Ok(())
    }

    /// Insert `values` starting at `index`, shifting the tail.
    pub fn insert(&self, index: usize, values: Vec<Value>) -> Result<(), Error> {
        if self.has_flag(LOCKED) || self.has_flag(FIXED_SIZE) {
            return Err(ErrorKind::Locked.into());
        }
        let mut cells = self.cells.borrow_mut();
        let at = index.min(cells.len());
        for (n, v) in values.into_iter().enumerate() {
            cells.insert(at + n, v);
        }
        Ok(())
    }

    /// Shorten to `len` cells. Used by hosts (and tests) to mutate an array
    /// out from under a running evaluator; the evaluator treats the new
    /// tail as end-of-stream.
    pub fn truncate(&self, len: usize) {
        self.cells.borrow_mut().truncate(len);
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.cells.borrow().clone()
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        *self.cells.borrow() == *other.cells.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_past_tail_is_none() {
        let a = Array::rc(vec![Value::Integer(1)]);
        assert_eq!(a.get(0), Some(Value::Integer(1)));
        assert_eq!(a.get(1), None);
        assert_eq!(a.get(99), None);
    }

    #[test]
    fn test_locked_refuses_mutation() {
        let a = Array::rc(vec![Value::Integer(1)]);
        a.lock();
        assert!(matches!(
            a.set(0, Value::Integer(2)),
            Err(Error { kind: ErrorKind::Locked, .. })
        ));
        assert!(a.push(Value::Integer(3)).is_err());
        // Reads still fine.
        assert_eq!(a.get(0), Some(Value::Integer(1)));
    }

    #[test]
    fn test_fixed_size_refuses_growth_only() {
        let a = Array::rc(vec![Value::Integer(1)]);
        a.set_flag(FIXED_SIZE);
        assert!(a.push(Value::Integer(2)).is_err());
        assert!(a.set(0, Value::Integer(5)).is_ok());
        assert_eq!(a.get(0), Some(Value::Integer(5)));
    }

    #[test]
    fn test_truncate_then_read() {
        let a = Array::rc(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        a.truncate(1);
        assert_eq!(a.len(), 1);
        assert_eq!(a.get(1), None);
    }

    #[test]
    fn test_insert_shifts_tail() {
        let a = Array::rc(vec![Value::Integer(1), Value::Integer(4)]);
        a.insert(1, vec![Value::Integer(2), Value::Integer(3)]).unwrap();
        assert_eq!(
            a.to_vec(),
            vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
                Value::Integer(4)
            ]
        );
    }
}
