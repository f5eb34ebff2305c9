//! The parameter stack shared by every statement built on one `Query`

use super::common::IntoParams;
use crate::Value;

/// FIFO of values to bind at execution time.
///
/// Independent of the clause state: assembling SQL text never touches it,
/// only [`ParamStack::drain`] empties it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamStack {
    values: Vec<Value>,
}

impl ParamStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append values to the tail, keeping their order
    pub fn push<P: IntoParams>(&mut self, params: P) {
        self.values.extend(params.into_params());
    }

    /// Return everything pushed so far and leave the stack empty
    pub fn drain(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.values)
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
