//! Multi-document writes committed all-or-nothing.

use crate::value::Fields;

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set { path: String, fields: Fields },
    Update { path: String, fields: Fields },
    Delete { path: String },
}

impl WriteOp {
    pub fn path(&self) -> &str {
        match self {
            Self::Set { path, .. } | Self::Update { path, .. } | Self::Delete { path } => path,
        }
    }
}

/// Staged writes.  Nothing reaches the store until the batch is handed to
/// [`DocumentStore::commit`](crate::DocumentStore::commit).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: impl Into<String>, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Set {
            path: path.into(),
            fields,
        });
        self
    }

    pub fn update(&mut self, path: impl Into<String>, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Update {
            path: path.into(),
            fields,
        });
        self
    }

    pub fn delete(&mut self, path: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete { path: path.into() });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
