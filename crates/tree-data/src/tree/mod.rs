//! Core forest abstraction for hierarchical UI data
//!
//! This module provides the node model, the `Forest` traits with their
//! search and traversal operations, id sanitization, target resolution and
//! cell metadata extraction.

mod cell;
mod error;
mod ids;
mod node;
mod target;
mod traits;

pub use cell::{cell_exists, extract_cell_metadata, CellMetadata, CellSchema, ValueKind};
pub use error::{Result, TreeError, ValidationFailure};
pub use ids::{fix_ids, sanitize_ids, IdChange, IdFix, IdRemap, IdStrategy, SanitizeOptions};
pub use node::{Cell, CellShape, ColumnDescriptor, Dataset, Node, NodeKind};
pub use target::Target;
pub use traits::{Detached, Forest, ForestTraversal, TraversalOrder, TreeWalker};

/// Re-export common types for convenience
pub mod prelude {
    pub use super::{
        cell_exists, extract_cell_metadata, fix_ids, sanitize_ids, Cell, CellMetadata, CellSchema,
        CellShape, Dataset, Forest, ForestTraversal, IdRemap, Node, NodeKind, SanitizeOptions,
        Target, TraversalOrder, TreeError,
    };
}
