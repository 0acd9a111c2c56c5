//! Tree Data Library
//!
//! Search, traversal and id repair over the hierarchical datasets that back
//! tree views, grids and other nested UI widgets.
//!
//! # Core Concepts
//!
//! - **Dataset**: a forest of root nodes plus optional column metadata
//! - **Node**: an id, a display value, optional children and optional cells
//! - **ForestTraversal**: lookups, filtering, visibility-aware walks and removal
//!
//! # Example
//!
//! ```
//! use std::collections::HashSet;
//! use tree_data::tree::prelude::*;
//!
//! let mut dataset = Dataset::from_json(r#"{
//!     "nodes": [
//!         { "id": "docs", "value": "Docs", "children": [
//!             { "id": "intro", "value": "Intro" },
//!             { "id": "intro", "value": "Setup" }
//!         ]}
//!     ]
//! }"#).expect("valid dataset");
//!
//! // Repair the duplicate id
//! let remap = sanitize_ids(&mut dataset, Vec::<String>::new(), &SanitizeOptions::default());
//! assert_eq!(remap.get("intro"), Some("setup-1"));
//!
//! // Walk only the expanded branches
//! let expanded: HashSet<&str> = HashSet::new();
//! let visible = dataset.traverse_visible(|node| expanded.contains(node.id.as_str()));
//! assert_eq!(visible.len(), 1);
//! ```

pub mod tree;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::tree::prelude::*;
}
