//! Dense tensor implementation and operations
//!
//! The type lives in [`types`]; operations are split into sub-modules by
//! functionality.

// Core type definition
pub mod types;

// Operation modules (organized by functionality)
mod combining;
pub mod convolution;
mod elementwise;
mod indexing;
pub mod padding;

// Supporting modules
pub mod densend_traits;

// Re-export the main type
pub use types::DenseND;

pub use padding::PaddingMode;
