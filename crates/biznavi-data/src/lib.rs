//! # biznavi-data
//!
//! Reference implementations of the data-side seams of the assistant:
//!
//! - [`CsvDatasetProvider`]: the sales report, with upload precedence and
//!   cache invalidation
//! - [`PersistedKnowledgeIndex`] and [`StoredIndex`]: build, persist and
//!   search the policy knowledge index
//! - [`TrendSeasonalModel`]: the demand forecast model
//!
//! Each type implements the matching trait from `biznavi_core::traits`, so
//! the tools never depend on this crate directly.

pub mod forecast;
pub mod knowledge;
pub mod provider;

pub use forecast::TrendSeasonalModel;
pub use knowledge::{
    chunk_text, HashingEmbedder, PersistedKnowledgeIndex, StoredIndex, DEFAULT_CHUNK_OVERLAP,
    DEFAULT_CHUNK_SIZE,
};
pub use provider::{read_sales_csv, CsvDatasetProvider};
