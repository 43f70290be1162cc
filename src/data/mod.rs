/// Data layer: parsing, filtering, aggregation and export.
///
/// Architecture:
/// ```text
///   uploaded .csv bytes
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  sha-256 of content → Arc<LoadedDataset>
///   └──────────┘
///        │ miss
///        ▼
///   ┌──────────┐
///   │  loader   │  parse CSV → Dataset + skipped-row warnings
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  InclusionState → FilteredView (row indices)
///   └──────────┘
///      │     │
///      ▼     ▼
///  summary  export
/// ```

pub mod cache;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;
