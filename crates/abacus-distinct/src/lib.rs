//! Distributed distinct-product counting.
//!
//! Counts the distinct values in the N×N multiplication table (i*j for
//! 1 <= i, j <= N) across a fixed pool of workers, none of which ever holds
//! the full table. Deduplication is distributed: a pure owner function over
//! the value domain routes every occurrence of a value to the same worker,
//! so per-worker distinct counts are disjoint and their sum is the global
//! answer with no final merge.
//!
//! ## Architecture
//!
//! Each worker runs the same fixed phase sequence, meeting its peers at
//! every collective boundary:
//!
//! ```text
//! ┌───────────┐   ┌────────┐   ┌──────────────────┐   ┌───────┐   ┌────────┐
//! │ Partition │──►│ Route  │──►│ Exchange         │──►│ Dedup │──►│ Reduce │
//! │ rows      │   │ owners │   │ counts + payload │   │ local │   │ sum    │
//! └───────────┘   └────────┘   └──────────────────┘   └───────┘   └────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use abacus_distinct::{count_distinct, CountConfig};
//!
//! let report = count_distinct(&CountConfig::new(10, 4)).unwrap();
//! assert_eq!(report.distinct, 42);
//! ```

pub mod comm;
pub mod count;
pub mod dedup;
pub mod exchange;
pub mod partition;
pub mod router;
pub mod worker;

pub use comm::{Collective, LocalCollective, LocalGroup};
pub use count::{count_distinct, CountConfig, CountReport};
pub use dedup::ValueSet;
pub use exchange::{exchange, ExchangePlan};
pub use partition::{partition_rows, RowRange};
pub use router::{owner_of, route_products, OutgoingBuffers, Traversal};
pub use worker::run_worker;
