//! Search module.
//!
//! Contains filter sets, facet aggregation, and the draft/applied filter
//! state machine.

mod facets;
mod filter;
mod state;

pub use facets::{FacetAggregator, FacetReport, FacetResult, FacetType, FacetValue};
pub use filter::{Dimension, FilterSet, PriceBounds, PriceRange};
pub use state::{AppliedSnapshot, CommitPhase, FilterState, ResponseGate, Tagged};
