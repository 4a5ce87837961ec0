//! Variant module.
//!
//! Expands attribute selections into combinations and creates the missing
//! ones as variants.

mod combination;
mod generator;
mod model;
pub mod sku;

pub use combination::{
    preview_combinations, AttributeSelection, CombinationPart, Selections, VariantCombination,
};
pub use generator::{
    GenerationOutcome, GenerationRequest, SingleVariantRequest, SkipReason, SkippedCombination,
    VariantGenerator,
};
pub use model::{BasePricing, NewVariant, OptionKey, PricingOverride, Variant, VariantOption};
