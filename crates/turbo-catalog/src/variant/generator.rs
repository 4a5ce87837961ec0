//! Variant generation against a store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{info, instrument, warn};

use crate::config::VariantConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::ids::{ProductId, VariantId};
use crate::store::{AttributeSource, VariantStore};
use crate::variant::sku::{sku_key, sku_token};
use crate::variant::{
    preview_combinations, BasePricing, NewVariant, OptionKey, PricingOverride, Selections,
    Variant, VariantCombination,
};

/// Input to [`VariantGenerator::generate_variants`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub product_id: ProductId,
    /// Product SKU used as the root of generated SKUs.
    #[serde(default)]
    pub sku_root: Option<String>,
    pub selections: Selections,
    pub pricing: BasePricing,
    /// Per-combination pricing, keyed by `slug=value|slug=value`.
    #[serde(default)]
    pub overrides: HashMap<String, PricingOverride>,
}

impl GenerationRequest {
    pub fn new(product_id: ProductId, selections: Selections, pricing: BasePricing) -> Self {
        Self {
            product_id,
            sku_root: None,
            selections,
            pricing,
            overrides: HashMap::new(),
        }
    }

    pub fn with_sku_root(mut self, sku_root: impl Into<String>) -> Self {
        self.sku_root = Some(sku_root.into());
        self
    }

    pub fn with_override(mut self, key: impl Into<String>, pricing: PricingOverride) -> Self {
        self.overrides.insert(key.into(), pricing);
        self
    }
}

/// Why a combination was not created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The option tuple already exists.
    AlreadyExists { variant_id: VariantId },
    /// The generated SKU is taken by a variant with different options.
    SkuCollision {
        sku: String,
        existing_variant_id: VariantId,
    },
    /// The store refused the insert.
    Rejected { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCombination {
    pub combination: VariantCombination,
    pub reason: SkipReason,
}

/// Per-item result of a generation batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub created: Vec<Variant>,
    pub skipped: Vec<SkippedCombination>,
}

impl GenerationOutcome {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
    }
}

/// Input to [`VariantGenerator::create_single`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleVariantRequest {
    pub product_id: ProductId,
    /// Exactly one value per attribute.
    pub selections: Selections,
    pub pricing: BasePricing,
    #[serde(default)]
    pub sku_root: Option<String>,
    /// Explicit SKU; generated when absent.
    #[serde(default)]
    pub sku: Option<String>,
}

/// Creates variants from attribute selections.
///
/// Writes for one product are serialized; different products proceed in
/// parallel.
pub struct VariantGenerator<S: VariantStore, A: AttributeSource> {
    store: Arc<S>,
    attributes: Arc<A>,
    config: VariantConfig,
    locks: LockTable,
}

type LockTable = Mutex<HashMap<ProductId, Arc<AsyncMutex<()>>>>;

impl<S: VariantStore, A: AttributeSource> VariantGenerator<S, A> {
    pub fn new(store: Arc<S>, attributes: Arc<A>) -> Self {
        Self {
            store,
            attributes,
            config: VariantConfig::default(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_config(mut self, config: VariantConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &VariantConfig {
        &self.config
    }

    /// Combinations a request would produce, without touching the store.
    ///
    /// Without a usable SKU root the product id becomes the root, so two
    /// products never share generated SKUs.
    pub async fn preview(
        &self,
        product_id: &ProductId,
        selections: &Selections,
        sku_root: Option<&str>,
    ) -> CatalogResult<Vec<VariantCombination>> {
        let attributes = self.attributes.product_attributes(product_id).await?;
        let root = sku_root
            .filter(|root| !sku_token(root, 0).is_empty())
            .unwrap_or(product_id.as_str());
        preview_combinations(&attributes, selections, Some(root), &self.config)
    }

    /// Create every combination the product does not have yet.
    ///
    /// Validation failures abort before anything is written. Existing
    /// tuples, SKU collisions and store rejections are reported per item.
    #[instrument(skip_all, fields(product = %request.product_id))]
    pub async fn generate_variants(
        &self,
        request: &GenerationRequest,
    ) -> CatalogResult<GenerationOutcome> {
        let combinations = self
            .preview(
                &request.product_id,
                &request.selections,
                request.sku_root.as_deref(),
            )
            .await?;
        let overrides: HashMap<OptionKey, PricingOverride> = request
            .overrides
            .iter()
            .map(|(key, pricing)| (OptionKey::parse(key), *pricing))
            .collect();

        let outcome = {
            let _lease = self.lock_product(&request.product_id).await;
            self.create_missing(request, combinations, &overrides).await?
        };
        info!(
            created = outcome.created.len(),
            skipped = outcome.skipped.len(),
            "generated variants"
        );
        Ok(outcome)
    }

    /// Create one variant from a single value per attribute.
    #[instrument(skip_all, fields(product = %request.product_id))]
    pub async fn create_single(&self, request: &SingleVariantRequest) -> CatalogResult<Variant> {
        let mut combinations = self
            .preview(
                &request.product_id,
                &request.selections,
                request.sku_root.as_deref(),
            )
            .await?;
        if combinations.len() != 1 {
            return Err(CatalogError::TooManyCombinations {
                count: combinations.len(),
                limit: 1,
            });
        }
        let mut combination = combinations.remove(0);
        if let Some(sku) = request.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            combination.sku = sku.to_string();
        }

        let _lease = self.lock_product(&request.product_id).await;
        self.create_one(request, combination).await
    }

    async fn create_missing(
        &self,
        request: &GenerationRequest,
        combinations: Vec<VariantCombination>,
        overrides: &HashMap<OptionKey, PricingOverride>,
    ) -> CatalogResult<GenerationOutcome> {
        let existing = self.store.list_variants(&request.product_id).await?;
        let mut index = ExistingIndex::new(&existing);
        let mut outcome = GenerationOutcome::default();

        for combination in combinations {
            let key = combination.option_key();
            if let Some(reason) = index.conflict(&key, &combination.sku) {
                outcome.skipped.push(SkippedCombination {
                    combination,
                    reason,
                });
                continue;
            }

            let pricing = request.pricing.apply(overrides.get(&key));
            let new = index.new_variant(&request.product_id, &combination, pricing);
            match self.store.create_variant(new).await {
                Ok(variant) => {
                    index.record(&variant);
                    outcome.created.push(variant);
                }
                Err(err) => {
                    let reason = skip_reason(err);
                    warn!(sku = %combination.sku, ?reason, "variant not created");
                    outcome.skipped.push(SkippedCombination {
                        combination,
                        reason,
                    });
                }
            }
        }
        Ok(outcome)
    }

    async fn create_one(
        &self,
        request: &SingleVariantRequest,
        combination: VariantCombination,
    ) -> CatalogResult<Variant> {
        let existing = self.store.list_variants(&request.product_id).await?;
        let index = ExistingIndex::new(&existing);
        match index.conflict(&combination.option_key(), &combination.sku) {
            Some(SkipReason::AlreadyExists { variant_id }) => {
                Err(CatalogError::DuplicateCombination {
                    existing_variant_id: variant_id,
                })
            }
            Some(SkipReason::SkuCollision {
                sku,
                existing_variant_id,
            }) => Err(CatalogError::SkuCollision {
                sku,
                existing_variant_id,
            }),
            Some(SkipReason::Rejected { message }) => Err(CatalogError::Store(message)),
            None => {
                let new = index.new_variant(&request.product_id, &combination, request.pricing);
                self.store.create_variant(new).await
            }
        }
    }

    /// Serialize writes for one product until the lease is dropped.
    async fn lock_product(&self, product_id: &ProductId) -> ProductLease<'_> {
        // The lease exists before the await so a cancelled wait still cleans up.
        let mut lease = ProductLease {
            locks: &self.locks,
            product_id: product_id.clone(),
            guard: None,
        };
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(product_id.clone()).or_default().clone()
        };
        lease.guard = Some(lock.lock_owned().await);
        lease
    }
}

/// Holds a product's write lock and prunes its table entry on drop.
struct ProductLease<'a> {
    locks: &'a LockTable,
    product_id: ProductId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ProductLease<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the table's own reference left: nobody holds or waits on it.
        if locks
            .get(&self.product_id)
            .map(|lock| Arc::strong_count(lock) == 1)
            .unwrap_or(false)
        {
            locks.remove(&self.product_id);
        }
    }
}

/// Existing variants of a product, indexed for reconciliation.
struct ExistingIndex {
    by_options: HashMap<OptionKey, VariantId>,
    by_sku: HashMap<String, VariantId>,
    has_variants: bool,
    next_position: u32,
}

impl ExistingIndex {
    fn new(existing: &[Variant]) -> Self {
        let mut index = Self {
            by_options: HashMap::new(),
            by_sku: HashMap::new(),
            has_variants: false,
            next_position: 0,
        };
        for variant in existing {
            index.record(variant);
        }
        index
    }

    fn record(&mut self, variant: &Variant) {
        self.by_options
            .entry(variant.option_key())
            .or_insert_with(|| variant.id.clone());
        self.by_sku
            .entry(sku_key(&variant.sku))
            .or_insert_with(|| variant.id.clone());
        self.has_variants = true;
        self.next_position = self.next_position.max(variant.position + 1);
    }

    fn conflict(&self, key: &OptionKey, sku: &str) -> Option<SkipReason> {
        if let Some(id) = self.by_options.get(key) {
            return Some(SkipReason::AlreadyExists {
                variant_id: id.clone(),
            });
        }
        self.by_sku
            .get(&sku_key(sku))
            .map(|id| SkipReason::SkuCollision {
                sku: sku.to_string(),
                existing_variant_id: id.clone(),
            })
    }

    /// Insert payload; only the first variant of a product becomes default.
    fn new_variant(
        &self,
        product_id: &ProductId,
        combination: &VariantCombination,
        pricing: BasePricing,
    ) -> NewVariant {
        NewVariant {
            product_id: product_id.clone(),
            name: combination.name.clone(),
            sku: combination.sku.clone(),
            price: pricing.price,
            sale_price: pricing.sale_price,
            cost_price: pricing.cost_price,
            stock: pricing.stock,
            is_default: !self.has_variants,
            options: combination.options(),
            position: self.next_position,
        }
    }
}

fn skip_reason(err: CatalogError) -> SkipReason {
    match err {
        CatalogError::DuplicateCombination {
            existing_variant_id,
        } => SkipReason::AlreadyExists {
            variant_id: existing_variant_id,
        },
        CatalogError::SkuCollision {
            sku,
            existing_variant_id,
        } => SkipReason::SkuCollision {
            sku,
            existing_variant_id,
        },
        other => SkipReason::Rejected {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    use crate::attribute::{Attribute, AttributeSet};
    use crate::money::Money;
    use crate::store::MemoryStore;
    use crate::variant::VariantOption;

    fn setup() -> (Arc<MemoryStore>, ProductId) {
        let product = ProductId::new("tee");
        let attributes = AttributeSet::new(vec![
            Attribute::new("Color").with_values(["Red", "Blue"]),
            Attribute::new("Size").with_values(["S", "M"]),
        ])
        .unwrap();
        let store = MemoryStore::new().with_product(product.clone(), attributes);
        (Arc::new(store), product)
    }

    fn generator(store: &Arc<MemoryStore>) -> VariantGenerator<MemoryStore, MemoryStore> {
        VariantGenerator::new(store.clone(), store.clone())
    }

    fn request(product: &ProductId) -> GenerationRequest {
        GenerationRequest::new(
            product.clone(),
            Selections::new()
                .select("size", ["S", "M"])
                .select("color", ["Red"]),
            BasePricing::new(Money::cents(2000)).with_stock(4),
        )
        .with_sku_root("TEE")
    }

    #[tokio::test]
    async fn test_first_generation_creates_default() {
        let (store, product) = setup();
        let outcome = generator(&store).generate_variants(&request(&product)).await.unwrap();

        assert_eq!(outcome.created.len(), 2);
        assert!(outcome.skipped.is_empty());
        assert!(outcome.created[0].is_default);
        assert!(!outcome.created[1].is_default);
        assert_eq!(outcome.created[0].sku, "TEE-S-RED");
        assert_eq!(outcome.created[1].position, 1);
        assert_eq!(outcome.created[1].stock, 4);
    }

    #[tokio::test]
    async fn test_overrides_apply_by_combination_key() {
        let (store, product) = setup();
        let request = request(&product).with_override(
            "size=M|color=Red",
            PricingOverride {
                price: Some(Money::cents(2500)),
                ..Default::default()
            },
        );
        let outcome = generator(&store).generate_variants(&request).await.unwrap();
        assert_eq!(outcome.created[0].price, Money::cents(2000));
        assert_eq!(outcome.created[1].price, Money::cents(2500));
    }

    #[tokio::test]
    async fn test_sku_collision_is_per_item() {
        let (store, product) = setup();
        let manual = NewVariant {
            product_id: product.clone(),
            name: "Manual".into(),
            sku: "TEE-M-RED".into(),
            price: Money::cents(1000),
            sale_price: None,
            cost_price: None,
            stock: 0,
            is_default: true,
            options: vec![VariantOption::new("size", "XL")],
            position: 0,
        };
        let manual = store.create_variant(manual).await.unwrap();

        let outcome = generator(&store).generate_variants(&request(&product)).await.unwrap();
        assert_eq!(outcome.created.len(), 1);
        assert!(!outcome.created[0].is_default);
        assert_eq!(
            outcome.skipped[0].reason,
            SkipReason::SkuCollision {
                sku: "TEE-M-RED".into(),
                existing_variant_id: manual.id
            }
        );
    }

    #[tokio::test]
    async fn test_create_single_rejects_existing_tuple() {
        let (store, product) = setup();
        let generator = generator(&store);
        generator.generate_variants(&request(&product)).await.unwrap();

        let single = SingleVariantRequest {
            product_id: product.clone(),
            selections: Selections::new().select("color", ["red"]).select("size", ["s"]),
            pricing: BasePricing::new(Money::cents(100)),
            sku_root: None,
            sku: Some("CUSTOM".into()),
        };
        assert!(matches!(
            generator.create_single(&single).await.unwrap_err(),
            CatalogError::DuplicateCombination { .. }
        ));

        let fresh = SingleVariantRequest {
            selections: Selections::new().select("color", ["Blue"]).select("size", ["S"]),
            ..single
        };
        let variant = generator.create_single(&fresh).await.unwrap();
        assert_eq!(variant.sku, "CUSTOM");
        assert!(!variant.is_default);
        assert_eq!(variant.position, 2);
    }

    #[tokio::test]
    async fn test_create_single_needs_one_value_per_attribute() {
        let (store, product) = setup();
        let single = SingleVariantRequest {
            product_id: product,
            selections: Selections::new().select("size", ["S", "M"]),
            pricing: BasePricing::new(Money::cents(100)),
            sku_root: None,
            sku: None,
        };
        assert!(matches!(
            generator(&store).create_single(&single).await.unwrap_err(),
            CatalogError::TooManyCombinations { count: 2, limit: 1 }
        ));
    }

    #[tokio::test]
    async fn test_products_without_root_get_distinct_skus() {
        let sizes = || AttributeSet::new(vec![Attribute::new("Size").with_values(["S"])]).unwrap();
        let (tee, hoodie) = (ProductId::new("tee"), ProductId::new("hoodie"));
        let store = Arc::new(
            MemoryStore::new()
                .with_product(tee.clone(), sizes())
                .with_product(hoodie.clone(), sizes()),
        );
        let generator = generator(&store);
        let selections = Selections::new().select("size", ["S"]);

        let created = generator
            .generate_variants(&GenerationRequest::new(
                tee,
                selections.clone(),
                BasePricing::new(Money::cents(100)),
            ))
            .await
            .unwrap();
        assert_eq!(created.created[0].sku, "TEE-S");

        let preview = generator.preview(&hoodie, &selections, Some("  ")).await.unwrap();
        assert_eq!(preview[0].sku, "HOODIE-S");
    }

    #[tokio::test]
    async fn test_cancelled_generation_releases_lock_entry() {
        let (store, product) = setup();
        let generator = generator(&store);

        let held = generator.lock_product(&product).await;
        assert!(generator
            .generate_variants(&request(&product))
            .now_or_never()
            .is_none());
        assert_eq!(generator.locks.lock().unwrap().len(), 1);

        drop(held);
        assert!(generator.locks.lock().unwrap().is_empty());

        let outcome = generator.generate_variants(&request(&product)).await.unwrap();
        assert_eq!(outcome.created.len(), 2);
        assert!(generator.locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let (store, _) = setup();
        let request = request(&ProductId::new("missing"));
        assert!(matches!(
            generator(&store).generate_variants(&request).await.unwrap_err(),
            CatalogError::ProductNotFound(_)
        ));
    }
}
