//! Variant generation against the in-memory store.

use std::sync::Arc;

use turbo_catalog::prelude::*;

fn store_with_product(product: &ProductId) -> Arc<MemoryStore> {
    let attributes = AttributeSet::new(vec![
        Attribute::new("Color").with_values(["Red", "Blue"]),
        Attribute::new("Size").with_values(["S", "M", "L"]),
    ])
    .unwrap();
    Arc::new(MemoryStore::new().with_product(product.clone(), attributes))
}

fn request(product: &ProductId, sizes: &[&str], colors: &[&str]) -> GenerationRequest {
    GenerationRequest::new(
        product.clone(),
        Selections::new()
            .select("size", sizes.iter().copied())
            .select("color", colors.iter().copied()),
        BasePricing::new(Money::cents(1999)).with_stock(10),
    )
    .with_sku_root("tee")
}

#[tokio::test]
async fn test_second_run_is_a_noop() {
    let product = ProductId::new("tee");
    let store = store_with_product(&product);
    let generator = VariantGenerator::new(store.clone(), store.clone());
    let req = request(&product, &["S", "M"], &["Red", "Blue"]);

    let first = generator.generate_variants(&req).await.unwrap();
    assert_eq!(first.created.len(), 4);
    let names: Vec<&str> = first.created.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["S / Red", "S / Blue", "M / Red", "M / Blue"]);

    let second = generator.generate_variants(&req).await.unwrap();
    assert!(second.is_noop());
    assert_eq!(second.skipped.len(), 4);
    assert!(second
        .skipped
        .iter()
        .all(|s| matches!(s.reason, SkipReason::AlreadyExists { .. })));
    assert_eq!(store.list_variants(&product).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_existing_default_is_preserved() {
    let product = ProductId::new("tee");
    let store = store_with_product(&product);
    let generator = VariantGenerator::new(store.clone(), store.clone());

    generator
        .generate_variants(&request(&product, &["S"], &["Red"]))
        .await
        .unwrap();
    let more = generator
        .generate_variants(&request(&product, &["S", "M", "L"], &["Red"]))
        .await
        .unwrap();
    assert_eq!(more.created.len(), 2);
    assert!(more.created.iter().all(|v| !v.is_default));

    let defaults: Vec<String> = store
        .list_variants(&product)
        .await
        .unwrap()
        .into_iter()
        .filter(|v| v.is_default)
        .map(|v| v.name)
        .collect();
    assert_eq!(defaults, vec!["S / Red".to_string()]);
}

#[tokio::test]
async fn test_empty_factor_creates_nothing() {
    let product = ProductId::new("tee");
    let store = store_with_product(&product);
    let generator = VariantGenerator::new(store.clone(), store.clone());

    let err = generator
        .generate_variants(&request(&product, &[], &["Red"]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CatalogError::EmptySelection {
            attribute: "size".into()
        }
    );
    assert!(err.is_validation());
    assert!(store.list_variants(&product).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_create_each_tuple_once() {
    let product = ProductId::new("tee");
    let store = store_with_product(&product);
    let generator = Arc::new(VariantGenerator::new(store.clone(), store.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let generator = generator.clone();
            let req = request(&product, &["S", "M", "L"], &["Red", "Blue"]);
            tokio::spawn(async move { generator.generate_variants(&req).await })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        created += handle.await.unwrap().unwrap().created.len();
    }
    assert_eq!(created, 6);

    let variants = store.list_variants(&product).await.unwrap();
    assert_eq!(variants.len(), 6);
    assert_eq!(variants.iter().filter(|v| v.is_default).count(), 1);
}

#[tokio::test]
async fn test_preview_does_not_write() {
    let product = ProductId::new("tee");
    let store = store_with_product(&product);
    let generator = VariantGenerator::new(store.clone(), store.clone());

    let selections = Selections::new().select("size", ["S", "M"]).select("color", ["Red"]);
    let preview = generator.preview(&product, &selections, Some("tee")).await.unwrap();
    let skus: Vec<&str> = preview.iter().map(|c| c.sku.as_str()).collect();
    assert_eq!(skus, vec!["TEE-S-RED", "TEE-M-RED"]);
    assert!(store.list_variants(&product).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_multi_word_values_all_generate() {
    let product = ProductId::new("tee");
    let attributes = AttributeSet::new(vec![
        Attribute::new("Color").with_values(["Navy", "Navy Blue"]),
        Attribute::new("Material").with_values(["Blue Cotton", "Cotton"]),
    ])
    .unwrap();
    let store = Arc::new(MemoryStore::new().with_product(product.clone(), attributes));
    let generator = VariantGenerator::new(store.clone(), store.clone());

    let req = GenerationRequest::new(
        product.clone(),
        Selections::new()
            .select("color", ["Navy", "Navy Blue"])
            .select("material", ["Blue Cotton", "Cotton"]),
        BasePricing::new(Money::cents(2500)),
    )
    .with_sku_root("tee");
    let outcome = generator.generate_variants(&req).await.unwrap();

    assert_eq!(outcome.created.len(), 4);
    assert!(outcome.skipped.is_empty());
    let skus: Vec<&str> = outcome.created.iter().map(|v| v.sku.as_str()).collect();
    assert!(skus.contains(&"TEE-NAVY-BLUECOTTON"));
    assert!(skus.contains(&"TEE-NAVYBLUE-COTTON"));
}
