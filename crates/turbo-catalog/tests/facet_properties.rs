//! Facet aggregation properties over randomly generated catalogs.

use std::sync::Arc;

use futures::executor::block_on;
use proptest::prelude::*;
use turbo_catalog::prelude::*;

const SIZES: [&str; 3] = ["S", "M", "L"];
const COLORS: [&str; 2] = ["Red", "Blue"];
const BRANDS: [&str; 2] = ["Acme", "Zed"];

#[derive(Debug, Clone)]
struct ItemSpec {
    size: usize,
    color: usize,
    brand: usize,
    price: i64,
    discount: Option<i64>,
    stock: i64,
}

fn item_spec() -> impl Strategy<Value = ItemSpec> {
    (0..3usize, 0..2usize, 0..2usize, 100..5000i64, prop::option::of(1..99i64), 0..3i64).prop_map(
        |(size, color, brand, price, discount, stock)| ItemSpec {
            size,
            color,
            brand,
            price,
            discount,
            stock,
        },
    )
}

/// Filters with color and in-stock left unconstrained, so tests can narrow them.
fn open_filters() -> impl Strategy<Value = FilterSet> {
    (
        prop::collection::btree_set(0..3usize, 0..=2),
        prop::collection::btree_set(0..2usize, 0..=1),
        any::<bool>(),
        prop::option::of((100..5000i64, 100..5000i64)),
    )
        .prop_map(|(sizes, brands, on_sale, price)| {
            let mut filters = FilterSet::new();
            for s in sizes {
                filters = filters.with_size(SIZES[s]);
            }
            for b in brands {
                filters = filters.with_brand(BRANDS[b]);
            }
            filters.on_sale = on_sale;
            filters.price_range = price.map(|(a, b)| PriceRange::new(a.min(b), a.max(b)).unwrap());
            filters
        })
}

fn build_store(specs: &[ItemSpec]) -> Arc<MemoryStore> {
    let category = Category::new_root("Shirts");
    let attributes = AttributeSet::new(vec![
        Attribute::new("Size").with_values(SIZES),
        Attribute::new("Color").with_values(COLORS),
    ])
    .unwrap();
    let items: Vec<CatalogItem> = specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let mut item = CatalogItem::new(format!("item-{i}"), Money::cents(spec.price))
                .in_category(category.id.clone())
                .with_brand(BRANDS[spec.brand])
                .with_attribute("size", [SIZES[spec.size]])
                .with_attribute("color", [COLORS[spec.color]])
                .with_stock(spec.stock);
            if let Some(pct) = spec.discount {
                item = item.with_sale_price(Money::cents(spec.price * pct / 100));
            }
            item
        })
        .collect();
    Arc::new(
        MemoryStore::new()
            .with_category(category, attributes)
            .with_items(items),
    )
}

fn facets(store: &Arc<MemoryStore>, filters: &FilterSet) -> FacetReport {
    block_on(FacetAggregator::new(store.clone()).compute_facets("shirts", filters)).unwrap()
}

fn assert_not_wider(narrow: &FacetReport, wide: &FacetReport) {
    assert!(narrow.total_matching <= wide.total_matching);
    for facet in &narrow.facets {
        let Some(wide_facet) = wide.facet(&facet.dimension) else {
            continue;
        };
        assert!(facet.total_matching <= wide_facet.total_matching);
        for value in &facet.values {
            assert!(
                value.count <= wide_facet.count_of(&value.name),
                "{} {} grew from {} to {}",
                facet.dimension,
                value.name,
                wide_facet.count_of(&value.name),
                value.count
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    })]

    /// Every count equals a brute-force count over the self-excluded filter.
    #[test]
    fn counts_match_brute_force(specs in prop::collection::vec(item_spec(), 0..24), filters in open_filters()) {
        let store = build_store(&specs);
        let report = facets(&store, &filters);
        let scope = block_on(store.resolve_scope("shirts")).unwrap().unwrap();
        let all = block_on(store.find_items(&scope, &FilterSet::new())).unwrap();
        let bounds = PriceBounds::from_items(&all);
        let applied = filters.clone().normalize_price(bounds);

        let expected_total = all.iter().filter(|i| applied.matches(&scope, i)).count();
        prop_assert_eq!(report.total_matching, expected_total);

        for (dimension, slug, names) in [
            (Dimension::Size, "size", &SIZES[..]),
            (Dimension::Color, "color", &COLORS[..]),
        ] {
            let reduced = applied.without(&dimension);
            let facet = report.facet(&dimension).unwrap();
            for name in names {
                let expected = all
                    .iter()
                    .filter(|i| reduced.matches(&scope, i) && i.has_value(slug, name))
                    .count();
                prop_assert_eq!(facet.count_of(name), expected);
            }
        }
    }

    /// Selecting a value never removes it from its own facet.
    #[test]
    fn selected_values_stay_visible(specs in prop::collection::vec(item_spec(), 0..24), filters in open_filters()) {
        let store = build_store(&specs);
        let report = facets(&store, &filters);
        let lifted = facets(&store, &filters.without(&Dimension::Size));
        let size = report.facet(&Dimension::Size).unwrap();

        for selected in &filters.sizes {
            let carried = lifted.facet(&Dimension::Size).unwrap().count_of(selected);
            if carried == 0 {
                continue;
            }
            let value = size.value(selected);
            prop_assert!(value.is_some(), "{} disappeared", selected);
            let value = value.unwrap();
            prop_assert!(value.selected);
            prop_assert_eq!(value.count, carried);
        }
    }

    /// Constraining an open dimension never widens any count.
    #[test]
    fn narrowing_is_monotonic(
        specs in prop::collection::vec(item_spec(), 0..24),
        filters in open_filters(),
        color in 0..2usize,
    ) {
        let store = build_store(&specs);
        let wide = facets(&store, &filters);

        let by_color = facets(&store, &filters.clone().with_color(COLORS[color]));
        assert_not_wider(&by_color, &wide);

        let by_stock = facets(&store, &filters.clone().in_stock_only());
        assert_not_wider(&by_stock, &wide);
    }
}

#[test]
fn test_size_color_scenario() {
    let specs: Vec<ItemSpec> = [(0, 0), (0, 1), (1, 0), (2, 1)]
        .into_iter()
        .map(|(size, color)| ItemSpec {
            size,
            color,
            brand: 0,
            price: 1000,
            discount: None,
            stock: 1,
        })
        .collect();
    let store = build_store(&specs);

    let report = facets(&store, &FilterSet::new());
    let size = report.facet(&Dimension::Size).unwrap();
    assert_eq!(
        (size.count_of("S"), size.count_of("M"), size.count_of("L")),
        (2, 1, 1)
    );
    let color = report.facet(&Dimension::Color).unwrap();
    assert_eq!((color.count_of("Red"), color.count_of("Blue")), (2, 2));

    // Color is counted over the size-filtered items; size ignores its own filter.
    let report = facets(&store, &FilterSet::new().with_size("S"));
    let color = report.facet(&Dimension::Color).unwrap();
    assert_eq!((color.count_of("Red"), color.count_of("Blue")), (1, 1));
    let size = report.facet(&Dimension::Size).unwrap();
    assert_eq!(
        (size.count_of("S"), size.count_of("M"), size.count_of("L")),
        (2, 1, 1)
    );
    assert!(size.value("S").unwrap().selected);
    assert_eq!(report.total_matching, 2);
}

#[test]
fn test_unknown_attribute_filter_is_ignored() {
    let store = build_store(&[ItemSpec {
        size: 0,
        color: 0,
        brand: 0,
        price: 1000,
        discount: None,
        stock: 1,
    }]);
    let report = facets(&store, &FilterSet::new().with_attribute("fit", "Slim"));
    assert_eq!(report.total_matching, 1);
    assert_eq!(
        report.warnings,
        vec![FacetWarning::UnknownDimension { slug: "fit".into() }]
    );
}
