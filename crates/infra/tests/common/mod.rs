// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a subset of the scenarios.

//! Repository behaviour shared by every `ProductRepository` implementation.
//!
//! Each scenario expects an empty store and leaves its rows behind.

use rust_decimal::Decimal;
use serde_json::json;

use catalog_core::DomainError;
use catalog_infra::{ProductRepository, RepositoryError};
use catalog_products::{Category, Product, ProductFilter, ProductId};

const NAMES: [&str; 6] = ["Fedora", "Hammer", "Bread", "Wrench", "Sofa", "Kettle"];

const DESCRIPTIONS: [&str; 4] = [
    "A red hat",
    "Sturdy and reliable",
    "Fresh every morning",
    "Limited edition",
];

/// Deterministic product factory; `seq` picks the field values so batches
/// contain repeated names, both availabilities and several categories.
pub fn fake_product(seq: u64) -> Product {
    let mix = seq.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
    let name = NAMES[(mix >> 33) as usize % NAMES.len()];
    let cents = 100 + (mix >> 17) as i64 % 99_900;
    let category = Category::ALL[(mix >> 41) as usize % Category::ALL.len()];

    Product::new(name, Decimal::new(cents, 2))
        .with_description(DESCRIPTIONS[(mix >> 7) as usize % DESCRIPTIONS.len()])
        .with_available((mix >> 29) & 1 == 1)
        .with_category(category)
}

pub fn fake_batch(start: u64, count: u64) -> Vec<Product> {
    (start..start + count).map(fake_product).collect()
}

async fn create_batch<R: ProductRepository>(repo: &R, count: u64) -> Vec<Product> {
    let mut products = fake_batch(1, count);
    for product in &mut products {
        repo.create(product).await.unwrap();
    }
    products
}

fn assert_same_fields(actual: &Product, expected: &Product) {
    assert_eq!(actual.name(), expected.name());
    assert_eq!(actual.description(), expected.description());
    assert_eq!(actual.price(), expected.price());
    assert_eq!(actual.available(), expected.available());
    assert_eq!(actual.category(), expected.category());
}

fn assert_validation(err: RepositoryError, needle: &str) {
    match err {
        RepositoryError::Validation(DomainError::Validation(msg)) => {
            assert!(msg.contains(needle), "message {msg:?} should mention {needle:?}")
        }
        other => panic!("Expected Validation error, got {other:?}"),
    }
}

pub async fn add_a_product<R: ProductRepository>(repo: &R) {
    assert!(repo.all().fetch_all().await.unwrap().is_empty());

    let mut product = fake_product(7);
    assert_eq!(product.id(), None);
    repo.create(&mut product).await.unwrap();

    assert!(product.id().is_some());
    let products = repo.all().fetch_all().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id(), product.id());
    assert_same_fields(&products[0], &product);
}

pub async fn read_a_product<R: ProductRepository>(repo: &R) {
    let mut product = fake_product(3);
    repo.create(&mut product).await.unwrap();
    let id = product.id().unwrap();

    let found = repo.find(id).await.unwrap().unwrap();
    assert_eq!(found.id(), Some(id));
    assert_same_fields(&found, &product);
}

pub async fn find_missing_id_returns_none<R: ProductRepository>(repo: &R) {
    assert!(repo.find(ProductId::from(4242)).await.unwrap().is_none());
}

pub async fn update_a_product<R: ProductRepository>(repo: &R) {
    let mut product = fake_product(11);
    repo.create(&mut product).await.unwrap();
    let old_id = product.id();

    product.set_description(Some("new product description".to_string()));
    repo.update(&product).await.unwrap();

    assert_eq!(product.id(), old_id);
    let products = repo.all().fetch_all().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id(), old_id);
    assert_eq!(products[0].description(), Some("new product description"));
}

pub async fn update_requires_id<R: ProductRepository>(repo: &R) {
    let product = fake_product(1);
    let err = repo.update(&product).await.unwrap_err();
    assert_validation(err, "Update called with empty ID field");
    assert_eq!(repo.all().count().await.unwrap(), 0);
}

pub async fn update_rejects_invalid_fields<R: ProductRepository>(repo: &R) {
    let mut product = fake_product(2);
    repo.create(&mut product).await.unwrap();
    let stored_name = product.name().to_string();

    product.set_name("  ");
    assert_validation(repo.update(&product).await.unwrap_err(), "name");

    let stored = repo.find(product.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.name(), stored_name);
}

pub async fn update_of_deleted_row_does_not_insert<R: ProductRepository>(repo: &R) {
    let mut product = fake_product(5);
    repo.create(&mut product).await.unwrap();
    repo.delete(&product).await.unwrap();

    product.set_name("Resurrected");
    assert_validation(repo.update(&product).await.unwrap_err(), "not stored");
    assert_eq!(repo.all().count().await.unwrap(), 0);
}

pub async fn delete_a_product<R: ProductRepository>(repo: &R) {
    let mut product = fake_product(9);
    repo.create(&mut product).await.unwrap();
    assert_eq!(repo.all().count().await.unwrap(), 1);

    repo.delete(&product).await.unwrap();
    assert_eq!(repo.all().count().await.unwrap(), 0);
    assert!(repo.find(product.id().unwrap()).await.unwrap().is_none());
    // The in-memory value is orphaned, not reset.
    assert!(product.id().is_some());
}

pub async fn delete_is_idempotent<R: ProductRepository>(repo: &R) {
    let mut product = fake_product(4);
    repo.create(&mut product).await.unwrap();

    repo.delete(&product).await.unwrap();
    repo.delete(&product).await.unwrap();
    assert_eq!(repo.all().count().await.unwrap(), 0);
}

pub async fn delete_requires_id<R: ProductRepository>(repo: &R) {
    let mut stored = fake_product(6);
    repo.create(&mut stored).await.unwrap();

    let transient = fake_product(6);
    assert_validation(repo.delete(&transient).await.unwrap_err(), "Delete called with empty ID field");
    assert_eq!(repo.all().count().await.unwrap(), 1);
}

pub async fn create_rejects_invalid_product<R: ProductRepository>(repo: &R) {
    let mut product = Product::new("", Decimal::new(100, 2));
    assert_validation(repo.create(&mut product).await.unwrap_err(), "name");
    assert_eq!(product.id(), None);
    assert_eq!(repo.all().count().await.unwrap(), 0);
}

pub async fn list_all_products<R: ProductRepository>(repo: &R) {
    assert_eq!(repo.all().count().await.unwrap(), 0);

    let products = create_batch(repo, 5).await;
    assert_eq!(repo.all().fetch_all().await.unwrap().len(), 5);

    repo.delete(&products[2]).await.unwrap();
    let remaining = repo.all().fetch_all().await.unwrap();
    assert_eq!(remaining.len(), 4);
    assert!(remaining.iter().all(|p| p.id() != products[2].id()));

    let ids: Vec<_> = remaining.iter().map(|p| p.id().unwrap()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted, "rows come back in id order");
}

/// Every query returns exactly what a naive filter over the created rows returns.
async fn assert_query_matches_naive<R: ProductRepository>(
    repo: &R,
    products: &[Product],
    filter: ProductFilter,
) {
    let expected: Vec<_> = products
        .iter()
        .filter(|p| filter.matches(p))
        .map(|p| p.id().unwrap())
        .collect();

    let query = repo.query(filter.clone());
    assert_eq!(query.count().await.unwrap(), expected.len() as u64, "count for {filter:?}");

    let found = query.fetch_all().await.unwrap();
    let found_ids: Vec<_> = found.iter().map(|p| p.id().unwrap()).collect();
    assert_eq!(found_ids, expected, "rows for {filter:?}");
    assert!(found.iter().all(|p| filter.matches(p)));
}

pub async fn find_by_name<R: ProductRepository>(repo: &R) {
    let products = create_batch(repo, 10).await;
    let name = products[0].name().to_string();

    let query = repo.find_by_name(&name);
    let expected = products.iter().filter(|p| p.name() == name).count() as u64;
    assert_eq!(query.count().await.unwrap(), expected);
    for product in query.fetch_all().await.unwrap() {
        assert_eq!(product.name(), name);
    }

    assert_query_matches_naive(repo, &products, ProductFilter::by_name(name)).await;
    assert_eq!(repo.find_by_name("No such product").count().await.unwrap(), 0);
}

pub async fn find_by_availability<R: ProductRepository>(repo: &R) {
    let products = create_batch(repo, 10).await;
    let available = products[0].available();

    let query = repo.find_by_availability(available);
    let expected = products.iter().filter(|p| p.available() == available).count() as u64;
    assert_eq!(query.count().await.unwrap(), expected);
    for product in query.fetch_all().await.unwrap() {
        assert_eq!(product.available(), available);
    }

    for flag in [true, false] {
        assert_query_matches_naive(repo, &products, ProductFilter::by_availability(flag)).await;
    }
}

pub async fn find_by_category<R: ProductRepository>(repo: &R) {
    let products = create_batch(repo, 10).await;
    let category = products[0].category();

    let query = repo.find_by_category(category);
    let expected = products.iter().filter(|p| p.category() == category).count() as u64;
    assert_eq!(query.count().await.unwrap(), expected);
    for product in query.fetch_all().await.unwrap() {
        assert_eq!(product.category(), category);
    }

    for category in Category::ALL {
        assert_query_matches_naive(repo, &products, ProductFilter::by_category(category)).await;
    }
}

pub async fn find_by_price<R: ProductRepository>(repo: &R) {
    let mut products = create_batch(repo, 6).await;
    let mut twin = fake_product(100);
    twin.set_price(products[0].price());
    repo.create(&mut twin).await.unwrap();
    products.push(twin);

    let price = products[0].price();
    let found = repo.find_by_price(price).fetch_all().await.unwrap();
    assert!(found.len() >= 2);
    assert!(found.iter().all(|p| p.price() == price));

    // Same amount written with a different scale.
    let rescaled = ProductFilter::by_price_str(&price.normalize().to_string()).unwrap();
    assert_query_matches_naive(repo, &products, rescaled).await;
}

pub async fn combined_filters_and_limits<R: ProductRepository>(repo: &R) {
    let products = create_batch(repo, 12).await;
    let first = &products[0];

    let filter = ProductFilter::by_name(first.name()).with_available(first.available());
    assert_query_matches_naive(repo, &products, filter).await;

    let query = repo.all().limit(3);
    let page = query.fetch_all().await.unwrap();
    assert_eq!(page.len(), 3);
    assert_eq!(query.count().await.unwrap(), 12);
    assert_eq!(query.first().await.unwrap().unwrap().id(), products[0].id());
}

pub async fn deserialized_product_persists<R: ProductRepository>(repo: &R) {
    let payload = json!({
        "name": "Tent",
        "description": "Two person dome",
        "price": "149.90",
        "available": false,
        "category": "HOUSEWARES",
    });
    let mut product = Product::from_value(&payload).unwrap();
    repo.create(&mut product).await.unwrap();

    let stored = repo.find(product.id().unwrap()).await.unwrap().unwrap();
    let data = stored.serialize();
    assert_eq!(data["id"], json!(product.id().unwrap().get()));
    assert_eq!(data["name"], payload["name"]);
    assert_eq!(data["description"], payload["description"]);
    assert_eq!(data["price"], payload["price"]);
    assert_eq!(data["available"], payload["available"]);
    assert_eq!(data["category"], payload["category"]);
}

/// A reloaded row renders its price the same way as the value that was stored.
pub async fn reloaded_price_keeps_column_scale<R: ProductRepository>(repo: &R) {
    for (price, rendered) in [("12.5", "12.50"), ("0.00", "0.00"), ("0", "0.00"), ("149.9", "149.90")] {
        let mut product = Product::new("Lamp", price.parse::<Decimal>().unwrap());
        let before = product.serialize()["price"].clone();
        repo.create(&mut product).await.unwrap();

        let stored = repo.find(product.id().unwrap()).await.unwrap().unwrap();
        assert_eq!(before, json!(rendered), "price {price} before storing");
        assert_eq!(stored.serialize()["price"], json!(rendered), "price {price} after reload");
    }
}
