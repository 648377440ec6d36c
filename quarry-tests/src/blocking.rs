use crate::batch::Item;
use quarry::{Clause, DataContext, Driver, blocking::BlockingDataContext, selector};

/// Same operations through the synchronous adapter. Must not be called from
/// inside an async runtime.
pub fn execute_blocking_tests<D: Driver>(driver: D, url: &str) {
    let context = BlockingDataContext::new(
        DataContext::from_url(driver, url).expect("Invalid connection url"),
    )
    .expect("Could not create the blocking context");

    // Setup
    context
        .execute("DROP TABLE IF EXISTS quarry_items;", None)
        .expect("Failed to drop the quarry_items table");
    context
        .execute(
            "CREATE TABLE quarry_items (
                id INTEGER PRIMARY KEY,
                code VARCHAR(16) NOT NULL UNIQUE,
                quantity INTEGER NOT NULL,
                price DOUBLE
            );",
            None,
        )
        .expect("Failed to create the quarry_items table");

    let first = Item {
        id: 1,
        code: "A".into(),
        quantity: 1,
        price: Some(9.99),
    };
    context.create(&first).expect("Failed to create an item");
    let result = context
        .batch_create(&[
            Item {
                id: 2,
                code: "B".into(),
                quantity: 2,
                price: None,
            },
            Item {
                id: 3,
                code: "C".into(),
                quantity: 3,
                price: None,
            },
        ])
        .expect("Failed to create the items");
    assert_eq!(result.rows_affected, 2);
    assert_eq!(
        context
            .single_by::<Item>(&selector! { code: "A" }, Clause::And)
            .expect("Failed to select the first item"),
        Some(first.clone())
    );

    let result = context
        .update(&Item {
            quantity: 10,
            ..first.clone()
        })
        .expect("Failed to update the first item");
    assert_eq!(result.rows_affected, 1);
    let large = context
        .select_by_sql::<Item>(
            "SELECT * FROM quarry_items WHERE quantity > @quantity;",
            Some(&selector! { quantity: 2 }),
        )
        .expect("Failed to select the large items");
    assert_eq!(large.len(), 2);

    let result = context
        .delete_by::<Item>(&selector! { id: 2i64, id: 3i64 }, Clause::Or)
        .expect("Failed to delete the items");
    assert_eq!(result.rows_affected, 1, "The last value of a repeated name wins");
    context.delete(&first).expect("Failed to delete the first item");
    let left = context.select_all::<Item>().expect("Failed to select the items");
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, 2);
    let result = context
        .delete_all::<Item>()
        .expect("Failed to delete the items");
    assert_eq!(result.rows_affected, 1);
}
