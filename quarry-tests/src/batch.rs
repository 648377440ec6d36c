use quarry::{DataContext, DataError, Driver, Entity};

#[derive(Entity, Default, Debug, Clone, PartialEq)]
#[table("quarry_items")]
#[primary_key("id")]
pub struct Item {
    pub id: i64,
    pub code: String,
    pub quantity: i32,
    pub price: Option<f64>,
}

fn item(id: i64, code: &str, quantity: i32) -> Item {
    Item {
        id,
        code: code.into(),
        quantity,
        price: None,
    }
}

async fn items<D: Driver>(context: &DataContext<D>) -> Vec<Item> {
    let mut items = context
        .select_all::<Item>()
        .await
        .expect("Failed to select the items");
    items.sort_by_key(|v| v.id);
    items
}

pub async fn batch<D: Driver>(context: &DataContext<D>) {
    // Setup
    context
        .execute("DROP TABLE IF EXISTS quarry_items;", None)
        .await
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
        .await
        .expect("Failed to create the quarry_items table");

    // Nothing to do
    let result = context
        .batch_create::<Item>(&[])
        .await
        .expect("Failed to create an empty batch");
    assert_eq!(result.rows_affected, 0);

    // Create
    let mut created = vec![item(1, "A", 10), item(2, "B", 20), item(3, "C", 30)];
    created[1].price = Some(2.5);
    let result = context
        .batch_create(&created)
        .await
        .expect("Failed to create the items");
    assert_eq!(result.rows_affected, 3);
    assert_eq!(items(context).await, created);

    // Duplicate primary key at the second row leaves the store unchanged
    let error = crate::silent_logs! {
        context
            .batch_create(&[item(4, "D", 40), item(2, "E", 50)])
            .await
            .expect_err("The duplicate key should have failed the batch")
    };
    assert!(
        error.downcast_ref::<DataError>().is_none(),
        "The driver error is returned as is"
    );
    assert_eq!(items(context).await, created);

    // Update
    let updated = created
        .iter()
        .map(|v| Item {
            quantity: v.quantity + 1,
            price: Some(1.0),
            ..v.clone()
        })
        .collect::<Vec<_>>();
    let result = context
        .batch_update(&updated)
        .await
        .expect("Failed to update the items");
    assert_eq!(result.rows_affected, 3);
    assert_eq!(items(context).await, updated);

    // Unique violation at the second row leaves the store unchanged
    let error = crate::silent_logs! {
        context
            .batch_update(&[
                Item {
                    quantity: 99,
                    ..updated[1].clone()
                },
                Item {
                    code: "C".into(),
                    ..updated[0].clone()
                },
            ])
            .await
            .expect_err("The unique code should have failed the batch")
    };
    assert!(
        error.downcast_ref::<DataError>().is_none(),
        "The driver error is returned as is"
    );
    assert_eq!(items(context).await, updated);
}
