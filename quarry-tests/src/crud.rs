use quarry::{Clause, DataContext, Driver, Entity, Selector, selector};
use rust_decimal::Decimal;
use time::{
    Date, PrimitiveDateTime,
    macros::{date, datetime},
};
use uuid::Uuid;

#[derive(Entity, Default, Debug, Clone, PartialEq)]
#[table("quarry_people")]
#[primary_key("id")]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub age: Option<i32>,
    pub email: Option<String>,
    pub height: Option<f64>,
    pub birthday: Option<Date>,
    pub registered: Option<PrimitiveDateTime>,
    pub token: Option<Uuid>,
    pub balance: Option<Decimal>,
    pub avatar: Option<Vec<u8>>,
    pub active: bool,
    #[skip]
    pub cached: Option<String>,
}

pub async fn crud<D: Driver>(context: &DataContext<D>) {
    // Setup
    context
        .execute("DROP TABLE IF EXISTS quarry_people;", None)
        .await
        .expect("Failed to drop the quarry_people table");
    context
        .execute(
            "CREATE TABLE quarry_people (
                id INTEGER PRIMARY KEY,
                name VARCHAR(64) NOT NULL,
                age INTEGER,
                email VARCHAR(128),
                height DOUBLE,
                birthday DATE,
                registered TIMESTAMP,
                token VARCHAR(36),
                balance VARCHAR(40),
                avatar BLOB,
                active BOOLEAN NOT NULL DEFAULT 0
            );",
            None,
        )
        .await
        .expect("Failed to create the quarry_people table");

    // Create
    let alice = Person {
        id: 1,
        name: "Alice".into(),
        age: Some(36),
        email: Some("alice@example.com".into()),
        height: Some(1.68),
        birthday: Some(date!(1989 - 05 - 17)),
        registered: Some(datetime!(2024-01-02 03:04:05)),
        token: Some(Uuid::parse_str("5e915574-bb30-4430-98cf-c5854f61fbbd").unwrap()),
        balance: Some(Decimal::new(123456, 2)),
        avatar: Some(vec![0xCA, 0xFE, 0x00, 0x01]),
        active: true,
        cached: None,
    };
    let result = context
        .create(&alice)
        .await
        .expect("Failed to create Alice");
    assert_eq!(result.rows_affected, 1);
    let bob = Person {
        id: 2,
        name: "Bob".into(),
        ..Default::default()
    };
    context.create(&bob).await.expect("Failed to create Bob");

    // Read back
    let found = context
        .single_by::<Person>(&selector! { id: 1i64 }, Clause::And)
        .await
        .expect("Failed to query Alice")
        .expect("Alice was not found");
    assert_eq!(found, alice);
    let found = context
        .single_by::<Person>(&selector! { id: 2i64 }, Clause::And)
        .await
        .expect("Failed to query Bob")
        .expect("Bob was not found");
    assert_eq!(found, bob);
    assert_eq!(found.age, None);
    assert_eq!(found.birthday, None);
    assert!(!found.active);

    // Update touches only the targeted row
    let older = Person {
        age: Some(37),
        ..alice.clone()
    };
    let result = context.update(&older).await.expect("Failed to update Alice");
    assert_eq!(result.rows_affected, 1);
    let robert = Person {
        id: 2,
        name: "Robert".into(),
        email: Some("robert@example.com".into()),
        ..Default::default()
    };
    context.update(&robert).await.expect("Failed to update Bob");
    let everyone = context
        .select_by::<Person>(&selector! { id: 1i64, name: "Robert" }, Clause::Or)
        .await
        .expect("Failed to select everyone");
    assert_eq!(everyone.len(), 2);
    let alice = everyone.iter().find(|p| p.id == 1).unwrap();
    assert_eq!(alice.age, Some(37));
    assert_eq!(alice.email.as_deref(), Some("alice@example.com"));
    let bob = everyone.iter().find(|p| p.id == 2).unwrap();
    assert_eq!(bob.name, "Robert");
    assert_eq!(bob.email.as_deref(), Some("robert@example.com"));
    assert_eq!(bob.age, None);

    // Single column IN
    let found = context
        .select_by::<Person>(&Selector::new().with("@id", 2i64), Clause::In)
        .await
        .expect("Failed to select with IN");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Robert");

    // Delete
    let result = context.delete(&older).await.expect("Failed to delete Alice");
    assert_eq!(result.rows_affected, 1);
    assert!(
        context
            .select_by::<Person>(&selector! { id: 1i64 }, Clause::And)
            .await
            .expect("Failed to select Alice")
            .is_empty()
    );
    let result = context
        .delete_by::<Person>(&selector! { name: "Robert" }, Clause::And)
        .await
        .expect("Failed to delete Robert");
    assert_eq!(result.rows_affected, 1);

    // Delete all
    for id in 10..15 {
        context
            .create(&Person {
                id,
                name: format!("Person {id}"),
                ..Default::default()
            })
            .await
            .expect("Failed to create a person");
    }
    let result = context
        .delete_all::<Person>()
        .await
        .expect("Failed to delete all the people");
    assert_eq!(result.rows_affected, 5);
    assert!(
        context
            .select_all::<Person>()
            .await
            .expect("Failed to select all the people")
            .is_empty()
    );
}
