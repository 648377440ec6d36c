use quarry::{Clause, ContextConfig, DataContext, DataError, Driver, Entity, selector};
use time::{Date, macros::date};

#[derive(Entity, Default, Debug, Clone, PartialEq)]
#[table("quarry_readings")]
#[primary_key("id")]
pub struct Reading {
    pub id: i64,
    pub small: i16,
    pub ratio: f32,
    pub label: Option<String>,
    #[column_name("taken_on")]
    pub taken: Option<Date>,
}

pub async fn mapping<D: Driver + Clone>(context: &DataContext<D>) {
    // Setup
    context
        .execute("DROP TABLE IF EXISTS quarry_readings;", None)
        .await
        .expect("Failed to drop the quarry_readings table");
    context
        .execute(
            "CREATE TABLE quarry_readings (
                id INTEGER PRIMARY KEY,
                small INTEGER,
                ratio REAL,
                label VARCHAR(32),
                taken_on DATE,
                extra VARCHAR(32)
            );",
            None,
        )
        .await
        .expect("Failed to create the quarry_readings table");
    context
        .execute(
            "INSERT INTO quarry_readings (id, small, ratio, label, taken_on, extra)
            VALUES (1, 300, 0.5, NULL, '2024-03-01', 'ignored');",
            None,
        )
        .await
        .expect("Failed to insert the first reading");

    // Narrowed numbers, null, renamed column and an extra one
    let reading = context
        .single_by::<Reading>(&selector! { id: 1i64 }, Clause::And)
        .await
        .expect("Failed to read the first reading")
        .expect("The first reading was not found");
    assert_eq!(
        reading,
        Reading {
            id: 1,
            small: 300,
            ratio: 0.5,
            label: None,
            taken: Some(date!(2024 - 03 - 01)),
        }
    );

    // Missing columns keep their default
    let partial = context
        .select_by_sql::<Reading>("SELECT id, small FROM quarry_readings;", None)
        .await
        .expect("Failed to read a partial row");
    assert_eq!(
        partial,
        [Reading {
            id: 1,
            small: 300,
            ..Default::default()
        }]
    );

    // Unless the context is strict
    let strict = DataContext::new(context.driver().clone(), context.url())
        .with_config(ContextConfig::new().strict(true))
        .with_cache(context.cache().clone());
    let error = crate::silent_logs! {
        strict
            .select_by_sql::<Reading>("SELECT id, small FROM quarry_readings;", None)
            .await
            .expect_err("Strict mapping should reject a partial row")
    };
    assert!(matches!(
        error.downcast_ref::<DataError>(),
        Some(DataError::MissingField { field, .. }) if field == "ratio"
    ));

    // Out of range for the declared type
    context
        .execute(
            "INSERT INTO quarry_readings (id, small, ratio) VALUES (2, 70000, 1);",
            None,
        )
        .await
        .expect("Failed to insert the second reading");
    let result = crate::silent_logs! {
        context
            .single_by::<Reading>(&selector! { id: 2i64 }, Clause::And)
            .await
    };
    assert!(result.is_err(), "70000 does not fit in a i16");
}
