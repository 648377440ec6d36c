use quarry::{Clause, DataContext, DataError, Driver, Entity, Selector};

#[derive(Entity, Default, Debug, Clone, PartialEq)]
#[table("quarry contacts")]
#[primary_key("id")]
pub struct Contact {
    pub id: i64,
    #[column_name("first name")]
    pub first: String,
    #[column_name("last-name")]
    pub last: Option<String>,
}

fn contact(id: i64, first: &str) -> Contact {
    Contact {
        id,
        first: first.into(),
        last: None,
    }
}

async fn contacts<D: Driver>(context: &DataContext<D>) -> Vec<Contact> {
    let mut contacts = context
        .select_all::<Contact>()
        .await
        .expect("Failed to select the contacts");
    contacts.sort_by_key(|v| v.id);
    contacts
}

pub async fn names<D: Driver>(context: &DataContext<D>) {
    // Setup
    context
        .execute(r#"DROP TABLE IF EXISTS "quarry contacts";"#, None)
        .await
        .expect("Failed to drop the quarry contacts table");
    context
        .execute(
            r#"CREATE TABLE "quarry contacts" (
                id INTEGER PRIMARY KEY,
                "first name" VARCHAR(32) NOT NULL,
                "last-name" VARCHAR(32)
            );"#,
            None,
        )
        .await
        .expect("Failed to create the quarry contacts table");

    // Columns that need quoting
    context
        .create(&contact(1, "Ada"))
        .await
        .expect("Failed to create Ada");
    context
        .batch_create(&[contact(2, "Grace"), contact(3, "Edsger")])
        .await
        .expect("Failed to create the other contacts");
    let grace = context
        .single_by::<Contact>(&Selector::new().with("first name", "Grace"), Clause::And)
        .await
        .expect("Failed to look for Grace")
        .expect("Grace was not found");
    assert_eq!(grace, contact(2, "Grace"));
    let result = context
        .update(&Contact {
            last: Some("Hopper".into()),
            ..grace
        })
        .await
        .expect("Failed to update Grace");
    assert_eq!(result.rows_affected, 1);
    let found = context
        .select_by::<Contact>(
            &Selector::new()
                .with("last-name", "Hopper")
                .with("first name", "Ada"),
            Clause::Or,
        )
        .await
        .expect("Failed to select by two quoted columns");
    assert_eq!(found.len(), 2);

    // Selector names that are not columns never reach the store
    let error = crate::silent_logs! {
        context
            .delete_by::<Contact>(&Selector::new().with("id OR 1=1", 1i64), Clause::And)
            .await
            .expect_err("An unknown column cannot be selected")
    };
    assert!(matches!(
        error.downcast_ref::<DataError>(),
        Some(DataError::UnknownColumn { column, .. }) if column == "id OR 1=1"
    ));
    let error = crate::silent_logs! {
        context
            .select_by::<Contact>(&Selector::new().with("first_name", "Ada"), Clause::And)
            .await
            .expect_err("An unknown column cannot be selected")
    };
    assert!(error.downcast_ref::<DataError>().is_some());
    assert_eq!(contacts(context).await.len(), 3);

    // Names match declared columns ignoring case
    let result = context
        .delete_by::<Contact>(&Selector::new().with("FIRST NAME", "Edsger"), Clause::And)
        .await
        .expect("Failed to delete Edsger");
    assert_eq!(result.rows_affected, 1);
    assert_eq!(
        contacts(context)
            .await
            .into_iter()
            .map(|v| v.first)
            .collect::<Vec<_>>(),
        ["Ada", "Grace"]
    );
}
