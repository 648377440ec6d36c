use quarry::{DataContext, DataError, Driver, Entity};

#[derive(Entity, Default, Debug, Clone, PartialEq)]
#[table("quarry_notes")]
pub struct Note {
    pub text: String,
}

pub async fn errors<D: Driver + Clone>(context: &DataContext<D>) {
    // Unreachable store
    let unreachable = DataContext::new(context.driver().clone(), "invalid://quarry");
    let error = crate::silent_logs! {
        unreachable
            .select_all::<Note>()
            .await
            .expect_err("The connection should have failed")
    };
    assert!(matches!(
        error.downcast_ref::<DataError>(),
        Some(DataError::Connection { .. })
    ));

    // No primary key, nothing reaches the store
    let note = Note { text: "hi".into() };
    for error in [
        context.update(&note).await,
        context.delete(&note).await,
        context.batch_update(&[note.clone()]).await,
    ]
    .map(|v| v.expect_err("A record without primary key cannot be targeted"))
    {
        assert!(matches!(
            error.downcast_ref::<DataError>(),
            Some(DataError::MissingPrimaryKey { .. })
        ));
    }

    // Driver errors are propagated
    let error = crate::silent_logs! {
        context
            .execute("THIS IS NOT SQL;", None)
            .await
            .expect_err("Invalid SQL should fail")
    };
    assert!(error.downcast_ref::<DataError>().is_none());
    let error = crate::silent_logs! {
        context
            .create(&note)
            .await
            .expect_err("The table does not exist")
    };
    assert!(error.downcast_ref::<DataError>().is_none());
}
