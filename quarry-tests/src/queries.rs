use quarry::{
    Clause, DataContext, Driver, Entity, Selector, selector, stream::TryStreamExt,
};

#[derive(Entity, Default, Debug, Clone, PartialEq)]
#[table("quarry_books")]
#[primary_key("id")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub year: i32,
    pub rating: Option<f32>,
}

pub async fn queries<D: Driver>(context: &DataContext<D>) {
    // Setup
    context
        .execute("DROP TABLE IF EXISTS quarry_books;", None)
        .await
        .expect("Failed to drop the quarry_books table");
    context
        .execute(
            "CREATE TABLE quarry_books (
                id INTEGER PRIMARY KEY,
                title VARCHAR(128) NOT NULL,
                year INTEGER NOT NULL,
                rating REAL
            );",
            None,
        )
        .await
        .expect("Failed to create the quarry_books table");
    let books = [
        (1, "Dune", 1965),
        (2, "Neuromancer", 1984),
        (3, "Anathem", 2008),
        (4, "Piranesi", 2020),
    ]
    .map(|(id, title, year)| Book {
        id,
        title: title.into(),
        year,
        rating: None,
    });
    context
        .batch_create(&books)
        .await
        .expect("Failed to create the books");

    // Caller supplied SQL
    let recent = context
        .select_by_sql::<Book>(
            "SELECT * FROM quarry_books WHERE year >= @year ORDER BY id;",
            Some(&selector! { year: 2000 }),
        )
        .await
        .expect("Failed to select the recent books");
    assert_eq!(recent, books[2..]);
    let same = context
        .select_by_sql::<Book>(
            "SELECT * FROM quarry_books WHERE year >= @year ORDER BY id;",
            Some(&Selector::new().with("@year", 2000)),
        )
        .await
        .expect("Failed to select the recent books");
    assert_eq!(same, recent);
    let newest = context
        .single_by_sql::<Book>("SELECT * FROM quarry_books ORDER BY year DESC;", None)
        .await
        .expect("Failed to select the newest book");
    assert_eq!(newest.as_ref(), Some(&books[3]));
    let none = context
        .single_by_sql::<Book>(
            "SELECT * FROM quarry_books WHERE title = @title;",
            Some(&selector! { title: "Solaris" }),
        )
        .await
        .expect("Failed to look for a missing book");
    assert_eq!(none, None);

    // Nothing matches
    let none = context
        .single_by::<Book>(&selector! { id: 42i64 }, Clause::And)
        .await
        .expect("Failed to look for a missing book");
    assert_eq!(none, None);
    let never = "nor".parse::<Clause>().unwrap();
    assert_eq!(never, Clause::Never);
    let nothing = context
        .select_by::<Book>(&selector! { id: 1i64 }, never)
        .await
        .expect("Failed to select with an unknown clause");
    assert!(nothing.is_empty());
    let nothing = context
        .select_by::<Book>(&selector! {}, Clause::And)
        .await
        .expect("Failed to select with an empty selector");
    assert!(nothing.is_empty());

    // Stream
    let mut streamed = context
        .stream_all::<Book>()
        .try_collect::<Vec<_>>()
        .await
        .expect("Failed to stream the books");
    streamed.sort_by_key(|v| v.id);
    assert_eq!(streamed, books);

    // Commands
    let result = context
        .execute(
            "UPDATE quarry_books SET rating = @rating WHERE year < @year;",
            Some(&selector! { rating: 4.5f32, year: 2000 }),
        )
        .await
        .expect("Failed to rate the older books");
    assert_eq!(result.rows_affected, 2);
    let rated = context
        .select_by_sql::<Book>(
            "SELECT * FROM quarry_books WHERE rating IS NOT NULL ORDER BY id;",
            None,
        )
        .await
        .expect("Failed to select the rated books");
    assert_eq!(
        rated.iter().map(|v| (v.id, v.rating)).collect::<Vec<_>>(),
        [(1, Some(4.5)), (2, Some(4.5))]
    );
    let result = context
        .delete_by_sql(
            "DELETE FROM quarry_books WHERE title = @title;",
            Some(&selector! { title: "Dune" }),
        )
        .await
        .expect("Failed to delete Dune");
    assert_eq!(result.rows_affected, 1);
    assert_eq!(
        context
            .select_all::<Book>()
            .await
            .expect("Failed to select the books")
            .len(),
        3
    );
}
