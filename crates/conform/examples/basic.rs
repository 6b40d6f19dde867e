//! Convention-based CRUD against an in-memory SQLite database.
//!
//! Run with:
//!   cargo run --example basic -p conform

use conform::prelude::*;

#[derive(Debug, Default, Entity)]
#[orm(table = "books")]
struct Book {
    id: i64,
    title: String,
    author: Option<String>,
    pages: Option<i64>,
}

fn main() -> OrmResult<()> {
    let conn = SqliteConnection::open_in_memory()?;
    conn.execute_batch(
        "CREATE TABLE books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            author TEXT,
            pages INTEGER
        );",
    )?;
    let orm = Orm::new(conn);

    let mut dune = Book {
        title: "Dune".into(),
        author: Some("Frank Herbert".into()),
        pages: Some(412),
        ..Default::default()
    };
    let id = orm.save(&mut dune)?;
    println!("inserted {dune:?}");

    orm.persist(&Book {
        title: "Solaris".into(),
        pages: Some(204),
        ..Default::default()
    })?;

    dune.pages = Some(896);
    orm.persist(&dune)?;
    let reloaded: Option<Book> = orm.get(id)?;
    println!("reloaded {reloaded:?}");

    let stmt = orm.prepare("SELECT * FROM books WHERE pages > :min ORDER BY title")?;
    let long: Vec<Book> = orm.find_all_as(stmt, &Criteria::new().named("min", 300_i64))?;
    println!("long books: {long:?}");

    let stmt = orm.prepare("SELECT title, pages FROM books WHERE author IS NULL")?;
    if let Some(row) = orm.find_one(stmt, &Criteria::new())? {
        for (column, value) in row.iter() {
            println!("  {column} = {value}");
        }
    }

    println!("deleted {} row(s)", orm.delete(&dune)?);
    Ok(())
}
