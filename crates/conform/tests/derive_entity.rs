//! Descriptor tables produced by `#[derive(Entity)]`.

use conform::{Entity, Row, Value, extract_fields, hydrate};

#[derive(Debug, Default, Entity)]
struct Order {
    id: i64,
    total: i64,
    note: Option<String>,
}

#[derive(Debug, Default, Entity)]
#[orm(table = "people")]
struct Person {
    #[orm(id)]
    person_id: i64,
    #[orm(column = "full_name")]
    name: String,
    #[orm(skip)]
    cached_score: u32,
}

#[test]
fn table_defaults_to_lowercased_type_name() {
    assert_eq!(Order::table_name(), "order");
    assert_eq!(Order::ID_COLUMN, "id");
}

#[test]
fn fields_follow_declaration_order() {
    let columns: Vec<_> = Order::fields().iter().map(|f| f.column).collect();
    assert_eq!(columns, ["id", "total", "note"]);
}

#[test]
fn attributes_override_table_column_and_id() {
    assert_eq!(Person::table_name(), "people");
    assert_eq!(Person::ID_COLUMN, "person_id");

    let columns: Vec<_> = Person::fields().iter().map(|f| f.column).collect();
    assert_eq!(columns, ["person_id", "full_name"]);
}

#[test]
fn id_accessors_use_marked_field() {
    let mut p = Person::default();
    assert!(p.is_transient());
    p.set_id(12);
    assert_eq!(p.person_id, 12);
    assert_eq!(p.id(), 12);
    assert!(!p.is_transient());
}

#[test]
fn generated_accessors_round_trip_through_rows() {
    let p = Person {
        person_id: 3,
        name: "Grace".into(),
        cached_score: 99,
    };
    let extracted = extract_fields(&p);
    assert_eq!(
        extracted,
        vec![
            ("person_id".to_string(), Value::Integer(3)),
            ("full_name".to_string(), Value::Text("Grace".into())),
        ]
    );

    let row: Row = extracted.into_iter().collect();
    let back: Person = hydrate(&row).unwrap();
    assert_eq!(back.person_id, 3);
    assert_eq!(back.name, "Grace");
    assert_eq!(back.cached_score, 0);
}

#[test]
fn setter_reports_type_mismatch() {
    let row: Row = [
        ("id".to_string(), Value::Integer(1)),
        ("total".to_string(), Value::Text("lots".into())),
    ]
    .into_iter()
    .collect();
    let err = hydrate::<Order>(&row).unwrap_err();
    assert!(err.to_string().contains("total"));
}
