use directory_core::{Client, ClientData, ClientFilter, Phones};
use serde_json::json;

#[test]
fn client_data_constructors_set_email() {
    let with_email = ClientData::new("Anna", "Ivanova", "a@x.com");
    assert_eq!(with_email.email.as_deref(), Some("a@x.com"));

    let without = ClientData::without_email("Anna", "Ivanova");
    assert_eq!(without.email, None);
}

#[test]
fn filter_builder_sets_only_requested_fields() {
    assert_eq!(ClientFilter::new(), ClientFilter::default());

    let filter = ClientFilter::new().first_name("Petr").phone("00000");
    assert_eq!(filter.first_name.as_deref(), Some("Petr"));
    assert_eq!(filter.phone.as_deref(), Some("00000"));
    assert_eq!(filter.last_name, None);
    assert_eq!(filter.email, None);
}

#[test]
fn phones_serialize_as_tagged_variants() {
    assert_eq!(serde_json::to_value(Phones::Empty).unwrap(), json!("empty"));
    assert_eq!(
        serde_json::to_value(Phones::from("111")).unwrap(),
        json!({ "single": "111" })
    );
    assert_eq!(
        serde_json::to_value(Phones::from(["111", "222"])).unwrap(),
        json!({ "many": ["111", "222"] })
    );

    let parsed: Phones = serde_json::from_value(json!({ "many": ["9"] })).unwrap();
    assert_eq!(parsed, Phones::Many(vec!["9".to_string()]));
}

#[test]
fn client_serialization_uses_column_names() {
    let client = Client {
        client_id: 3,
        first_name: Some("Petr".to_string()),
        last_name: Some("Aleksandrov".to_string()),
        email: Some("abc@gmail.com".to_string()),
    };

    let json = serde_json::to_value(&client).unwrap();
    assert_eq!(
        json,
        json!({
            "client_id": 3,
            "first_name": "Petr",
            "last_name": "Aleksandrov",
            "email": "abc@gmail.com"
        })
    );
}

#[test]
fn missing_names_serialize_as_null() {
    let client = Client {
        client_id: 7,
        first_name: None,
        last_name: Some("Petrov".to_string()),
        email: None,
    };

    let json = serde_json::to_value(&client).unwrap();
    assert_eq!(json["first_name"], json!(null));
    assert_eq!(json["last_name"], json!("Petrov"));
}
