//! Filter and sort values handed to the persistence service.
//!
//! A request record names the fields it can be filtered on through an
//! explicit [`FilterFields`] mapping; only the populated ones become
//! equality conditions. Sort lists keep the caller's order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pipeline::Status;

/// Storage key for record identities.
pub const ID_KEY: &str = "_id";

/// Per-entity mapping from a request record to `(storage key, value)` pairs.
/// Use `"id"` as the key for the record identity.
pub trait FilterFields {
    fn filter_fields(&self) -> Vec<(&'static str, &str)>;
}

/// Equality conditions, one per populated field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter {
    fields: BTreeMap<String, String>,
}

impl Filter {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Build a filter from the populated fields of `record`. `None` matches
/// everything.
pub fn build_filter<T: FilterFields + ?Sized>(record: Option<&T>) -> Result<Filter, Status> {
    let mut filter = Filter::default();
    let Some(record) = record else {
        return Ok(filter);
    };

    for (key, value) in record.filter_fields() {
        if value.is_empty() {
            continue;
        }
        if key == "id" {
            if !is_object_id(value) {
                return Err(Status::invalid_argument("invalid id"));
            }
            filter.fields.insert(ID_KEY.to_string(), value.to_string());
        } else {
            filter.fields.insert(key.to_string(), value.to_string());
        }
    }
    Ok(filter)
}

/// 24 hexadecimal digits.
fn is_object_id(value: &str) -> bool {
    value.len() == 24 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

/// One requested sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    #[serde(default)]
    pub order: Order,
}

/// Ordered `(field, 1 | -1)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec(pub Vec<(String, i8)>);

pub fn build_sort(fields: &[SortField]) -> SortSpec {
    SortSpec(
        fields
            .iter()
            .map(|f| {
                let direction = match f.order {
                    Order::Asc => 1,
                    Order::Desc => -1,
                };
                (f.field.clone(), direction)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Code;

    #[derive(Default)]
    struct ExecQuery {
        id: String,
        first_name: String,
        email: String,
        role: String,
    }

    impl FilterFields for ExecQuery {
        fn filter_fields(&self) -> Vec<(&'static str, &str)> {
            vec![
                ("id", self.id.as_str()),
                ("first_name", self.first_name.as_str()),
                ("email", self.email.as_str()),
                ("role", self.role.as_str()),
            ]
        }
    }

    #[test]
    fn only_populated_fields_filter() {
        let query = ExecQuery {
            first_name: "Ada".into(),
            role: "admin".into(),
            ..Default::default()
        };
        let filter = build_filter(Some(&query)).unwrap();
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.get("first_name"), Some("Ada"));
        assert_eq!(filter.get("email"), None);
    }

    #[test]
    fn id_maps_to_storage_key_and_is_checked() {
        let query = ExecQuery {
            id: "64f0c0ffee64f0c0ffee64f0".into(),
            ..Default::default()
        };
        let filter = build_filter(Some(&query)).unwrap();
        assert_eq!(filter.get(ID_KEY), Some("64f0c0ffee64f0c0ffee64f0"));

        let bad = ExecQuery {
            id: "not-an-object-id".into(),
            ..Default::default()
        };
        assert_eq!(build_filter(Some(&bad)).unwrap_err().code(), Code::InvalidArgument);
    }

    #[test]
    fn no_record_matches_everything() {
        assert!(build_filter::<ExecQuery>(None).unwrap().is_empty());
    }

    #[test]
    fn sort_keeps_order() {
        let fields: Vec<SortField> =
            serde_json::from_str(r#"[{"field":"last_name","order":"DESC"},{"field":"email"}]"#)
                .unwrap();
        let sort = build_sort(&fields);
        assert_eq!(
            sort.0,
            vec![("last_name".to_string(), -1), ("email".to_string(), 1)]
        );
    }
}
