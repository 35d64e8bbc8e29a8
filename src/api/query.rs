//! Query-string encoding of paging, filters and sorters.

use serde_json::Value;

use crate::model::{BcFilter, BcSorter};

pub type QueryParams = Vec<(String, String)>;

/// `_page` / `_limit`. A zero limit asks the backend for every row.
pub fn pagination(page: usize, limit: usize) -> QueryParams {
    vec![
        ("_page".to_string(), page.to_string()),
        ("_limit".to_string(), limit.to_string()),
    ]
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Filter value as sent on the wire; arrays become a JSON list of quoted strings.
pub fn filter_value(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let quoted: Vec<Value> = items.iter().map(|item| Value::String(scalar(item))).collect();
            Value::Array(quoted).to_string()
        }
        other => scalar(other),
    }
}

/// `{fieldName}.{type}=value` per filter, in order.
pub fn filters(filters: &[BcFilter]) -> QueryParams {
    filters
        .iter()
        .map(|filter| {
            (
                format!("{}.{}", filter.field_name, filter.filter_type.as_str()),
                filter_value(&filter.value),
            )
        })
        .collect()
}

/// `_sort.{priority}.{direction}=fieldName`, priority being the position.
pub fn sorters(sorters: &[BcSorter]) -> QueryParams {
    sorters
        .iter()
        .enumerate()
        .map(|(index, sorter)| {
            (
                format!("_sort.{}.{}", index, sorter.direction.as_str()),
                sorter.field_name.clone(),
            )
        })
        .collect()
}

/// Filters followed by sorters.
pub fn context(bc_filters: &[BcFilter], bc_sorters: &[BcSorter]) -> QueryParams {
    let mut params = filters(bc_filters);
    params.extend(sorters(bc_sorters));
    params
}
