//! Per-BC filters and sorters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqualThan,
    LessOrEqualThan,
    Contains,
    Specified,
    EqualsOneOf,
    ContainsOneOf,
}

impl FilterType {
    /// Query-string suffix used by the backend (`field.<suffix>=value`).
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Equals => "equals",
            FilterType::NotEquals => "notEquals",
            FilterType::GreaterThan => "greaterThan",
            FilterType::LessThan => "lessThan",
            FilterType::GreaterOrEqualThan => "greaterOrEqualThan",
            FilterType::LessOrEqualThan => "lessOrEqualThan",
            FilterType::Contains => "contains",
            FilterType::Specified => "specified",
            FilterType::EqualsOneOf => "equalsOneOf",
            FilterType::ContainsOneOf => "containsOneOf",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BcFilter {
    pub field_name: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_name: Option<String>,
}

impl BcFilter {
    pub fn new(field_name: impl Into<String>, filter_type: FilterType, value: Value) -> Self {
        Self {
            field_name: field_name.into(),
            filter_type,
            value,
            view_name: None,
            widget_name: None,
        }
    }

    /// Two filters on the same field and type occupy the same slot.
    pub fn same_slot(&self, other: &BcFilter) -> bool {
        self.field_name == other.field_name && self.filter_type == other.filter_type
    }
}

/// Adds `filter` to `filters`, replacing the value of an existing filter in the same slot.
pub fn upsert_filter(filters: &mut Vec<BcFilter>, filter: BcFilter) {
    match filters.iter_mut().find(|existing| existing.same_slot(&filter)) {
        Some(existing) => *existing = filter,
        None => filters.push(filter),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BcSorter {
    pub field_name: String,
    pub direction: SortDirection,
}

impl BcSorter {
    pub fn new(field_name: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field_name: field_name.into(),
            direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upsert_replaces_same_field_and_type() {
        let mut filters = vec![BcFilter::new("name", FilterType::Contains, json!("a"))];
        upsert_filter(
            &mut filters,
            BcFilter::new("name", FilterType::Equals, json!("b")),
        );
        upsert_filter(
            &mut filters,
            BcFilter::new("name", FilterType::Contains, json!("c")),
        );
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].value, json!("c"));
        assert_eq!(filters[1].filter_type, FilterType::Equals);
    }

    #[test]
    fn filter_wire_shape() {
        let filter: BcFilter = serde_json::from_value(json!({
            "fieldName": "status",
            "type": "equalsOneOf",
            "value": ["A", "B"]
        }))
        .unwrap();
        assert_eq!(filter.filter_type, FilterType::EqualsOneOf);
        assert_eq!(filter.filter_type.as_str(), "equalsOneOf");
    }
}
