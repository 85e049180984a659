use std::collections::BTreeMap;

/// A real estate agency record. Transport-agnostic; the REST layer owns the JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RealEstate {
    /// Assigned by the service on save.
    pub id: Option<i32>,
    pub name: String,
    /// Brazilian company tax id.
    pub cnpj: String,
    pub state_id: Option<i32>,
    pub city_id: Option<i32>,
    pub address_zip_code: Option<String>,
}

/// Filter keys, in the order they are reported.
pub const FILTER_KEYS: [&str; 4] = ["name", "cnpj", "stateId", "cityId"];

/// Request-scoped filter values keyed by filter name.
///
/// All four keys of [`FILTER_KEYS`] are always present. An empty string means
/// "no constraint" for that key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    values: BTreeMap<String, String>,
}

impl FilterCriteria {
    /// Absent ids become `""`, present ones their decimal form.
    pub fn from_params(
        name: impl Into<String>,
        cnpj: impl Into<String>,
        state_id: Option<i32>,
        city_id: Option<i32>,
    ) -> Self {
        let id_text = |v: Option<i32>| v.map(|n| n.to_string()).unwrap_or_default();
        let values = BTreeMap::from([
            ("name".to_string(), name.into()),
            ("cnpj".to_string(), cnpj.into()),
            ("stateId".to_string(), id_text(state_id)),
            ("cityId".to_string(), id_text(city_id)),
        ]);
        Self { values }
    }

    /// Replace the value of one of [`FILTER_KEYS`]; other keys are ignored.
    pub fn with_value(mut self, key: &str, value: impl Into<String>) -> Self {
        if let Some(slot) = self.values.get_mut(key) {
            *slot = value.into();
        }
        self
    }

    /// Raw value, `""` included.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value for `key` when it actually constrains the result.
    pub fn constraint(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self::from_params("", "", None, None)
    }
}
