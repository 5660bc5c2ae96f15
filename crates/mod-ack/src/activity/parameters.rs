//! Query parameters appended to the target of a URL acknowledgement.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::domain::{UrlParameterPair, MAX_URL_PARAMETERS};

/// Ordered name -> value mapping. Re-inserting a name replaces its value in
/// place, so the first occurrence fixes the position and the last one the
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParameters {
    entries: Vec<(String, String)>,
}

#[derive(Debug, thiserror::Error)]
pub enum ParameterDecodeError {
    #[error("stored parameters are not a JSON object of strings: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Outcome of collecting form rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedParameters {
    pub parameters: UrlParameters,
    /// Rows dropped because the name or the value was empty.
    pub skipped: usize,
}

impl UrlParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks the first [`MAX_URL_PARAMETERS`] rows in index order and keeps
    /// the complete ones. Incomplete rows are dropped without error.
    pub fn collect(pairs: &[UrlParameterPair]) -> CollectedParameters {
        let mut collected = CollectedParameters::default();
        for pair in pairs.iter().take(MAX_URL_PARAMETERS) {
            if !pair.is_complete() {
                collected.skipped += 1;
                continue;
            }
            collected
                .parameters
                .insert(pair.name.clone(), pair.value.clone());
        }
        collected
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Expands the mapping back into form rows, e.g. to pre-fill an edit form.
    pub fn to_pairs(&self) -> Vec<UrlParameterPair> {
        self.iter()
            .map(|(name, value)| UrlParameterPair::new(name, value))
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, ParameterDecodeError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl<N, V> FromIterator<(N, V)> for UrlParameters
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut parameters = Self::new();
        for (name, value) in iter {
            parameters.insert(name, value);
        }
        parameters
    }
}

impl Serialize for UrlParameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for UrlParameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ParametersVisitor;

        impl<'de> Visitor<'de> for ParametersVisitor {
            type Value = UrlParameters;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parameter names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut parameters = UrlParameters::new();
                while let Some((name, value)) = access.next_entry::<String, String>()? {
                    parameters.insert(name, value);
                }
                Ok(parameters)
            }
        }

        deserializer.deserialize_map(ParametersVisitor)
    }
}

/// Stores the mapping as a JSON string inside the `parameters` column.
pub(crate) mod json_column {
    use super::UrlParameters;
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(
        value: &Option<UrlParameters>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(parameters) => {
                let encoded = parameters.to_json().map_err(S::Error::custom)?;
                serializer.serialize_some(&encoded)
            }
            None => serializer.serialize_none(),
        }
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<UrlParameters>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.filter(|encoded| !encoded.is_empty())
            .map(|encoded| UrlParameters::from_json(&encoded).map_err(D::Error::custom))
            .transpose()
    }
}
