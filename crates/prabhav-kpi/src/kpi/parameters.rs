use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Repeated measurements of one KPI dimension over a scoring period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Named parameter series in a stable iteration order.
///
/// Names are unique; inserting an existing name replaces its values in place so the original
/// position is kept.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct ParameterSet {
    series: Vec<ParameterSeries>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a series, returning the previous values for that name.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Option<Vec<f64>> {
        let name = name.into();
        match self.series.iter_mut().find(|series| series.name == name) {
            Some(existing) => Some(std::mem::replace(&mut existing.values, values)),
            None => {
                self.series.push(ParameterSeries { name, values });
                None
            }
        }
    }

    pub fn with_series(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert(name, values);
        self
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|series| series.name == name)
            .map(|series| series.values.as_slice())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterSeries> {
        self.series.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|series| series.name.as_str())
    }

    /// Parse a JSON object of `name -> [numbers]`.
    pub fn from_json(value: &Value) -> Result<Self, ParameterSetError> {
        let object = value.as_object().ok_or(ParameterSetError::NotAnObject)?;
        let mut set = ParameterSet::new();

        for (name, raw) in object {
            let items = raw.as_array().ok_or_else(|| ParameterSetError::NotAnArray {
                parameter: name.clone(),
            })?;
            let values = items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    item.as_f64().ok_or_else(|| ParameterSetError::NonNumeric {
                        parameter: name.clone(),
                        index,
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;
            set.insert(name.clone(), values);
        }

        Ok(set)
    }
}

impl TryFrom<Value> for ParameterSet {
    type Error = ParameterSetError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(&value)
    }
}

impl Serialize for ParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.series.len()))?;
        for series in &self.series {
            map.serialize_entry(&series.name, &series.values)?;
        }
        map.end()
    }
}

impl<N: Into<String>> FromIterator<(N, Vec<f64>)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (N, Vec<f64>)>>(iter: I) -> Self {
        let mut set = ParameterSet::new();
        for (name, values) in iter {
            set.insert(name, values);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a ParameterSeries;
    type IntoIter = std::slice::Iter<'a, ParameterSeries>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.iter()
    }
}

/// Shape errors raised while reading a parameter set from JSON.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParameterSetError {
    #[error("kpi data must be an object with parameter names as keys and arrays as values")]
    NotAnObject,
    #[error("invalid data for {parameter}: each parameter must have an array of numeric values")]
    NotAnArray { parameter: String },
    #[error("invalid data for {parameter}: value at index {index} is not a number")]
    NonNumeric { parameter: String, index: usize },
}
