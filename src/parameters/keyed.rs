//! Keyed flat vectors
//!
//! The optimizer works with one flat `Array1<f64>`, but every lookup in this
//! crate goes through a parameter name. [`Layout`] records where each named
//! entry lives inside the flat buffer and [`KeyedVector`] pairs a layout with
//! its data, so reordering declarations can never shift one parameter into
//! another's slot.

use crate::error::{ReparamError, Result};
use crate::parameters::annotation::{IntoValue, Value};
use ndarray::{Array1, ArrayViewD, IxDyn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    name: String,
    shape: Vec<usize>,
    offset: usize,
    len: usize,
}

/// Named, shaped segments of a flat buffer in declaration order.
///
/// Serialized as its `(name, shape)` entries only; offsets are recomputed on
/// load.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
    total: usize,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named segment with the given shape.
    ///
    /// Returns `DuplicateParameter` if the name already has a segment, or
    /// `DimensionMismatch` if the segment size overflows.
    pub fn push(&mut self, name: &str, shape: &[usize]) -> Result<()> {
        if self.index.contains_key(name) {
            return Err(ReparamError::DuplicateParameter {
                name: name.to_string(),
            });
        }
        let len = shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .filter(|&len| self.total.checked_add(len).is_some())
            .ok_or_else(|| {
                ReparamError::DimensionMismatch(format!(
                    "Segment '{}' with shape {:?} is too large",
                    name, shape
                ))
            })?;
        self.index.insert(name.to_string(), self.slots.len());
        self.slots.push(Slot {
            name: name.to_string(),
            shape: shape.to_vec(),
            offset: self.total,
            len,
        });
        self.total += len;
        Ok(())
    }

    /// Total number of scalars across all segments.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of named segments.
    pub fn num_entries(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.name.as_str())
    }

    /// Shape of a named segment.
    pub fn shape(&self, name: &str) -> Option<&[usize]> {
        self.slot(name).map(|s| s.shape.as_slice())
    }

    /// Flat index range of a named segment.
    pub fn range(&self, name: &str) -> Option<std::ops::Range<usize>> {
        self.slot(name).map(|s| s.offset..s.offset + s.len)
    }

    fn slot(&self, name: &str) -> Option<&Slot> {
        self.index.get(name).and_then(|&i| self.slots.get(i))
    }
}

#[derive(Serialize, Deserialize)]
struct SlotEntry {
    name: String,
    shape: Vec<usize>,
}

impl Serialize for Layout {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.slots.iter().map(|s| SlotEntry {
            name: s.name.clone(),
            shape: s.shape.clone(),
        }))
    }
}

impl<'de> Deserialize<'de> for Layout {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<SlotEntry>::deserialize(deserializer)?;
        let mut layout = Layout::new();
        for entry in entries {
            layout
                .push(&entry.name, &entry.shape)
                .map_err(serde::de::Error::custom)?;
        }
        Ok(layout)
    }
}

/// A flat numeric buffer addressed by parameter name.
///
/// Used for the optimizable vector, the fixed vector and raw fit results.
/// The layout is shared, so cloning or rebuilding with new data is cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedVector {
    layout: Arc<Layout>,
    data: Array1<f64>,
}

impl KeyedVector {
    /// Build a keyed vector from `(name, value)` pairs in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use reparam_rs::parameters::{IntoValue, KeyedVector};
    ///
    /// let kv = KeyedVector::from_entries(vec![
    ///     ("a".to_string(), 2.0.into_value()),
    ///     ("w".to_string(), vec![1.0, 3.0].into_value()),
    /// ])
    /// .unwrap();
    /// assert_eq!(kv.len(), 3);
    /// assert_eq!(kv.scalar("a").unwrap(), 2.0);
    /// assert_eq!(kv.get("w").unwrap()[[1]], 3.0);
    /// ```
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut layout = Layout::new();
        let mut data = Vec::new();
        for (name, value) in entries {
            layout.push(&name, value.shape())?;
            data.extend(value.iter().copied());
        }
        Ok(Self {
            layout: Arc::new(layout),
            data: Array1::from_vec(data),
        })
    }

    /// Pair an existing layout with a flat buffer.
    pub fn from_flat(layout: Arc<Layout>, data: Array1<f64>) -> Result<Self> {
        if data.len() != layout.len() {
            return Err(ReparamError::DimensionMismatch(format!(
                "Expected {} values for layout, got {}",
                layout.len(),
                data.len()
            )));
        }
        Ok(Self { layout, data })
    }

    /// A keyed vector with the same layout and new data.
    pub fn with_flat(&self, data: Array1<f64>) -> Result<Self> {
        Self::from_flat(Arc::clone(&self.layout), data)
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layout.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layout.names()
    }

    pub fn as_flat(&self) -> &Array1<f64> {
        &self.data
    }

    pub fn into_flat(self) -> Array1<f64> {
        self.data
    }

    /// View of a named entry with its declared shape.
    pub fn get(&self, name: &str) -> Result<ArrayViewD<'_, f64>> {
        view_entry(&self.layout, &self.data, name)
    }

    /// Value of a scalar (single-element) entry.
    pub fn scalar(&self, name: &str) -> Result<f64> {
        let view = self.get(name)?;
        scalar_of(name, view.iter().copied(), view.len())
    }

    /// Owned copy of every entry, with its declared shape, in layout order.
    pub fn to_values(&self) -> Result<Vec<(String, Value)>> {
        self.layout
            .names()
            .map(|name| Ok((name.to_string(), self.get(name)?.to_owned())))
            .collect()
    }
}

/// Borrow one named segment of `data` under `layout`.
pub(crate) fn view_entry<'a>(
    layout: &Layout,
    data: &'a Array1<f64>,
    name: &str,
) -> Result<ArrayViewD<'a, f64>> {
    let slot = layout
        .slot(name)
        .ok_or_else(|| ReparamError::ParameterNotFound(name.to_string()))?;
    data.slice(ndarray::s![slot.offset..slot.offset + slot.len])
        .into_shape(IxDyn(&slot.shape))
        .map_err(|e| ReparamError::DimensionMismatch(format!("{}: {}", name, e)))
}

pub(crate) fn scalar_of(name: &str, mut values: impl Iterator<Item = f64>, len: usize) -> Result<f64> {
    match (len, values.next()) {
        (1, Some(v)) => Ok(v),
        _ => Err(ReparamError::DimensionMismatch(format!(
            "Parameter '{}' has {} elements, expected a scalar",
            name, len
        ))),
    }
}

/// An ordered `name -> value` mapping in external (user-facing) form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NamedValues {
    entries: Vec<(String, Value)>,
}

impl NamedValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; later lookups return the first entry with a given name.
    pub fn push(&mut self, name: String, value: Value) {
        self.entries.push((name, value));
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, name: &str, value: impl IntoValue) -> Self {
        self.push(name.to_string(), value.into_value());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Value of a scalar entry, or `ParameterNotFound` / `DimensionMismatch`.
    pub fn scalar(&self, name: &str) -> Result<f64> {
        let value = self
            .get(name)
            .ok_or_else(|| ReparamError::ParameterNotFound(name.to_string()))?;
        scalar_of(name, value.iter().copied(), value.len())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl fmt::Display for NamedValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            if value.len() == 1 {
                if let Some(v) = value.iter().next() {
                    writeln!(f, "  {}: {:.6e}", name, v)?;
                    continue;
                }
            }
            writeln!(f, "  {}: {}", name, value)?;
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for KeyedVector {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct KeyedHelper {
            layout: Layout,
            data: Array1<f64>,
        }

        let helper = KeyedHelper::deserialize(deserializer)?;
        KeyedVector::from_flat(Arc::new(helper.layout), helper.data)
            .map_err(serde::de::Error::custom)
    }
}

impl Serialize for KeyedVector {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("KeyedVector", 2)?;
        state.serialize_field("layout", self.layout.as_ref())?;
        state.serialize_field("data", &self.data)?;
        state.end()
    }
}
