//! Ordered parameter set
//!
//! A [`ParameterSet`] maps parameter names to [`Annotation`]s. Declaration
//! order is the canonical order used when named results are rebuilt, and a
//! name can only be declared once.

use crate::error::{ReparamError, Result};
use crate::parameters::annotation::{Annotation, Constraint, IntoValue};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// An insertion-ordered collection of annotated parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParameterSet {
    params: Vec<(String, Annotation)>,
}

impl ParameterSet {
    /// Create a new empty parameter set
    ///
    /// # Examples
    ///
    /// ```
    /// use reparam_rs::parameters::ParameterSet;
    ///
    /// let params = ParameterSet::new();
    /// assert_eq!(params.len(), 0);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an annotated parameter
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the parameter
    /// * `annotation` - The declared value and its treatment
    ///
    /// # Returns
    ///
    /// `Ok(())` if the parameter was added, or `DuplicateParameter` if the name
    /// was already declared
    ///
    /// # Examples
    ///
    /// ```
    /// use reparam_rs::parameters::{Annotation, ParameterSet};
    ///
    /// let mut params = ParameterSet::new();
    /// params.add("amplitude", Annotation::positive(3.0)).unwrap();
    /// assert!(params.add("amplitude", Annotation::fixed(1.0)).is_err());
    /// ```
    pub fn add(&mut self, name: &str, annotation: Annotation) -> Result<()> {
        if self.contains(name) {
            return Err(ReparamError::DuplicateParameter {
                name: name.to_string(),
            });
        }
        self.params.push((name.to_string(), annotation));
        Ok(())
    }

    /// Declare a free parameter, builder style.
    ///
    /// # Examples
    ///
    /// ```
    /// use reparam_rs::parameters::ParameterSet;
    ///
    /// let params = ParameterSet::new()
    ///     .positive("a", 4.0).unwrap()
    ///     .fixed("b", 2.0).unwrap()
    ///     .free("c", 1.0).unwrap();
    /// assert_eq!(params.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    /// ```
    pub fn free(mut self, name: &str, value: impl IntoValue) -> Result<Self> {
        self.add(name, Annotation::free(value))?;
        Ok(self)
    }

    /// Declare a fixed parameter, builder style.
    pub fn fixed(mut self, name: &str, value: impl IntoValue) -> Result<Self> {
        self.add(name, Annotation::fixed(value))?;
        Ok(self)
    }

    /// Declare a positive parameter, builder style.
    pub fn positive(mut self, name: &str, value: impl IntoValue) -> Result<Self> {
        self.add(name, Annotation::positive(value))?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Annotation> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    pub fn constraint(&self, name: &str) -> Option<Constraint> {
        self.get(name).map(Annotation::constraint)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameter names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Annotation)> {
        self.params.iter().map(|(n, a)| (n.as_str(), a))
    }

    /// Number of scalars the optimizer will search over.
    pub fn optimizable_len(&self) -> usize {
        self.params
            .iter()
            .filter(|(_, a)| a.constraint().is_optimized())
            .map(|(_, a)| a.value().len())
            .sum()
    }

    /// Save the parameter set to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a parameter set from a JSON file
    ///
    /// Names are re-validated, so a file declaring the same name twice is rejected.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawParameterSet = serde_json::from_str(json)?;
        let mut params = ParameterSet::new();
        for (name, annotation) in raw.params {
            params.add(&name, annotation)?;
        }
        Ok(params)
    }
}

#[derive(Deserialize)]
struct RawParameterSet {
    params: Vec<(String, Annotation)>,
}

impl<'de> Deserialize<'de> for ParameterSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawParameterSet::deserialize(deserializer)?;
        let mut seen = HashSet::new();
        for (name, _) in &raw.params {
            if !seen.insert(name.as_str()) {
                return Err(serde::de::Error::custom(format!(
                    "parameter '{}' is declared more than once",
                    name
                )));
            }
        }
        Ok(ParameterSet { params: raw.params })
    }
}
