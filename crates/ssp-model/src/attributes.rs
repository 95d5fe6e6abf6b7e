//! Federated attribute sets.
//!
//! Attributes are released by an identity provider after a successful login.
//! Names are provider-defined (an LDAP attribute such as `mail`, or a claim
//! URI for WS-Federation/ADFS); every attribute is multi-valued.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Attribute name to ordered values, as released by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FederatedAttributeSet {
    attributes: HashMap<String, Vec<String>>,
}

impl FederatedAttributeSet {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single-valued attribute.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), vec![value.into()]);
        self
    }

    /// Sets all values of an attribute.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.attributes.insert(name.into(), values);
    }

    /// Gets all values of an attribute.
    #[must_use]
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    /// Gets the first non-blank value of an attribute.
    ///
    /// An attribute that is absent, has no values, or whose first value is
    /// blank is reported as `None`.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Checks if an attribute is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Returns the attribute names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Checks if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl From<HashMap<String, Vec<String>>> for FederatedAttributeSet {
    fn from(attributes: HashMap<String, Vec<String>>) -> Self {
        Self { attributes }
    }
}

impl<K, V> FromIterator<(K, Vec<V>)> for FederatedAttributeSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Vec<V>)>>(iter: I) -> Self {
        let attributes = iter
            .into_iter()
            .map(|(k, vs)| (k.into(), vs.into_iter().map(Into::into).collect()))
            .collect();
        Self { attributes }
    }
}
