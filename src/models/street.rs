use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a street, owned by the street directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreetId(pub i64);

impl fmt::Display for StreetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "street/{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Street {
    pub id: StreetId,
    pub name: String,

    /// Neighborhood / urbanization label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,

    pub active: bool,
}

impl Street {
    pub fn new(id: StreetId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            neighborhood: None,
            active: true,
        }
    }
}
