//! Shared types for resolving Turkish postal addresses.
//!
//! The resolver crates pass three things around: raw gazetteer rows read
//! from the source table, the administrative level a name belongs to, and
//! the resolved [`Address`]. The address shape is the contract with any
//! other resolution strategy (for example a trained tagger), so it stays a
//! plain serde record with optional fields.
//!
//! ```rust
//! use adres_types::{Address, AdminLevel, GazetteerRow};
//!
//! let row = GazetteerRow::from_fields(&["İSTANBUL", "KADIKÖY", "34710", "CAFERAĞA MAH"]).unwrap();
//! assert_eq!(row.district, "KADIKÖY");
//!
//! let addr = Address::unresolved("Caferağa Mah.");
//! assert!(addr.get(AdminLevel::Province).is_none());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Column of the province name in a gazetteer source row.
pub const PROVINCE_COL: usize = 0;
/// Column of the district name in a gazetteer source row.
pub const DISTRICT_COL: usize = 1;
/// Column of the neighbourhood name in a gazetteer source row.
pub const NEIGHBOURHOOD_COL: usize = 3;

/// Administrative level, from the widest to the narrowest.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminLevel {
    Province,
    District,
    Neighbourhood,
}

impl AdminLevel {
    pub const ALL: [AdminLevel; 3] = [
        AdminLevel::Province,
        AdminLevel::District,
        AdminLevel::Neighbourhood,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AdminLevel::Province => "province",
            AdminLevel::District => "district",
            AdminLevel::Neighbourhood => "neighbourhood",
        }
    }

    /// Parse the lowercase name used in logs and query strings.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "province" | "il" => Some(AdminLevel::Province),
            "district" | "ilce" | "ilçe" => Some(AdminLevel::District),
            "neighbourhood" | "neighborhood" | "mahalle" => Some(AdminLevel::Neighbourhood),
            _ => None,
        }
    }
}

impl fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw row of the gazetteer source table, trimmed but not normalized.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GazetteerRow {
    pub province: String,
    pub district: String,
    pub neighbourhood: String,
}

impl GazetteerRow {
    /// Build a row from already-trimmed parts, rejecting blank fields.
    pub fn new(province: &str, district: &str, neighbourhood: &str) -> Option<Self> {
        let (province, district, neighbourhood) =
            (province.trim(), district.trim(), neighbourhood.trim());
        if province.is_empty() || district.is_empty() || neighbourhood.is_empty() {
            return None;
        }
        Some(Self {
            province: province.to_string(),
            district: district.to_string(),
            neighbourhood: neighbourhood.to_string(),
        })
    }

    /// Pick the province, district and neighbourhood columns out of a
    /// positional record. Short records and blank fields yield `None`.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Option<Self> {
        let province = fields.get(PROVINCE_COL)?.as_ref();
        let district = fields.get(DISTRICT_COL)?.as_ref();
        let neighbourhood = fields.get(NEIGHBOURHOOD_COL)?.as_ref();
        Self::new(province, district, neighbourhood)
    }
}

/// Resolution result. Every field except `original_text` may be absent.
///
/// `original_text` is always the caller's input, byte for byte.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub province: Option<String>,
    pub district: Option<String>,
    pub neighbourhood: Option<String>,
    pub original_text: String,
}

impl Address {
    /// An address with nothing resolved.
    pub fn unresolved(original_text: impl Into<String>) -> Self {
        Self {
            original_text: original_text.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, level: AdminLevel) -> Option<&str> {
        match level {
            AdminLevel::Province => self.province.as_deref(),
            AdminLevel::District => self.district.as_deref(),
            AdminLevel::Neighbourhood => self.neighbourhood.as_deref(),
        }
    }

    pub fn set(&mut self, level: AdminLevel, value: Option<String>) {
        match level {
            AdminLevel::Province => self.province = value,
            AdminLevel::District => self.district = value,
            AdminLevel::Neighbourhood => self.neighbourhood = value,
        }
    }

    /// Levels that carry a value, widest first.
    pub fn resolved_levels(&self) -> Vec<AdminLevel> {
        AdminLevel::ALL
            .into_iter()
            .filter(|level| self.get(*level).is_some())
            .collect()
    }

    pub fn is_unresolved(&self) -> bool {
        self.province.is_none() && self.district.is_none() && self.neighbourhood.is_none()
    }
}
