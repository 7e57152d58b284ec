//! Breaking change categories that group related rules

use serde::{Deserialize, Serialize};

/// Breaking change categories that group related rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreakingCategory {
    /// OPERATION category - operations that disappear from the API
    Operation,
    /// REQUEST category - stricter inputs that existing callers do not send
    Request,
    /// RESPONSE category - outputs that existing callers rely on
    Response,
    /// SCHEMA category - incompatible type and constraint changes of any schema
    Schema,
}

impl BreakingCategory {
    /// Get the string identifier for this category
    pub fn id(&self) -> &'static str {
        match self {
            BreakingCategory::Operation => "OPERATION",
            BreakingCategory::Request => "REQUEST",
            BreakingCategory::Response => "RESPONSE",
            BreakingCategory::Schema => "SCHEMA",
        }
    }

    /// Get the description for this category
    pub fn description(&self) -> &'static str {
        match self {
            BreakingCategory::Operation => {
                "Checks that no operation (path and method) is removed."
            }
            BreakingCategory::Request => {
                "Checks that requests accepted by the old API are still accepted."
            }
            BreakingCategory::Response => {
                "Checks that responses still carry everything the old API returned."
            }
            BreakingCategory::Schema => {
                "Checks that schema types and constraints are not narrowed."
            }
        }
    }

    /// Parse category from string ID
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "OPERATION" => Some(BreakingCategory::Operation),
            "REQUEST" => Some(BreakingCategory::Request),
            "RESPONSE" => Some(BreakingCategory::Response),
            "SCHEMA" => Some(BreakingCategory::Schema),
            _ => None,
        }
    }

    /// Get all available categories
    pub fn all() -> Vec<Self> {
        vec![
            BreakingCategory::Operation,
            BreakingCategory::Request,
            BreakingCategory::Response,
            BreakingCategory::Schema,
        ]
    }
}

impl std::fmt::Display for BreakingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for BreakingCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| format!("Unknown breaking category: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_ids_round_trip() {
        for category in BreakingCategory::all() {
            assert_eq!(category.id().parse::<BreakingCategory>(), Ok(category));
        }
        assert!("FILE".parse::<BreakingCategory>().is_err());
    }
}
