use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParentType {
    Root,
    OrganizationalUnit,
}

/// A node an account can hang under: the organization root or an OU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParentContainer {
    pub id: String,
    #[serde(rename = "Type")]
    pub parent_type: ParentType,
}

impl ParentContainer {
    pub fn root(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_type: ParentType::Root,
        }
    }

    pub fn organizational_unit(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_type: ParentType::OrganizationalUnit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Root {
    pub id: String,
    #[serde(default)]
    pub arn: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Outcome of a relocation. `changed` is false when the account was
/// already under the destination and no move was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveResult {
    pub changed: bool,
    pub account_id: String,
    pub from_parent_id: String,
    pub to_parent_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_deserializes_provider_payload() {
        let parents: Vec<ParentContainer> = serde_json::from_value(serde_json::json!([
            { "Id": "r-ab12", "Type": "ROOT" },
            { "Id": "ou-ab12-11111111", "Type": "ORGANIZATIONAL_UNIT" }
        ]))
        .unwrap();

        assert_eq!(parents[0], ParentContainer::root("r-ab12"));
        assert_eq!(
            parents[1],
            ParentContainer::organizational_unit("ou-ab12-11111111")
        );
    }
}
