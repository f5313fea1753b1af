use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::DeskError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Student {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub group: i32,
}

/// A validated insert request. Construction parses the group number, so a
/// `NewStudent` never carries a non-numeric group.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub group: i32,
}

impl NewStudent {
    pub fn parse(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        group: &str,
    ) -> Result<Self, DeskError> {
        let group = group
            .trim()
            .parse::<i32>()
            .map_err(|_| DeskError::InvalidNumericInput(group.to_string()))?;
        Ok(Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            group,
        })
    }
}
