use crate::catalog::Level;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreferenceError {
    #[error("name must not be blank")]
    MissingName,
}

/// Structured preferences submitted by a learner. Only field of study and level are scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub name: String,
    pub field_of_study: String,
    pub level: Level,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
}

impl Preferences {
    pub fn validate(&self) -> Result<(), PreferenceError> {
        if self.name.trim().is_empty() {
            return Err(PreferenceError::MissingName);
        }
        Ok(())
    }

    /// "<field_of_study> <level>"
    pub fn to_query(&self) -> String {
        format!("{} {}", self.field_of_study.trim(), self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs(name: &str) -> Preferences {
        Preferences {
            name: name.into(),
            field_of_study: "Data Science".into(),
            level: Level::Intermediate,
            duration: Some("1-3 months".into()),
            mode: Some("Online".into()),
        }
    }

    #[test]
    fn synthesizes_query_from_field_and_level() {
        assert_eq!(prefs("Ada").to_query(), "Data Science Intermediate");
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(prefs("  ").validate(), Err(PreferenceError::MissingName));
        assert!(prefs("Ada").validate().is_ok());
    }
}
