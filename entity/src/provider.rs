use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Email service providers a key can belong to. Stored as a Postgres enum,
/// rendered lowercase on the wire and in default key names.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    EnumIter,
    Deserialize,
    Serialize,
    DeriveActiveEnum,
    Default,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "esp_provider")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[sea_orm(string_value = "mailchimp")]
    #[default]
    Mailchimp,
    #[sea_orm(string_value = "getresponse")]
    Getresponse,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mailchimp => write!(f, "mailchimp"),
            Self::Getresponse => write!(f, "getresponse"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ProviderParseError;

impl FromStr for Provider {
    type Err = ProviderParseError;

    fn from_str(tag: &str) -> Result<Provider, Self::Err> {
        match tag.to_lowercase().as_str() {
            "mailchimp" => Ok(Provider::Mailchimp),
            "getresponse" => Ok(Provider::Getresponse),
            _ => Err(ProviderParseError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_stored_tag() {
        assert_eq!(Provider::Mailchimp.to_string(), "mailchimp");
        assert_eq!(Provider::Getresponse.to_string(), "getresponse");
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Mailchimp".parse::<Provider>(), Ok(Provider::Mailchimp));
        assert_eq!("GETRESPONSE".parse::<Provider>(), Ok(Provider::Getresponse));
        assert_eq!("sendgrid".parse::<Provider>(), Err(ProviderParseError));
    }
}
