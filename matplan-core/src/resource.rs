//! Resource identities shared by requirements, the ledger, and persistence.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{ASCENSION_ID_PREFIX, CURRENCY_ID, EMBER_ID_PREFIX, SKILL_ID_PREFIX};

/// Catalog identity of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ember tier, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmberTier {
    Bronze,
    Silver,
    Gold,
}

impl EmberTier {
    pub const ALL: [Self; 3] = [Self::Bronze, Self::Silver, Self::Gold];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze Ember",
            Self::Silver => "Silver Ember",
            Self::Gold => "Gold Ember",
        }
    }
}

/// Which progression axis produced a catalog material requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Ascension,
    Skill,
}

impl SourceKind {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Ascension => ASCENSION_ID_PREFIX,
            Self::Skill => SKILL_ID_PREFIX,
        }
    }
}

/// Pre-merge identity of a requirement line.
///
/// Serialized as the composite string form (`"qp"`, `"ember-gold"`,
/// `"ascension-6503"`, `"skill-6503"`, or a bare item id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RawResourceId {
    Currency,
    Ember(EmberTier),
    CatalogItem {
        id: ItemId,
        source: Option<SourceKind>,
    },
}

impl RawResourceId {
    #[must_use]
    pub const fn ascension(id: ItemId) -> Self {
        Self::CatalogItem {
            id,
            source: Some(SourceKind::Ascension),
        }
    }

    #[must_use]
    pub const fn skill(id: ItemId) -> Self {
        Self::CatalogItem {
            id,
            source: Some(SourceKind::Skill),
        }
    }

    /// Catalog identity, if this line refers to a catalog item.
    #[must_use]
    pub const fn item_id(&self) -> Option<ItemId> {
        match self {
            Self::CatalogItem { id, .. } => Some(*id),
            Self::Currency | Self::Ember(_) => None,
        }
    }

    /// Identity with the provenance tag stripped; used as the ledger key.
    #[must_use]
    pub fn ledger_key(&self) -> String {
        match self {
            Self::Currency => CURRENCY_ID.to_string(),
            Self::Ember(tier) => format!("{EMBER_ID_PREFIX}{}", tier.key()),
            Self::CatalogItem { id, .. } => id.to_string(),
        }
    }
}

impl fmt::Display for RawResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CatalogItem {
                id,
                source: Some(kind),
            } => write!(f, "{}{id}", kind.prefix()),
            other => f.write_str(&other.ledger_key()),
        }
    }
}

/// Raised when a resource id string has none of the known shapes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized resource id `{0}`")]
pub struct ResourceIdError(pub String);

impl FromStr for RawResourceId {
    type Err = ResourceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == CURRENCY_ID {
            return Ok(Self::Currency);
        }
        if let Some(tier) = trimmed.strip_prefix(EMBER_ID_PREFIX) {
            return EmberTier::ALL
                .into_iter()
                .find(|candidate| candidate.key() == tier)
                .map(Self::Ember)
                .ok_or_else(|| ResourceIdError(s.to_string()));
        }
        let (source, digits) = if let Some(rest) = trimmed.strip_prefix(ASCENSION_ID_PREFIX) {
            (Some(SourceKind::Ascension), rest)
        } else if let Some(rest) = trimmed.strip_prefix(SKILL_ID_PREFIX) {
            (Some(SourceKind::Skill), rest)
        } else {
            (None, trimmed)
        };
        digits
            .parse::<u32>()
            .map(|raw| Self::CatalogItem {
                id: ItemId(raw),
                source,
            })
            .map_err(|_| ResourceIdError(s.to_string()))
    }
}

impl From<RawResourceId> for String {
    fn from(value: RawResourceId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for RawResourceId {
    type Error = ResourceIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_composite_shape() {
        assert_eq!("qp".parse::<RawResourceId>(), Ok(RawResourceId::Currency));
        assert_eq!(
            "ember-silver".parse::<RawResourceId>(),
            Ok(RawResourceId::Ember(EmberTier::Silver))
        );
        assert_eq!(
            "ascension-6503".parse::<RawResourceId>(),
            Ok(RawResourceId::ascension(ItemId(6503)))
        );
        assert_eq!(
            "skill-6503".parse::<RawResourceId>(),
            Ok(RawResourceId::skill(ItemId(6503)))
        );
        assert_eq!(
            "6503".parse::<RawResourceId>(),
            Ok(RawResourceId::CatalogItem {
                id: ItemId(6503),
                source: None
            })
        );
    }

    #[test]
    fn rejects_unknown_shapes() {
        assert!("ember-platinum".parse::<RawResourceId>().is_err());
        assert!("skill-".parse::<RawResourceId>().is_err());
        assert!("proof".parse::<RawResourceId>().is_err());
    }

    #[test]
    fn ledger_key_strips_provenance() {
        assert_eq!(RawResourceId::ascension(ItemId(7)).ledger_key(), "7");
        assert_eq!(RawResourceId::skill(ItemId(7)).to_string(), "skill-7");
        assert_eq!(RawResourceId::Ember(EmberTier::Gold).ledger_key(), "ember-gold");
        assert_eq!(RawResourceId::Currency.to_string(), "qp");
    }

    #[test]
    fn serializes_as_composite_string() {
        let json = serde_json::to_string(&RawResourceId::skill(ItemId(42))).unwrap();
        assert_eq!(json, "\"skill-42\"");
        let back: RawResourceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RawResourceId::skill(ItemId(42)));
    }
}
