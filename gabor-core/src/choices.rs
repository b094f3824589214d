use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;

/// The set of keys accepted as a response. Keys are compared after
/// normalization (see [`normalize_key`]); order is irrelevant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choices {
    All,
    Keys(BTreeSet<String>),
}

impl Choices {
    pub fn none() -> Self {
        Choices::Keys(BTreeSet::new())
    }

    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Choices::Keys(keys.into_iter().map(|k| normalize_key(k.as_ref())).collect())
    }

    pub fn accepts(&self, key: &str) -> bool {
        match self {
            Choices::All => true,
            Choices::Keys(keys) => keys.contains(&normalize_key(key)),
        }
    }

    /// True when no key press can ever qualify as a response.
    pub fn is_empty(&self) -> bool {
        matches!(self, Choices::Keys(keys) if keys.is_empty())
    }
}

impl Default for Choices {
    fn default() -> Self {
        Choices::keys([" "])
    }
}

/// Single characters are lower-cased, named keys ("Enter", "ArrowLeft")
/// likewise. The space key stays `" "`.
pub fn normalize_key(key: &str) -> String {
    if key == " " {
        return key.to_string();
    }
    key.trim().to_lowercase()
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ChoicesRepr {
    Sentinel(String),
    List(Vec<String>),
}

impl Serialize for Choices {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Choices::All => ChoicesRepr::Sentinel("ALL_KEYS".to_string()).serialize(serializer),
            Choices::Keys(keys) => {
                ChoicesRepr::List(keys.iter().cloned().collect()).serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Choices {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match ChoicesRepr::deserialize(deserializer)? {
            ChoicesRepr::Sentinel(s) if s == "ALL_KEYS" => Ok(Choices::All),
            ChoicesRepr::Sentinel(s) if s == "NO_KEYS" => Ok(Choices::none()),
            ChoicesRepr::Sentinel(other) => Err(serde::de::Error::custom(format!(
                "choices must be a list of keys, \"ALL_KEYS\" or \"NO_KEYS\", got `{other}`"
            ))),
            ChoicesRepr::List(keys) => Ok(Choices::keys(keys)),
        }
    }
}
