use serde::de::Deserializer;
use serde::Deserialize;

pub mod compiled;
pub mod semgrep;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Single(String),
    Multiple(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::Single(s) => vec![s],
            OneOrMany::Multiple(list) => list,
        }
    }
}

pub(crate) fn deserialize_languages<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<OneOrMany>::deserialize(deserializer)?;
    Ok(value.map(Vec::from))
}

/// Accepts `cwe: "CWE-89"` as well as `cwe: ["CWE-89", "CWE-564"]`.
pub(crate) fn deserialize_one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<OneOrMany>::deserialize(deserializer)?;
    Ok(value.map(Vec::from).unwrap_or_default())
}
