use serde::{de::Error, Deserialize, Deserializer};

/// Indices and version numbers are not encoded consistently across sources,
/// some send them as numbers and some as numeric strings.
pub fn deserialize_number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Int(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(value) => u32::try_from(value)
            .map_err(|_| D::Error::custom(format!("{} does not fit into u32", value))),
        NumberOrString::String(value) => value
            .trim()
            .parse::<u32>()
            .map_err(|e| D::Error::custom(format!("invalid number {:?}: {}", value, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize, Debug)]
    struct Indexed {
        #[serde(deserialize_with = "deserialize_number_or_string")]
        index: u32,
    }

    #[test]
    fn accepts_numbers_and_strings() {
        let from_number: Indexed = serde_json::from_value(json!({ "index": 226 })).unwrap();
        let from_string: Indexed = serde_json::from_value(json!({ "index": "226" })).unwrap();
        assert_eq!(from_number.index, 226);
        assert_eq!(from_string.index, 226);
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_value::<Indexed>(json!({ "index": "ref-226" })).is_err());
        assert!(serde_json::from_value::<Indexed>(json!({ "index": -1 })).is_err());
        assert!(serde_json::from_value::<Indexed>(json!({ "index": 5_000_000_000u64 })).is_err());
    }
}
