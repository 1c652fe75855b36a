use serde::Deserialize;
use std::io::Read;

pub const DEFAULT_BLOCK_DURATION_MS: u64 = 6_000;
pub const DEFAULT_PAST_LIMIT: u32 = 20;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AggregatorSettings {
    /// Expected time between two blocks, used to estimate end dates.
    pub block_duration_ms: u64,
    /// How many ended referenda the past run asks the indexer for.
    pub past_limit: u32,
    /// Prefix of the account explorer link, the account id is appended.
    pub account_link_base: Option<String>,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            block_duration_ms: DEFAULT_BLOCK_DURATION_MS,
            past_limit: DEFAULT_PAST_LIMIT,
            account_link_base: None,
        }
    }
}

impl AggregatorSettings {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    pub fn account_link(&self, account: &str) -> Option<String> {
        self.account_link_base
            .as_ref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings = AggregatorSettings::from_reader(r#"{ "pastLimit": 5 }"#.as_bytes()).unwrap();
        assert_eq!(settings.past_limit, 5);
        assert_eq!(settings.block_duration_ms, DEFAULT_BLOCK_DURATION_MS);
        assert_eq!(settings.account_link("a"), None);
    }

    #[test]
    fn account_links() {
        let settings = AggregatorSettings {
            account_link_base: Some("https://kusama.subscan.io/account/".into()),
            ..Default::default()
        };
        assert_eq!(
            settings.account_link("F3opx").as_deref(),
            Some("https://kusama.subscan.io/account/F3opx")
        );
    }
}
