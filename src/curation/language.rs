use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language quiz prompts are shown in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetLanguage {
    French,
    Spanish,
    German,
    Japanese,
}

impl TargetLanguage {
    pub const ALL: [TargetLanguage; 4] = [
        TargetLanguage::French,
        TargetLanguage::Spanish,
        TargetLanguage::German,
        TargetLanguage::Japanese,
    ];

    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            TargetLanguage::French => "fr",
            TargetLanguage::Spanish => "es",
            TargetLanguage::German => "de",
            TargetLanguage::Japanese => "ja",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TargetLanguage::French => "French",
            TargetLanguage::Spanish => "Spanish",
            TargetLanguage::German => "German",
            TargetLanguage::Japanese => "Japanese",
        }
    }

    pub fn flag(&self) -> &'static str {
        match self {
            TargetLanguage::French => "🇫🇷",
            TargetLanguage::Spanish => "🇪🇸",
            TargetLanguage::German => "🇩🇪",
            TargetLanguage::Japanese => "🇯🇵",
        }
    }
}

impl FromStr for TargetLanguage {
    type Err = String;

    /// Accepts a display name or ISO code, ignoring case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TargetLanguage::ALL
            .into_iter()
            .find(|lang| lang.code() == wanted || lang.display_name().to_lowercase() == wanted)
            .ok_or_else(|| format!("unsupported target language '{}'", s.trim()))
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_codes() {
        assert_eq!("French".parse::<TargetLanguage>().unwrap(), TargetLanguage::French);
        assert_eq!(" es ".parse::<TargetLanguage>().unwrap(), TargetLanguage::Spanish);
        assert_eq!("GERMAN".parse::<TargetLanguage>().unwrap(), TargetLanguage::German);
        assert_eq!("ja".parse::<TargetLanguage>().unwrap(), TargetLanguage::Japanese);
        assert!("xx".parse::<TargetLanguage>().is_err());
    }

    #[test]
    fn test_codes_round_trip_through_parse() {
        for lang in TargetLanguage::ALL {
            assert_eq!(lang.code().parse::<TargetLanguage>().unwrap(), lang);
            assert!(!lang.flag().is_empty());
        }
    }
}
