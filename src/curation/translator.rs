use super::language::TargetLanguage;
use crate::classifier::normalize_label;
use crate::error::{CapabilityError, LingoLensError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, trace};

/// Text translation capability: one English label in, one prompt out
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        label: &str,
        language: TargetLanguage,
    ) -> std::result::Result<String, CapabilityError>;

    /// Whether the capability can be used at all on this host
    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str;
}

const BUILTIN_DICTIONARY: &[(&str, [&str; 4])] = &[
    // label, [french, spanish, german, japanese]
    ("chair", ["chaise", "silla", "Stuhl", "椅子"]),
    ("table", ["table", "mesa", "Tisch", "テーブル"]),
    ("cup", ["tasse", "taza", "Tasse", "カップ"]),
    ("bottle", ["bouteille", "botella", "Flasche", "ボトル"]),
    ("laptop", ["ordinateur portable", "portátil", "Laptop", "ノートパソコン"]),
    ("book", ["livre", "libro", "Buch", "本"]),
    ("person", ["personne", "persona", "Person", "人"]),
    ("dog", ["chien", "perro", "Hund", "犬"]),
    ("cat", ["chat", "gato", "Katze", "猫"]),
    ("phone", ["téléphone", "teléfono", "Telefon", "電話"]),
    ("lamp", ["lampe", "lámpara", "Lampe", "ランプ"]),
    ("plant", ["plante", "planta", "Pflanze", "植物"]),
    ("window", ["fenêtre", "ventana", "Fenster", "窓"]),
    ("door", ["porte", "puerta", "Tür", "ドア"]),
    ("keyboard", ["clavier", "teclado", "Tastatur", "キーボード"]),
    ("clock", ["horloge", "reloj", "Uhr", "時計"]),
    ("bag", ["sac", "bolsa", "Tasche", "かばん"]),
    ("shoe", ["chaussure", "zapato", "Schuh", "靴"]),
    ("apple", ["pomme", "manzana", "Apfel", "りんご"]),
    ("sofa", ["canapé", "sofá", "Sofa", "ソファ"]),
];

/// Offline translator backed by a word list.
///
/// Labels missing from the dictionary fail to translate and are dropped by
/// the quiz builder.
pub struct DictionaryTranslator {
    entries: HashMap<TargetLanguage, HashMap<String, String>>,
}

impl DictionaryTranslator {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Dictionary covering common household objects in every language
    pub fn builtin() -> Self {
        let mut translator = Self::new();
        for (label, prompts) in BUILTIN_DICTIONARY {
            for (language, prompt) in TargetLanguage::ALL.into_iter().zip(prompts.iter()) {
                translator.insert(language, label, prompt);
            }
        }
        translator
    }

    /// Built-in dictionary extended by a TOML file of `[language] label = "prompt"` tables
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let tables: HashMap<String, HashMap<String, String>> = toml::from_str(&contents)?;

        let mut translator = Self::builtin();
        for (language, words) in tables {
            let language: TargetLanguage = language
                .parse()
                .map_err(|e: String| LingoLensError::component("dictionary", e.as_str()))?;
            for (label, prompt) in words {
                translator.insert(language, &label, &prompt);
            }
        }

        debug!(
            "Loaded translation dictionary from {}",
            path.as_ref().display()
        );
        Ok(translator)
    }

    pub fn insert(&mut self, language: TargetLanguage, label: &str, prompt: &str) {
        self.entries
            .entry(language)
            .or_default()
            .insert(normalize_label(label), prompt.trim().to_string());
    }

    pub fn len(&self, language: TargetLanguage) -> usize {
        self.entries.get(&language).map(HashMap::len).unwrap_or(0)
    }
}

impl Default for DictionaryTranslator {
    fn default() -> Self {
        Self::builtin()
    }
}

#[async_trait]
impl Translator for DictionaryTranslator {
    async fn translate(
        &self,
        label: &str,
        language: TargetLanguage,
    ) -> std::result::Result<String, CapabilityError> {
        let key = normalize_label(label);
        let prompt = self
            .entries
            .get(&language)
            .and_then(|words| words.get(&key))
            .cloned();

        trace!("Dictionary lookup {} ({}) -> {:?}", key, language.code(), prompt);

        prompt.ok_or_else(|| CapabilityError::Failed {
            capability: "translation",
            details: format!("no {} entry for '{}'", language.display_name(), key),
        })
    }

    fn name(&self) -> &str {
        "dictionary"
    }
}
