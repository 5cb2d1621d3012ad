/// Writing direction of a display language, used to lay out the transcript
/// text area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Ltr
    }
}

struct LanguageSpec {
    name: &'static str,
    code: &'static str,
    direction: Direction,
}

// Display languages the app ships, mapped to the engine's internal language
// codes. Lookup is by lowercase display name.
const LANGUAGES: &[LanguageSpec] = &[
    LanguageSpec { name: "arabic", code: "ar", direction: Direction::Rtl },
    LanguageSpec { name: "chinese", code: "zh", direction: Direction::Ltr },
    LanguageSpec { name: "english", code: "en", direction: Direction::Ltr },
    LanguageSpec { name: "french", code: "fr", direction: Direction::Ltr },
    LanguageSpec { name: "german", code: "de", direction: Direction::Ltr },
    LanguageSpec { name: "hebrew", code: "he", direction: Direction::Rtl },
    LanguageSpec { name: "hindi", code: "hi", direction: Direction::Ltr },
    LanguageSpec { name: "italian", code: "it", direction: Direction::Ltr },
    LanguageSpec { name: "japanese", code: "ja", direction: Direction::Ltr },
    LanguageSpec { name: "korean", code: "ko", direction: Direction::Ltr },
    LanguageSpec { name: "norwegian", code: "no", direction: Direction::Ltr },
    LanguageSpec { name: "polish", code: "pl", direction: Direction::Ltr },
    LanguageSpec { name: "portuguese", code: "pt", direction: Direction::Ltr },
    LanguageSpec { name: "russian", code: "ru", direction: Direction::Ltr },
    LanguageSpec { name: "spanish", code: "es", direction: Direction::Ltr },
    LanguageSpec { name: "swedish", code: "sv", direction: Direction::Ltr },
    LanguageSpec { name: "turkish", code: "tr", direction: Direction::Ltr },
    LanguageSpec { name: "ukrainian", code: "uk", direction: Direction::Ltr },
];

fn find(name: &str) -> Option<&'static LanguageSpec> {
    let lower = name.to_lowercase();
    LANGUAGES.iter().find(|spec| spec.name == lower)
}

/// Engine language code for a display language, or `None` when the language
/// is not in the table.
pub fn engine_code(display_name: &str) -> Option<&'static str> {
    find(display_name).map(|spec| spec.code)
}

/// Writing direction of a display language. Unknown languages default to
/// left-to-right.
pub fn direction(display_name: &str) -> Direction {
    find(display_name).map(|spec| spec.direction).unwrap_or_default()
}

pub fn supported_languages() -> impl Iterator<Item = &'static str> {
    LANGUAGES.iter().map(|spec| spec.name)
}
