//! Language tag spellings.
//!
//! Historical rows spell the same language three ways: the display name
//! (`Spanish`), the lowercase internal name (`spanish`) and the ISO 639-1
//! code (`es`).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KnownLanguage {
    display: &'static str,
    name: &'static str,
    code: &'static str,
}

const fn known(
    display: &'static str, name: &'static str, code: &'static str,
) -> KnownLanguage {
    KnownLanguage {
        display,
        name,
        code,
    }
}

static LANGUAGES: &[KnownLanguage] = &[
    known("Arabic", "arabic", "ar"),
    known("Chinese", "chinese", "zh"),
    known("Dutch", "dutch", "nl"),
    known("English", "english", "en"),
    known("French", "french", "fr"),
    known("German", "german", "de"),
    known("Hindi", "hindi", "hi"),
    known("Italian", "italian", "it"),
    known("Japanese", "japanese", "ja"),
    known("Korean", "korean", "ko"),
    known("Polish", "polish", "pl"),
    known("Portuguese", "portuguese", "pt"),
    known("Russian", "russian", "ru"),
    known("Spanish", "spanish", "es"),
    known("Turkish", "turkish", "tr"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageTag {
    Known {
        display: &'static str,
        name: &'static str,
        code: &'static str,
    },
    Unknown(String),
}

impl LanguageTag {
    /// Resolves any of the three spellings, case-insensitively.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        LANGUAGES
            .iter()
            .find(|lang| {
                trimmed.eq_ignore_ascii_case(lang.name)
                    || trimmed.eq_ignore_ascii_case(lang.code)
            })
            .map(|lang| Self::Known {
                display: lang.display,
                name: lang.name,
                code: lang.code,
            })
            .unwrap_or_else(|| Self::Unknown(trimmed.to_string()))
    }

    /// Lowercase internal name, the spelling topics are stored under.
    pub fn name(&self) -> String {
        match self {
            Self::Known { name, .. } => (*name).to_string(),
            Self::Unknown(raw) => raw.to_lowercase(),
        }
    }

    /// Every distinct spelling to query legacy tables with.
    pub fn variants(&self) -> Vec<String> {
        let candidates = match self {
            Self::Known {
                display,
                name,
                code,
            } => {
                vec![display.to_string(), name.to_string(), code.to_string()]
            }
            Self::Unknown(raw) => vec![raw.clone(), raw.to_lowercase()],
        };

        let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !candidate.is_empty() && !variants.contains(&candidate) {
                variants.push(candidate);
            }
        }
        variants
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known { display, .. } => f.write_str(display),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}
