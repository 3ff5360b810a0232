//! Plural categories and the languages that require them.

use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    str::FromStr,
};

use serde::{Deserialize, Serialize};

/// CLDR plural category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub const ALL: [PluralCategory; 6] = [
        PluralCategory::Zero,
        PluralCategory::One,
        PluralCategory::Two,
        PluralCategory::Few,
        PluralCategory::Many,
        PluralCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluralCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PluralCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown plural category {:?}", s))
    }
}

/// How integer counts map onto categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralRule {
    /// one: 1; other.
    English,
    /// one: 0 and 1; other.
    French,
    /// other only.
    EastAsian,
    /// one: n%10=1 except 11; few: n%10=2..4 except 12..14; many; other.
    Russian,
    /// one: 1; few: n%10=2..4 except 12..14; many; other.
    Polish,
    /// one: 1; few: 2..4; other.
    Czech,
    /// zero: 0; one: 1; two: 2; few: n%100=3..10; many: n%100=11..99; other.
    Arabic,
}

impl PluralRule {
    pub fn categories(&self) -> BTreeSet<PluralCategory> {
        use PluralCategory::*;
        let cats: &[PluralCategory] = match self {
            PluralRule::English | PluralRule::French => &[One, Other],
            PluralRule::EastAsian => &[Other],
            PluralRule::Russian | PluralRule::Polish => &[One, Few, Many, Other],
            PluralRule::Czech => &[One, Few, Other],
            PluralRule::Arabic => &[Zero, One, Two, Few, Many, Other],
        };
        cats.iter().copied().collect()
    }

    /// Category for an integer count; negative counts use their magnitude.
    pub fn select(&self, count: i64) -> PluralCategory {
        use PluralCategory::*;
        let n = count.unsigned_abs();
        let (m10, m100) = (n % 10, n % 100);
        match self {
            PluralRule::English => {
                if n == 1 {
                    One
                } else {
                    Other
                }
            }
            PluralRule::French => {
                if n <= 1 {
                    One
                } else {
                    Other
                }
            }
            PluralRule::EastAsian => Other,
            PluralRule::Russian => {
                if m10 == 1 && m100 != 11 {
                    One
                } else if (2..=4).contains(&m10) && !(12..=14).contains(&m100) {
                    Few
                } else {
                    Many
                }
            }
            PluralRule::Polish => {
                if n == 1 {
                    One
                } else if (2..=4).contains(&m10) && !(12..=14).contains(&m100) {
                    Few
                } else {
                    Many
                }
            }
            PluralRule::Czech => match n {
                1 => One,
                2..=4 => Few,
                _ => Other,
            },
            PluralRule::Arabic => match (n, m100) {
                (0, _) => Zero,
                (1, _) => One,
                (2, _) => Two,
                (_, 3..=10) => Few,
                (_, 11..=99) => Many,
                _ => Other,
            },
        }
    }
}

/// A language tag together with the plural categories it requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    pub tag: String,
    pub plurals: BTreeSet<PluralCategory>,
    pub rule: PluralRule,
}

impl Language {
    pub fn new(tag: impl Into<String>, rule: PluralRule) -> Self {
        Self {
            tag: tag.into(),
            plurals: rule.categories(),
            rule,
        }
    }

    pub fn requires(&self, category: PluralCategory) -> bool {
        self.plurals.contains(&category)
    }

    /// Category a count selects, limited to the categories this language
    /// requires.
    pub fn plural_category(&self, count: i64) -> PluralCategory {
        let category = self.rule.select(count);
        if self.requires(category) {
            category
        } else {
            PluralCategory::Other
        }
    }
}

/// Read-only source of plural requirements per language.
pub trait LocaleDirectory {
    fn language(&self, tag: &str) -> Option<Language>;

    fn required_categories(&self, tag: &str) -> Option<BTreeSet<PluralCategory>> {
        self.language(tag).map(|language| language.plurals)
    }
}

/// Primary subtag → rule.
const BUILTIN_RULES: &[(&str, PluralRule)] = &[
    ("en", PluralRule::English),
    ("de", PluralRule::English),
    ("nl", PluralRule::English),
    ("sv", PluralRule::English),
    ("da", PluralRule::English),
    ("nb", PluralRule::English),
    ("no", PluralRule::English),
    ("fi", PluralRule::English),
    ("et", PluralRule::English),
    ("it", PluralRule::English),
    ("es", PluralRule::English),
    ("ca", PluralRule::English),
    ("el", PluralRule::English),
    ("hu", PluralRule::English),
    ("tr", PluralRule::English),
    ("bg", PluralRule::English),
    ("fr", PluralRule::French),
    ("pt", PluralRule::French),
    ("hi", PluralRule::French),
    ("ja", PluralRule::EastAsian),
    ("zh", PluralRule::EastAsian),
    ("ko", PluralRule::EastAsian),
    ("vi", PluralRule::EastAsian),
    ("th", PluralRule::EastAsian),
    ("id", PluralRule::EastAsian),
    ("ms", PluralRule::EastAsian),
    ("ru", PluralRule::Russian),
    ("uk", PluralRule::Russian),
    ("be", PluralRule::Russian),
    ("pl", PluralRule::Polish),
    ("cs", PluralRule::Czech),
    ("sk", PluralRule::Czech),
    ("ar", PluralRule::Arabic),
];

/// Built-in table of common languages.
///
/// Tags are matched case-insensitively, `_` and `-` alike, first as a whole
/// and then by primary subtag (`pt-BR` → `pt`).
#[derive(Debug, Clone, Default)]
pub struct BuiltinLocales {
    overrides: HashMap<String, BTreeSet<PluralCategory>>,
}

impl BuiltinLocales {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the required categories of `tag` (or adds an unknown tag).
    pub fn with_override(
        mut self,
        tag: &str,
        plurals: impl IntoIterator<Item = PluralCategory>,
    ) -> Self {
        self.overrides
            .insert(normalize_tag(tag), plurals.into_iter().collect());
        self
    }

    fn rule_for(tag: &str) -> Option<PluralRule> {
        let primary = tag.split('-').next().unwrap_or(tag);
        [tag, primary].into_iter().find_map(|candidate| {
            BUILTIN_RULES
                .iter()
                .find(|(t, _)| *t == candidate)
                .map(|(_, rule)| *rule)
        })
    }
}

impl LocaleDirectory for BuiltinLocales {
    fn language(&self, tag: &str) -> Option<Language> {
        let normalized = normalize_tag(tag);
        let primary = normalized.split('-').next().unwrap_or(&normalized);
        let overridden = self
            .overrides
            .get(&normalized)
            .or_else(|| self.overrides.get(primary));
        let rule = Self::rule_for(&normalized);
        match (overridden, rule) {
            (Some(plurals), rule) => Some(Language {
                tag: tag.to_string(),
                plurals: plurals.clone(),
                rule: rule.unwrap_or(PluralRule::EastAsian),
            }),
            (None, Some(rule)) => Some(Language::new(tag, rule)),
            (None, None) => None,
        }
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().replace('_', "-").to_lowercase()
}
