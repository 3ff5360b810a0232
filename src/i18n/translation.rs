//! Single and plural translations and their completeness operations.
//!
//! A plural translation may be sparse; a missing category reads as an
//! empty template. Completeness is always judged against a [`Language`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    I18nError,
    language::{Language, PluralCategory},
    message::{MessageTemplate, RenderErrorPolicy},
};

/// A message in one locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TranslationRecord", into = "TranslationRecord")]
pub enum Translation {
    /// One template used for every count.
    Single {
        id: String,
        template: MessageTemplate,
    },
    /// One template per plural category.
    Plural {
        id: String,
        templates: BTreeMap<PluralCategory, MessageTemplate>,
    },
}

impl Translation {
    pub fn single(id: impl Into<String>, src: &str) -> Result<Self, I18nError> {
        let id = id.into();
        let template = parse_template(&id, src)?;
        Ok(Translation::Single { id, template })
    }

    pub fn plural<'s>(
        id: impl Into<String>,
        forms: impl IntoIterator<Item = (PluralCategory, &'s str)>,
    ) -> Result<Self, I18nError> {
        let id = id.into();
        let templates = forms
            .into_iter()
            .map(|(category, src)| Ok((category, parse_template(&id, src)?)))
            .collect::<Result<_, I18nError>>()?;
        Ok(Translation::Plural { id, templates })
    }

    pub fn id(&self) -> &str {
        match self {
            Translation::Single { id, .. } | Translation::Plural { id, .. } => id,
        }
    }

    pub fn is_plural(&self) -> bool {
        matches!(self, Translation::Plural { .. })
    }

    /// The template used for `category`; a single translation answers with
    /// its only template.
    pub fn template(&self, category: PluralCategory) -> Option<&MessageTemplate> {
        match self {
            Translation::Single { template, .. } => Some(template),
            Translation::Plural { templates, .. } => templates.get(&category),
        }
    }

    /// Restricts a plural translation to exactly the categories `language`
    /// requires, adding empty templates where needed.
    pub fn normalize(&mut self, language: &Language) {
        if let Translation::Plural { templates, .. } = self {
            templates.retain(|category, _| language.requires(*category));
            for category in &language.plurals {
                templates.entry(*category).or_default();
            }
        }
    }

    /// Whether any category `language` requires lacks content.
    pub fn incomplete(&self, language: &Language) -> bool {
        !self.missing_categories(language).is_empty()
    }

    /// Required categories without content, in category order. A single
    /// translation reports `other` when its template is empty.
    pub fn missing_categories(&self, language: &Language) -> Vec<PluralCategory> {
        match self {
            Translation::Single { template, .. } => {
                if template.is_empty() {
                    vec![PluralCategory::Other]
                } else {
                    Vec::new()
                }
            }
            Translation::Plural { templates, .. } => language
                .plurals
                .iter()
                .copied()
                .filter(|category| templates.get(category).is_none_or(MessageTemplate::is_empty))
                .collect(),
        }
    }

    /// Fills every empty slot with `source`'s `other` template.
    ///
    /// Only slots that exist are filled; normalize first to create them.
    pub fn backfill(&mut self, source: &Translation) {
        let Some(fallback) = source.template(PluralCategory::Other) else {
            return;
        };
        match self {
            Translation::Single { template, .. } => {
                if template.is_empty() {
                    *template = fallback.clone();
                }
            }
            Translation::Plural { templates, .. } => {
                for template in templates.values_mut().filter(|t| t.is_empty()) {
                    *template = fallback.clone();
                }
            }
        }
    }

    /// Overlays the non-empty templates of `other`.
    ///
    /// When the two differ in variant or id nothing is merged and `other` is
    /// returned as the replacement.
    pub fn merge(self, other: Translation) -> Translation {
        match (self, other) {
            (
                Translation::Single { id, template },
                Translation::Single {
                    id: other_id,
                    template: other_template,
                },
            ) if id == other_id => Translation::Single {
                template: if other_template.is_empty() {
                    template
                } else {
                    other_template
                },
                id,
            },
            (
                Translation::Plural { id, mut templates },
                Translation::Plural {
                    id: other_id,
                    templates: other_templates,
                },
            ) if id == other_id => {
                for (category, template) in other_templates {
                    if !template.is_empty() {
                        templates.insert(category, template);
                    }
                }
                Translation::Plural { id, templates }
            }
            (_, other) => other,
        }
    }

    /// Same id and variant, no content.
    pub fn untranslated_copy(&self) -> Translation {
        match self {
            Translation::Single { id, .. } => Translation::Single {
                id: id.clone(),
                template: MessageTemplate::empty(),
            },
            Translation::Plural { id, .. } => Translation::Plural {
                id: id.clone(),
                templates: BTreeMap::new(),
            },
        }
    }

    /// Template sources as written in the list form.
    pub fn to_value(&self) -> TranslationValue {
        match self {
            Translation::Single { template, .. } => {
                TranslationValue::Single(template.source().to_string())
            }
            Translation::Plural { templates, .. } => TranslationValue::Plural(sources(templates)),
        }
    }

    /// Category map as written in the flat form; a single translation is
    /// written as its `other` form.
    pub fn to_flat_value(&self) -> BTreeMap<PluralCategory, String> {
        match self {
            Translation::Single { template, .. } => {
                BTreeMap::from([(PluralCategory::Other, template.source().to_string())])
            }
            Translation::Plural { templates, .. } => sources(templates),
        }
    }

    /// Renders the form `count` selects in `language`.
    ///
    /// A plural translation without that form, or with it empty, falls
    /// back to `other`, and to the message id when that is empty too.
    pub fn render<T: Serialize + ?Sized>(
        &self,
        language: &Language,
        count: i64,
        data: &T,
        policy: RenderErrorPolicy,
    ) -> Result<String, I18nError> {
        let category = language.plural_category(count);
        let template = self
            .template(category)
            .filter(|t| !t.is_empty())
            .or_else(|| self.template(PluralCategory::Other))
            .filter(|t| !t.is_empty());
        match template {
            Some(template) => template
                .render(data, policy)
                .map_err(|source| I18nError::Template {
                    id: self.id().to_string(),
                    source,
                }),
            None => Ok(self.id().to_string()),
        }
    }
}

fn sources(templates: &BTreeMap<PluralCategory, MessageTemplate>) -> BTreeMap<PluralCategory, String> {
    templates
        .iter()
        .map(|(category, template)| (*category, template.source().to_string()))
        .collect()
}

fn parse_template(id: &str, src: &str) -> Result<MessageTemplate, I18nError> {
    MessageTemplate::named(id, src).map_err(|source| I18nError::Template {
        id: id.to_string(),
        source,
    })
}

/// Translation value as written in files: a string or a category map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslationValue {
    Single(String),
    Plural(BTreeMap<PluralCategory, String>),
}

/// `{"id": ..., "translation": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub id: String,
    pub translation: TranslationValue,
}

impl TryFrom<TranslationRecord> for Translation {
    type Error = I18nError;

    fn try_from(record: TranslationRecord) -> Result<Self, Self::Error> {
        match &record.translation {
            TranslationValue::Single(src) => Translation::single(record.id, src),
            TranslationValue::Plural(forms) => Translation::plural(
                record.id,
                forms.iter().map(|(category, src)| (*category, src.as_str())),
            ),
        }
    }
}

impl From<Translation> for TranslationRecord {
    fn from(translation: Translation) -> Self {
        let translation_value = translation.to_value();
        let id = match translation {
            Translation::Single { id, .. } | Translation::Plural { id, .. } => id,
        };
        TranslationRecord {
            id,
            translation: translation_value,
        }
    }
}
