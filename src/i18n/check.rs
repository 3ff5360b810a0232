//! Completeness of every locale in a bundle against the source locale.

use std::{fmt, path::PathBuf};

use tracing::debug;

use super::{
    I18nError,
    bundle::Bundle,
    language::{LocaleDirectory, PluralCategory},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// A source message the locale does not define.
    Missing,
    /// Required plural forms without content.
    Incomplete(Vec<PluralCategory>),
    /// Identical to the source locale.
    Untranslated,
}

impl IssueKind {
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::Missing | IssueKind::Incomplete(_) => Severity::Error,
            IssueKind::Untranslated => Severity::Warning,
        }
    }

    pub fn rule(&self) -> &'static str {
        match self {
            IssueKind::Missing => "missing",
            IssueKind::Incomplete(_) => "incomplete",
            IssueKind::Untranslated => "untranslated",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rule())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub locale: String,
    pub id: String,
    pub kind: IssueKind,
    /// First file loaded into the locale, if any.
    pub file: Option<PathBuf>,
}

impl Issue {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn message(&self) -> &str {
        &self.id
    }

    pub fn location(&self) -> String {
        match &self.file {
            Some(path) => path.display().to_string(),
            None => self.locale.clone(),
        }
    }

    pub fn details(&self) -> String {
        match &self.kind {
            IssueKind::Missing => format!("not defined in locale {:?}", self.locale),
            IssueKind::Incomplete(categories) => {
                let names: Vec<&str> = categories.iter().map(PluralCategory::as_str).collect();
                format!(
                    "locale {:?} has no text for: {}",
                    self.locale,
                    names.join(", ")
                )
            }
            IssueKind::Untranslated => {
                format!("locale {:?} uses the source text unchanged", self.locale)
            }
        }
    }
}

/// Reports, per locale: source messages it lacks, messages missing plural
/// forms its language requires, and messages copied verbatim from the
/// source locale.
///
/// Issues are ordered by locale, then id.
pub fn check_bundle(
    bundle: &Bundle,
    source_locale: &str,
    directory: &dyn LocaleDirectory,
) -> Result<Vec<Issue>, I18nError> {
    let source = bundle.translations(source_locale);
    let mut issues = Vec::new();

    for locale in bundle.locales() {
        let language = directory
            .language(locale)
            .ok_or_else(|| I18nError::UnknownLanguage {
                tag: locale.to_string(),
            })?;
        let file = bundle.files(locale).first().cloned();
        let issue = |id: &str, kind| Issue {
            locale: locale.to_string(),
            id: id.to_string(),
            kind,
            file: file.clone(),
        };
        let translations = bundle.translations(locale).into_iter().flatten();
        let is_source = locale == source_locale;

        for (id, translation) in translations {
            let missing = translation.missing_categories(&language);
            if !missing.is_empty() {
                issues.push(issue(id, IssueKind::Incomplete(missing)));
            } else if !is_source
                && source.and_then(|s| s.get(id)) == Some(translation)
            {
                issues.push(issue(id, IssueKind::Untranslated));
            }
        }

        if !is_source && let Some(source) = source {
            for id in source.keys() {
                if bundle.get(locale, id).is_none() {
                    issues.push(issue(id, IssueKind::Missing));
                }
            }
        }
        debug!(locale, issues = issues.len(), "checked locale");
    }

    issues.sort_by(|a, b| a.locale.cmp(&b.locale).then_with(|| a.id.cmp(&b.id)));
    Ok(issues)
}
