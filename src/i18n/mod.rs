//! Plural-aware translations.
//!
//! - `language`: plural categories, rules and the [`LocaleDirectory`] lookup
//! - `message`: the template stored in each translation slot
//! - `translation`: [`Translation`] and its completeness operations
//! - `bundle`: translation files grouped by locale, and merge output
//! - `check`: completeness issues across a bundle

pub mod bundle;
pub mod check;
mod error;
pub mod language;
pub mod message;
pub mod translation;

pub use bundle::{Bundle, MergeOutput};
pub use error::I18nError;
pub use language::{BuiltinLocales, Language, LocaleDirectory, PluralCategory, PluralRule};
pub use message::{MessageTemplate, RenderErrorPolicy};
pub use translation::Translation;
