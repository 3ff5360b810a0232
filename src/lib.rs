//! Glossa - named text templates and plural-aware translations
//!
//! Glossa is a library and CLI for organizing reusable text templates into
//! shared namespaces and for keeping translation files complete across the
//! plural forms each language requires.
//!
//! ## Module Structure
//!
//! - `template`: Template namespaces, the default parser and executor
//! - `i18n`: Plural categories, translations, bundles and completeness checks
//! - `config`: Configuration file loading and parsing
//! - `cli`: Command-line interface layer

pub mod cli;
pub mod config;
pub mod i18n;
pub mod template;
