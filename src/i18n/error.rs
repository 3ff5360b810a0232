use thiserror::Error;

use crate::template::TemplateError;

#[derive(Debug, Error)]
pub enum I18nError {
    #[error("unknown language {tag:?}")]
    UnknownLanguage { tag: String },

    #[error("invalid translation {id:?}: {reason}")]
    InvalidTranslation { id: String, reason: String },

    #[error("message {id:?}: {source}")]
    Template {
        id: String,
        #[source]
        source: TemplateError,
    },
}
