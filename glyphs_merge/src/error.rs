use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("glyph '{0}' already exists in the base font")]
    DuplicateGlyph(String),

    #[error("all code points of glyph '{name}' ({codepoints}) are already used by the base font")]
    DuplicateUnicode { name: String, codepoints: String },

    #[error("version '{0}' is not of the form <major>.<minor>")]
    VersionFormat(String),
}

pub type Result<T> = std::result::Result<T, MergeError>;
