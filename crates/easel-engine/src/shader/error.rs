use thiserror::Error;

/// Configuration error raised while reading a shader program.
///
/// Shaders are static assets, so none of these are recoverable: the caller is
/// expected to abort startup with the message. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderError {
    #[error("{shader}:{line}: unknown type `{token}`")]
    UnknownType { shader: String, line: usize, token: String },

    #[error("{shader}:{line}: uniform block `{block}` has no `binding = N` annotation")]
    MissingBinding { shader: String, line: usize, block: String },

    #[error("{shader}:{line}: malformed array bound in `{decl}`")]
    MalformedArray { shader: String, line: usize, decl: String },

    #[error("{shader}:{line}: malformed declaration `{decl}`")]
    Malformed { shader: String, line: usize, decl: String },

    #[error("{shader}:{line}: `{name}` is never closed")]
    Unterminated { shader: String, line: usize, name: String },

    #[error("{shader}: uniform `{name}` is declared with conflicting bindings")]
    ConflictingUniform { shader: String, name: String },

    /// The program parsed but does not fit the renderer that loads it.
    #[error("{shader}: {message}")]
    Invalid { shader: String, message: String },
}

impl ShaderError {
    pub(crate) fn invalid(shader: &str, message: impl Into<String>) -> Self {
        Self::Invalid { shader: shader.to_owned(), message: message.into() }
    }
}
