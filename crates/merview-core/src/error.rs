pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors raised by an engine or its loader.
///
/// Messages are captured as strings so one outcome can be shared by every caller that joined
/// the same in-flight load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("failed to load diagram engine: {message}")]
    Load { message: String },

    #[error("diagram engine failed to validate source: {message}")]
    Parse { message: String },

    #[error("Mermaid render error: {message}")]
    Render { message: String },
}

impl EngineError {
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }
}

/// The failure half of a [`crate::RenderResult`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("Mermaid parse error: Invalid syntax")]
    InvalidSyntax,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl RenderError {
    pub fn is_invalid_syntax(&self) -> bool {
        matches!(self, Self::InvalidSyntax)
    }
}
