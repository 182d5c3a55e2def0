//! Error types for the HTMC engine.

use thiserror::Error;

/// Errors while parsing HTML markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unterminated comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },

    #[error("Unterminated tag <{tag}> starting at byte {offset}")]
    UnterminatedTag { tag: String, offset: usize },

    #[error("Unterminated value for attribute '{attribute}' at byte {offset}")]
    UnterminatedAttributeValue { attribute: String, offset: usize },
}

/// Errors while compiling a `<component>` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefineError {
    #[error("Component is missing a \"name\" attribute")]
    MissingName,

    #[error("Component with name \"{name}\" is already defined")]
    AlreadyDefined { name: String },

    #[error("Invalid component name \"{name}\": names must start with a lowercase letter followed by lowercase letters, digits, or hyphens")]
    InvalidName { name: String },

    #[error("Failed to create template for component \"{name}\": {source}")]
    Template {
        name: String,
        #[source]
        source: ParseError,
    },

    #[error("\"{name}\" is not a valid custom element name: {reason}")]
    Platform { name: String, reason: String },
}

/// Errors while rendering a component instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("No registry entry found for component: {component}")]
    MissingEntry { component: String },

    #[error("No shadow root found for component: {component}")]
    MissingShadowRoot { component: String },
}

/// Error reported by a fetch transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors while importing a remote fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("Attach element has no src to import")]
    MissingSource,

    #[error("Failed to fetch {src}: {source}")]
    Network {
        src: String,
        #[source]
        source: FetchError,
    },

    #[error("Failed to load component file {src}: status {status}")]
    Status { src: String, status: u16 },

    #[error("Failed to parse component file {src}: {source}")]
    Parse {
        src: String,
        #[source]
        source: ParseError,
    },
}

/// Error reported by a script runner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("Inline script failed: {message}")]
    Inline { message: String },

    #[error("Script {src} failed: {message}")]
    External { src: String, message: String },
}

impl ScriptError {
    /// Build the error variant matching whether the script had a `src`.
    pub fn new(src: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        match src {
            Some(src) => Self::External {
                src: src.to_string(),
                message,
            },
            None => Self::Inline { message },
        }
    }
}
