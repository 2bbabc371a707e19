use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Error {
        Error(
            ErrorKind::TypeMismatch {
                expected: expected.into(),
                actual: actual.into(),
            }
            .into(),
        )
    }

    pub fn decode(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Decode {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn overflow(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Overflow {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn out_of_memory(context: impl Into<String>) -> Error {
        Error(
            ErrorKind::OutOfMemory {
                context: context.into(),
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("invalid storage format for '{element}': {message}")]
    Decode { element: String, message: String },

    #[error("invalid size for {name}: {message}")]
    Overflow { name: String, message: String },

    #[error("allocation failure in {context}")]
    OutOfMemory { context: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }
}
