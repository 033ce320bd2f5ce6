use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Mesh has no vertices")]
    EmptyMesh,

    #[error("Face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    InvalidFaceIndex {
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Structurally invalid mesh data supplied by the caller.
    ///
    /// HTTP front-ends map this class to a 4xx response.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::EmptyMesh | Error::InvalidFaceIndex { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classification() {
        assert!(Error::EmptyMesh.is_input_error());
        assert!(Error::InvalidFaceIndex { face: 0, index: 9, vertex_count: 3 }.is_input_error());
        assert!(!Error::Cancelled.is_input_error());
        assert!(!Error::InvalidConfig("bins".to_string()).is_input_error());
    }

    #[test]
    fn test_invalid_face_message() {
        let err = Error::InvalidFaceIndex { face: 4, index: 12, vertex_count: 8 };
        assert_eq!(
            err.to_string(),
            "Face 4 references vertex 12, but the mesh has 8 vertices"
        );
    }
}
