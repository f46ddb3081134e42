use crate::store::PersistenceError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not permitted: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Persistence(PersistenceError),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<PersistenceError> for CoreError {
    /// An update aimed at an absent record is a lookup failure for callers.
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Missing { collection, id } => {
                Self::NotFound(format!("{collection} {id}"))
            }
            other => Self::Persistence(other),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Collection;
    use assert_matches::assert_matches;
    use uuid::Uuid;

    #[test]
    fn missing_record_reads_as_not_found() {
        let err = CoreError::from(PersistenceError::Missing {
            collection: Collection::Trainings,
            id: Uuid::nil(),
        });
        assert_matches!(err, CoreError::NotFound(what) if what.starts_with("trainings"));

        let err = CoreError::from(PersistenceError::Backend("down".into()));
        assert_matches!(err, CoreError::Persistence(PersistenceError::Backend(_)));
    }
}
