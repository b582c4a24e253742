use std::io::Error as IoError;

use thiserror::Error;

/// Failures raised by [`LazySeeker`](crate::LazySeeker) itself.
///
/// `Read` and `Seek` can only return [`std::io::Error`], so these travel wrapped
/// inside one. Use [`LazySeekError::from_io`] to get them back out.
#[derive(Debug, Error)]
pub enum LazySeekError {
    #[error("failed to drain the raw stream after {seeded} delivered bytes")]
    Drain {
        seeded: usize,
        #[source]
        source: IoError,
    },
    #[error("stream is unusable after a failed drain")]
    Poisoned,
}

impl LazySeekError {
    pub fn from_io(err: &IoError) -> Option<&LazySeekError> {
        err.get_ref()?.downcast_ref::<LazySeekError>()
    }

    pub fn is_drain_failure(err: &IoError) -> bool {
        matches!(Self::from_io(err), Some(LazySeekError::Drain { .. }))
    }
}

impl From<LazySeekError> for IoError {
    fn from(value: LazySeekError) -> Self {
        IoError::other(value)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object {0:?} does not exist")]
    NotFound(String),
    #[error("access to {0:?} is not permitted")]
    PermissionDenied(String),
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn drain_error_survives_io_wrapping() {
        let err: IoError = LazySeekError::Drain {
            seeded: 4,
            source: IoError::new(ErrorKind::ConnectionReset, "reset"),
        }
        .into();

        assert!(LazySeekError::is_drain_failure(&err));
        match LazySeekError::from_io(&err) {
            Some(LazySeekError::Drain { seeded, source }) => {
                assert_eq!(*seeded, 4);
                assert_eq!(source.kind(), ErrorKind::ConnectionReset);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn plain_io_errors_are_not_lazy_seek_errors() {
        let err = IoError::new(ErrorKind::Other, "boom");
        assert!(LazySeekError::from_io(&err).is_none());
        assert!(!LazySeekError::is_drain_failure(&IoError::from(ErrorKind::BrokenPipe)));
    }
}
