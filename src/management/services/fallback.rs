//! Ordered registration with fallback to less specific management views.

use crate::management::{
    domain::{ManagedObject, ObjectName},
    ports::{ManagementError, ManagementServer},
};
use thiserror::Error;
use tracing::debug;

/// Failure to publish any candidate under a name.
///
/// Callers log this and carry on; management publication never decides
/// whether a service runs.
#[derive(Debug, Clone, Error)]
pub enum ManagementRegistrationError {
    /// No candidates were offered.
    #[error("no management objects were offered for {0}")]
    NoCandidates(ObjectName),

    /// The last attempted candidate failed.
    #[error("could not register {name} after {attempts} attempt(s): {cause}")]
    Failed {
        /// Name the candidates were offered under.
        name: ObjectName,
        /// Number of candidates tried.
        attempts: usize,
        /// Failure of the last candidate tried.
        #[source]
        cause: ManagementError,
    },
}

/// Registers the first candidate the server accepts under `name`.
///
/// A candidate rejected as [`ManagementError::NotCompliant`] moves on to the
/// next one. Any other failure stops immediately. Returns the index of the
/// candidate that was registered.
///
/// # Errors
///
/// Returns [`ManagementRegistrationError`] when no candidate is registered.
pub fn register_with_fallback(
    server: &dyn ManagementServer,
    name: &ObjectName,
    candidates: impl IntoIterator<Item = ManagedObject>,
) -> Result<usize, ManagementRegistrationError> {
    let mut last_failure = None;
    for (index, candidate) in candidates.into_iter().enumerate() {
        let kind = candidate.kind();
        match server.register(candidate, name) {
            Ok(()) => return Ok(index),
            Err(err) if err.is_not_compliant() => {
                debug!(object = %name, kind, error = %err, "candidate rejected, trying next");
                last_failure = Some((index + 1, err));
            }
            Err(err) => {
                return Err(ManagementRegistrationError::Failed {
                    name: name.clone(),
                    attempts: index + 1,
                    cause: err,
                });
            }
        }
    }

    match last_failure {
        Some((attempts, cause)) => Err(ManagementRegistrationError::Failed {
            name: name.clone(),
            attempts,
            cause,
        }),
        None => Err(ManagementRegistrationError::NoCandidates(name.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::management::{domain::ManagedRecordProcessor, ports::ManagementResult};
    use crate::webservices::domain::RecordProcessor;
    use mockall::{
        Sequence, mock,
        predicate::{always, eq},
    };
    use rstest::{fixture, rstest};
    use std::sync::Arc;

    mock! {
        Server {}

        impl ManagementServer for Server {
            fn register(&self, object: ManagedObject, name: &ObjectName) -> ManagementResult<()>;
            fn unregister(&self, name: &ObjectName) -> ManagementResult<()>;
            fn is_registered(&self, name: &ObjectName) -> bool;
        }
    }

    #[derive(Debug)]
    struct Buffer;

    impl RecordProcessor for Buffer {
        fn name(&self) -> &str {
            "buffer"
        }
    }

    #[fixture]
    fn object_name() -> ObjectName {
        ObjectName::parse("lintel.ws:endpoint=Orders,recordProcessor=buffer")
            .expect("valid object name")
    }

    fn candidates() -> Vec<ManagedObject> {
        let processor: Arc<dyn RecordProcessor> = Arc::new(Buffer);
        vec![
            ManagedObject::RecordProcessor(Arc::clone(&processor)),
            ManagedObject::RecordProcessorAdapter(ManagedRecordProcessor::new(processor)),
        ]
    }

    fn not_compliant(name: &ObjectName) -> ManagementError {
        ManagementError::NotCompliant {
            name: name.clone(),
            reason: "no interface".to_owned(),
        }
    }

    #[rstest]
    fn falls_back_when_first_candidate_is_not_compliant(object_name: ObjectName) {
        let mut server = MockServer::new();
        let mut sequence = Sequence::new();
        let rejected = not_compliant(&object_name);
        server
            .expect_register()
            .withf(|object, _| matches!(object, ManagedObject::RecordProcessor(_)))
            .times(1)
            .in_sequence(&mut sequence)
            .return_once(move |_, _| Err(rejected));
        server
            .expect_register()
            .withf(|object, _| matches!(object, ManagedObject::RecordProcessorAdapter(_)))
            .times(1)
            .in_sequence(&mut sequence)
            .return_once(|_, _| Ok(()));

        let chosen = register_with_fallback(&server, &object_name, candidates());

        assert_eq!(chosen.expect("adapter should be accepted"), 1);
    }

    #[rstest]
    fn other_failures_stop_the_fallback(object_name: ObjectName) {
        let mut server = MockServer::new();
        let taken = ManagementError::AlreadyRegistered(object_name.clone());
        server
            .expect_register()
            .times(1)
            .return_once(move |_, _| Err(taken));

        let result = register_with_fallback(&server, &object_name, candidates());

        assert!(matches!(
            result,
            Err(ManagementRegistrationError::Failed {
                attempts: 1,
                cause: ManagementError::AlreadyRegistered(_),
                ..
            })
        ));
    }

    #[rstest]
    fn exhausting_candidates_reports_the_last_cause(object_name: ObjectName) {
        let mut server = MockServer::new();
        let name = object_name.clone();
        server
            .expect_register()
            .times(2)
            .returning(move |_, _| Err(not_compliant(&name)));

        let result = register_with_fallback(&server, &object_name, candidates());

        assert!(matches!(
            result,
            Err(ManagementRegistrationError::Failed { attempts: 2, cause, .. })
                if cause.is_not_compliant()
        ));
    }

    #[rstest]
    fn empty_candidate_list_is_an_error(object_name: ObjectName) {
        let server = MockServer::new();

        let result = register_with_fallback(&server, &object_name, Vec::new());

        assert!(matches!(result, Err(ManagementRegistrationError::NoCandidates(_))));
    }

    #[rstest]
    fn registers_under_the_given_name(object_name: ObjectName) {
        let mut server = MockServer::new();
        server
            .expect_register()
            .with(always(), eq(object_name.clone()))
            .times(1)
            .return_once(|_, _| Ok(()));

        let chosen = register_with_fallback(&server, &object_name, candidates());

        assert_eq!(chosen.expect("first candidate accepted"), 0);
    }
}
