use crate::net::PacketError;
use crate::value::ValueType;

#[derive(Debug, thiserror::Error)]
pub enum ReplicaError {
    #[error("unknown object id {0}")]
    UnknownId(u32),
    #[error("unknown kind `{0}`")]
    UnknownKind(String),
    #[error("action `{kind}` targeting object {action_id} cannot be performed")]
    ImpossibleAction { action_id: u32, kind: String },
    #[error("value type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: ValueType, found: ValueType },
    #[error("interpolation fraction {0} is outside [0, 1]")]
    OutOfRange(f32),
    #[error("`{kind}` has no attribute `{name}`")]
    UnknownAttribute { kind: String, name: String },
    #[error("malformed {ty} value: expected {expected} bytes, got {actual}")]
    MalformedValue {
        ty: ValueType,
        expected: usize,
        actual: usize,
    },
    #[error("malformed delta for object {id}: {reason}")]
    MalformedDelta { id: u32, reason: &'static str },
    #[error("delta out of sequence: expected base tick {expected}, got {found}")]
    OutOfSequence { expected: u32, found: u32 },
    #[error(transparent)]
    Packet(#[from] PacketError),
}

impl ReplicaError {
    /// Errors caused by untrusted input that the tick driver reports as a
    /// failed action instead of aborting the tick.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownId(_) | Self::ImpossibleAction { .. })
    }
}

pub type Result<T, E = ReplicaError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_input_errors_are_recoverable() {
        assert!(ReplicaError::UnknownId(3).is_recoverable());
        assert!(
            ReplicaError::ImpossibleAction {
                action_id: 1,
                kind: "Hit".to_string(),
            }
            .is_recoverable()
        );
        assert!(!ReplicaError::OutOfRange(1.5).is_recoverable());
        assert!(
            !ReplicaError::MalformedDelta {
                id: 0,
                reason: "object added twice",
            }
            .is_recoverable()
        );
        assert!(
            !ReplicaError::TypeMismatch {
                expected: ValueType::Int,
                found: ValueType::Float,
            }
            .is_recoverable()
        );
        assert!(
            !ReplicaError::UnknownAttribute {
                kind: "Unit".to_string(),
                name: "mana".to_string(),
            }
            .is_recoverable()
        );
    }

    #[test]
    fn messages_name_the_offender() {
        let err = ReplicaError::UnknownKind("Dragon".to_string());
        assert_eq!(err.to_string(), "unknown kind `Dragon`");

        let err = ReplicaError::ImpossibleAction {
            action_id: 7,
            kind: "Hit".to_string(),
        };
        assert!(err.to_string().contains("Hit"));
        assert!(err.to_string().contains('7'));
    }
}
