use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializeError {
    #[error("cyclic structure: {type_name} is reachable from itself")]
    CyclicStructure { type_name: &'static str },
    #[error("nesting deeper than {limit} levels")]
    DepthExceeded { limit: usize },
    #[error("non-finite number has no JSON representation")]
    NonFiniteNumber,
}
