use crate::data::schema::Role;

/// Raised when a query or recording refers to an argument the schema does not declare.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum InvalidArgument {
    #[error("{role} index {index} is out of range for {schema}, which has {len} {role}s")]
    IndexOutOfRange {
        schema: String,
        role: Role,
        index: usize,
        len: usize,
    },
    #[error("{schema} has no input argument named {name:?}")]
    UnknownArgument { schema: String, name: String },
}

pub type Result<T> = std::result::Result<T, InvalidArgument>;
