/// Error type for formatting a value into a column type's canonical form.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum TypeError {
    #[error("'{value}' is not a valid {type_id}")]
    InvalidValue { type_id: &'static str, value: String },

    #[error("{type_id} cannot represent a {kind} value")]
    UnsupportedValue {
        type_id: &'static str,
        kind: &'static str,
    },

    #[error("Unknown column type '{0}'")]
    UnknownType(String),
}
