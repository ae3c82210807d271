//! Column type registry: validation, canonical formatting and conversion.

mod column_type;
mod error;
mod options;

pub use column_type::{convert, ColumnType};
pub use error::TypeError;
pub use options::ColumnOptions;

pub(crate) use column_type::{email_pattern, parse_date, parse_number};
