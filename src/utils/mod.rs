pub mod text;
pub mod validation;

pub use text::StrExt;
pub use validation::{parse_pid, parse_port_input, validate_port};
