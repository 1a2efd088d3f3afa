pub mod date_handling;
pub mod path_processing;

pub use date_handling::{format_date_display, format_time_display, parse_attribute_date, parse_attribute_time};
pub use path_processing::{DocumentFormat, document_format, expand_tilde};
