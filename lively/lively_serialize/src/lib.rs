#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(non_camel_case_types)]

pub mod binary_serializable;
pub mod byte_stream;

pub use binary_serializable::Binary_Serializable;
pub use byte_stream::Byte_Stream;
