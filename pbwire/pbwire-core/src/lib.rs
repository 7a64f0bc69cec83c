//! Schema-independent building blocks of the protocol buffers wire format.
//!
//! This crate knows nothing about message schemas. It provides:
//! - [`varint`]: base-128 varint and zigzag codecs
//! - [`wire`]: field keys, [`WireType`], fixed-width and length-delimited
//!   readers, and raw payload extraction for skipping/preserving fields
//! - [`UnknownFieldSet`]: verbatim storage of fields a schema does not declare

mod error;
mod unknown;
pub mod varint;
pub mod wire;

pub use error::WireError;
pub use unknown::{UnknownField, UnknownFieldSet};
pub use varint::{decode_varint, encode_varint, encoded_len_varint, zigzag_decode, zigzag_encode};
pub use wire::{WireType, decode_key, encode_key, key_len};
