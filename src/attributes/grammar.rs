//! Pest grammar for attribute micro-syntax.
//!
//! The grammar lives in `values.pest`; the typed decoders sit next to their
//! consumers (`attributes::transform`, `geometry::path_data`,
//! `attributes::parser::parse_number_list`).

use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "attributes/values.pest"]
pub struct ValueParser;
