//! `#[derive(Entity)]`
//!
//! Reads a named-field struct and its `#[rowmap(...)]` attributes and emits
//! the `rowmap::Entity` implementation: the static declaration consumed by
//! the registry and the fixed-order row marshalling.
//!
//! Struct attribute: `#[rowmap(table = "...")]`.
//!
//! Field attributes: `primary_key`, `generated`, `column = "..."`,
//! `nullable`, `unique`, `max_length = N`,
//! `relation(one_to_one | one_to_many)`, `foreign_key = "..."`,
//! `fetch = "lazy" | "eager"`.

use proc_macro::TokenStream;

mod attrs;
mod entity;
mod util;

#[proc_macro_derive(Entity, attributes(rowmap))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity::derive_entity(input.into()).into()
}
