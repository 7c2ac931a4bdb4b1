//! Wire-format types for every route.
//!
//! Field names serialize in camelCase to match the browser clients; database
//! records are mapped through per-file `to_response` helpers so the storage
//! layout never leaks into the API surface.

pub mod admin;
pub mod auth;
pub mod cases;
pub mod chat;
pub mod chats;
pub mod collect;
pub mod groups;
pub mod models;

/// Deserializer for the nested-`Option` PATCH fields: plain serde collapses an
/// explicit JSON `null` into the outer `None`, so "clear" would be
/// indistinguishable from "absent".  Wrapping the parsed value in `Some` keeps
/// the three states apart (`#[serde(default)]` still covers the absent case).
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(de).map(Some)
}
