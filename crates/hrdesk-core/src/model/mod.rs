//! Domain types shared by routing, lifecycle, and the store.

pub mod actor;
pub mod category;
pub mod message;
pub mod ticket;

/// Canonical form used by every `FromStr` impl in this module: trimmed,
/// lowercase, with spaces and dashes folded to underscores.
fn normalize(input: &str) -> String {
    input
        .trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}
