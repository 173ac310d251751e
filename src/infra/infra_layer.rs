// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "articles/mod.rs"]
pub mod articles;
