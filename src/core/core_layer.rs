// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "articles/mod.rs"]
pub mod articles;

#[path = "moderation/mod.rs"]
pub mod moderation;
