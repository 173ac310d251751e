// Core moderation module - the admin-facing view of reported articles.
// Reads only; admin actions go through the engagement engine.

pub mod moderation_service;

pub use moderation_service::*;
