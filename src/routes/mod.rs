/**
 * Routes Module
 * API route handlers, one module per resource
 */

pub mod auth;
pub mod essays;
pub mod friendships;
pub mod health;
pub mod inspirations;
pub mod messages;
pub mod peer_reviews;
pub mod profiles;
