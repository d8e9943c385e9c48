//! Domain services: business rules above the stores.
//!
//! Services take already-authenticated user ids from the route layer and
//! return [`AppError`](crate::error::AppError) variants the route layer
//! renders directly.

pub mod auth;
pub mod essay;
pub mod essay_like;
pub mod friendship;
pub mod inspiration;
pub mod message;
pub mod profile;
pub mod review;
pub mod user_correction;

mod seed;

pub use auth::AuthService;
pub use essay::EssayService;
pub use essay_like::EssayLikeService;
pub use friendship::FriendshipService;
pub use inspiration::InspirationService;
pub use message::MessageService;
pub use profile::ProfileService;
pub use review::ReviewService;
pub use user_correction::UserCorrectionService;
