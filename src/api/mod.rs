// api module — REST access to the notification server

pub mod auth;
pub mod client;
pub mod notifications;
pub mod preferences;

pub use client::{ApiClient, ApiError};
pub use notifications::{FilterQuery, NotificationPage, SortOrder};
