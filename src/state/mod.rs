// state module — the process-wide shared notification state

mod center;
mod interface;
mod sync;

pub use center::NotificationCenter;
pub use interface::{CenterHandle, CenterSnapshot, Command, LocalNotification};
pub use sync::SyncMarker;
