//! Data models for Roomdesk

pub mod booking;
pub mod report;
pub mod room;

// Re-export commonly used types
pub use booking::{Booking, BookingFilter, BookingPage, BookingStatus, CreateBooking, NewBooking};
pub use report::RoomUtilization;
pub use room::{CreateRoom, Room, RoomQuery};
