pub mod booking;
pub mod traits;

pub use booking::BookingClient;
pub use traits::FlightSource;
