pub mod access_tokens;
pub mod bookings;
pub mod gyms;
pub mod packages;
pub mod users;
