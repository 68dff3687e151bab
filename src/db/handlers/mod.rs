pub mod access_tokens;
pub mod bookings;
pub mod gyms;
pub mod packages;
pub mod repository;
pub mod users;

pub use access_tokens::BookingAccessTokens;
pub use bookings::Bookings;
pub use gyms::Gyms;
pub use packages::Packages;
pub use repository::Repository;
pub use users::Users;
