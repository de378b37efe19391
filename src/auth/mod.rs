pub(crate) mod extractors;
pub mod jwt;

pub use extractors::AuthUser;
pub use jwt::JwtKeys;
