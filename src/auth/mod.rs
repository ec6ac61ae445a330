//! Bearer-token authentication: bcrypt password hashes, HS256 JWTs and the
//! request extractor that turns an `Authorization` header into a user id.

mod extractor;
mod jwt;
mod password;

pub use extractor::AuthenticatedUser;
pub use jwt::{create_token, issue_token, verify_token, Claims};
pub use password::{hash_password, verify_password};
