//! Authentication Module
//!
//! User accounts, password hashing and JWT sessions.
//!
//! - **`users`** - the `users` row and its queries
//! - **`sessions`** - JWT creation and verification
//! - **`handlers`** - signup, login and me endpoints
//!
//! # Authentication Flow
//!
//! 1. **Signup**: username, email and password → user created → JWT returned
//! 2. **Login**: username or email plus password → verified → JWT returned
//! 3. **Requests**: `Authorization: Bearer <jwt>` → `auth_middleware` loads the user
//!
//! Passwords are hashed with bcrypt at the configured cost. Unknown users and
//! wrong passwords share one 401 message.

/// User data model and database operations
pub mod users;

/// JWT token generation and validation
pub mod sessions;

/// HTTP handlers for authentication endpoints
pub mod handlers;

pub use handlers::{get_me, login, signup, AuthResponse, LoginRequest, SignupRequest, UserResponse};
