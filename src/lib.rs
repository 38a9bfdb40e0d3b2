//! A Twitter-style social API: users, tweets, follows, and a stateless
//! token session core with a revocation denylist for logout.

pub mod config;
pub mod error;
pub mod state;
pub mod db;

pub mod models {
    pub mod user;
    pub mod tweet;
}

pub mod repositories {
    pub mod users;
    pub mod revoked_tokens;
    pub mod tweets;
    pub mod follows;
}

pub mod services {
    pub mod password;
    pub mod token;
    pub mod session;
}

pub mod handlers {
    pub mod auth;
    pub mod users;
    pub mod tweets;
    pub mod follows;
    pub mod admin;
}

pub mod middleware_layer {
    pub mod auth;
}
