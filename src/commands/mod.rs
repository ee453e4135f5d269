// Plan, apply, destroy and refresh over every configured item
pub mod declarative;

// Single-item commands
pub mod crud;

// Commands that never contact the server
pub mod schema;
