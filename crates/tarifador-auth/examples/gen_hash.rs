//! Password hash generator utility
//!
//! Usage: cargo run --example gen_hash -p tarifador-auth -- <password>
//!
//! Generates an Argon2id password hash that can be inserted into the
//! users table to seed an API account.

use tarifador_auth::PasswordService;

fn main() {
    let password = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "admin123".to_string());

    let service = PasswordService::new();
    let hash = service
        .hash_password(&password)
        .expect("Failed to hash password");

    println!("Password: {}", password);
    println!("Hash: {}", hash);
    println!();
    println!("SQL to seed an API user:");
    println!("INSERT INTO users (username, password_hash, active)");
    println!("VALUES ('admin', '{}', true);", hash);
}
