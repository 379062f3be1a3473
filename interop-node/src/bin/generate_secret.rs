//! Swap Secret Generation Utility
//!
//! This binary generates a fresh 32-byte swap secret and the hash lock that
//! commits to it.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin generate_secret
//! ```
//!
//! ## Output
//!
//! - Secret (hex) - revealed by the receiver in `withdraw`
//! - Hash lock (hex) - `keccak256(secret)`, passed to `newContract`
//!
//! Keep the secret private until the counter-party has locked their side.

use interop_node::htlc::secret::Secret;

fn main() {
    let secret = Secret::generate();
    let hash_lock = secret.hash();

    println!("Generated swap secret:");
    println!("Secret:    0x{:x}", secret);
    println!("Hash lock: {}", hash_lock);
}
