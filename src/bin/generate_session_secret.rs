use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;

fn main() {
    println!("🔐 Session Secret Generator");
    println!("===========================");

    // 256-bit key
    let mut key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);

    let secret = STANDARD.encode(key);

    println!();
    println!("📝 Copy this line to your .env file:");
    println!("SESSION_SECRET={}", secret);
}
