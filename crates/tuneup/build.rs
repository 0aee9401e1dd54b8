// Build script for tuneup - embeds version at compile time

fn main() {
    // Get version from environment (set by release CI) or Cargo.toml
    let version =
        std::env::var("TUNEUP_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

    // Embed as environment variable for runtime access
    println!("cargo:rustc-env=TUNEUP_VERSION={}", version);

    // Also rerun if Cargo.toml changes
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed=TUNEUP_VERSION");
}
