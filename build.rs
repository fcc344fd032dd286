use std::env;

fn main() {
    // Version string shown by --version
    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let version = match env::var("BILI_AUDIO_BUILD_TAG") {
        Ok(tag) if !tag.is_empty() => format!("{version}+{tag}"),
        _ => version,
    };
    println!("cargo:rustc-env=BILI_AUDIO_VERSION={version}");

    println!("cargo:rerun-if-env-changed=BILI_AUDIO_BUILD_TAG");
    println!("cargo:rerun-if-changed=src/");
    println!("cargo:rerun-if-changed=Cargo.toml");
}
