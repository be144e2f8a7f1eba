//! Generates `include/dmg_emu.h` for the C ABI when the `ios` feature is on.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/ffi.rs");
    if env::var_os("CARGO_FEATURE_IOS").is_none() {
        return;
    }

    let crate_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => return,
    };
    let header = crate_dir.join("include").join("dmg_emu.h");

    let config = cbindgen::Config {
        language: cbindgen::Language::C,
        include_guard: Some("DMG_EMU_H".to_string()),
        ..Default::default()
    };

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(header);
        }
        Err(e) => println!("cargo:warning=cbindgen failed: {e}"),
    }
}
