// Build script for alpm-bridge
//
// cbindgen 0.27 does not pick up Rust 2024's #[unsafe(no_mangle)] functions,
// so include/alpm_bridge.h is maintained by hand. Setting
// ALPM_BRIDGE_GEN_HEADER regenerates the #[repr(C)] type declarations into
// include/alpm_bridge_types.h for comparison against it.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/");
    println!("cargo:rerun-if-changed=cbindgen.toml");
    println!("cargo:rerun-if-env-changed=ALPM_BRIDGE_GEN_HEADER");

    if env::var_os("CARGO_FEATURE_SYSTEM_ALPM").is_some() {
        println!("cargo:rustc-link-lib=alpm");
    }

    if env::var_os("ALPM_BRIDGE_GEN_HEADER").is_some() {
        let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
        let config = cbindgen::Config::from_file(crate_dir.join("cbindgen.toml"))
            .expect("cbindgen.toml is readable");

        match cbindgen::Builder::new()
            .with_crate(&crate_dir)
            .with_config(config)
            .generate()
        {
            Ok(bindings) => {
                bindings.write_to_file(crate_dir.join("include/alpm_bridge_types.h"));
            }
            Err(e) => println!("cargo:warning=cbindgen failed: {e}"),
        }
    }
}
