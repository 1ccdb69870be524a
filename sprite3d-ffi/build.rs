use std::env;
use std::path::PathBuf;

fn main() {
    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap_or_else(|_| ".".to_string()));

    println!("cargo:rerun-if-changed=src");

    // Header for the C++ engine shim; generation errors only warn.
    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("AGS_SPRITE3D_H")
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(out_dir.join("ags_sprite3d.h"));
        }
        Err(err) => println!("cargo:warning=header generation skipped: {}", err),
    }
}
