fn main() {
    // The extension module links against libpython lazily on macOS; the
    // interpreter provides the symbols at import time.
    #[cfg(target_os = "macos")]
    {
        println!("cargo:rustc-cdylib-link-arg=-undefined");
        println!("cargo:rustc-cdylib-link-arg=dynamic_lookup");
    }
}
