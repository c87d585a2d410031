fn main() {
    if let Err(err) = built::write_built_file() {
        println!("cargo:warning=failed to collect build metadata: {err}");
    }
}
