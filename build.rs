fn main() {
    println!("cargo:rerun-if-env-changed=AQUAAUTO_CONFIG_JSON");

    // Host builds (tests, simulation) have no ESP-IDF toolchain to wire up.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
