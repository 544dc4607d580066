fn main() {
    // Propagate ESP-IDF sysenv (linker args, cfg flags) only for device builds;
    // host builds and tests need nothing from the build script.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
