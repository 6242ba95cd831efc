fn main() {
    #[cfg(feature = "app")]
    tauri_build::build();

    #[cfg(not(feature = "app"))]
    println!("cargo::rustc-check-cfg=cfg(mobile, desktop)");
}
