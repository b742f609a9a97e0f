//! Build script: embeds the git hash and checks GPU toolkits early.
//!
//! GPU feature builds fail deep inside whisper-rs-sys when the toolkit is
//! missing; checking up front turns that into a readable message.

use std::process::Command;

fn main() {
    // Embed git short hash for version string
    if let Ok(output) = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        && output.status.success()
    {
        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=GIT_HASH={}", hash);
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");

    if cfg!(feature = "cuda") {
        require_tool(
            "nvcc",
            &["--version"],
            "CUDA toolkit",
            "https://developer.nvidia.com/cuda-downloads",
        );
    }
    if cfg!(feature = "vulkan") {
        require_tool(
            "vulkaninfo",
            &["--summary"],
            "Vulkan SDK",
            "https://vulkan.lunarg.com/",
        );
    }
    if cfg!(feature = "hipblas") {
        require_tool("rocminfo", &[], "ROCm", "https://rocm.docs.amd.com/");
    }
    if cfg!(feature = "openblas") {
        check_openblas();
    }
}

/// Panic with an actionable message when a GPU toolchain tool is missing.
fn require_tool(tool: &str, args: &[&str], toolkit: &str, install_url: &str) {
    if Command::new(tool).args(args).output().is_err() {
        panic!(
            "\n`{tool}` not found: {toolkit} is not installed.\n\
             Install it from {install_url}, or build without it: cargo build --release\n"
        );
    }
    println!("cargo::warning={toolkit} detected");
}

fn check_openblas() {
    let pkg_config_ok = Command::new("pkg-config")
        .args(["--exists", "openblas"])
        .status()
        .is_ok_and(|s| s.success());

    if !pkg_config_ok {
        // Fallback: check the usual shared library locations
        let lib_exists = [
            "/usr/lib/x86_64-linux-gnu/libopenblas.so",
            "/usr/lib/libopenblas.so",
            "/usr/lib64/libopenblas.so",
        ]
        .iter()
        .any(|p| std::path::Path::new(p).exists());

        if !lib_exists {
            panic!(
                "\nOpenBLAS not found.\n\
                 Install it (sudo apt install libopenblas-dev), or build without it: cargo build --release\n"
            );
        }
    }
    println!("cargo::warning=OpenBLAS detected");
}
