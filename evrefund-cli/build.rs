//! Stamps the binary's `--version` with the checkout it was built from.

use std::path::Path;
use std::process::Command;

fn git(root: &Path, args: &[&str]) -> Option<String> {
    let out = Command::new("git").arg("-C").arg(root).args(args).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let text = String::from_utf8(out.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn main() {
    let manifest = std::env::var_os("CARGO_MANIFEST_DIR").unwrap_or_else(|| ".".into());
    let root = Path::new(&manifest).join("..");

    // Tarball builds have no repository; the version then reads "(unknown)".
    let describe = git(&root, &["describe", "--always", "--dirty", "--abbrev=10"])
        .unwrap_or_else(|| "unknown".to_string());

    if let Some(head) = git(&root, &["rev-parse", "--git-path", "HEAD"]) {
        println!("cargo:rerun-if-changed={}", root.join(head).display());
    }
    println!("cargo:rerun-if-env-changed=EVREFUND_BUILD_SHA");
    let stamp = std::env::var("EVREFUND_BUILD_SHA").unwrap_or(describe);
    println!("cargo:rustc-env=EVREFUND_BUILD_SHA={stamp}");
}
