use std::path::Path;
use std::process::Command;

fn git_revision(workspace: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(workspace)
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let rev = String::from_utf8(out.stdout).ok()?.trim().to_string();
    (!rev.is_empty()).then_some(rev)
}

fn main() {
    // Packagers building from a tarball can pin the revision.
    println!("cargo:rerun-if-env-changed=CARELOG_BUILD_SHA");
    let rev = std::env::var("CARELOG_BUILD_SHA").ok().or_else(|| {
        let manifest = std::env::var("CARGO_MANIFEST_DIR").ok()?;
        git_revision(Path::new(&manifest).parent()?)
    });

    println!(
        "cargo:rustc-env=CARELOG_BUILD_SHA={}",
        rev.as_deref().unwrap_or("unknown")
    );
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
