// ASTRA - GPL-3.0-or-later
// Embeds the git revision so `astra --version` and discovery logs can name the exact build

use std::process::Command;

fn git(args: &[&str]) -> Option<Vec<u8>> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| output.stdout)
}

fn main() {
    let revision = git(&["rev-parse", "--short", "HEAD"])
        .and_then(|stdout| String::from_utf8(stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string());

    let dirty = git(&["status", "--porcelain"]).is_some_and(|stdout| !stdout.is_empty());

    let revision = if dirty {
        format!("{revision}-dirty")
    } else {
        revision
    };

    println!("cargo:rustc-env=ASTRA_GIT_REVISION={revision}");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
}
