use std::process::Command;

fn git_short_sha() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (output.status.success() && !sha.is_empty()).then_some(sha)
}

fn main() {
    let base = env!("CARGO_PKG_VERSION");
    let nightly = std::env::var("AMBERWATCH_NIGHTLY")
        .is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

    let version = if nightly {
        match git_short_sha() {
            Some(sha) => format!("{base}-nightly+{sha}"),
            None => format!("{base}-nightly"),
        }
    } else {
        base.to_string()
    };

    println!("cargo:rustc-env=APP_VERSION={version}");
    println!("cargo:rerun-if-env-changed=AMBERWATCH_NIGHTLY");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
