fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    let git = |args: &[&str]| {
        std::process::Command::new("git")
            .args(args)
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
    };

    // Tagged builds report the crate version; anything else reports the commit.
    let version = match git(&["describe", "--exact-match", "--tags", "HEAD"]) {
        Some(_) => std::env::var("CARGO_PKG_VERSION").unwrap_or_default(),
        None => match git(&["rev-parse", "--short", "HEAD"]) {
            Some(hash) if !hash.is_empty() => format!("dev@{hash}"),
            _ => "dev@unknown".to_string(),
        },
    };

    println!("cargo:rustc-env=WORKS_GAL_VERSION={version}");
}
