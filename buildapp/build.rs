use std::{env, fs, io::BufRead, path::PathBuf, process::Command};

fn git<'a, I: IntoIterator<Item = &'a str>>(args: I) -> Option<std::process::Output> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
}

fn git_commit_hash() -> Option<String> {
    let output = git(["rev-parse", "--short", "HEAD"])?;
    output.stdout.lines().next()?.ok()
}

fn git_is_clean() -> bool {
    git(["status", "--porcelain"]).is_some_and(|output| output.stdout.is_empty())
}

fn main() {
    println!("cargo:rerun-if-env-changed=BUILDAPP_RELEASE");

    let doing_release = env::var("BUILDAPP_RELEASE")
        .map(|env| matches!(env.as_str(), "1" | "true"))
        .unwrap_or_default();

    let mut version = env!("CARGO_PKG_VERSION").to_owned();
    // Builds outside of a git checkout, such as from a source tarball, get the plain version.
    if !doing_release {
        if let Some(commit_hash) = git_commit_hash() {
            version.push('+');
            version.push_str(&commit_hash);
            if !git_is_clean() {
                version.push_str(".dirty");
            }
        }
    }

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").unwrap());
    fs::write(
        out_dir.join("version.rs"),
        format!("pub const VERSION: &str = {version:?};"),
    )
    .unwrap();
}
