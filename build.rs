use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let fallback = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());

    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output();

    let version = match output {
        Ok(o) if o.status.success() => {
            let git_output = String::from_utf8(o.stdout)
                .unwrap_or_default()
                .trim()
                .to_string();

            // Strip 'v' prefix if present (e.g., "v1.1.1" -> "1.1.1")
            let version = git_output.strip_prefix('v').unwrap_or(&git_output);

            // Only release tags are usable as package versions; a bare commit
            // hash or a dirty tree keeps the manifest version.
            if version.is_empty()
                || version.ends_with("-dirty")
                || !version.starts_with(|c: char| c.is_ascii_digit())
                || !version.contains('.')
            {
                fallback
            } else {
                version.to_string()
            }
        }
        _ => fallback,
    };

    println!("cargo:rustc-env=TURBO_PKG_VERSION={}", version);
}
