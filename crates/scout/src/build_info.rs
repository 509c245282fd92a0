pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COMMIT: &str = match option_env!("BUILD_COMMIT") {
    Some(c) => c,
    None => "unknown",
};

/// Client name announced to the gateway during the handshake.
pub const CLIENT_NAME: &str = "scout";

/// Version string including the commit, for `scout version`.
pub fn version_string() -> String {
    format!("{} (commit: {})", VERSION, COMMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_mentions_commit() {
        let vs = version_string();
        assert!(vs.starts_with(VERSION));
        assert!(vs.contains("commit:"));
    }
}
