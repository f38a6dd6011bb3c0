use std::path::PathBuf;

/// Locate the server binary on PATH
pub fn find_binary(binary: &str) -> Option<PathBuf> {
    which::which(binary).ok()
}
