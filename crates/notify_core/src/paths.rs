use std::path::PathBuf;

/// Default location of the persisted token record. Kept in the working
/// directory so the CI workspace and a local checkout behave the same way.
pub fn default_token_path() -> PathBuf {
    PathBuf::from("kakao_token.json")
}
