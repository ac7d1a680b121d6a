use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use failure::{Error, ResultExt};
use sec::Secret;
use std::fs;

/// Read a personal access token from disk.
///
/// The path may contain `~` or environment variables. Surrounding
/// whitespace (e.g. a trailing newline) is stripped.
pub fn load_token(path: &str) -> Result<Secret<String>, Error> {
    let expanded = shellexpand::full(path).context("Unable to expand the token file path")?;
    debug!("Reading the access token from {}", expanded);

    let raw = fs::read_to_string(&*expanded)
        .with_context(|_| format!("Unable to read the access token from {}", expanded))?;

    let token = raw.trim();
    if token.is_empty() {
        warn!("The access token in {} is empty", expanded);
    }

    Ok(Secret::new(token.to_string()))
}

/// The value sent after `Basic ` in the `Authorization` header. Azure
/// DevOps ignores the username, so it's left blank.
pub fn basic_credential(token: &Secret<String>) -> Secret<String> {
    let encoded = STANDARD.encode(format!(":{}", token.reveal_str()));
    Secret::new(encoded)
}
