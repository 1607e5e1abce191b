//! Password-reset code generation

use rand::Rng;
use url::Url;

/// Random bytes per code (hex-encoded to twice as many characters)
const RESET_CODE_BYTES: usize = 32;

/// Generate an unguessable reset code.
pub fn generate_reset_code() -> String {
    let random_bytes: [u8; RESET_CODE_BYTES] = rand::thread_rng().gen();
    hex::encode(random_bytes)
}

/// Build the link mailed to the user: `<base>?token=<code>&email=<email>`.
///
/// An existing query string on `base` is extended rather than replaced.
pub fn build_reset_link(base: &str, code: &str, email: &str) -> Result<String, url::ParseError> {
    let mut link = Url::parse(base)?;
    link.query_pairs_mut()
        .append_pair("token", code)
        .append_pair("email", email);
    Ok(link.into())
}
