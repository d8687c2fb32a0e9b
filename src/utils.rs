use base64::{engine::general_purpose::STANDARD, Engine};

// ###################################
// ->   Base64 utils
// ###################################
pub fn b64_encode(v: impl AsRef<[u8]>) -> String {
    STANDARD.encode(v)
}

// ###################################
// ->   Error format chain
// ###################################
/// Calls `Error::source()` on a chain of errors and tries to write them to a `Formatter`.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current_src = e.source();
    while let Some(cause) = current_src {
        write!(f, "Caused by:\n\t{cause}")?;
        current_src = cause.source();
    }

    Ok(())
}
