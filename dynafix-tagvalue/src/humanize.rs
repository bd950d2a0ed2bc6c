/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Human-readable rendering of wire bytes.

/// Renders wire bytes with every SOH shown as `" | "`.
///
/// Diagnostic use only: the result is not parseable and the substitution is
/// not reversible (DATA values may themselves contain SOH).
#[must_use]
pub fn humanize(bytes: &[u8]) -> String {
    bytes
        .split(|&b| b == 0x01)
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(" | ")
}
