/// Address prefixes treated as internal.
pub const PRIVATE_PREFIXES: [&str; 3] = ["10.", "172.", "192.168."];

/// Replacement for each masked octet.
pub const OCTET_MASK: &str = "x";

/// Mask the last three octets of a private-range IPv4 address.
///
/// `10.1.2.3` becomes `10.x.x.x`. Anything that does not start with a private
/// prefix or does not have exactly four dot-separated parts is returned as is.
pub fn obfuscate_ip(ip: &str) -> String {
    if !PRIVATE_PREFIXES.iter().any(|prefix| ip.starts_with(prefix)) {
        return ip.to_string();
    }

    let parts: Vec<&str> = ip.split('.').collect();
    if parts.len() != 4 {
        return ip.to_string();
    }

    format!("{}.{OCTET_MASK}.{OCTET_MASK}.{OCTET_MASK}", parts[0])
}
