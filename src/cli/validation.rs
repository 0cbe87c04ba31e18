//! Value parsers for flags clap cannot check with a plain range.

use std::net::IpAddr;
use std::path::PathBuf;

/// `--config`: must name a readable TOML file
pub fn config_file(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    if !path.is_file() {
        return Err(format!("'{}' is not a configuration file", raw));
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
        return Err(format!("'{}' must be a .toml file", raw));
    }
    std::fs::File::open(&path)
        .map(|_| path)
        .map_err(|e| format!("cannot read '{}': {}", raw, e))
}

/// `serve --host`: an IP literal or a DNS name the listener can resolve
pub fn bind_host(raw: &str) -> Result<String, String> {
    let host = raw.trim();
    if host.parse::<IpAddr>().is_ok() {
        return Ok(host.to_string());
    }

    let looks_like_ipv4 = host.chars().all(|c| c.is_ascii_digit() || c == '.');
    let valid_name = !looks_like_ipv4
        && host.len() <= 253
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });

    if valid_name {
        Ok(host.to_string())
    } else {
        Err(format!("'{}' is neither an IP address nor a host name", raw))
    }
}
