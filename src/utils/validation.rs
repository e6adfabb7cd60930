use crate::utils::error::{AlertError, Result};
use std::net::IpAddr;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Parse a port the way the container sets it: a decimal string from `PORT`.
pub fn parse_port(field_name: &str, raw: &str) -> Result<u16> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AlertError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: raw.to_string(),
            reason: "Port cannot be empty".to_string(),
        });
    }

    let value: u64 = trimmed
        .parse()
        .map_err(|e| AlertError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: raw.to_string(),
            reason: format!("Port must be a number: {}", e),
        })?;

    validate_range(field_name, value, 0, u16::MAX as u64)?;
    Ok(value as u16)
}

pub fn validate_host(field_name: &str, host: &str) -> Result<()> {
    validate_non_empty_string(field_name, host)?;

    if host.parse::<IpAddr>().is_ok() {
        return Ok(());
    }

    // RFC 1123 主機名稱
    let valid_hostname = host.len() <= 253
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });

    if !valid_hostname {
        return Err(AlertError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: host.to_string(),
            reason: "Host must be an IP address or a hostname".to_string(),
        });
    }

    Ok(())
}

pub fn validate_package_names(field_name: &str, packages: &[String]) -> Result<()> {
    for package in packages {
        validate_non_empty_string(field_name, package)?;
        if package.chars().any(char::is_whitespace) {
            return Err(AlertError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: package.clone(),
                reason: "Package names cannot contain whitespace".to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AlertError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(AlertError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}
