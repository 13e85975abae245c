use crate::Result;

/// Parse user-supplied port text. Range checking is left to `validate_port`
/// so that values like `0` and `65536` get the range error, not a format one.
pub fn parse_port_input(port: &str) -> Result<u32> {
    port.trim()
        .parse::<u32>()
        .map_err(|_| crate::Error::InvalidPort(format!("'{}' is not a number", port.trim())))
}

pub fn validate_port(port: u32) -> Result<u16> {
    match u16::try_from(port) {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(crate::Error::InvalidPort(port.to_string())),
    }
}

pub fn parse_pid(pid: &str) -> Result<u32> {
    match pid.trim().parse::<u32>() {
        Ok(0) => Err(crate::Error::InvalidPid(
            "PID 0 does not identify a single process".to_string(),
        )),
        Ok(pid) => Ok(pid),
        Err(_) => Err(crate::Error::InvalidPid(format!("'{}'", pid.trim()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_port() {
        assert_eq!(validate_port(1).unwrap(), 1);
        assert_eq!(validate_port(8080).unwrap(), 8080);
        assert_eq!(validate_port(65535).unwrap(), 65535);

        for port in [0, 65536, 100_000] {
            let result = validate_port(port);
            assert!(result.is_err());
            assert!(result.unwrap_err().to_string().contains("between 1 and 65535"));
        }
    }

    #[test]
    fn test_parse_port_input() {
        assert_eq!(parse_port_input("3000").unwrap(), 3000);
        assert_eq!(parse_port_input(" 8080\n").unwrap(), 8080);
        assert_eq!(parse_port_input("65536").unwrap(), 65536);

        for input in ["", "http", "-1", "30.5"] {
            let result = parse_port_input(input);
            assert!(result.is_err());
            assert!(result.unwrap_err().to_string().contains("Invalid port"));
        }
    }

    #[test]
    fn test_parse_pid() {
        for valid in ["1", "123", "65535", " 4242 "] {
            assert!(parse_pid(valid).is_ok());
        }

        for invalid in ["abc", "", "12.34", "not_a_number", "-5", "0"] {
            let result = parse_pid(invalid);
            assert!(result.is_err());
            assert!(result.unwrap_err().to_string().contains("Invalid PID format"));
        }
    }
}
