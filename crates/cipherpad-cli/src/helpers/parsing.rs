//! Parsing helpers for unlock timeouts.

use std::time::Duration;

use cipherpad_core::TtlPreset;

use crate::errors::CliError;

/// Parse a duration string (e.g., "90s", "7d", "24h").
pub fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    if value.len() < 2 {
        return Err(anyhow::anyhow!(
            "Invalid duration: {} (expected <number><unit>)",
            value
        ));
    }

    let (num_str, unit) = value.split_at(value.len() - 1);
    let amount: u64 = num_str
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", value))?;

    let seconds = match unit {
        "d" => amount.checked_mul(86_400),
        "h" => amount.checked_mul(3_600),
        "m" => amount.checked_mul(60),
        "s" => Some(amount),
        _ => {
            return Err(anyhow::anyhow!(
                "Invalid duration unit: {} (use d/h/m/s)",
                unit
            ))
        }
    };
    seconds
        .map(Duration::from_secs)
        .ok_or_else(|| anyhow::anyhow!("Duration is too large: {}", value))
}

/// Resolve a `--timeout` value to a preset.
///
/// Preset names are matched first; other durations round up to the
/// shortest preset that covers them.
pub fn parse_timeout(value: &str) -> anyhow::Result<&'static TtlPreset> {
    if let Some(preset) = TtlPreset::from_name(value) {
        return Ok(preset);
    }
    let duration = parse_duration(value.trim()).map_err(|_| {
        let names: Vec<&str> = TtlPreset::all().iter().map(|p| p.name).collect();
        CliError::invalid_input(format!(
            "Unknown timeout \"{}\" (use one of: {})",
            value,
            names.join(", ")
        ))
    })?;
    let preset = TtlPreset::snap_up(duration);
    tracing::debug!(requested = value, preset = preset.name, "timeout rounded up to preset");
    Ok(preset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_names() {
        assert_eq!(parse_timeout("5m").expect("5m").name, "5m");
        assert_eq!(parse_timeout("NEVER").expect("never").name, "never");
        assert_eq!(
            parse_timeout("immediately").expect("immediately").ttl,
            Duration::ZERO
        );
    }

    #[test]
    fn test_durations_round_up_to_covering_preset() {
        assert_eq!(parse_timeout("30s").expect("30s").name, "1m");
        assert_eq!(parse_timeout("90s").expect("90s").name, "5m");
        assert_eq!(parse_timeout("3h").expect("3h").name, "6h");
        assert_eq!(parse_timeout("60m").expect("60m").name, "1h");
        assert_eq!(parse_timeout("0s").expect("0s").name, "immediately");
        assert_eq!(parse_timeout("3650d").expect("3650d").name, "never");
        assert_eq!(parse_timeout("9999d").expect("9999d").name, "never");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_timeout("soon").is_err());
        assert!(parse_duration("5x").is_err());
        assert!(parse_duration("m").is_err());
    }
}
