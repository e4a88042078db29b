//! Human-readable error descriptions and structured JSON error formatting.

use sweep_core::error::{BuildError, SweepError};
use sweep_hardware::HwError;

use crate::printer::PrinterError;

/// Exit code for a scale that never signalled data-ready.
pub const EXIT_DEVICE_NOT_READY: i32 = 3;
/// Exit code for a config file or builder setting that failed validation.
pub const EXIT_INVALID_CONFIG: i32 = 4;

fn find<'a, T: std::error::Error + 'static>(err: &'a eyre::Report) -> Option<&'a T> {
    err.chain().find_map(|e| e.downcast_ref::<T>())
}

fn sweep_error(err: &eyre::Report) -> Option<SweepError> {
    if let Some(se) = find::<SweepError>(err) {
        return Some(se.clone());
    }
    find::<HwError>(err).map(|hw| match hw {
        HwError::DeviceNotReady => SweepError::DeviceNotReady,
        HwError::InvalidConfiguration(code) => {
            SweepError::InvalidConfiguration(format!("hx711 channel code {code}"))
        }
        other => SweepError::Hardware(other.to_string()),
    })
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = find::<BuildError>(err) {
        return match be {
            BuildError::MissingPrinter => {
                "What happened: No printer status source was provided to the controller.\nLikely causes: The [printer] section could not be turned into a client.\nHow to fix: Check printer.host, printer.port and printer.api_key in the config.".to_string()
            }
            BuildError::MissingArm => {
                "What happened: No arm was provided to the controller.\nLikely causes: The servo failed to initialize or was not wired into the builder.\nHow to fix: Ensure the servo is created successfully and passed via with_arm(...).".to_string()
            }
            BuildError::MissingScale => {
                "What happened: No scale was provided to the controller.\nLikely causes: The HX711 failed to initialize or was not wired into the builder.\nHow to fix: Ensure the HX711 scale is created successfully and passed via with_scale(...).".to_string()
            }
            BuildError::MissingNetwork => {
                "What happened: No network link was provided to the controller.\nLikely causes: The builder was not given a link.\nHow to fix: Pass a link via with_network(...); use the host link when the OS manages Wi-Fi.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/cleansweep.toml for a sample."
            ),
        };
    }

    if let Some(se) = sweep_error(err) {
        return match se {
            SweepError::DeviceNotReady => "What happened: Scale read timed out.\nLikely causes: HX711 not wired correctly, no power/ground, or timeout too low.\nHow to fix: Verify the DT/SCK pins and power, and consider increasing scale.ready_timeout_ms in the config.".to_string(),
            SweepError::InvalidConfiguration(msg) => format!(
                "What happened: Invalid hardware configuration ({msg}).\nLikely causes: Unsupported HX711 channel or gain.\nHow to fix: Set scale.channel to a128, a64 or b32."
            ),
            SweepError::Hardware(msg) => format!(
                "What happened: Hardware fault ({msg}).\nLikely causes: Wrong pin numbers, insufficient GPIO permissions, or an arm angle outside 0..=180.\nHow to fix: Fix the [pins] and [arm] values in the config; ensure the process may access GPIO."
            ),
            SweepError::Network(msg) => format!(
                "What happened: Could not join the network ({msg}).\nLikely causes: Wrong SSID or password, or the access point is out of range.\nHow to fix: Check network.ssid and network.password, or set network.manage_wifi = false."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(pe) = find::<PrinterError>(err) {
        return match pe {
            PrinterError::Status { code, .. } if *code == 401 || *code == 403 => format!(
                "What happened: The printer rejected the request (HTTP {code}).\nLikely causes: Wrong or revoked API key.\nHow to fix: Copy a fresh key into printer.api_key."
            ),
            other => format!(
                "What happened: Printer status request failed ({other}).\nLikely causes: Printer host offline, wrong port or path.\nHow to fix: Check printer.host, printer.port and printer.path in the config."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("failed to read config") {
        return format!(
            "What happened: The config file could not be read.\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Point --config at a readable TOML file. Original: {msg}"
        );
    }

    if lower.contains("parse config") || lower.contains("invalid config") {
        let cause = err
            .chain()
            .nth(1)
            .map(|c| format!(" ({c})"))
            .unwrap_or_default();
        return format!(
            "What happened: Configuration is invalid or incomplete{cause}.\nLikely causes: Missing [printer] section or out-of-range values.\nHow to fix: Edit the TOML config and try again."
        );
    }

    if lower.contains("status server") {
        return format!(
            "What happened: The status page could not be started.\nLikely causes: Port already in use, or binding a port below 1024 without privileges.\nHow to fix: Change status.port or status.bind in the config. Original: {msg}"
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.chain().nth(1) {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes for the failure classes scripts care about.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if find::<BuildError>(err).is_some() {
        return EXIT_INVALID_CONFIG;
    }
    match sweep_error(err) {
        Some(SweepError::DeviceNotReady) => return EXIT_DEVICE_NOT_READY,
        Some(SweepError::InvalidConfiguration(_)) => return EXIT_INVALID_CONFIG,
        _ => {}
    }
    if err.chain().any(|e| {
        let m = e.to_string().to_ascii_lowercase();
        m.contains("invalid config") || m.starts_with("parse config")
    }) {
        return EXIT_INVALID_CONFIG;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = find::<BuildError>(err) {
        return match be {
            BuildError::InvalidConfig(_) => "InvalidConfig",
            _ => "Build",
        };
    }
    if let Some(se) = sweep_error(err) {
        return match se {
            SweepError::DeviceNotReady => "DeviceNotReady",
            SweepError::InvalidConfiguration(_) => "InvalidConfiguration",
            SweepError::PrinterFetch(_) => "PrinterFetch",
            SweepError::RemovalNotConfirmed { .. } => "RemovalNotConfirmed",
            SweepError::Hardware(_) => "Hardware",
            SweepError::Network(_) => "Network",
        };
    }
    if find::<PrinterError>(err).is_some() {
        return "PrinterFetch";
    }
    if exit_code_for_error(err) == EXIT_INVALID_CONFIG {
        return "InvalidConfig";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;
    use rstest::rstest;

    fn wrapped(e: SweepError) -> eyre::Report {
        Err::<(), _>(e).wrap_err("weigh failed").unwrap_err()
    }

    #[rstest]
    #[case(SweepError::DeviceNotReady, EXIT_DEVICE_NOT_READY, "Scale read timed out")]
    #[case(SweepError::InvalidConfiguration("hx711 channel code 7".into()), EXIT_INVALID_CONFIG, "a128")]
    #[case(SweepError::Hardware("pwm error: busy".into()), 1, "GPIO")]
    #[case(SweepError::Network("no AP".into()), 1, "network.ssid")]
    fn typed_faults_survive_wrapping(#[case] e: SweepError, #[case] code: i32, #[case] needle: &str) {
        let report = wrapped(e);
        assert_eq!(exit_code_for_error(&report), code);
        let text = humanize(&report);
        assert!(text.starts_with("What happened:"), "{text}");
        assert!(text.contains(needle), "{text}");
    }

    #[rstest]
    fn hardware_timeout_is_device_not_ready() {
        let report = eyre::Report::new(HwError::DeviceNotReady);
        assert_eq!(exit_code_for_error(&report), EXIT_DEVICE_NOT_READY);
        assert!(humanize(&report).contains("Scale read timed out"));
    }

    #[rstest]
    fn build_errors_are_config_errors() {
        let report = eyre::Report::new(BuildError::InvalidConfig("arm up and down angles must differ"));
        assert_eq!(exit_code_for_error(&report), EXIT_INVALID_CONFIG);
        assert!(humanize(&report).contains("arm up and down angles must differ"));
    }

    #[rstest]
    fn validation_messages_are_config_errors() {
        let report = eyre::eyre!("printer.api_key must not be empty").wrap_err("invalid config");
        assert_eq!(exit_code_for_error(&report), EXIT_INVALID_CONFIG);
        assert!(humanize(&report).contains("printer.api_key must not be empty"));
    }

    #[rstest]
    fn unknown_errors_fall_back_to_generic_text() {
        let report = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&report), 1);
        assert!(humanize(&report).starts_with("Something went wrong."));
    }

    #[rstest]
    fn json_error_has_reason_and_message() {
        let v: serde_json::Value =
            serde_json::from_str(&format_error_json(&wrapped(SweepError::DeviceNotReady))).unwrap();
        assert_eq!(v["reason"], "DeviceNotReady");
        assert_eq!(v["exit_code"], 3);
        assert!(v["message"].as_str().unwrap().contains("What happened"));
    }
}
