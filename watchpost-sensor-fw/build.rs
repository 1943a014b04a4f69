//! Build script for watchpost-sensor-fw
//!
//! - Validates node.toml at compile time
//! - Generates `node_config.rs` with typed constants for the firmware

use std::env;
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    let config = validate_config();
    generate_config(&config);
}

/// Validate node.toml and return the parsed document
fn validate_config() -> toml::Value {
    println!("cargo:rerun-if-changed=node.toml");

    let config_path = Path::new("node.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: node.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The sensor firmware requires a node.toml configuration file.    ║\n\
            ║  Please create one in the watchpost-sensor-fw directory.         ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read node.toml                                 ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in node.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_node(&config, &mut errors);
    validate_network(&config, &mut errors);
    validate_alerts(&config, &mut errors);
    validate_secrets(&config, &mut errors);
    report("Invalid node configuration", &errors);

    println!("cargo:warning=node.toml validated successfully");
    config
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn string_at<'a>(config: &'a toml::Value, section: &str, key: &str) -> Option<&'a str> {
    config.get(section)?.get(key)?.as_str()
}

fn integer_at(config: &toml::Value, section: &str, key: &str) -> Option<i64> {
    config.get(section)?.get(key)?.as_integer()
}

fn require_ip(config: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) {
    match string_at(config, section, key) {
        Some(text) if text.parse::<Ipv4Addr>().is_ok() => {}
        Some(text) => errors.push(format!("[{}] {} '{}' is not an IPv4 address", section, key, text)),
        None => errors.push(format!("[{}] missing '{}'", section, key)),
    }
}

/// Parse `a.b.c.d[:port]`
fn parse_endpoint(text: &str, default_port: u16) -> Option<(Ipv4Addr, u16)> {
    match text.split_once(':') {
        Some((ip, port)) => Some((ip.parse().ok()?, port.parse().ok()?)),
        None => Some((text.parse().ok()?, default_port)),
    }
}

fn validate_node(config: &toml::Value, errors: &mut Vec<String>) {
    match string_at(config, "node", "device_name") {
        Some(name) if !name.is_empty() && name.len() <= 32 => {}
        Some(_) => errors.push("[node] device_name must be 1-32 characters".into()),
        None => errors.push("[node] missing 'device_name'".into()),
    }
    match string_at(config, "node", "role") {
        Some("sensor") => {}
        Some(other) => errors.push(format!("[node] role must be 'sensor', found '{}'", other)),
        None => errors.push("[node] missing 'role'".into()),
    }
}

fn validate_network(config: &toml::Value, errors: &mut Vec<String>) {
    require_ip(config, "network", "address", errors);
    require_ip(config, "network", "gateway", errors);
    require_ip(config, "display", "address", errors);

    match integer_at(config, "network", "prefix_len") {
        Some(len) if (8..=30).contains(&len) => {}
        Some(_) => errors.push("[network] prefix_len must be 8-30".into()),
        None => errors.push("[network] missing 'prefix_len'".into()),
    }
    match integer_at(config, "network", "udp_port") {
        Some(port) if (1..=65535).contains(&port) => {}
        Some(_) => errors.push("[network] udp_port must be 1-65535".into()),
        None => errors.push("[network] missing 'udp_port'".into()),
    }
}

fn validate_alerts(config: &toml::Value, errors: &mut Vec<String>) {
    let fallbacks = match config.get("alerts").and_then(|a| a.get("fallbacks")) {
        Some(toml::Value::Array(list)) => list,
        Some(_) => {
            errors.push("[alerts] fallbacks must be an array".into());
            return;
        }
        None => {
            errors.push("[alerts] missing 'fallbacks'".into());
            return;
        }
    };
    if fallbacks.len() != 2 {
        errors.push("[alerts] fallbacks must list exactly 2 addresses".into());
    }
    for entry in fallbacks {
        match entry.as_str() {
            Some(text) if parse_endpoint(text, 5005).is_some() => {}
            _ => errors.push(format!("[alerts] bad fallback {}", entry)),
        }
    }
}

fn validate_secrets(config: &toml::Value, errors: &mut Vec<String>) {
    match string_at(config, "access_point", "ssid") {
        Some(ssid) if !ssid.is_empty() && ssid.len() <= 32 => {}
        _ => errors.push("[access_point] ssid must be 1-32 characters".into()),
    }
    match string_at(config, "access_point", "password") {
        Some(pass) if (8..=64).contains(&pass.len()) => {}
        _ => errors.push("[access_point] password must be 8-64 characters".into()),
    }
    match string_at(config, "security", "pin") {
        Some(pin) if pin.len() == 8 && pin.chars().all(|c| "0123456789ABCD*#".contains(c)) => {}
        _ => errors.push("[security] pin must be 8 keypad characters".into()),
    }
}

fn ip_literal(ip: Ipv4Addr) -> String {
    let [a, b, c, d] = ip.octets();
    format!("Ipv4Addr::new({}, {}, {}, {})", a, b, c, d)
}

fn endpoint_literal(text: &str, default_port: u16) -> String {
    // Validated above
    let (ip, port) = parse_endpoint(text, default_port).unwrap();
    format!("Endpoint::new({}, {})", ip_literal(ip), port)
}

/// Write `node_config.rs` into OUT_DIR
fn generate_config(config: &toml::Value) {
    let ip = |section: &str, key: &str| -> Ipv4Addr {
        string_at(config, section, key).unwrap().parse().unwrap()
    };
    let text = |section: &str, key: &str| -> String { string_at(config, section, key).unwrap().to_string() };
    let port = integer_at(config, "network", "udp_port").unwrap() as u16;

    let fallbacks: Vec<String> = config["alerts"]["fallbacks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| endpoint_literal(f.as_str().unwrap(), port))
        .collect();

    let out = format!(
        "// Generated by build.rs from node.toml. Do not edit.\n\
         \n\
         pub const DEVICE_NAME: &str = {:?};\n\
         pub const ROLE: NodeRole = NodeRole::Sensor;\n\
         pub const ADDRESS: Ipv4Addr = {};\n\
         pub const PREFIX_LEN: u8 = {};\n\
         pub const GATEWAY: Ipv4Addr = {};\n\
         pub const UDP_PORT: u16 = {};\n\
         pub const DISPLAY: Endpoint = Endpoint::new({}, {});\n\
         pub const FALLBACKS: [Endpoint; 2] = [{}];\n\
         pub const AP_SSID: &str = {:?};\n\
         pub const AP_PASSWORD: &str = {:?};\n\
         pub const DEFAULT_PIN: &str = {:?};\n",
        text("node", "device_name"),
        ip_literal(ip("network", "address")),
        integer_at(config, "network", "prefix_len").unwrap(),
        ip_literal(ip("network", "gateway")),
        port,
        ip_literal(ip("display", "address")),
        port,
        fallbacks.join(", "),
        text("access_point", "ssid"),
        text("access_point", "password"),
        text("security", "pin"),
    );

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("node_config.rs"), out).unwrap();
}
