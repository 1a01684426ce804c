//! Ubiquiti UniFi module
//!
//! Handles two dialects:
//!
//! - **CEF** - UniFi Network exports `CEF:0|Ubiquiti|...` with the event
//!   name in the sixth header slot and `UNIFI*` extension keys.
//! - **Device-level** - raw process logs from the gateways themselves
//!   (charon, sshd, kernel, dnsmasq, hostapd, ...).

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::fields::FieldValue;
use crate::{
    extract_key_value_pairs, severity_badge_color, Badge, DetailItem, DeviceModule, DisplayInfo,
    EventTypeInfo, FieldInfo, FilterSuggestion, ModuleMetadata, ParsedLog,
};

static CEF_SIGNATURE: Lazy<Regex> = Lazy::new(|| Regex::new(r"CEF:\d+\|Ubiquiti\|").unwrap());

static CEF_EVENT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"CEF:\d+\|[^|]+\|[^|]+\|[^|]+\|[^|]+\|([^|]+)\|").unwrap());

static CEF_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"CEF:(\d+)\|([^|]+)\|([^|]+)\|([^|]+)\|([^|]+)\|([^|]+)\|([^|]+)\|(.*)").unwrap()
});

static PROCESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)\[(\d+)\]:").unwrap());

static IPV4: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\b").unwrap());

static MAC_ADDR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([0-9A-Fa-f]{2}(?:[:-][0-9A-Fa-f]{2}){5})\b").unwrap()
});

static PORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"port\s+(\d+)").unwrap());

static FW_SRC: Lazy<Regex> = Lazy::new(|| Regex::new(r"SRC=(\S+)").unwrap());
static FW_DST: Lazy<Regex> = Lazy::new(|| Regex::new(r"DST=(\S+)").unwrap());
static FW_PROTO: Lazy<Regex> = Lazy::new(|| Regex::new(r"PROTO=(\w+)").unwrap());
static FW_DPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"DPT=(\d+)").unwrap());
static FW_SPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"SPT=(\d+)").unwrap());

static SSH_USER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:for|user)\s+(\w+)").unwrap());
static FROM_HOST: Lazy<Regex> = Lazy::new(|| Regex::new(r"from\s+(\S+)").unwrap());
static LINK_STATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+):\s+link\s+(up|down)").unwrap());

static SA_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+)\]").unwrap());
static SA_LOCAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"between\s+(\S+)").unwrap());
static SA_REMOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\.\.\s*(\S+)").unwrap());

/// Processes seen on UniFi devices; any hit also needs a hostname keyword.
const PROCESS_KEYWORDS: &[&str] = &[
    "charon",
    "unifi",
    "ubnt",
    "mca-monitor",
    "mca-client",
    "mca-alert",
    "kernel",
    "sshd",
    "dhcp",
    "dnsmasq",
    "hostapd",
    "wpa_supplicant",
];

const HOSTNAME_KEYWORDS: &[&str] = &[
    "unifi", "ubiquiti", "ucg", "udm", "usg", "uxg", "dream", "cloud", "gateway",
];

pub struct UbiquitiModule;

impl DeviceModule for UbiquitiModule {
    fn name(&self) -> &'static str {
        "ubiquiti"
    }

    fn detect(&self, raw: &str) -> bool {
        if CEF_SIGNATURE.is_match(raw) {
            return true;
        }

        let lower = raw.to_lowercase();
        PROCESS_KEYWORDS.iter().any(|p| lower.contains(p))
            && HOSTNAME_KEYWORDS.iter().any(|h| lower.contains(h))
    }

    fn event_type(&self, raw: &str) -> String {
        // CEF: the sixth header field is the event name.
        if let Some(caps) = CEF_EVENT_NAME.captures(raw) {
            return caps[1].to_lowercase().replace(' ', "_");
        }

        // CEF extension category keys, when the header regex missed.
        let kv = extract_key_value_pairs(raw);
        if let Some(category) = kv.get("UNIFIcategory") {
            let category = category.to_lowercase();
            if let Some(sub) = kv.get("UNIFIsubCategory") {
                return format!("{}_{}", category, sub.to_lowercase().replace(' ', "_"));
            }
            return category;
        }

        device_level_event_type(&raw.to_lowercase())
    }

    fn parse(&self, raw: &str, mut entry: ParsedLog) -> ParsedLog {
        entry.device_type = "ubiquiti".to_string();
        entry.event_type = self.event_type(raw);

        if let Some(caps) = CEF_HEADER.captures(raw) {
            entry.fields.insert("cef_version".into(), FieldValue::classify(&caps[1]));
            entry.fields.insert("vendor".into(), caps[2].into());
            entry.fields.insert("product".into(), caps[3].into());
            entry.fields.insert("product_version".into(), caps[4].into());
            entry.fields.insert("event_class_id".into(), caps[5].into());
            entry.fields.insert("event_name".into(), caps[6].into());
            entry.fields.insert("cef_severity".into(), FieldValue::classify(&caps[7]));

            for (key, value) in parse_cef_extension(&caps[8]) {
                entry.fields.insert(key, FieldValue::classify(&value));
            }
        } else {
            parse_device_level(raw, &mut entry);
        }

        entry.event_category = match entry.fields.get("UNIFIcategory").and_then(FieldValue::as_str)
        {
            Some(category) => match entry.fields.get("UNIFIsubCategory").and_then(FieldValue::as_str) {
                Some(sub) => format!("{} / {}", category, sub),
                None => category.to_string(),
            },
            None => infer_category(&entry.event_type).to_string(),
        };

        entry
    }

    fn display_info(&self, entry: &ParsedLog) -> DisplayInfo {
        let (icon, color) = category_style(&entry.event_category, &entry.event_type);

        let description = entry
            .fields
            .get("msg")
            .map(FieldValue::as_text)
            .unwrap_or_else(|| entry.raw_message.clone());

        let title = entry
            .fields
            .get("event_name")
            .map(FieldValue::as_text)
            .unwrap_or_else(|| entry.event_type.replace('_', " "));

        let mut badges = Vec::new();
        if !entry.event_category.is_empty() {
            badges.push(Badge {
                label: "Category".to_string(),
                color: color.to_string(),
                value: entry.event_category.clone(),
            });
        }
        if let Some(FieldValue::Int(sev)) = entry.fields.get("cef_severity") {
            let sev = (*sev).clamp(0, 7) as u8;
            badges.push(Badge {
                label: "Severity".to_string(),
                color: severity_badge_color(sev).to_string(),
                value: siphon_syslog::severity_name(sev).to_string(),
            });
        }

        let mut details = Vec::new();
        for (key, label, kind) in [
            ("UNIFIhost", "Host", "text"),
            ("UNIFIclientHostname", "Client Hostname", "text"),
            ("UNIFIclientIp", "Client IP", "ip"),
            ("UNIFIclientMac", "Client MAC", "mac"),
            ("UNIFInetworkName", "Network", "text"),
            ("src", "Source IP", "ip"),
            ("dst", "Destination IP", "ip"),
            ("source_ip", "Source IP", "ip"),
            ("dest_ip", "Destination IP", "ip"),
            ("user", "User", "text"),
            ("interface", "Interface", "text"),
            ("process_name", "Process", "text"),
        ] {
            if let Some(value) = entry.fields.get(key) {
                details.push(DetailItem {
                    label: label.to_string(),
                    value: value.as_text(),
                    kind,
                });
            }
        }

        DisplayInfo {
            icon: icon.to_string(),
            color: color.to_string(),
            title,
            description,
            badges,
            details,
        }
    }

    fn metadata(&self) -> ModuleMetadata {
        ModuleMetadata {
            device_type: "ubiquiti",
            device_name: "Ubiquiti",
            description: "Ubiquiti UniFi devices (USG, UDM, UCG, UAP) - CEF and device-level logs",
            event_types: vec![
                // CEF event types
                EventTypeInfo { id: "wired_client_connected", name: "Wired Client Connected", category: "Monitoring" },
                EventTypeInfo { id: "wired_client_disconnected", name: "Wired Client Disconnected", category: "Monitoring" },
                EventTypeInfo { id: "wifi_client_connected", name: "WiFi Client Connected", category: "Monitoring" },
                EventTypeInfo { id: "wifi_client_disconnected", name: "WiFi Client Disconnected", category: "Monitoring" },
                EventTypeInfo { id: "blocked_by_firewall", name: "Blocked by Firewall", category: "Security" },
                EventTypeInfo { id: "threat_detected_and_blocked", name: "Threat Detected and Blocked", category: "Security" },
                EventTypeInfo { id: "honeypot_triggered", name: "Honeypot Triggered", category: "Security" },
                EventTypeInfo { id: "temporary_internet_disconnection", name: "Temporary Internet Disconnection", category: "Internet" },
                EventTypeInfo { id: "wan_failover", name: "WAN Failover", category: "Internet" },
                EventTypeInfo { id: "high_latency_detected", name: "High Latency Detected", category: "Internet" },
                EventTypeInfo { id: "packet_loss_detected", name: "Packet Loss Detected", category: "Internet" },
                EventTypeInfo { id: "admin_accessed_unifi_network", name: "Admin Accessed UniFi Network", category: "System" },
                EventTypeInfo { id: "device_adopted", name: "Device Adopted", category: "System" },
                EventTypeInfo { id: "device_offline", name: "Device Offline", category: "System" },
                EventTypeInfo { id: "device_online", name: "Device Online", category: "System" },
                EventTypeInfo { id: "insufficient_poe_output", name: "Insufficient PoE Output", category: "Power" },
                EventTypeInfo { id: "poe_availability_exceeded", name: "PoE Availability Exceeded", category: "Power" },
                EventTypeInfo { id: "ap_underpowered", name: "AP Underpowered", category: "Power" },
                // Device-level event types
                EventTypeInfo { id: "ipsec_ike_established", name: "IPsec IKE SA Established", category: "VPN" },
                EventTypeInfo { id: "ipsec_ike_closed", name: "IPsec IKE SA Closed", category: "VPN" },
                EventTypeInfo { id: "ipsec_child_established", name: "IPsec Child SA Established", category: "VPN" },
                EventTypeInfo { id: "ipsec_child_closed", name: "IPsec Child SA Closed", category: "VPN" },
                EventTypeInfo { id: "ipsec_message", name: "IPsec Message", category: "VPN" },
                EventTypeInfo { id: "ipsec_event", name: "IPsec Event", category: "VPN" },
                EventTypeInfo { id: "ssh_login_success", name: "SSH Login Success", category: "Security" },
                EventTypeInfo { id: "ssh_login_failed", name: "SSH Login Failed", category: "Security" },
                EventTypeInfo { id: "ssh_disconnected", name: "SSH Disconnected", category: "Security" },
                EventTypeInfo { id: "ssh_event", name: "SSH Event", category: "Security" },
                EventTypeInfo { id: "interface_state_change", name: "Interface State Change", category: "Network" },
                EventTypeInfo { id: "firewall_event", name: "Firewall Event", category: "Security" },
                EventTypeInfo { id: "kernel_event", name: "Kernel Event", category: "System" },
                EventTypeInfo { id: "dhcp_lease", name: "DHCP Lease", category: "Network" },
                EventTypeInfo { id: "dhcp_release", name: "DHCP Release", category: "Network" },
                EventTypeInfo { id: "dhcp_event", name: "DHCP Event", category: "Network" },
                EventTypeInfo { id: "dns_event", name: "DNS Event", category: "Network" },
                EventTypeInfo { id: "wifi_association", name: "WiFi Association", category: "Wireless" },
                EventTypeInfo { id: "wifi_disassociation", name: "WiFi Disassociation", category: "Wireless" },
                EventTypeInfo { id: "wifi_event", name: "WiFi Event", category: "Wireless" },
                EventTypeInfo { id: "unifi_monitoring", name: "UniFi Monitoring", category: "Monitoring" },
                EventTypeInfo { id: "unifi_client_event", name: "UniFi Client Event", category: "Monitoring" },
                EventTypeInfo { id: "unifi_alert", name: "UniFi Alert", category: "System" },
                EventTypeInfo { id: "unifi_system_event", name: "UniFi System Event", category: "System" },
            ],
            common_fields: vec![
                FieldInfo { key: "UNIFIhost", label: "UniFi Host", kind: "string" },
                FieldInfo { key: "UNIFIcategory", label: "UniFi Category", kind: "string" },
                FieldInfo { key: "UNIFIsubCategory", label: "UniFi Sub Category", kind: "string" },
                FieldInfo { key: "UNIFIclientIp", label: "Client IP", kind: "ip" },
                FieldInfo { key: "UNIFIclientMac", label: "Client MAC", kind: "mac" },
                FieldInfo { key: "UNIFIclientHostname", label: "Client Hostname", kind: "string" },
                FieldInfo { key: "UNIFInetworkName", label: "Network Name", kind: "string" },
                FieldInfo { key: "UNIFInetworkVlan", label: "Network VLAN", kind: "number" },
                FieldInfo { key: "src", label: "Source IP", kind: "ip" },
                FieldInfo { key: "dst", label: "Destination IP", kind: "ip" },
                FieldInfo { key: "proto", label: "Protocol", kind: "string" },
                FieldInfo { key: "spt", label: "Source Port", kind: "port" },
                FieldInfo { key: "dpt", label: "Destination Port", kind: "port" },
                FieldInfo { key: "act", label: "Action", kind: "string" },
            ],
            filter_suggestions: vec![
                FilterSuggestion {
                    field: "UNIFIcategory",
                    label: "UniFi Category",
                    options: vec!["Monitoring", "Security", "Internet", "Power", "System"],
                },
                FilterSuggestion {
                    field: "act",
                    label: "Action",
                    options: vec!["blocked", "allowed"],
                },
            ],
        }
    }
}

/// Classify device-level (non-CEF) logs by process fingerprints.
fn device_level_event_type(lower: &str) -> String {
    if lower.contains("charon") {
        if lower.contains("ike_sa") || lower.contains("ike-sa") {
            if lower.contains("established") {
                return "ipsec_ike_established".into();
            }
            if lower.contains("deleted") || lower.contains("closing") {
                return "ipsec_ike_closed".into();
            }
        }
        if lower.contains("child_sa") || lower.contains("child-sa") {
            if lower.contains("established") {
                return "ipsec_child_established".into();
            }
            if lower.contains("closing") || lower.contains("deleted") {
                return "ipsec_child_closed".into();
            }
        }
        if lower.contains("generating") || lower.contains("received") {
            return "ipsec_message".into();
        }
        return "ipsec_event".into();
    }

    if lower.contains("sshd") {
        if lower.contains("accepted") || lower.contains("successful") {
            return "ssh_login_success".into();
        }
        if lower.contains("failed") || lower.contains("authentication failure") {
            return "ssh_login_failed".into();
        }
        if lower.contains("disconnected") {
            return "ssh_disconnected".into();
        }
        return "ssh_event".into();
    }

    if lower.contains("kernel:") {
        if lower.contains("link up") || lower.contains("link down") {
            return "interface_state_change".into();
        }
        if lower.contains("ufw") || lower.contains("firewall") {
            return "firewall_event".into();
        }
        return "kernel_event".into();
    }

    if lower.contains("dhcp") {
        if lower.contains("lease") {
            return "dhcp_lease".into();
        }
        if lower.contains("release") {
            return "dhcp_release".into();
        }
        return "dhcp_event".into();
    }

    if lower.contains("dnsmasq") {
        return "dns_event".into();
    }

    if lower.contains("hostapd") || lower.contains("wpa_supplicant") {
        if lower.contains("associated") || lower.contains("association") {
            return "wifi_association".into();
        }
        if lower.contains("disassociated") || lower.contains("disassociation") {
            return "wifi_disassociation".into();
        }
        return "wifi_event".into();
    }

    if lower.contains("mca-") {
        if lower.contains("monitor") {
            return "unifi_monitoring".into();
        }
        if lower.contains("client") {
            return "unifi_client_event".into();
        }
        if lower.contains("alert") {
            return "unifi_alert".into();
        }
        return "unifi_system_event".into();
    }

    "unknown".into()
}

/// Parse a CEF extension: `key=value` runs where values may contain spaces.
///
/// CEF does not quote values, so a value extends until the next `key=` token.
fn parse_cef_extension(extension: &str) -> HashMap<String, String> {
    let mut result = HashMap::new();
    let mut current_key: Option<String> = None;
    let mut current_value = String::new();

    for part in extension.split_whitespace() {
        match part.split_once('=') {
            Some((key, value)) if !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_') => {
                if let Some(prev) = current_key.take() {
                    result.insert(prev, std::mem::take(&mut current_value));
                }
                current_key = Some(key.to_string());
                current_value = value.to_string();
            }
            _ => {
                if current_key.is_some() {
                    if !current_value.is_empty() {
                        current_value.push(' ');
                    }
                    current_value.push_str(part);
                }
            }
        }
    }

    if let Some(key) = current_key {
        result.insert(key, current_value);
    }

    if result.is_empty() {
        return extract_key_value_pairs(extension);
    }

    result
}

/// Extract fields from device-level logs: process, addresses, event specifics.
fn parse_device_level(raw: &str, entry: &mut ParsedLog) {
    if let Some(caps) = PROCESS.captures(raw) {
        entry.fields.insert("process_name".into(), caps[1].into());
        entry.fields.insert("process_id".into(), FieldValue::classify(&caps[2]));
    }

    let ips: Vec<&str> = IPV4.find_iter(raw).map(|m| m.as_str()).collect();
    if let Some(first) = ips.first() {
        entry.fields.insert("source_ip".into(), FieldValue::classify(first));
    }
    if let Some(second) = ips.get(1) {
        entry.fields.insert("dest_ip".into(), FieldValue::classify(second));
    }

    if let Some(mac) = MAC_ADDR.find(raw) {
        entry
            .fields
            .insert("mac_address".into(), FieldValue::classify(mac.as_str()));
    }

    if let Some(caps) = PORT.captures(raw) {
        entry.fields.insert("port".into(), FieldValue::classify(&caps[1]));
    }

    for (key, value) in extract_key_value_pairs(raw) {
        entry.fields.insert(key, FieldValue::classify(&value));
    }

    match entry.event_type.as_str() {
        "ipsec_ike_established" | "ipsec_child_established" => {
            if let Some(caps) = SA_ID.captures(raw) {
                entry.fields.insert("sa_id".into(), FieldValue::classify(&caps[1]));
            }
            if let Some(caps) = SA_LOCAL.captures(raw) {
                entry.fields.insert("local_ip".into(), FieldValue::classify(&caps[1]));
            }
            if let Some(caps) = SA_REMOTE.captures(raw) {
                entry.fields.insert("remote_ip".into(), FieldValue::classify(&caps[1]));
            }
        }
        "ssh_login_success" | "ssh_login_failed" => {
            if let Some(caps) = SSH_USER.captures(raw) {
                entry.fields.insert("user".into(), caps[1].into());
            }
            if let Some(caps) = FROM_HOST.captures(raw) {
                entry.fields.insert("source_ip".into(), FieldValue::classify(&caps[1]));
            }
        }
        "interface_state_change" => {
            if let Some(caps) = LINK_STATE.captures(raw) {
                entry.fields.insert("interface".into(), caps[1].into());
                entry.fields.insert("link_state".into(), caps[2].into());
            }
        }
        "firewall_event" => {
            if raw.contains("BLOCK") {
                entry.fields.insert("action".into(), "blocked".into());
            } else if raw.contains("ALLOW") {
                entry.fields.insert("action".into(), "allowed".into());
            }
            for (re, key) in [
                (&*FW_SRC, "source_ip"),
                (&*FW_DST, "dest_ip"),
                (&*FW_PROTO, "protocol"),
                (&*FW_DPT, "dest_port"),
                (&*FW_SPT, "source_port"),
            ] {
                if let Some(caps) = re.captures(raw) {
                    entry.fields.insert(key.into(), FieldValue::classify(&caps[1]));
                }
            }
        }
        _ => {}
    }
}

fn infer_category(event_type: &str) -> &'static str {
    let e = event_type;
    if e.contains("firewall") || e.contains("threat") || e.contains("honeypot") || e.contains("intrusion") || e.contains("ssh") {
        return "Security";
    }
    if e.contains("wifi") || e.contains("client") || e.contains("roaming") || e.contains("monitoring") {
        return "Monitoring";
    }
    if e.contains("outage") || e.contains("failover") || e.contains("latency") || e.contains("packet_loss") {
        return "Internet";
    }
    if e.contains("poe") || e.contains("power") {
        return "Power";
    }
    if e.contains("ipsec") || e.contains("vpn") {
        return "VPN";
    }
    if e.contains("dhcp") || e.contains("dns") || e.contains("interface") {
        return "Network";
    }
    "System"
}

fn category_style(category: &str, event_type: &str) -> (&'static str, &'static str) {
    if event_type.contains("wired_client") {
        return ("fa-network-wired", "#10b981");
    }
    if category.contains("Security") {
        return ("fa-shield-halved", "#ef4444");
    }
    if category.contains("Monitoring") || category.contains("Wireless") {
        return ("fa-wifi", "#10b981");
    }
    if category.contains("Internet") {
        return ("fa-globe", "#f59e0b");
    }
    if category.contains("Power") {
        return ("fa-plug", "#8b5cf6");
    }
    if category.contains("VPN") {
        return ("fa-lock", "#6366f1");
    }
    ("fa-server", "#0066cc")
}

#[cfg(test)]
#[path = "ubiquiti_test.rs"]
mod ubiquiti_test;
