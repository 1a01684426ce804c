//! Cisco Meraki module
//!
//! Meraki cloud-managed devices (MX security appliances, MS switches, MR
//! access points) emit keyword-tagged event streams (`events`, `flows`,
//! `urls`, `ids-alerts`, ...) with `key=value` payloads. Detection is
//! keyword-based and therefore registered after the more specific modules.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::fields::FieldValue;
use crate::{
    extract_key_value_pairs, Badge, DetailItem, DeviceModule, DisplayInfo, EventTypeInfo,
    FieldInfo, FilterSuggestion, ModuleMetadata, ParsedLog,
};

static DEVICE_MODEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(MX\d+|MS\d+|MR\d+|MV\d+|MG\d+|MT\d+|\w+_appliance|\w+_Z\d+)").unwrap());

/// Event-type patterns, checked in order: specific `type=` tags first, then
/// VPN daemon text, then stream names.
static EVENT_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("vpn_connectivity_change", r"type=vpn_connectivity_change"),
        ("association", r"type=association"),
        ("disassociation", r"type=disassociation"),
        ("wpa_auth", r"type=wpa_auth"),
        ("wpa_deauth", r"type=wpa_deauth"),
        ("wpa_failed", r"auth_neg_failed.*is_wpa"),
        ("splash_auth", r"type=splash_auth"),
        ("8021x_auth", r"8021x_auth|8021x_eap_success"),
        ("8021x_deauth", r"8021x_deauth|8021x_client_deauth"),
        ("8021x_failure", r"8021x_eap_failure"),
        ("vpn_ike_established", r"IKE_SA.*established"),
        ("vpn_child_established", r"CHILD_SA.*established"),
        ("vpn_ike_deleted", r"deleting IKE_SA|ISAKMP-SA deleted"),
        ("vpn_child_closed", r"closing CHILD_SA|IPsec-SA established"),
        ("vpn_phase1_initiate", r"initiate new phase 1|initiate new phase 2"),
        (
            "vpn_phase2_failed",
            r"phase2 negotiation failed|failed to get sainfo|failed to pre-process ph2",
        ),
        ("vpn_ipsec_queued", r"IPsec-SA request queued"),
        ("vpn_isakmp_purge", r"purging ISAKMP-SA"),
        ("anyconnect_auth_success", r"anyconnect_vpn_auth_success"),
        ("anyconnect_auth_failure", r"anyconnect_vpn_auth_failure"),
        ("anyconnect_connect", r"anyconnect_vpn_connect"),
        ("anyconnect_disconnect", r"anyconnect_vpn_disconnect"),
        ("anyconnect_session", r"anyconnect_vpn_session_manager"),
        ("dhcp_lease", r"dhcp lease"),
        ("dhcp_no_offers", r"dhcp no offers"),
        ("dhcp_blocked", r"Blocked DHCP server"),
        ("ids_alert", r"ids-alerts|ids_alerted"),
        ("security_file_scanned", r"security_filtering_file_scanned"),
        ("security_disposition", r"security_filtering_disposition_change"),
        ("port_status", r"port.*status changed"),
        ("stp_guard", r"STP BPDU.*blocked|spanning-tree guard"),
        ("stp_role_change", r"STP role|spanning-tree interface role"),
        ("vrrp_collision", r"VRRP.*collision|incompatible configuration"),
        ("vrrp_transition", r"VRRP.*transition|VRRP passive to VRRP active"),
        ("power_supply", r"Power supply.*inserted"),
        ("packet_flood", r"device_packet_flood"),
        ("rogue_ssid", r"rogue_ssid_detected"),
        ("ssid_spoofing", r"ssid_spoofing_detected"),
        ("uplink_connectivity", r"uplink|Cellular connection|failover"),
        ("urls", r"\burls\b"),
        ("firewall", r"\bfirewall\b|cellular_firewall|vpn_firewall"),
        ("flows", r"\bflows\b"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).unwrap()))
    .collect()
});

const DETECT_KEYWORDS: &[&str] = &[
    "mx", "ms", "mr", "mv", "mg", "mt", "labs_appliance", "labs_z1", "events", "urls", "flows",
    "firewall", "ids-alerts", "security_event", "airmarshal_events", "cellular_firewall",
    "vpn_firewall",
];

static PEER_TUNNEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"between\s+\S+\[([^\]]+)\].*\.\.\.\S*\[([^\]]+)\]").unwrap()
});
static LEASED_IP: Lazy<Regex> = Lazy::new(|| Regex::new(r"ip ([\d.]+)").unwrap());
static SERVER_MAC: Lazy<Regex> = Lazy::new(|| Regex::new(r"server mac ([A-F0-9:]+)").unwrap());
static CLIENT_MAC: Lazy<Regex> = Lazy::new(|| Regex::new(r"client mac ([A-F0-9:]+)").unwrap());
static SUBNET: Lazy<Regex> = Lazy::new(|| Regex::new(r"subnet ([\d./]+)").unwrap());
static VLAN_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"on VLAN (\d+)").unwrap());
static PORT_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)port (\d+)").unwrap());
static STATUS_CHANGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"from (\w+) to (\w+)").unwrap());
static PEER_IP: Lazy<Regex> = Lazy::new(|| Regex::new(r"Peer IP=([\d.]+)").unwrap());
static ANYCONNECT_USER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"User\[([^\]]+)\]|user id '([^']+)'").unwrap());
static EPOCH_TS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{10}\.\d+)\b").unwrap());

pub struct MerakiModule;

impl DeviceModule for MerakiModule {
    fn name(&self) -> &'static str {
        "meraki"
    }

    fn detect(&self, raw: &str) -> bool {
        let lower = raw.to_lowercase();
        DETECT_KEYWORDS.iter().any(|k| lower.contains(k))
    }

    fn event_type(&self, raw: &str) -> String {
        for (name, pattern) in EVENT_PATTERNS.iter() {
            if pattern.is_match(raw) {
                return (*name).to_string();
            }
        }
        "unknown".to_string()
    }

    fn parse(&self, raw: &str, mut entry: ParsedLog) -> ParsedLog {
        entry.device_type = "meraki".to_string();
        entry.event_type = self.event_type(raw);

        if let Some(model) = DEVICE_MODEL.find(raw) {
            entry
                .fields
                .insert("device_model".into(), model.as_str().into());
        }

        if let Some(caps) = EPOCH_TS.captures(raw) {
            entry
                .fields
                .insert("meraki_timestamp".into(), caps[1].into());
        }

        for (key, value) in extract_key_value_pairs(raw) {
            entry.fields.insert(key, FieldValue::classify(&value));
        }

        parse_event_fields(raw, &mut entry);

        entry
    }

    fn display_info(&self, entry: &ParsedLog) -> DisplayInfo {
        let color = match entry.event_category.as_str() {
            "Security" | "Firewall" => "#ef4444",
            "VPN" => "#6366f1",
            "Wireless" => "#10b981",
            _ => "#67b346",
        };

        let mut badges = Vec::new();
        if !entry.event_category.is_empty() {
            badges.push(Badge {
                label: "Category".to_string(),
                color: color.to_string(),
                value: entry.event_category.clone(),
            });
        }
        if let Some(model) = entry.fields.get("device_model") {
            badges.push(Badge {
                label: "Model".to_string(),
                color: "#67b346".to_string(),
                value: model.as_text(),
            });
        }

        let mut details = Vec::new();
        for (key, label, kind) in [
            ("source_ip", "Source IP", "ip"),
            ("source_port", "Source Port", "text"),
            ("dest_ip", "Destination IP", "ip"),
            ("dest_port", "Destination Port", "text"),
            ("protocol", "Protocol", "text"),
            ("action", "Action", "text"),
            ("user", "User", "text"),
            ("peer_ip", "Peer IP", "ip"),
            ("leased_ip", "Leased IP", "ip"),
            ("client_mac", "Client MAC", "mac"),
            ("url", "URL", "url"),
            ("signature_id", "Signature", "text"),
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
            icon: "fa-cloud".to_string(),
            color: color.to_string(),
            title: entry.event_type.replace('_', " "),
            description: entry.raw_message.clone(),
            badges,
            details,
        }
    }

    fn metadata(&self) -> ModuleMetadata {
        ModuleMetadata {
            device_type: "meraki",
            device_name: "Meraki",
            description: "Cisco Meraki MX/MS/MR event, flow, and security streams",
            event_types: vec![
                EventTypeInfo { id: "flows", name: "Flow", category: "Firewall" },
                EventTypeInfo { id: "firewall", name: "Firewall", category: "Firewall" },
                EventTypeInfo { id: "urls", name: "URL Request", category: "Web" },
                EventTypeInfo { id: "ids_alert", name: "IDS Alert", category: "Security" },
                EventTypeInfo { id: "security_file_scanned", name: "File Scanned", category: "Security" },
                EventTypeInfo { id: "security_disposition", name: "File Disposition Change", category: "Security" },
                EventTypeInfo { id: "vpn_connectivity_change", name: "VPN Connectivity Change", category: "VPN" },
                EventTypeInfo { id: "vpn_ike_established", name: "VPN IKE Established", category: "VPN" },
                EventTypeInfo { id: "vpn_child_established", name: "VPN Child SA Established", category: "VPN" },
                EventTypeInfo { id: "vpn_ike_deleted", name: "VPN IKE Deleted", category: "VPN" },
                EventTypeInfo { id: "vpn_child_closed", name: "VPN Child SA Closed", category: "VPN" },
                EventTypeInfo { id: "vpn_phase1_initiate", name: "VPN Phase 1 Initiate", category: "VPN" },
                EventTypeInfo { id: "vpn_phase2_failed", name: "VPN Phase 2 Failed", category: "VPN" },
                EventTypeInfo { id: "vpn_ipsec_queued", name: "VPN IPsec Queued", category: "VPN" },
                EventTypeInfo { id: "vpn_isakmp_purge", name: "VPN ISAKMP Purge", category: "VPN" },
                EventTypeInfo { id: "anyconnect_auth_success", name: "AnyConnect Auth Success", category: "VPN" },
                EventTypeInfo { id: "anyconnect_auth_failure", name: "AnyConnect Auth Failure", category: "VPN" },
                EventTypeInfo { id: "anyconnect_connect", name: "AnyConnect Connect", category: "VPN" },
                EventTypeInfo { id: "anyconnect_disconnect", name: "AnyConnect Disconnect", category: "VPN" },
                EventTypeInfo { id: "anyconnect_session", name: "AnyConnect Session", category: "VPN" },
                EventTypeInfo { id: "uplink_connectivity", name: "Uplink Connectivity", category: "Network" },
                EventTypeInfo { id: "dhcp_lease", name: "DHCP Lease", category: "Network" },
                EventTypeInfo { id: "dhcp_no_offers", name: "DHCP No Offers", category: "Network" },
                EventTypeInfo { id: "dhcp_blocked", name: "Rogue DHCP Blocked", category: "Security" },
                EventTypeInfo { id: "association", name: "WiFi Association", category: "Wireless" },
                EventTypeInfo { id: "disassociation", name: "WiFi Disassociation", category: "Wireless" },
                EventTypeInfo { id: "wpa_auth", name: "WPA Auth", category: "Wireless" },
                EventTypeInfo { id: "wpa_deauth", name: "WPA Deauth", category: "Wireless" },
                EventTypeInfo { id: "wpa_failed", name: "WPA Failed", category: "Wireless" },
                EventTypeInfo { id: "splash_auth", name: "Splash Auth", category: "Wireless" },
                EventTypeInfo { id: "8021x_auth", name: "802.1X Auth", category: "Wireless" },
                EventTypeInfo { id: "8021x_deauth", name: "802.1X Deauth", category: "Wireless" },
                EventTypeInfo { id: "8021x_failure", name: "802.1X Failure", category: "Wireless" },
                EventTypeInfo { id: "port_status", name: "Port Status Change", category: "Network" },
                EventTypeInfo { id: "stp_guard", name: "STP Guard", category: "Network" },
                EventTypeInfo { id: "stp_role_change", name: "STP Role Change", category: "Network" },
                EventTypeInfo { id: "vrrp_collision", name: "VRRP Collision", category: "System" },
                EventTypeInfo { id: "vrrp_transition", name: "VRRP Transition", category: "System" },
                EventTypeInfo { id: "power_supply", name: "Power Supply", category: "System" },
                EventTypeInfo { id: "packet_flood", name: "Packet Flood", category: "Security" },
                EventTypeInfo { id: "rogue_ssid", name: "Rogue SSID Detected", category: "Security" },
                EventTypeInfo { id: "ssid_spoofing", name: "SSID Spoofing Detected", category: "Security" },
            ],
            common_fields: vec![
                FieldInfo { key: "device_model", label: "Device Model", kind: "string" },
                FieldInfo { key: "src", label: "Source", kind: "string" },
                FieldInfo { key: "dst", label: "Destination", kind: "string" },
                FieldInfo { key: "source_ip", label: "Source IP", kind: "ip" },
                FieldInfo { key: "dest_ip", label: "Destination IP", kind: "ip" },
                FieldInfo { key: "protocol", label: "Protocol", kind: "string" },
                FieldInfo { key: "action", label: "Action", kind: "string" },
                FieldInfo { key: "client_mac", label: "Client MAC", kind: "mac" },
                FieldInfo { key: "url", label: "URL", kind: "string" },
                FieldInfo { key: "signature_id", label: "IDS Signature", kind: "string" },
            ],
            filter_suggestions: vec![
                FilterSuggestion {
                    field: "action",
                    label: "Action",
                    options: vec!["allow", "deny"],
                },
                FilterSuggestion {
                    field: "protocol",
                    label: "Protocol",
                    options: vec!["tcp", "udp", "icmp"],
                },
            ],
        }
    }
}

/// Split a `host:port` field value into its parts.
fn split_host_port(value: &str) -> (String, Option<String>) {
    match value.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            (host.to_string(), Some(port.to_string()))
        }
        _ => (value.to_string(), None),
    }
}

/// Event-family-specific field extraction and categorization.
fn parse_event_fields(raw: &str, entry: &mut ParsedLog) {
    match entry.event_type.as_str() {
        "vpn_connectivity_change" => {
            entry.event_category = "VPN".into();
            if let Some(peer) = entry.fields.get("peer_contact").map(FieldValue::as_text) {
                let (ip, port) = split_host_port(&peer);
                entry.fields.insert("peer_ip".into(), FieldValue::classify(&ip));
                if let Some(port) = port {
                    entry.fields.insert("peer_port".into(), FieldValue::classify(&port));
                }
            }
        }

        "vpn_ike_established" | "vpn_child_established" | "vpn_ike_deleted"
        | "vpn_child_closed" | "vpn_phase1_initiate" | "vpn_phase2_failed"
        | "vpn_ipsec_queued" | "vpn_isakmp_purge" => {
            entry.event_category = "VPN".into();
            if let Some(caps) = PEER_TUNNEL.captures(raw) {
                entry.fields.insert("local_ip".into(), FieldValue::classify(&caps[1]));
                entry.fields.insert("remote_ip".into(), FieldValue::classify(&caps[2]));
            }
        }

        "anyconnect_auth_success" | "anyconnect_auth_failure" | "anyconnect_connect"
        | "anyconnect_disconnect" | "anyconnect_session" => {
            entry.event_category = "VPN".into();
            if let Some(caps) = PEER_IP.captures(raw) {
                entry.fields.insert("peer_ip".into(), FieldValue::classify(&caps[1]));
            }
            if let Some(caps) = ANYCONNECT_USER.captures(raw) {
                let user = caps.get(1).or_else(|| caps.get(2));
                if let Some(user) = user {
                    entry.fields.insert("user".into(), user.as_str().into());
                }
            }
        }

        "uplink_connectivity" => {
            entry.event_category = "Network".into();
            if raw.contains("Cellular") {
                entry.fields.insert("uplink_type".into(), "Cellular".into());
            }
            if raw.contains("down") {
                entry.fields.insert("status".into(), "down".into());
            } else if raw.contains("up") {
                entry.fields.insert("status".into(), "up".into());
            }
        }

        "dhcp_lease" => {
            entry.event_category = "Network".into();
            if let Some(caps) = LEASED_IP.captures(raw) {
                entry.fields.insert("leased_ip".into(), FieldValue::classify(&caps[1]));
            }
            if let Some(caps) = SERVER_MAC.captures(raw) {
                entry.fields.insert("server_mac".into(), FieldValue::classify(&caps[1]));
            }
            if let Some(caps) = CLIENT_MAC.captures(raw) {
                entry.fields.insert("client_mac".into(), FieldValue::classify(&caps[1]));
            }
            if let Some(caps) = SUBNET.captures(raw) {
                entry.fields.insert("subnet".into(), caps[1].into());
            }
        }

        "dhcp_no_offers" => {
            entry.event_category = "Network".into();
            if let Some(caps) = CLIENT_MAC.captures(raw) {
                entry.fields.insert("client_mac".into(), FieldValue::classify(&caps[1]));
            }
        }

        "dhcp_blocked" => {
            entry.event_category = "Security".into();
            if let Some(caps) = VLAN_TAG.captures(raw) {
                entry.fields.insert("vlan".into(), FieldValue::classify(&caps[1]));
            }
        }

        "firewall" | "flows" => {
            entry.event_category = "Firewall".into();
            promote_endpoints(entry);
            if raw.contains(" allow ") {
                entry.fields.insert("action".into(), "allow".into());
            } else if raw.contains(" deny ") {
                entry.fields.insert("action".into(), "deny".into());
            }
        }

        "ids_alert" | "security_file_scanned" | "security_disposition" => {
            entry.event_category = "Security".into();
            promote_endpoints(entry);
            if let Some(sig) = entry.fields.get("signature").cloned() {
                entry.fields.insert("signature_id".into(), sig);
            }
            if let Some(msg) = entry.fields.get("message").cloned() {
                entry.fields.insert("alert_message".into(), msg);
            }
            if let Some(name) = entry.fields.get("name").cloned() {
                entry.fields.insert("file_name".into(), name);
            }
            if let Some(sha) = entry.fields.get("sha256").cloned() {
                entry.fields.insert("file_sha256".into(), sha);
            }
        }

        "urls" => {
            entry.event_category = "Web".into();
            promote_endpoints(entry);
            let request = entry.fields.get("request").map(FieldValue::as_text);
            if let Some(request) = request {
                if let Some((method, url)) = request.split_once(' ') {
                    entry.fields.insert("method".into(), method.into());
                    entry.fields.insert("url".into(), url.into());
                }
            }
        }

        "port_status" | "stp_guard" | "stp_role_change" => {
            entry.event_category = "Network".into();
            if let Some(caps) = PORT_NUMBER.captures(raw) {
                entry.fields.insert("port_number".into(), FieldValue::classify(&caps[1]));
            }
            if let Some(caps) = STATUS_CHANGE.captures(raw) {
                entry.fields.insert("old_status".into(), caps[1].into());
                entry.fields.insert("new_status".into(), caps[2].into());
            }
        }

        "association" | "disassociation" | "wpa_auth" | "wpa_deauth" | "wpa_failed"
        | "splash_auth" | "8021x_auth" | "8021x_deauth" | "8021x_failure" => {
            entry.event_category = "Wireless".into();
        }

        "rogue_ssid" | "ssid_spoofing" | "packet_flood" => {
            entry.event_category = "Security".into();
        }

        "vrrp_collision" | "vrrp_transition" | "power_supply" => {
            entry.event_category = "System".into();
        }

        _ => {}
    }
}

/// Promote `src`/`dst` host:port pairs and related keys to normalized names.
fn promote_endpoints(entry: &mut ParsedLog) {
    if let Some(src) = entry.fields.get("src").map(FieldValue::as_text) {
        let (ip, port) = split_host_port(&src);
        entry.fields.insert("source_ip".into(), FieldValue::classify(&ip));
        if let Some(port) = port {
            entry.fields.insert("source_port".into(), FieldValue::classify(&port));
        }
    }
    if let Some(dst) = entry.fields.get("dst").map(FieldValue::as_text) {
        let (ip, port) = split_host_port(&dst);
        entry.fields.insert("dest_ip".into(), FieldValue::classify(&ip));
        if let Some(port) = port {
            entry.fields.insert("dest_port".into(), FieldValue::classify(&port));
        }
    }
    if let Some(mac) = entry.fields.get("mac").cloned() {
        entry.fields.insert("mac_address".into(), mac);
    }
    if let Some(sport) = entry.fields.get("sport").cloned() {
        entry.fields.insert("source_port".into(), sport);
    }
    if let Some(dport) = entry.fields.get("dport").cloned() {
        entry.fields.insert("dest_port".into(), dport);
    }
}

#[cfg(test)]
#[path = "meraki_test.rs"]
mod meraki_test;
