//! Cisco IOS module
//!
//! IOS messages carry a `%FACILITY-SEVERITY-MNEMONIC: description` marker,
//! which is the primary (and very reliable) detection signal. Event types
//! are normalized per facility family; the description yields interface,
//! neighbor, user, and state fields.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::fields::FieldValue;
use crate::{
    severity_badge_color, Badge, DetailItem, DeviceModule, DisplayInfo, EventTypeInfo, FieldInfo,
    FilterSuggestion, ModuleMetadata, ParsedLog,
};

static IOS_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"%[A-Z0-9_]+-\d+-[A-Z0-9_]+:").unwrap());

static IOS_MESSAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%([A-Z0-9_]+)-(\d+)-([A-Z0-9_]+):\s*(.*)").unwrap());

static INTERFACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)interface\s+([A-Za-z0-9/.\-]+)").unwrap());

static IPV4: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\b").unwrap());

static NEIGHBOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)neighbor\s+(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})").unwrap());

static USER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\[user:\s*|user:\s*|by\s+)(\w+)").unwrap());

static PAREN_IP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\)").unwrap());

static LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(vty\d+|console|aux)").unwrap());

static STATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"changed state to\s+(\w+)").unwrap());

static ACL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:access-list|ACL)\s+(\w+)").unwrap());

static VLAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"Vlan(\d+)").unwrap());

static GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"group\s+(\d+)").unwrap());

static REASON: Lazy<Regex> = Lazy::new(|| Regex::new(r"reason:\s*(.+?)(?:\s|$)").unwrap());

static DUE_TO: Lazy<Regex> = Lazy::new(|| Regex::new(r"due to\s+(.+?)(?:\s|$)").unwrap());

const HOSTNAME_KEYWORDS: &[&str] = &[
    "cisco", "router", "switch", "asa", "nexus", "catalyst", "ios", "nx-os",
];

const CONTENT_KEYWORDS: &[&str] = &[
    "interface",
    "line protocol",
    "changed state",
    "configured from",
    "vty",
    "console",
    "neighbor",
    "adjacency",
    "ospf",
    "bgp",
    "eigrp",
];

pub struct CiscoModule;

impl DeviceModule for CiscoModule {
    fn name(&self) -> &'static str {
        "cisco"
    }

    fn detect(&self, raw: &str) -> bool {
        if IOS_MARKER.is_match(raw) {
            return true;
        }

        let lower = raw.to_lowercase();
        HOSTNAME_KEYWORDS.iter().any(|h| lower.contains(h))
            && CONTENT_KEYWORDS.iter().any(|k| lower.contains(k))
    }

    fn event_type(&self, raw: &str) -> String {
        let Some(caps) = IOS_MESSAGE.captures(raw) else {
            return "unknown".into();
        };

        let facility = caps[1].to_lowercase();
        let mnemonic = caps[3].to_lowercase();

        match facility.as_str() {
            "link" => state_variant(raw, "interface_up", "interface_down", "interface_state_change"),
            "lineproto" => state_variant(
                raw,
                "line_protocol_up",
                "line_protocol_down",
                "line_protocol_state_change",
            ),
            "sys" => match mnemonic.as_str() {
                "config_i" | "config" => "configuration_change".into(),
                "restart" => "system_restart".into(),
                "reload" => "system_reload".into(),
                _ => "system_event".into(),
            },
            "ospf" => {
                if raw.contains("neighbor") || raw.contains("Neighbor") {
                    if raw.contains("FULL") || raw.contains(" up") {
                        "ospf_neighbor_up".into()
                    } else if raw.contains("DOWN") || raw.contains(" down") {
                        "ospf_neighbor_down".into()
                    } else {
                        "ospf_neighbor_change".into()
                    }
                } else if raw.contains("adjacency") {
                    "ospf_adjacency_change".into()
                } else {
                    "ospf_event".into()
                }
            }
            "bgp" => {
                if raw.contains("neighbor") || raw.contains("Neighbor") {
                    if raw.contains("Up") || raw.contains("established") {
                        "bgp_neighbor_up".into()
                    } else if raw.contains("Down") || raw.contains("down") {
                        "bgp_neighbor_down".into()
                    } else {
                        "bgp_neighbor_change".into()
                    }
                } else {
                    "bgp_event".into()
                }
            }
            "eigrp" => {
                if raw.contains("neighbor") || raw.contains("Neighbor") {
                    "eigrp_neighbor_change".into()
                } else {
                    "eigrp_event".into()
                }
            }
            "sec_login" => {
                let lower = raw.to_lowercase();
                if lower.contains("success") {
                    "login_success".into()
                } else if lower.contains("failure") || lower.contains("failed") {
                    "login_failure".into()
                } else if lower.contains("logout") {
                    "logout".into()
                } else {
                    "authentication_event".into()
                }
            }
            "auth" => {
                let lower = raw.to_lowercase();
                if lower.contains("success") {
                    "authentication_success".into()
                } else if lower.contains("failure") || lower.contains("failed") {
                    "authentication_failure".into()
                } else {
                    "authentication_event".into()
                }
            }
            "acl" => {
                let lower = raw.to_lowercase();
                if lower.contains("denied") || lower.contains("blocked") {
                    "acl_denied".into()
                } else if lower.contains("permitted") || lower.contains("allowed") {
                    "acl_permitted".into()
                } else {
                    "acl_event".into()
                }
            }
            "dhcp" => {
                let lower = raw.to_lowercase();
                if lower.contains("lease") {
                    "dhcp_lease".into()
                } else if lower.contains("release") {
                    "dhcp_release".into()
                } else {
                    "dhcp_event".into()
                }
            }
            "hsrp" | "vrrp" => {
                let lower = raw.to_lowercase();
                if lower.contains("active") || lower.contains("master") {
                    format!("{}_active", facility)
                } else if lower.contains("standby") || lower.contains("backup") {
                    format!("{}_standby", facility)
                } else {
                    format!("{}_state_change", facility)
                }
            }
            "stp" => {
                let lower = raw.to_lowercase();
                if lower.contains("topology change") {
                    "stp_topology_change".into()
                } else if lower.contains("port") {
                    "stp_port_change".into()
                } else {
                    "stp_event".into()
                }
            }
            "ipsec" => {
                let lower = raw.to_lowercase();
                if lower.contains("established") {
                    "ipsec_tunnel_up".into()
                } else if lower.contains("torn down") || lower.contains("down") {
                    "ipsec_tunnel_down".into()
                } else {
                    "ipsec_event".into()
                }
            }
            "crypto" => {
                let lower = raw.to_lowercase();
                if lower.contains("ike") {
                    "ike_event".into()
                } else if lower.contains("ipsec") {
                    "ipsec_event".into()
                } else {
                    "crypto_event".into()
                }
            }
            _ => format!("{}_{}", facility, mnemonic),
        }
    }

    fn parse(&self, raw: &str, mut entry: ParsedLog) -> ParsedLog {
        entry.device_type = "cisco".to_string();
        entry.event_type = self.event_type(raw);

        if let Some(caps) = IOS_MESSAGE.captures(raw) {
            entry.fields.insert("facility".into(), caps[1].into());
            entry
                .fields
                .insert("message_severity".into(), FieldValue::classify(&caps[2]));
            entry.fields.insert("mnemonic".into(), caps[3].into());

            let description = caps[4].to_string();
            parse_description(&description, &mut entry);
            entry.fields.insert("description".into(), description.into());
        }

        entry.event_category = match entry.fields.get("facility").and_then(FieldValue::as_str) {
            Some(facility) => infer_category(facility, &entry.event_type),
            None => "System",
        }
        .to_string();

        entry
    }

    fn display_info(&self, entry: &ParsedLog) -> DisplayInfo {
        let color = match entry.event_category.as_str() {
            "Security" => "#ef4444",
            "Routing" => "#8b5cf6",
            "Network" => "#10b981",
            _ => "#049fd9",
        };

        let description = entry
            .fields
            .get("description")
            .map(FieldValue::as_text)
            .unwrap_or_else(|| entry.raw_message.clone());

        let mut badges = vec![Badge {
            label: "Category".to_string(),
            color: color.to_string(),
            value: entry.event_category.clone(),
        }];
        if let Some(FieldValue::Int(sev)) = entry.fields.get("message_severity") {
            let sev = (*sev).clamp(0, 7) as u8;
            badges.push(Badge {
                label: "Severity".to_string(),
                color: severity_badge_color(sev).to_string(),
                value: siphon_syslog::severity_name(sev).to_string(),
            });
        }

        let mut details = Vec::new();
        for (key, label) in [
            ("interface", "Interface"),
            ("state", "State"),
            ("protocol", "Protocol"),
            ("user", "User"),
            ("line", "Line"),
            ("acl_name", "ACL"),
        ] {
            if let Some(value) = entry.fields.get(key) {
                details.push(DetailItem::text(label, value.as_text()));
            }
        }
        for (key, label) in [
            ("neighbor_ip", "Neighbor"),
            ("source_ip", "Source IP"),
            ("dest_ip", "Destination IP"),
        ] {
            if let Some(value) = entry.fields.get(key) {
                details.push(DetailItem::ip(label, value.as_text()));
            }
        }

        DisplayInfo {
            icon: "fa-diagram-project".to_string(),
            color: color.to_string(),
            title: entry.event_type.replace('_', " "),
            description,
            badges,
            details,
        }
    }

    fn metadata(&self) -> ModuleMetadata {
        ModuleMetadata {
            device_type: "cisco",
            device_name: "Cisco",
            description: "Cisco IOS / IOS-XE devices (%FACILITY-SEVERITY-MNEMONIC format)",
            event_types: vec![
                EventTypeInfo { id: "interface_up", name: "Interface Up", category: "Network" },
                EventTypeInfo { id: "interface_down", name: "Interface Down", category: "Network" },
                EventTypeInfo { id: "interface_state_change", name: "Interface State Change", category: "Network" },
                EventTypeInfo { id: "line_protocol_up", name: "Line Protocol Up", category: "Network" },
                EventTypeInfo { id: "line_protocol_down", name: "Line Protocol Down", category: "Network" },
                EventTypeInfo { id: "line_protocol_state_change", name: "Line Protocol State Change", category: "Network" },
                EventTypeInfo { id: "configuration_change", name: "Configuration Change", category: "System" },
                EventTypeInfo { id: "system_restart", name: "System Restart", category: "System" },
                EventTypeInfo { id: "system_reload", name: "System Reload", category: "System" },
                EventTypeInfo { id: "system_event", name: "System Event", category: "System" },
                EventTypeInfo { id: "ospf_neighbor_up", name: "OSPF Neighbor Up", category: "Routing" },
                EventTypeInfo { id: "ospf_neighbor_down", name: "OSPF Neighbor Down", category: "Routing" },
                EventTypeInfo { id: "ospf_neighbor_change", name: "OSPF Neighbor Change", category: "Routing" },
                EventTypeInfo { id: "ospf_adjacency_change", name: "OSPF Adjacency Change", category: "Routing" },
                EventTypeInfo { id: "ospf_event", name: "OSPF Event", category: "Routing" },
                EventTypeInfo { id: "bgp_neighbor_up", name: "BGP Neighbor Up", category: "Routing" },
                EventTypeInfo { id: "bgp_neighbor_down", name: "BGP Neighbor Down", category: "Routing" },
                EventTypeInfo { id: "bgp_neighbor_change", name: "BGP Neighbor Change", category: "Routing" },
                EventTypeInfo { id: "bgp_event", name: "BGP Event", category: "Routing" },
                EventTypeInfo { id: "eigrp_neighbor_change", name: "EIGRP Neighbor Change", category: "Routing" },
                EventTypeInfo { id: "eigrp_event", name: "EIGRP Event", category: "Routing" },
                EventTypeInfo { id: "login_success", name: "Login Success", category: "Security" },
                EventTypeInfo { id: "login_failure", name: "Login Failure", category: "Security" },
                EventTypeInfo { id: "logout", name: "Logout", category: "Security" },
                EventTypeInfo { id: "authentication_success", name: "Authentication Success", category: "Security" },
                EventTypeInfo { id: "authentication_failure", name: "Authentication Failure", category: "Security" },
                EventTypeInfo { id: "authentication_event", name: "Authentication Event", category: "Security" },
                EventTypeInfo { id: "acl_denied", name: "ACL Denied", category: "Security" },
                EventTypeInfo { id: "acl_permitted", name: "ACL Permitted", category: "Security" },
                EventTypeInfo { id: "acl_event", name: "ACL Event", category: "Security" },
                EventTypeInfo { id: "dhcp_lease", name: "DHCP Lease", category: "Network" },
                EventTypeInfo { id: "dhcp_release", name: "DHCP Release", category: "Network" },
                EventTypeInfo { id: "dhcp_event", name: "DHCP Event", category: "Network" },
                EventTypeInfo { id: "hsrp_active", name: "HSRP Active", category: "Network" },
                EventTypeInfo { id: "hsrp_standby", name: "HSRP Standby", category: "Network" },
                EventTypeInfo { id: "hsrp_state_change", name: "HSRP State Change", category: "Network" },
                EventTypeInfo { id: "vrrp_active", name: "VRRP Active", category: "Network" },
                EventTypeInfo { id: "vrrp_standby", name: "VRRP Standby", category: "Network" },
                EventTypeInfo { id: "vrrp_state_change", name: "VRRP State Change", category: "Network" },
                EventTypeInfo { id: "stp_topology_change", name: "STP Topology Change", category: "Network" },
                EventTypeInfo { id: "stp_port_change", name: "STP Port Change", category: "Network" },
                EventTypeInfo { id: "stp_event", name: "STP Event", category: "Network" },
                EventTypeInfo { id: "ipsec_tunnel_up", name: "IPsec Tunnel Up", category: "Security" },
                EventTypeInfo { id: "ipsec_tunnel_down", name: "IPsec Tunnel Down", category: "Security" },
                EventTypeInfo { id: "ipsec_event", name: "IPsec Event", category: "Security" },
                EventTypeInfo { id: "ike_event", name: "IKE Event", category: "Security" },
                EventTypeInfo { id: "crypto_event", name: "Crypto Event", category: "Security" },
            ],
            common_fields: vec![
                FieldInfo { key: "facility", label: "Facility", kind: "string" },
                FieldInfo { key: "mnemonic", label: "Mnemonic", kind: "string" },
                FieldInfo { key: "message_severity", label: "Message Severity", kind: "number" },
                FieldInfo { key: "interface", label: "Interface", kind: "string" },
                FieldInfo { key: "state", label: "State", kind: "string" },
                FieldInfo { key: "neighbor_ip", label: "Neighbor IP", kind: "ip" },
                FieldInfo { key: "user", label: "User", kind: "string" },
                FieldInfo { key: "line", label: "Line", kind: "string" },
                FieldInfo { key: "vlan", label: "VLAN", kind: "number" },
                FieldInfo { key: "reason", label: "Reason", kind: "string" },
            ],
            filter_suggestions: vec![
                FilterSuggestion {
                    field: "facility",
                    label: "Facility",
                    options: vec!["LINK", "LINEPROTO", "SYS", "OSPF", "BGP", "SEC_LOGIN"],
                },
                FilterSuggestion {
                    field: "state",
                    label: "State",
                    options: vec!["up", "down"],
                },
            ],
        }
    }
}

fn state_variant(raw: &str, up: &str, down: &str, other: &str) -> String {
    if raw.contains("changed state to up") {
        up.into()
    } else if raw.contains("changed state to down") {
        down.into()
    } else {
        other.into()
    }
}

/// Pull interface/address/user/state fields out of the description text.
fn parse_description(description: &str, entry: &mut ParsedLog) {
    if let Some(caps) = INTERFACE.captures(description) {
        entry.fields.insert("interface".into(), caps[1].into());
    }

    let ips: Vec<&str> = IPV4.find_iter(description).map(|m| m.as_str()).collect();
    if let Some(first) = ips.first() {
        entry.fields.insert("source_ip".into(), FieldValue::classify(first));
    }
    if let Some(second) = ips.get(1) {
        entry.fields.insert("dest_ip".into(), FieldValue::classify(second));
    }

    if let Some(caps) = NEIGHBOR.captures(description) {
        entry.fields.insert("neighbor_ip".into(), FieldValue::classify(&caps[1]));
    }

    if let Some(caps) = USER.captures(description) {
        entry.fields.insert("user".into(), caps[1].into());
    }

    // Configuration changes carry the admin's address in parentheses.
    if let Some(caps) = PAREN_IP.captures(description) {
        entry.fields.insert("source_ip".into(), FieldValue::classify(&caps[1]));
    }

    if let Some(caps) = LINE.captures(description) {
        entry.fields.insert("line".into(), caps[1].into());
    }

    if let Some(caps) = STATE.captures(description) {
        entry
            .fields
            .insert("state".into(), caps[1].to_lowercase().into());
    }

    for proto in ["OSPF", "BGP", "EIGRP"] {
        if description.contains(proto) {
            entry.fields.insert("protocol".into(), proto.into());
            break;
        }
    }

    if let Some(caps) = ACL.captures(description) {
        entry.fields.insert("acl_name".into(), caps[1].into());
    }

    if let Some(caps) = VLAN.captures(description) {
        entry.fields.insert("vlan".into(), FieldValue::classify(&caps[1]));
    }

    if let Some(caps) = GROUP.captures(description) {
        entry.fields.insert("group".into(), FieldValue::classify(&caps[1]));
    }

    if let Some(caps) = REASON.captures(description) {
        entry.fields.insert("reason".into(), caps[1].trim().into());
    } else if let Some(caps) = DUE_TO.captures(description) {
        entry.fields.insert("reason".into(), caps[1].trim().into());
    }
}

fn infer_category(facility: &str, event_type: &str) -> &'static str {
    let facility = facility.to_lowercase();
    let event = event_type.to_lowercase();

    if facility == "sec_login"
        || facility == "auth"
        || facility == "acl"
        || event.contains("login")
        || event.contains("auth")
        || event.contains("acl")
    {
        return "Security";
    }
    if facility == "ospf"
        || facility == "bgp"
        || facility == "eigrp"
        || event.contains("neighbor")
    {
        return "Routing";
    }
    if facility == "link"
        || facility == "lineproto"
        || facility == "ip"
        || facility == "dhcp"
        || facility == "hsrp"
        || facility == "vrrp"
        || facility == "stp"
        || event.contains("interface")
        || event.contains("line_protocol")
    {
        return "Network";
    }
    "System"
}

#[cfg(test)]
#[path = "cisco_test.rs"]
mod cisco_test;
