//! Tests for the Cisco module

use chrono::Utc;

use crate::cisco::CiscoModule;
use crate::fields::FieldValue;
use crate::{DeviceModule, ParsedLog};

fn entry_for(raw: &str) -> ParsedLog {
    ParsedLog::new(raw, Utc::now(), 3, 187)
}

#[test]
fn test_detect_ios_marker() {
    let module = CiscoModule;
    assert!(module.detect("%LINK-3-UPDOWN: Interface GigabitEthernet0/1, changed state to up"));
    assert!(module.detect("%SYS-5-CONFIG_I: Configured from console by admin"));
}

#[test]
fn test_detect_hostname_plus_keyword() {
    let module = CiscoModule;
    assert!(module.detect("router1 line protocol on Interface Gi0/1 changed state"));
    assert!(!module.detect("router1 something unrelated happened"));
    assert!(!module.detect("plain message without markers"));
}

#[test]
fn test_interface_events() {
    let module = CiscoModule;
    assert_eq!(
        module.event_type("%LINK-3-UPDOWN: Interface Gi0/1, changed state to up"),
        "interface_up"
    );
    assert_eq!(
        module.event_type("%LINK-3-UPDOWN: Interface Gi0/1, changed state to down"),
        "interface_down"
    );
    assert_eq!(
        module.event_type("%LINEPROTO-5-UPDOWN: Line protocol on Interface Gi0/1, changed state to down"),
        "line_protocol_down"
    );
}

#[test]
fn test_config_and_auth_events() {
    let module = CiscoModule;
    assert_eq!(
        module.event_type("%SYS-5-CONFIG_I: Configured from console by admin on vty0 (10.0.0.5)"),
        "configuration_change"
    );
    assert_eq!(
        module.event_type("%SEC_LOGIN-4-LOGIN_FAILED: Login failed [user: bob] [Source: 10.1.1.1]"),
        "login_failure"
    );
    assert_eq!(
        module.event_type("%SEC_LOGIN-5-LOGIN_SUCCESS: Login Success [user: alice]"),
        "login_success"
    );
}

#[test]
fn test_routing_events() {
    let module = CiscoModule;
    assert_eq!(
        module.event_type(
            "%OSPF-5-ADJCHG: Process 1, Nbr 10.0.0.2 on Gi0/0 from LOADING to FULL, neighbor up"
        ),
        "ospf_neighbor_up"
    );
    assert_eq!(
        module.event_type("%BGP-5-ADJCHANGE: neighbor 192.0.2.1 Up"),
        "bgp_neighbor_up"
    );
}

#[test]
fn test_unknown_facility_builds_event_type() {
    let module = CiscoModule;
    assert_eq!(
        module.event_type("%ENVMON-2-FAN_FAILURE: Fan 1 failure detected"),
        "envmon_fan_failure"
    );
    assert_eq!(module.event_type("no marker here"), "unknown");
}

#[test]
fn test_parse_interface_fields() {
    let module = CiscoModule;
    let raw = "%LINK-3-UPDOWN: Interface GigabitEthernet0/1, changed state to up";
    let parsed = module.parse(raw, entry_for(raw));

    assert_eq!(parsed.device_type, "cisco");
    assert_eq!(parsed.event_category, "Network");
    assert_eq!(
        parsed.fields.get("facility"),
        Some(&FieldValue::Str("LINK".into()))
    );
    assert_eq!(
        parsed.fields.get("mnemonic"),
        Some(&FieldValue::Str("UPDOWN".into()))
    );
    assert_eq!(parsed.fields.get("message_severity"), Some(&FieldValue::Int(3)));
    assert_eq!(
        parsed.fields.get("interface"),
        Some(&FieldValue::Str("GigabitEthernet0/1".into()))
    );
    assert_eq!(
        parsed.fields.get("state"),
        Some(&FieldValue::Str("up".into()))
    );
}

#[test]
fn test_parse_config_change_fields() {
    let module = CiscoModule;
    let raw = "%SYS-5-CONFIG_I: Configured from console by admin on vty0 (10.0.0.5)";
    let parsed = module.parse(raw, entry_for(raw));

    assert_eq!(parsed.event_type, "configuration_change");
    assert_eq!(parsed.event_category, "System");
    assert_eq!(parsed.fields.get("user"), Some(&FieldValue::Str("admin".into())));
    assert_eq!(parsed.fields.get("line"), Some(&FieldValue::Str("vty0".into())));
    assert!(matches!(parsed.fields.get("source_ip"), Some(FieldValue::Ip(_))));
}

#[test]
fn test_parse_routing_fields() {
    let module = CiscoModule;
    let raw = "%BGP-5-ADJCHANGE: neighbor 192.0.2.1 Up";
    let parsed = module.parse(raw, entry_for(raw));

    assert_eq!(parsed.event_category, "Routing");
    assert!(matches!(
        parsed.fields.get("neighbor_ip"),
        Some(FieldValue::Ip(_))
    ));
    assert_eq!(
        parsed.fields.get("protocol"),
        Some(&FieldValue::Str("BGP".into()))
    );
}

#[test]
fn test_security_category() {
    let module = CiscoModule;
    let raw = "%SEC_LOGIN-4-LOGIN_FAILED: Login failed [user: bob]";
    let parsed = module.parse(raw, entry_for(raw));

    assert_eq!(parsed.event_category, "Security");
    assert_eq!(parsed.fields.get("user"), Some(&FieldValue::Str("bob".into())));
}

#[test]
fn test_display_info() {
    let module = CiscoModule;
    let raw = "%LINK-3-UPDOWN: Interface Gi0/1, changed state to down";
    let parsed = module.parse(raw, entry_for(raw));
    let info = module.display_info(&parsed);

    assert_eq!(info.title, "interface down");
    assert!(info.badges.iter().any(|b| b.value == "Network"));
    assert!(info.details.iter().any(|d| d.label == "State" && d.value == "down"));
}

#[test]
fn test_crypto_facility_distinction() {
    let module = CiscoModule;

    assert_eq!(
        module.event_type("%CRYPTO-6-IKMP_MODE_FAILURE: Processing of Ike mode failed"),
        "ike_event"
    );
    assert_eq!(
        module.event_type("%CRYPTO-4-RECVD_PKT_INV_SPI: decaps: rec'd IPSEC packet has invalid spi"),
        "ipsec_event"
    );
    assert_eq!(
        module.event_type("%CRYPTO-6-SELF_TEST_RESULT: Self test of algorithm succeeded"),
        "crypto_event"
    );
}

#[test]
fn test_ipsec_facility_events() {
    let module = CiscoModule;

    assert_eq!(
        module.event_type("%IPSEC-5-TUNNEL_STATUS: Tunnel to 192.0.2.1 established"),
        "ipsec_tunnel_up"
    );
    assert_eq!(
        module.event_type("%IPSEC-3-TUNNEL_STATUS: Tunnel to 192.0.2.1 torn down"),
        "ipsec_tunnel_down"
    );
    assert_eq!(
        module.event_type("%IPSEC-6-STATUS: periodic status report"),
        "ipsec_event"
    );
}

#[test]
fn test_reason_extraction() {
    let module = CiscoModule;

    let raw = "%LINEPROTO-5-UPDOWN: Line protocol on Interface Gi0/1, changed state to down due to keepalive failure";
    let parsed = module.parse(raw, entry_for(raw));
    assert_eq!(
        parsed.fields.get("reason"),
        Some(&FieldValue::Str("keepalive".into()))
    );

    let raw = "%BGP-3-NOTIFICATION: sent to neighbor 192.0.2.1 reason: holdtime expired";
    let parsed = module.parse(raw, entry_for(raw));
    assert_eq!(
        parsed.fields.get("reason"),
        Some(&FieldValue::Str("holdtime".into()))
    );
}

#[test]
fn test_metadata_covers_emittable_event_types() {
    use std::collections::HashSet;

    let module = CiscoModule;
    let ids: HashSet<&str> = module.metadata().event_types.iter().map(|e| e.id).collect();

    // Every fixed id the facility switch can produce.
    for id in [
        "interface_up",
        "interface_down",
        "interface_state_change",
        "line_protocol_up",
        "line_protocol_down",
        "line_protocol_state_change",
        "configuration_change",
        "system_restart",
        "system_reload",
        "system_event",
        "ospf_neighbor_up",
        "ospf_neighbor_down",
        "ospf_neighbor_change",
        "ospf_adjacency_change",
        "ospf_event",
        "bgp_neighbor_up",
        "bgp_neighbor_down",
        "bgp_neighbor_change",
        "bgp_event",
        "eigrp_neighbor_change",
        "eigrp_event",
        "login_success",
        "login_failure",
        "logout",
        "authentication_success",
        "authentication_failure",
        "authentication_event",
        "acl_denied",
        "acl_permitted",
        "acl_event",
        "dhcp_lease",
        "dhcp_release",
        "dhcp_event",
        "hsrp_active",
        "hsrp_standby",
        "hsrp_state_change",
        "vrrp_active",
        "vrrp_standby",
        "vrrp_state_change",
        "stp_topology_change",
        "stp_port_change",
        "stp_event",
        "ipsec_tunnel_up",
        "ipsec_tunnel_down",
        "ipsec_event",
        "ike_event",
        "crypto_event",
    ] {
        assert!(ids.contains(id), "metadata missing event type '{}'", id);
    }
}
