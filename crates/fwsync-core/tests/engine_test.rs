#![allow(clippy::unwrap_used)]
// End-to-end reconciliation tests against a wiremock appliance.
//
// The mock server doubles as a spy: `received_requests()` gives the exact
// order of remote calls, which is what most invariants here are about.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fwsync_api::{Credentials, Scheme};
use fwsync_core::{
    ApplyState, ConnectionMode, ConnectionSettings, CoreError, Device, DeviceId, DeviceStatus,
    Domain, Engine, EngineConfig, InMemoryRepository, IpMacPolicy, Phase, RegistrationStatus,
    RuleAction, RuleOwner, RuleRecord, RuleStatus, SingletonConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config() -> EngineConfig {
    EngineConfig {
        credentials: Credentials {
            username: "admin".into(),
            password: "secret".to_string().into(),
        },
        scheme: Scheme::Http,
        ..EngineConfig::default()
    }
}

/// Appliance whose login and logout always succeed.
async fn appliance() -> MockServer {
    let server = MockServer::start().await;
    mount_session(&server).await;
    server
}

async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 0})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

fn device_for(id: &str, server: &MockServer) -> Device {
    let addr = server.address();
    Device::new(id, addr.ip()).with_port(addr.port())
}

fn engine_with(devices: Vec<Device>) -> (Engine<InMemoryRepository>, Arc<InMemoryRepository>) {
    let repo = Arc::new(InMemoryRepository::new());
    for device in devices {
        repo.insert_device(device);
    }
    (Engine::new(config(), Arc::clone(&repo)), repo)
}

async fn reply(server: &MockServer, verb: &str, endpoint: &str, body: Value) {
    Mock::given(method(verb))
        .and(path(format!("/api/{endpoint}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Paths the appliance saw, minus login and logout.
async fn calls(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().trim_start_matches("/api/").to_owned())
        .filter(|p| p != "login" && p != "logout")
        .collect()
}

async fn body_of(server: &MockServer, endpoint: &str) -> Value {
    let requests = server.received_requests().await.unwrap();
    let request = requests
        .iter()
        .find(|r| r.url.path() == format!("/api/{endpoint}"))
        .unwrap();
    serde_json::from_slice(&request.body).unwrap()
}

async fn logouts(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/api/logout")
        .count()
}

fn dev() -> DeviceId {
    DeviceId::from("fw-1")
}

fn template_rule(id: &str, status: RuleStatus) -> RuleRecord {
    RuleRecord::new(id, RuleOwner::Template("plant-a".into()))
        .with_action(RuleAction::Block)
        .with_status(status)
        .with_attr("src_ip", "10.0.0.1")
        .with_attr("protocol", "tcp")
}

// ── Rule-list Apply ─────────────────────────────────────────────────

#[tokio::test]
async fn test_apply_five_tuple_replaces_remote_rules() {
    let server = appliance().await;
    reply(&server, "GET", "rule/ids", json!({"ids": [9]})).await;
    for ep in ["rule/disable", "rule/delete", "rule/add", "rule/enable"] {
        reply(&server, "POST", ep, json!({"status": 0})).await;
    }

    let (engine, repo) = engine_with(vec![device_for("fw-1", &server)]);
    repo.seed_records(
        &dev(),
        Domain::FiveTuple,
        vec![
            template_rule("1", RuleStatus::Enabled),
            template_rule("2", RuleStatus::Disabled),
            template_rule("3", RuleStatus::Enabled),
        ],
    );

    engine.apply_domain(&dev(), Domain::FiveTuple).await.unwrap();

    assert_eq!(
        calls(&server).await,
        vec!["rule/ids", "rule/disable", "rule/delete", "rule/add", "rule/enable"]
    );
    assert_eq!(body_of(&server, "rule/disable").await, json!({"ids": ["9"]}));
    assert_eq!(body_of(&server, "rule/delete").await, json!({"ids": ["9"]}));
    assert_eq!(body_of(&server, "rule/enable").await, json!({"ids": ["1", "3"]}));

    let added = body_of(&server, "rule/add").await;
    let rules = added["rules"].as_array().unwrap();
    assert_eq!(rules.len(), 3);
    assert_eq!(rules[1]["_ruleID"], json!("2"));
    assert_eq!(rules[1]["_status"], json!(0));
    assert_eq!(rules[0]["_action"], json!(2));
    assert_eq!(logouts(&server).await, 1);
}

#[tokio::test]
async fn test_apply_uses_echoed_ids_for_enable() {
    let server = appliance().await;
    reply(&server, "GET", "modbus/ids", json!([])).await;
    reply(&server, "POST", "modbus/add", json!({"status": 2, "ids": [501, 502]})).await;
    reply(&server, "POST", "modbus/enable", json!({"status": 0})).await;

    let (engine, repo) = engine_with(vec![device_for("fw-1", &server)]);
    repo.seed_records(
        &dev(),
        Domain::Modbus,
        vec![
            template_rule("a", RuleStatus::Disabled),
            template_rule("b", RuleStatus::Enabled),
        ],
    );

    engine.apply_domain(&dev(), Domain::Modbus).await.unwrap();

    assert_eq!(calls(&server).await, vec!["modbus/ids", "modbus/add", "modbus/enable"]);
    assert_eq!(body_of(&server, "modbus/enable").await, json!({"ids": ["502"]}));
}

#[tokio::test]
async fn test_apply_never_sends_empty_id_lists() {
    let server = appliance().await;
    reply(&server, "GET", "whitelist/ids", json!({"ids": []})).await;
    reply(&server, "POST", "whitelist/add", json!({"status": 0})).await;

    let (engine, repo) = engine_with(vec![device_for("fw-1", &server)]);
    repo.seed_records(
        &dev(),
        Domain::Whitelist,
        vec![template_rule("7", RuleStatus::Disabled)],
    );

    engine.apply_domain(&dev(), Domain::Whitelist).await.unwrap();

    assert_eq!(calls(&server).await, vec!["whitelist/ids", "whitelist/add"]);
}

#[tokio::test]
async fn test_apply_stops_at_failed_step() {
    let server = appliance().await;
    reply(&server, "GET", "s7/ids", json!({"ids": ["4"]})).await;
    reply(
        &server,
        "POST",
        "s7/disable",
        json!({"status": -2, "msg": "rule locked"}),
    )
    .await;

    let (engine, repo) = engine_with(vec![device_for("fw-1", &server)]);
    repo.seed_records(&dev(), Domain::S7, vec![template_rule("1", RuleStatus::Enabled)]);

    let err = engine.apply_domain(&dev(), Domain::S7).await.unwrap_err();

    assert_eq!(err.failed_phase(), Some(Phase::Apply(ApplyState::Cleared)));
    assert!(matches!(
        err.root(),
        CoreError::ApplianceLogic { code: Some(-2), .. }
    ));
    // Nothing after the failure went out, and the session was still closed.
    assert_eq!(calls(&server).await, vec!["s7/ids", "s7/disable"]);
    assert_eq!(logouts(&server).await, 1);
}

#[tokio::test]
async fn test_apply_fails_fast_when_login_rejected() {
    let server = MockServer::start().await;
    reply(&server, "POST", "login", json!({"status": -1, "msg": "bad password"})).await;

    let (engine, _repo) = engine_with(vec![device_for("fw-1", &server)]);
    let err = engine
        .apply_domain(&dev(), Domain::FiveTuple)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    assert!(calls(&server).await.is_empty());
}

// ── Verdict Apply ───────────────────────────────────────────────────

#[tokio::test]
async fn test_apply_blacklist_groups_by_action() {
    let server = appliance().await;
    reply(
        &server,
        "GET",
        "blacklist/ids",
        json!({"ids": [3001, 3002, 3003, 3999]}),
    )
    .await;
    reply(&server, "POST", "blacklist/action", json!({"success": true})).await;
    for ep in ["blacklist/enable", "blacklist/disable"] {
        reply(&server, "POST", ep, json!({"status": 0})).await;
    }

    let (engine, repo) = engine_with(vec![device_for("fw-1", &server)]);
    let owner = RuleOwner::Device(dev());
    repo.seed_records(
        &dev(),
        Domain::Blacklist,
        vec![
            RuleRecord::new("3001", owner.clone()).with_action(RuleAction::Block),
            RuleRecord::new("3002", owner.clone())
                .with_action(RuleAction::Alert)
                .with_status(RuleStatus::Disabled),
            RuleRecord::new("3003", owner).with_action(RuleAction::Block),
        ],
    );

    engine.apply_domain(&dev(), Domain::Blacklist).await.unwrap();

    assert_eq!(
        calls(&server).await,
        vec![
            "blacklist/ids",
            "blacklist/action",
            "blacklist/action",
            "blacklist/disable",
            "blacklist/enable"
        ]
    );
    // 3999 has no local row, so it is switched off with the disabled ones.
    assert_eq!(
        body_of(&server, "blacklist/disable").await,
        json!({"ids": ["3002", "3999"]})
    );
    assert_eq!(
        body_of(&server, "blacklist/enable").await,
        json!({"ids": ["3001", "3003"]})
    );
    let requests = server.received_requests().await.unwrap();
    let actions: Vec<Value> = requests
        .iter()
        .filter(|r| r.url.path() == "/api/blacklist/action")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(
        actions,
        vec![
            json!({"ids": ["3002"], "action": 1}),
            json!({"ids": ["3001", "3003"], "action": 2}),
        ]
    );
}

#[tokio::test]
async fn test_apply_learned_whitelist_switches_off_appliance_only_entries() {
    let server = appliance().await;
    reply(&server, "GET", "learned/ids", json!({"ids": ["fc-1", "fc-2"]})).await;
    reply(&server, "POST", "learned/disable", json!({"status": 0})).await;

    let (engine, _repo) = engine_with(vec![device_for("fw-1", &server)]);
    engine
        .apply_domain(&dev(), Domain::LearnedWhitelist)
        .await
        .unwrap();

    assert_eq!(calls(&server).await, vec!["learned/ids", "learned/disable"]);
    assert_eq!(
        body_of(&server, "learned/disable").await,
        json!({"ids": ["fc-1", "fc-2"]})
    );
}

#[tokio::test]
async fn test_apply_learned_whitelist_deploys_enabled() {
    let server = appliance().await;
    reply(&server, "GET", "learned/ids", json!(["fc-12"])).await;
    reply(&server, "POST", "learned/action", json!({"success": 1})).await;
    reply(&server, "POST", "learned/enable", json!({"status": 0})).await;
    reply(&server, "POST", "learned/deploy", json!({"success": true})).await;

    let (engine, repo) = engine_with(vec![device_for("fw-1", &server)]);
    repo.seed_records(
        &dev(),
        Domain::LearnedWhitelist,
        vec![RuleRecord::new("fc-12", RuleOwner::Device(dev()))],
    );

    engine
        .apply_domain(&dev(), Domain::LearnedWhitelist)
        .await
        .unwrap();

    assert_eq!(
        calls(&server).await,
        vec![
            "learned/ids",
            "learned/action",
            "learned/enable",
            "learned/deploy"
        ]
    );
    assert_eq!(body_of(&server, "learned/deploy").await, json!({"ids": ["fc-12"]}));
}

// ── IP-MAC Apply ────────────────────────────────────────────────────

#[tokio::test]
async fn test_apply_ip_mac_without_records_only_clears() {
    let server = appliance().await;
    reply(
        &server,
        "GET",
        "ipmac/list",
        json!({"data": [{"_id": 4, "_ip": "10.0.0.4", "_mac": "aa:bb:cc:dd:ee:ff"}]}),
    )
    .await;
    for ep in ["ipmac/clear", "ipmac/delete", "ipmac/unknown_action"] {
        reply(&server, "POST", ep, json!({"status": 0})).await;
    }

    let (engine, _repo) = engine_with(vec![device_for("fw-1", &server)]);
    engine
        .apply_domain(&dev(), Domain::IpMacBinding)
        .await
        .unwrap();

    assert_eq!(
        calls(&server).await,
        vec!["ipmac/list", "ipmac/clear", "ipmac/delete", "ipmac/unknown_action"]
    );
    assert_eq!(body_of(&server, "ipmac/delete").await, json!({"ids": ["4"]}));
}

#[tokio::test]
async fn test_apply_ip_mac_resolves_ips_before_deploy() {
    let server = appliance().await;
    reply(&server, "GET", "ipmac/list", json!([])).await;
    reply(&server, "POST", "ipmac/add", json!({"status": 0})).await;
    Mock::given(method("POST"))
        .and(path("/api/ipmac/enable"))
        .and(body_json(json!({"ips": ["10.0.0.5"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 0})))
        .expect(1)
        .mount(&server)
        .await;
    reply(
        &server,
        "POST",
        "ipmac/lookup",
        json!({"data": [{"_id": 77, "_ip": "10.0.0.5"}]}),
    )
    .await;
    reply(&server, "POST", "ipmac/deploy", json!({"success": true})).await;
    Mock::given(method("POST"))
        .and(path("/api/ipmac/unknown_action"))
        .and(body_string("action=2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let (engine, repo) = engine_with(vec![device_for("fw-1", &server)]);
    let owner = RuleOwner::Device(dev());
    repo.seed_records(
        &dev(),
        Domain::IpMacBinding,
        vec![
            RuleRecord::new("10.0.0.5", owner.clone()).with_attr("mac", "00:11:22:33:44:55"),
            RuleRecord::new("10.0.0.6", owner)
                .with_attr("mac", "00:11:22:33:44:66")
                .with_status(RuleStatus::Disabled),
        ],
    );
    repo.seed_singleton(
        &dev(),
        SingletonConfig::IpMacPolicy(IpMacPolicy {
            clear_action: RuleAction::Pass,
            unknown_device_action: RuleAction::Block,
        }),
    );

    engine
        .apply_domain(&dev(), Domain::IpMacBinding)
        .await
        .unwrap();

    assert_eq!(
        calls(&server).await,
        vec![
            "ipmac/list",
            "ipmac/add",
            "ipmac/enable",
            "ipmac/lookup",
            "ipmac/deploy",
            "ipmac/unknown_action"
        ]
    );
    assert_eq!(body_of(&server, "ipmac/deploy").await, json!({"ids": ["77"]}));
}

#[tokio::test]
async fn test_apply_ip_mac_clear_uses_stored_action() {
    let server = appliance().await;
    reply(&server, "GET", "ipmac/list", json!([{"_id": 4, "_ip": "10.0.0.4"}])).await;
    Mock::given(method("POST"))
        .and(path("/api/ipmac/clear"))
        .and(body_string("action=2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 0})))
        .expect(1)
        .mount(&server)
        .await;
    for ep in ["ipmac/delete", "ipmac/unknown_action"] {
        reply(&server, "POST", ep, json!({"status": 0})).await;
    }

    let (engine, repo) = engine_with(vec![device_for("fw-1", &server)]);
    repo.seed_singleton(
        &dev(),
        SingletonConfig::IpMacPolicy(IpMacPolicy {
            clear_action: RuleAction::Block,
            unknown_device_action: RuleAction::Alert,
        }),
    );

    engine
        .apply_domain(&dev(), Domain::IpMacBinding)
        .await
        .unwrap();

    assert_eq!(
        calls(&server).await,
        vec!["ipmac/list", "ipmac/clear", "ipmac/delete", "ipmac/unknown_action"]
    );
    let requests = server.received_requests().await.unwrap();
    let unknown = requests
        .iter()
        .find(|r| r.url.path() == "/api/ipmac/unknown_action")
        .unwrap();
    assert_eq!(unknown.body, b"action=1".to_vec());
}

#[tokio::test]
async fn test_apply_ip_mac_fails_when_lookup_misses_an_ip() {
    let server = appliance().await;
    reply(&server, "GET", "ipmac/list", json!([])).await;
    for ep in ["ipmac/add", "ipmac/enable", "ipmac/unknown_action"] {
        reply(&server, "POST", ep, json!({"status": 0})).await;
    }
    reply(&server, "POST", "ipmac/lookup", json!({"data": []})).await;
    Mock::given(method("POST"))
        .and(path("/api/ipmac/deploy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&server)
        .await;

    let (engine, repo) = engine_with(vec![device_for("fw-1", &server)]);
    repo.seed_records(
        &dev(),
        Domain::IpMacBinding,
        vec![RuleRecord::new("10.0.0.5", RuleOwner::Device(dev()))
            .with_attr("mac", "00:11:22:33:44:55")],
    );

    let err = engine
        .apply_domain(&dev(), Domain::IpMacBinding)
        .await
        .unwrap_err();

    assert_eq!(err.failed_phase(), Some(Phase::Apply(ApplyState::Enabled)));
    match err.root() {
        CoreError::ApplianceLogic {
            endpoint,
            code,
            message,
        } => {
            assert_eq!(endpoint, "ipmac/lookup");
            assert_eq!(*code, None);
            assert!(message.contains("10.0.0.5"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        calls(&server).await,
        vec!["ipmac/list", "ipmac/add", "ipmac/enable", "ipmac/lookup"]
    );
    assert_eq!(logouts(&server).await, 1);
}

// ── Singletons ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_apply_singleton_without_row_is_not_found() {
    let server = appliance().await;
    let (engine, _repo) = engine_with(vec![device_for("fw-1", &server)]);

    let err = engine
        .apply_domain(&dev(), Domain::OpcReadWrite)
        .await
        .unwrap_err();

    assert!(matches!(err.root(), CoreError::NotFound { .. }));
    assert!(calls(&server).await.is_empty());
}

#[tokio::test]
async fn test_apply_connection_config_sets_mode_then_action() {
    let server = appliance().await;
    for ep in ["config/connection_mode", "config/default_action"] {
        reply(&server, "POST", ep, json!({"status": 0})).await;
    }

    let (engine, repo) = engine_with(vec![device_for("fw-1", &server)]);
    repo.seed_singleton(
        &dev(),
        SingletonConfig::Connection(ConnectionSettings {
            connection_mode: ConnectionMode::Monitor,
            default_action: RuleAction::Alert,
        }),
    );

    engine
        .apply_domain(&dev(), Domain::ConnectionConfig)
        .await
        .unwrap();

    assert_eq!(
        calls(&server).await,
        vec!["config/connection_mode", "config/default_action"]
    );
}

#[tokio::test]
async fn test_sync_connection_config_stores_row() {
    let server = appliance().await;
    reply(&server, "GET", "config/connection_mode", json!({"mode": 1})).await;
    reply(&server, "GET", "config/default_action", json!({"data": {"action": "2"}})).await;

    let (engine, repo) = engine_with(vec![device_for("fw-1", &server)]);
    engine
        .sync_domain(&dev(), Domain::ConnectionConfig)
        .await
        .unwrap();

    assert_eq!(
        repo.singleton(&dev(), Domain::ConnectionConfig),
        Some(SingletonConfig::Connection(ConnectionSettings {
            connection_mode: ConnectionMode::Bridge,
            default_action: RuleAction::Block,
        }))
    );
}

// ── Sync ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sync_replaces_rows_and_drops_unknown_fields() {
    let server = appliance().await;
    reply(
        &server,
        "GET",
        "rule/list",
        json!({"data": [
            {"_ruleID": 11, "_srcIP": "10.1.0.1", "_action": 1, "_status": 1, "_hitCount": 40},
            {"_ruleID": "12", "_dstPort": "502", "_action": "0", "_status": "disable"}
        ]}),
    )
    .await;

    let (engine, repo) = engine_with(vec![device_for("fw-1", &server)]);
    repo.seed_records(
        &dev(),
        Domain::FiveTuple,
        vec![template_rule("stale", RuleStatus::Enabled)],
    );

    engine.sync_domain(&dev(), Domain::FiveTuple).await.unwrap();

    let stored = repo.records(&dev(), Domain::FiveTuple);
    assert_eq!(
        stored,
        vec![
            RuleRecord::new("11", RuleOwner::Device(dev()))
                .with_action(RuleAction::Alert)
                .with_attr("src_ip", "10.1.0.1"),
            RuleRecord::new("12", RuleOwner::Device(dev()))
                .with_status(RuleStatus::Disabled)
                .with_attr("dst_port", "502"),
        ]
    );
}

#[tokio::test]
async fn test_sync_skips_rows_with_unknown_action() {
    let server = appliance().await;
    reply(
        &server,
        "GET",
        "modbus/list",
        json!([
            {"_ruleID": 21, "_funcCode": 3, "_action": 9, "_status": 1},
            {"_ruleID": 22, "_action": 2, "_status": 1}
        ]),
    )
    .await;

    let (engine, repo) = engine_with(vec![device_for("fw-1", &server)]);
    engine.sync_domain(&dev(), Domain::Modbus).await.unwrap();

    assert_eq!(
        repo.records(&dev(), Domain::Modbus),
        vec![RuleRecord::new("22", RuleOwner::Device(dev())).with_action(RuleAction::Block)]
    );
}

#[tokio::test]
async fn test_sync_failure_keeps_stored_rows() {
    let server = appliance().await;
    reply(
        &server,
        "GET",
        "whitelist/list",
        json!([{"_srcIP": "10.0.0.1"}]),
    )
    .await;

    let (engine, repo) = engine_with(vec![device_for("fw-1", &server)]);
    let before = vec![template_rule("1", RuleStatus::Enabled)];
    repo.seed_records(&dev(), Domain::Whitelist, before.clone());

    let err = engine
        .sync_domain(&dev(), Domain::Whitelist)
        .await
        .unwrap_err();

    assert_eq!(
        err.failed_phase(),
        Some(Phase::Sync(fwsync_core::SyncState::Normalized))
    );
    assert_eq!(repo.records(&dev(), Domain::Whitelist), before);
}

#[tokio::test]
async fn test_sync_of_apply_only_domain_is_unsupported() {
    let server = appliance().await;
    let (engine, _repo) = engine_with(vec![device_for("fw-1", &server)]);

    for domain in [Domain::Blacklist, Domain::LearnedWhitelist, Domain::IpMacBinding] {
        let err = engine.sync_domain(&dev(), domain).await.unwrap_err();
        assert!(matches!(err, CoreError::Unsupported { .. }), "{domain}");
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── All domains ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_apply_all_domains_isolates_failures() {
    let server = appliance().await;
    for ep in ["rule/ids", "blacklist/ids", "learned/ids"] {
        reply(&server, "GET", ep, json!({"ids": []})).await;
    }

    let (engine, _repo) = engine_with(vec![device_for("fw-1", &server)]);
    let report = engine.apply_all_domains(&dev()).await.unwrap();

    assert_eq!(report.results.len(), 10);
    let failed = report.failed_domains();
    assert!(!failed.contains(&Domain::FiveTuple));
    assert!(!failed.contains(&Domain::Blacklist));
    assert!(!failed.contains(&Domain::LearnedWhitelist));
    assert_eq!(failed.len(), 7);
    assert!(matches!(
        report.into_result(),
        Err(CoreError::DomainFailures { .. })
    ));
    assert_eq!(logouts(&server).await, 1);
}

// ── Fleet ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_reboot_reports_failed_devices() {
    let healthy = appliance().await;
    reply(&healthy, "POST", "system/reboot", json!({"success": true})).await;

    let broken = appliance().await;
    reply(&broken, "POST", "system/reboot", json!({"success": false, "msg": "busy"})).await;

    let offline = appliance().await;

    let (engine, _repo) = engine_with(vec![
        device_for("fw-ok", &healthy),
        device_for("fw-bad", &broken),
        device_for("fw-off", &offline).with_status(DeviceStatus::Offline),
    ]);

    let ids: Vec<DeviceId> = ["fw-ok", "fw-bad", "fw-off"]
        .into_iter()
        .map(DeviceId::from)
        .collect();
    let outcome = engine.batch_reboot(&ids).await;

    assert_eq!(outcome.attempted(), 2);
    assert_eq!(outcome.failed_device_ids(), vec![DeviceId::from("fw-bad")]);
    assert_eq!(outcome.skipped, vec![DeviceId::from("fw-off")]);
    assert!(offline.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_unregister_flips_registration_on_success_only() {
    let healthy = appliance().await;
    reply(&healthy, "POST", "system/unregister", json!({"success": true})).await;

    let broken = appliance().await;
    reply(&broken, "POST", "system/unregister", json!({"success": false})).await;

    let (engine, repo) = engine_with(vec![
        device_for("fw-ok", &healthy),
        device_for("fw-bad", &broken),
    ]);

    let outcome = engine
        .batch_unregister(&[DeviceId::from("fw-ok"), DeviceId::from("fw-bad")])
        .await;

    assert_eq!(outcome.failed_device_ids(), vec![DeviceId::from("fw-bad")]);
    assert_eq!(
        repo.registration(&DeviceId::from("fw-ok")),
        Some(RegistrationStatus::NotRegistered)
    );
    assert_eq!(
        repo.registration(&DeviceId::from("fw-bad")),
        Some(RegistrationStatus::Registered)
    );
}

#[tokio::test]
async fn test_unreachable_device_counts_as_failed() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (engine, _repo) = engine_with(vec![
        Device::new("fw-gone", addr.ip()).with_port(addr.port()),
    ]);
    let outcome = engine.batch_reboot(&[DeviceId::from("fw-gone")]).await;

    assert_eq!(outcome.failed_device_ids(), vec![DeviceId::from("fw-gone")]);
    let err = outcome.into_result().unwrap_err();
    assert!(err.is_retryable());
}
