use clap::Parser;
use clawprint_agent::config::AgentConfig;
use clawprint_agent::error::ApiError;
use clawprint_agent::handler::HandlerRegistry;
use clawprint_agent::tooling::cli::{
    CardCommands, Cli, CliContext, Commands, ConfigCommands, MemoryCommands, SearchArgs,
};
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::CARD;

fn context(temp: &TempDir) -> CliContext {
    let card_path = temp.path().join("agent.yaml");
    fs::write(&card_path, CARD).unwrap();

    let mut config = AgentConfig::default();
    config.worker.card_path = card_path;
    config.worker.memory_path = temp.path().join("state").join("memory.json");
    CliContext::with_config(config, HandlerRegistry::with_builtins())
}

fn memory(command: MemoryCommands) -> Commands {
    Commands::Memory { command }
}

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["clawprint-agent", "run"],
        vec!["clawprint-agent", "run", "--once", "--handler", "echo"],
        vec!["clawprint-agent", "run", "--card", "cards/a.yaml"],
        vec!["clawprint-agent", "card", "validate"],
        vec!["clawprint-agent", "card", "validate", "--format", "json"],
        vec!["clawprint-agent", "card", "show", "--card", "a.yaml"],
        vec!["clawprint-agent", "memory", "get", "k"],
        vec!["clawprint-agent", "memory", "set", "k", "{\"a\":1}"],
        vec!["clawprint-agent", "memory", "rm", "k"],
        vec!["clawprint-agent", "memory", "list", "--format", "json"],
        vec!["clawprint-agent", "register", "--yes"],
        vec!["clawprint-agent", "config", "show"],
        vec!["clawprint-agent", "update", "--set", "description=New"],
        vec!["clawprint-agent", "search", "--q", "legal", "--limit", "5"],
        vec!["clawprint-agent", "search", "--max-cost", "2.5", "--format", "json"],
        vec!["clawprint-agent", "agent", "demo-agent"],
        vec!["clawprint-agent", "trust", "demo-agent"],
        vec!["clawprint-agent", "domains"],
        vec!["clawprint-agent", "discover"],
        vec!["clawprint-agent", "scan", "some text"],
        vec!["clawprint-agent", "request", "create", "--domain", "legal", "--task", "Review"],
        vec!["clawprint-agent", "request", "get", "req_1"],
        vec!["clawprint-agent", "--log-level", "debug", "run", "--once"],
        vec!["clawprint-agent", "run", "--config", "agent.toml"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_unknown_commands() {
    assert!(Cli::try_parse_from(["clawprint-agent", "serve"]).is_err());
    assert!(Cli::try_parse_from(["clawprint-agent", "memory", "set", "only-key"]).is_err());
    assert!(Cli::try_parse_from(["clawprint-agent", "update"]).is_err());
    assert!(Cli::try_parse_from(["clawprint-agent", "request", "create", "--task", "x"]).is_err());
}

#[test]
fn logging_flags_override_config() {
    let cli = Cli::try_parse_from([
        "clawprint-agent",
        "--log-level",
        "debug",
        "--log-format",
        "json",
        "config",
        "show",
    ])
    .unwrap();
    let mut config = AgentConfig::default();
    cli.apply_logging_overrides(&mut config);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.logging.output, "stderr");
}

#[test]
fn card_validate_json_contract_has_required_fields() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);
    let output = cli
        .execute(&Commands::Card {
            command: CardCommands::Validate {
                card: None,
                format: "json".to_string(),
            },
        })
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["valid"], true);
    assert_eq!(parsed["handle"], "demo-agent");
    assert_eq!(
        parsed["polling_domains"],
        serde_json::json!(["research", "summaries"])
    );
    assert!(parsed["services"].as_array().is_some());
}

#[test]
fn card_validate_reports_parse_errors_with_path() {
    let temp = TempDir::new().unwrap();
    let bad = temp.path().join("bad.yaml");
    fs::write(&bad, "handle: a\n  stray: b\n").unwrap();

    let err = context(&temp)
        .execute(&Commands::Card {
            command: CardCommands::Validate {
                card: Some(bad),
                format: "text".to_string(),
            },
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::CardParse { .. }), "{}", err);
    let message = err.to_string();
    assert!(message.contains("bad.yaml"), "{}", message);
    assert!(message.contains("line 2"), "{}", message);
}

#[test]
fn card_show_prints_document_json() {
    let temp = TempDir::new().unwrap();
    let output = context(&temp)
        .execute(&Commands::Card {
            command: CardCommands::Show { card: None },
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["name"], "Demo Agent");
    assert_eq!(parsed["services"][0]["id"], "research");
}

#[test]
fn memory_commands_round_trip() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);

    cli.execute(&memory(MemoryCommands::Set {
        key: "count".to_string(),
        value: "3".to_string(),
    }))
    .unwrap();
    cli.execute(&memory(MemoryCommands::Set {
        key: "note".to_string(),
        value: "plain words".to_string(),
    }))
    .unwrap();

    let count = cli
        .execute(&memory(MemoryCommands::Get {
            key: "count".to_string(),
        }))
        .unwrap();
    assert_eq!(count, "3");

    let list = cli
        .execute(&memory(MemoryCommands::List {
            format: "json".to_string(),
        }))
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&list).unwrap();
    assert_eq!(parsed, serde_json::json!({"count": 3, "note": "plain words"}));

    cli.execute(&memory(MemoryCommands::Rm {
        key: "count".to_string(),
    }))
    .unwrap();
    let err = cli
        .execute(&memory(MemoryCommands::Get {
            key: "count".to_string(),
        }))
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[test]
fn config_show_redacts_api_key() {
    let temp = TempDir::new().unwrap();
    let mut cli = context(&temp);
    cli.config_mut().exchange.api_key = Some("cp_live_abcdef123456".to_string());

    let output = cli
        .execute(&Commands::Config {
            command: ConfigCommands::Show,
        })
        .unwrap();
    assert!(output.contains("****3456"));
    assert!(!output.contains("abcdef"));
    let parsed: toml::Value = toml::from_str(&output).unwrap();
    assert_eq!(parsed["worker"]["handler"].as_str(), Some("echo"));
}

#[test]
fn run_requires_api_key() {
    let temp = TempDir::new().unwrap();
    let err = context(&temp)
        .execute(&Commands::Run {
            once: true,
            handler: None,
            card: None,
        })
        .unwrap_err();
    assert!(err.to_string().contains("API key required"), "{}", err);
}

/// Registration is how an agent obtains its key, so it must work without one.
#[test]
fn register_works_without_api_key() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/agents"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"handle": "demo-agent", "api_key": "cp_new_key"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        server
    });

    let temp = TempDir::new().unwrap();
    let mut cli = context(&temp);
    cli.config_mut().exchange.base_url = server.uri();
    assert!(cli.config().exchange.api_key.is_none());

    let output = cli
        .execute(&Commands::Register {
            card: None,
            yes: true,
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["api_key"], "cp_new_key");

    let received = runtime.block_on(server.received_requests()).unwrap();
    assert_eq!(received.len(), 1);
    assert!(!received[0].headers.contains_key("authorization"));
}

#[test]
fn update_and_scan_require_api_key() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);

    let err = cli
        .execute(&Commands::Update {
            card: None,
            set: vec!["description=Updated".to_string()],
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)), "{}", err);

    let err = cli
        .execute(&Commands::Scan {
            content: "hello".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)), "{}", err);
}

#[test]
fn update_rejects_malformed_fields() {
    let temp = TempDir::new().unwrap();
    let mut cli = context(&temp);
    cli.config_mut().exchange.api_key = Some("cp_test".to_string());

    let err = cli
        .execute(&Commands::Update {
            card: None,
            set: vec!["no-equals-sign".to_string()],
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)), "{}", err);
}

#[test]
fn search_renders_results_table() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/agents/search"))
            .and(query_param("domain", "legal"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"handle": "legal-eagle", "name": "Legal Eagle", "trust_score": 91}],
                "total": 1,
                "limit": 20,
                "offset": 0
            })))
            .expect(1)
            .mount(&server)
            .await;
        server
    });

    let temp = TempDir::new().unwrap();
    let mut cli = context(&temp);
    cli.config_mut().exchange.base_url = server.uri();

    let output = cli
        .execute(&Commands::Search {
            filters: SearchArgs {
                domain: Some("legal".to_string()),
                ..Default::default()
            },
            format: "text".to_string(),
        })
        .unwrap();
    assert!(output.contains("legal-eagle"), "{}", output);
    assert!(output.contains("Showing 1 of 1"), "{}", output);
}

#[test]
fn run_rejects_unknown_handler() {
    let temp = TempDir::new().unwrap();
    let mut cli = context(&temp);
    cli.config_mut().exchange.api_key = Some("cp_test".to_string());

    let err = cli
        .execute(&Commands::Run {
            once: true,
            handler: Some("missing".to_string()),
            card: None,
        })
        .unwrap_err();
    assert!(err.to_string().contains("Unknown handler 'missing'"), "{}", err);
}

#[test]
fn run_refuses_card_without_domains() {
    let temp = TempDir::new().unwrap();
    let bare = temp.path().join("bare.yaml");
    fs::write(&bare, "name: Bare\nhandle: bare\ndescription: No services\n").unwrap();

    let mut cli = context(&temp);
    cli.config_mut().exchange.api_key = Some("cp_test".to_string());
    let err = cli
        .execute(&Commands::Run {
            once: true,
            handler: None,
            card: Some(bare),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)), "{}", err);
    assert!(err.to_string().contains("no service domains"), "{}", err);
}
