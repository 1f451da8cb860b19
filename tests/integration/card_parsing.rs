use clawprint_agent::card::{decode_scalar, parse_document, AgentProfile, Node};
use proptest::prelude::*;
use serde_json::{json, Value};

const TWO_BY_TWO: &str = "\
name: Research Bot
handle: research-bot
description: Finds and summarises sources
services:
  - id: search
    domains:
      - research
      - legal
  - id: digest
    domains: [summaries, research]
";

#[test]
fn handle_and_flattened_domains_round_trip() {
    let profile = AgentProfile::parse(TWO_BY_TWO).unwrap();
    assert_eq!(profile.handle, "research-bot");
    assert_eq!(
        profile.domains,
        vec!["research", "legal", "summaries", "research"]
    );
    assert_eq!(
        profile.polling_domains(),
        vec!["research", "legal", "summaries"]
    );
}

#[test]
fn parsing_twice_yields_equal_trees() {
    let first = parse_document(TWO_BY_TWO).unwrap();
    let second = parse_document(TWO_BY_TWO).unwrap();
    assert_eq!(first, second);
}

#[test]
fn scalar_decoding_table() {
    let cases = [
        ("true", json!(true)),
        ("false", json!(false)),
        ("42", json!(42)),
        ("-7", json!(-7)),
        ("2.5", json!(2.5)),
        ("null", Value::Null),
        ("~", Value::Null),
        ("[a, b]", json!(["a", "b"])),
        ("[]", json!([])),
        ("[1, [x, y], 'q, r']", json!([1, ["x", "y"], "q, r"])),
        ("'a: b # c'", json!("a: b # c")),
        ("\"[not a list]\"", json!("[not a list]")),
        ("plain text", json!("plain text")),
        ("", json!("")),
    ];
    for (raw, expected) in cases {
        let node = decode_scalar(raw, 1).unwrap();
        assert_eq!(node.to_json(), expected, "decoding {:?}", raw);
    }
}

#[test]
fn integers_stay_integral() {
    let node = decode_scalar("42", 1).unwrap();
    assert_eq!(node.as_i64(), Some(42));
    assert!(node.to_json().is_i64());
}

#[test]
fn extra_card_fields_pass_through() {
    let text = "\
handle: demo
pricing:
  model: per_task
  amount: 3
services:
  - id: a
    domains: [x]
    sla_minutes: 15
";
    let profile = AgentProfile::parse(text).unwrap();
    let card = profile.card_json();
    assert_eq!(card["pricing"], json!({"model": "per_task", "amount": 3}));
    assert_eq!(card["services"][0]["sla_minutes"], 15);
}

#[test]
fn parse_error_reports_line() {
    let err = AgentProfile::parse("handle: demo\nservices:\n  - id: a\n  oops\n   - b\nbad indent\n  x: 1\n")
        .unwrap_err();
    assert!(err.to_string().contains("line"), "{}", err);
}

/// Well-formed cards must read the same as they do under a full YAML parser.
#[test]
fn agrees_with_yaml_on_well_formed_cards() {
    let cards = [
        TWO_BY_TWO,
        "handle: a\nservices: []\n",
        "handle: b\nenabled: true\nlimits:\n  rpm: 60\n  burst: 5\n",
        "handle: c\ntags:\n- one\n- two\nnested:\n  list:\n    - id: x\n      on: false\n",
        "handle: d\nquoted: 'keeps: colons'\nempty:\n",
    ];
    for card in cards {
        let ours = parse_document(card).unwrap().to_json();
        let oracle: Value = serde_yaml::from_str(card).unwrap();
        assert_eq!(ours, oracle, "card:\n{}", card);
    }
}

/// Lowercase slugs that do not collide with YAML keywords.
fn slug() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,10}".prop_filter("keyword", |s| {
        !matches!(s.as_str(), "null" | "true" | "false")
    })
}

fn render_card(handle: &str, services: &[(String, Vec<String>)], inline: bool) -> String {
    let mut out = format!("name: Generated Agent\nhandle: {}\nservices:\n", handle);
    for (id, domains) in services {
        out.push_str(&format!("  - id: {}\n", id));
        if inline {
            out.push_str(&format!("    domains: [{}]\n", domains.join(", ")));
        } else {
            out.push_str("    domains:\n");
            for domain in domains {
                out.push_str(&format!("      - {}\n", domain));
            }
        }
    }
    out
}

proptest! {
    #[test]
    fn generated_cards_parse_idempotently(
        handle in slug(),
        services in prop::collection::vec((slug(), prop::collection::vec(slug(), 1..4)), 1..4),
        inline in any::<bool>(),
    ) {
        let text = render_card(&handle, &services, inline);
        let first = parse_document(&text).unwrap();
        let second = parse_document(&text).unwrap();
        prop_assert_eq!(&first, &second);

        let profile = AgentProfile::from_document(first).unwrap();
        prop_assert_eq!(profile.handle, handle);
        let expected: Vec<String> = services.iter().flat_map(|(_, d)| d.clone()).collect();
        prop_assert_eq!(profile.domains, expected);
    }

    #[test]
    fn generated_cards_agree_with_yaml(
        handle in slug(),
        services in prop::collection::vec((slug(), prop::collection::vec(slug(), 1..3)), 0..3),
        inline in any::<bool>(),
    ) {
        let text = render_card(&handle, &services, inline);
        let ours = parse_document(&text).unwrap().to_json();
        let oracle: Value = serde_yaml::from_str(&text).unwrap();
        prop_assert_eq!(ours, oracle);
    }

    #[test]
    fn arbitrary_text_never_panics(text in "[a-z:\\- \\[\\]'\"#\n]{0,80}") {
        let _ = parse_document(&text);
    }
}

#[test]
fn node_accessors() {
    let doc = parse_document("handle: demo\nflag: true\ncount: 3\nlist: [a]\n").unwrap();
    assert_eq!(doc.get("handle").and_then(Node::as_str), Some("demo"));
    assert_eq!(doc.get("flag").and_then(Node::as_bool), Some(true));
    assert_eq!(doc.get("count").and_then(Node::as_i64), Some(3));
    assert_eq!(doc.get("list").and_then(Node::as_sequence).map(|s| s.len()), Some(1));
}
