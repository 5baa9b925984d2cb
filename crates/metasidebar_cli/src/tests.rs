//! Unit tests for the `mdside` CLI entrypoint module.

use super::{format_view, normalize_server, parse_value, resolve_scope, Cli, Commands, Intent};
use clap::Parser;
use metasidebar_core::models::{MetadataEditor, MetadataInstance, MetadataTemplate};
use metasidebar_core::patch::PatchOp;
use metasidebar_core::{project, EditorListState, SidebarView, DEFAULT_SERVER_URL};
use serde_json::{json, Map, Value};

fn editor(id: &str, data: Value) -> MetadataEditor {
    let template = MetadataTemplate::new("enterprise", "contract", "Contract");
    let mut instance = MetadataInstance::for_template(&template);
    instance.id = id.to_string();
    instance.data = match data {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    MetadataEditor::new(instance, template)
}

fn loaded(editors: Vec<MetadataEditor>) -> EditorListState {
    EditorListState::default().initialize(
        editors,
        vec![
            MetadataTemplate::new("enterprise", "contract", "Contract"),
            MetadataTemplate::properties(),
        ],
    )
}

#[test]
fn normalize_server_matrix() {
    let cases = [
        (None, DEFAULT_SERVER_URL),
        (Some("   "), DEFAULT_SERVER_URL),
        (Some("http://example.test:9000/"), "http://example.test:9000"),
        (Some(" http://127.0.0.1:1 "), "http://127.0.0.1:1"),
    ];
    for (input, expected) in cases {
        assert_eq!(normalize_server(input.map(str::to_string)), expected);
    }
}

#[test]
fn set_values_parse_as_json_when_valid() {
    assert_eq!(parse_value("42"), json!(42));
    assert_eq!(parse_value("true"), json!(true));
    assert_eq!(parse_value("[\"a\",\"b\"]"), json!(["a", "b"]));
    assert_eq!(parse_value("\"quoted\""), json!("quoted"));
    assert_eq!(parse_value("Acme Corp"), json!("Acme Corp"));
}

#[test]
fn cli_parses_subcommands_into_intents() {
    let cli = Cli::parse_from(["mdside", "set", "1001", "contract-1001", "amount", "12.5"]);
    let (file, intent) = cli.command.target().expect("file command");
    assert_eq!(file, "1001");
    assert_eq!(
        intent,
        Some(Intent::Save(
            "contract-1001".to_string(),
            vec![PatchOp::add("amount", json!(12.5))]
        ))
    );

    let cli = Cli::parse_from(["mdside", "unset", "1001", "e1", "color"]);
    assert_eq!(
        cli.command.target().and_then(|(_, intent)| intent),
        Some(Intent::Save("e1".to_string(), vec![PatchOp::remove("color")]))
    );

    let cli = Cli::parse_from(["mdside", "--json", "show", "1001", "--no-properties"]);
    assert!(cli.json);
    assert!(cli.no_properties);
    assert!(matches!(cli.command, Commands::Show { ref file } if file == "1001"));

    let cli = Cli::parse_from(["mdside", "add", "1001", "contract", "--scope", "enterprise"]);
    assert_eq!(
        cli.command.target().and_then(|(_, intent)| intent),
        Some(Intent::Add {
            scope: Some("enterprise".to_string()),
            template_key: "contract".to_string(),
        })
    );

    let cli = Cli::parse_from(["mdside", "completions", "bash"]);
    assert!(cli.command.target().is_none());
}

#[test]
fn text_view_lists_editors_fields_and_available_templates() {
    let mut dirty = editor("e1", json!({ "client": "Acme Corp", "amount": 10 }));
    dirty.is_dirty = true;
    let state = loaded(vec![dirty]);
    let output = format_view(&project(&state, true), false).expect("format");
    assert_eq!(
        output,
        "[e1] Contract (enterprise/contract) *\n  amount: 10\n  client: Acme Corp\nAvailable templates: properties"
    );
}

#[test]
fn text_view_covers_loading_error_empty_and_read_only() {
    let loading = EditorListState::default();
    assert_eq!(
        format_view(&project(&loading, true), false).expect("format"),
        "Loading..."
    );

    let failed = loading.set_error(true);
    assert_eq!(
        format_view(&SidebarView::Error, false).expect("format"),
        format_view(&project(&failed, true), false).expect("format")
    );

    let empty = loaded(Vec::new());
    assert_eq!(
        format_view(&project(&empty, true), false).expect("format"),
        "No metadata attached.\nAvailable templates: contract, properties"
    );
    assert_eq!(
        format_view(&project(&empty, false), false).expect("format"),
        "No metadata attached."
    );

    let read_only = loaded(vec![editor("e1", json!({}))]);
    let output = format_view(&project(&read_only, false), false).expect("format");
    assert!(output.ends_with("(read-only)"), "output: {}", output);
}

#[test]
fn json_view_is_tagged_by_kind() {
    let state = loaded(vec![editor("e1", json!({ "client": "Acme" }))]);
    let output = format_view(&project(&state, true), true).expect("format");
    let value: Value = serde_json::from_str(&output).expect("json");
    assert_eq!(value["kind"], "editors");
    assert_eq!(value["editors"][0]["instance"]["id"], "e1");
}

#[test]
fn bare_template_key_resolves_only_when_unique() {
    let state = EditorListState::default().initialize(
        Vec::new(),
        vec![
            MetadataTemplate::new("enterprise", "contract", "Contract"),
            MetadataTemplate::new("global", "contract", "Contract (global)"),
            MetadataTemplate::properties(),
        ],
    );

    assert_eq!(
        resolve_scope(&state, None, "properties").expect("unique key"),
        "global"
    );
    assert_eq!(
        resolve_scope(&state, Some("global"), "contract").expect("explicit scope"),
        "global"
    );

    let ambiguous = resolve_scope(&state, None, "contract").expect_err("ambiguous key");
    assert!(ambiguous.to_string().contains("--scope"), "{}", ambiguous);
    let unknown = resolve_scope(&state, None, "missing").expect_err("unknown key");
    assert!(unknown.to_string().contains("unknown template"), "{}", unknown);
}
