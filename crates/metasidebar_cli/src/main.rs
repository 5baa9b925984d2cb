//! Command-line client that drives a metadata sidebar over HTTP.

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use metasidebar_core::models::MetadataEditor;
use metasidebar_core::patch::PatchOp;
use metasidebar_core::view::TemplatePicker;
use metasidebar_core::{
    EditorListState, SidebarView, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVER_URL,
};
use metasidebar_sidebar::{HttpMetadataApi, MetadataSidebar, SidebarOptions};
use serde_json::Value;
use std::io;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mdside", about = "Metadata sidebar CLI", version)]
struct Cli {
    /// Server URL (can also be set via METASIDEBAR_SERVER env var)
    #[arg(short, long, env = "METASIDEBAR_SERVER")]
    server: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// Request timeout in seconds
    #[arg(short = 't', long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    timeout: u64,

    /// Hide the free-form properties template
    #[arg(long, global = true)]
    no_properties: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Show the metadata attached to a file
    Show { file: String },
    /// Attach a template to a file
    Add {
        file: String,
        template_key: String,
        /// Template scope; required only when the key exists in several scopes
        #[arg(long)]
        scope: Option<String>,
    },
    /// Set one field; the value is parsed as JSON when valid
    Set {
        file: String,
        editor_id: String,
        key: String,
        value: String,
    },
    /// Remove one field
    Unset {
        file: String,
        editor_id: String,
        key: String,
    },
    /// Detach an editor from a file
    Remove { file: String, editor_id: String },
}

/// One user intent applied after the initial load.
#[derive(Debug, Clone, PartialEq)]
enum Intent {
    Add {
        scope: Option<String>,
        template_key: String,
    },
    Save(String, Vec<PatchOp>),
    Remove(String),
}

impl Intent {
    fn label(&self) -> &'static str {
        match self {
            Intent::Add { .. } => "Add",
            Intent::Save(..) => "Save",
            Intent::Remove(_) => "Remove",
        }
    }
}

impl Commands {
    /// The file a command targets and the intent it performs, if any.
    fn target(self) -> Option<(String, Option<Intent>)> {
        match self {
            Commands::Completions { .. } => None,
            Commands::Show { file } => Some((file, None)),
            Commands::Add {
                file,
                template_key,
                scope,
            } => Some((file, Some(Intent::Add { scope, template_key }))),
            Commands::Set {
                file,
                editor_id,
                key,
                value,
            } => Some((
                file,
                Some(Intent::Save(editor_id, vec![PatchOp::add(&key, parse_value(&value))])),
            )),
            Commands::Unset {
                file,
                editor_id,
                key,
            } => Some((file, Some(Intent::Save(editor_id, vec![PatchOp::remove(&key)])))),
            Commands::Remove { file, editor_id } => Some((file, Some(Intent::Remove(editor_id)))),
        }
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn normalize_server(server: Option<String>) -> String {
    let trimmed = server
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_SERVER_URL);
    trimmed.trim_end_matches('/').to_string()
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn format_picker(picker: &TemplatePicker<'_>) -> String {
    let keys: Vec<&str> = picker
        .available()
        .into_iter()
        .map(|template| template.template_key.as_str())
        .collect();
    if keys.is_empty() {
        "All templates attached.".to_string()
    } else {
        format!("Available templates: {}", keys.join(", "))
    }
}

fn format_editor(editor: &MetadataEditor) -> Vec<String> {
    let marker = if editor.is_dirty { " *" } else { "" };
    let mut lines = vec![format!(
        "[{}] {} ({}/{}){}",
        editor.id(),
        editor.template.display_name,
        editor.template.scope,
        editor.template.template_key,
        marker
    )];
    for (key, value) in &editor.instance.data {
        lines.push(format!("  {}: {}", key, format_value(value)));
    }
    lines
}

fn format_view(view: &SidebarView<'_>, json: bool) -> anyhow::Result<String> {
    if json {
        return serde_json::to_string_pretty(view).context("response encoding error");
    }

    let lines = match view {
        SidebarView::Loading => vec!["Loading...".to_string()],
        SidebarView::Error => vec!["Metadata could not be loaded or saved.".to_string()],
        SidebarView::Empty { add_control, .. } => {
            let mut lines = vec!["No metadata attached.".to_string()];
            lines.extend(add_control.as_ref().map(format_picker));
            lines
        }
        SidebarView::Editors {
            editors,
            read_only,
            add_control,
            ..
        } => {
            let mut lines: Vec<String> = editors.iter().flat_map(format_editor).collect();
            if *read_only {
                lines.push("(read-only)".to_string());
            }
            lines.extend(add_control.as_ref().map(format_picker));
            lines
        }
    };
    Ok(lines.join("\n"))
}

fn wait_or_bail(sidebar: &mut MetadataSidebar, timeout: Duration, action: &str) -> anyhow::Result<()> {
    if !sidebar.wait_idle(timeout) {
        bail!("{} did not complete within {:?}", action, timeout);
    }
    Ok(())
}

/// Pick the scope of `template_key` among the loaded templates.
///
/// An explicit scope is taken as given. Without one the key must be unique.
fn resolve_scope(
    state: &EditorListState,
    scope: Option<&str>,
    template_key: &str,
) -> anyhow::Result<String> {
    if let Some(scope) = scope {
        return Ok(scope.to_string());
    }
    let scopes: Vec<&str> = state
        .templates
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter(|template| template.template_key == template_key)
        .map(|template| template.scope.as_str())
        .collect();
    match scopes.as_slice() {
        [] => bail!("Add failed: unknown template '{}'", template_key),
        [scope] => Ok(scope.to_string()),
        _ => bail!(
            "Add failed: template '{}' exists in scopes {}; pass --scope",
            template_key,
            scopes.join(", ")
        ),
    }
}

fn dispatch(sidebar: &mut MetadataSidebar, intent: Intent) -> anyhow::Result<()> {
    let accepted = match &intent {
        Intent::Add {
            scope,
            template_key,
        } => {
            let scope = resolve_scope(&sidebar.state(), scope.as_deref(), template_key)?;
            debug!("adding {}/{}", scope, template_key);
            sidebar.add_template(&scope, template_key)
        }
        Intent::Save(editor_id, ops) => sidebar.save(editor_id, ops.clone()),
        Intent::Remove(editor_id) => sidebar.remove(editor_id),
    };
    if accepted {
        return Ok(());
    }
    let label = intent.label();
    match intent {
        Intent::Add { template_key, .. } => {
            bail!("{} failed: unknown template '{}'", label, template_key)
        }
        Intent::Save(editor_id, _) | Intent::Remove(editor_id) => {
            bail!("{} failed: no editor '{}'", label, editor_id)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let json = cli.json;
    let timeout = Duration::from_secs(cli.timeout);
    let options = SidebarOptions {
        include_properties: !cli.no_properties,
    };
    let server = normalize_server(cli.server);

    let Some((file_id, intent)) = cli.command.target() else {
        bail!("command does not target a file");
    };

    let api = HttpMetadataApi::new(&server, timeout)?;
    let file = api
        .get_file(&file_id)
        .with_context(|| format!("Lookup of file '{}' on {} failed", file_id, server))?;
    debug!("opening sidebar for file {} on {}", file.id, server);
    let mut sidebar = MetadataSidebar::spawn(file, api, options);
    wait_or_bail(&mut sidebar, timeout, "List")?;

    let action = match intent {
        Some(intent) if !sidebar.state().has_error => {
            let label = intent.label();
            dispatch(&mut sidebar, intent)?;
            wait_or_bail(&mut sidebar, timeout, label)?;
            label
        }
        _ => "List",
    };

    println!("{}", format_view(&sidebar.view(), json)?);
    if sidebar.state().has_error {
        warn!("{} on file {} left the sidebar in error", action, file_id);
        bail!("{} failed", action);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "mdside", &mut io::stdout());
        return Ok(());
    }
    run(cli)
}

#[cfg(test)]
mod tests;
