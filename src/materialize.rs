//! Plugin dispatch table generation
//!
//! Works out which plugins implement hooks for each context and writes the
//! glue modules the runtime loads:
//!
//! - `api-runner-browser-plugins.js`: every plugin that ships a
//!   `kiln-browser.js`, referenced relative to the cache directory so the
//!   file is identical across checkouts.
//! - `api-runner-ssr.js`: the staged server runner template prefixed with the
//!   plugins that declare server hooks.

use crate::cache::SiteLayout;
use crate::error::{KilnError, KilnResult};
use crate::plugin::{HookContext, PluginRecord};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const INJECT_START: &str = "// kiln:plugins:start";
const INJECT_END: &str = "// kiln:plugins:end";

/// One entry of a generated dispatch table
#[derive(Debug, Clone, PartialEq)]
pub struct HookBinding {
    pub context: HookContext,
    pub plugin_name: String,
    /// Entry module, without extension
    pub module: PathBuf,
    pub options: serde_json::Value,
}

/// Counts of plugins written to each artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializedArtifacts {
    pub client_plugins: usize,
    pub server_plugins: usize,
}

/// Whether a plugin contributes to a context
///
/// Client contributions are decided by the entry file alone, since browser
/// entries often only carry side effects. Server contributions need declared
/// hooks and no loader override.
pub async fn contributes(plugin: &PluginRecord, context: HookContext) -> bool {
    match context {
        HookContext::Client => {
            let entry = plugin.entry_module(context).with_extension("js");
            fs::metadata(&entry)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false)
        }
        HookContext::Server => !plugin.hooks(context).is_empty() && !plugin.server_disabled,
    }
}

/// Bindings for a context, in plugin list order
pub async fn bindings(plugins: &[PluginRecord], context: HookContext) -> Vec<HookBinding> {
    let mut out = Vec::new();
    for plugin in plugins {
        if contributes(plugin, context).await {
            out.push(HookBinding {
                context,
                plugin_name: plugin.name.clone(),
                module: plugin.entry_module(context),
                options: plugin.options.clone(),
            });
        } else {
            debug!("{} has no {} contribution", plugin.name, context);
        }
    }
    out
}

/// Relative module specifier from `from_dir` to `to`, using `/` separators
pub fn relative_module(from_dir: &Path, to: &Path) -> String {
    let from: Vec<Component> = from_dir.components().collect();
    let target: Vec<Component> = to.components().collect();

    let common_len = from
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common_len..from.len() {
        parts.push("..".to_string());
    }
    for component in target.iter().skip(common_len) {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }

    let joined = parts.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{}", joined)
    }
}

fn js_string(value: &str) -> KilnResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn module_path_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Render the client dispatch module
pub fn render_client(bindings: &[HookBinding], artifact_dir: &Path) -> KilnResult<String> {
    let mut out = String::from("module.exports = [");
    for binding in bindings {
        let module = relative_module(artifact_dir, &binding.module);
        out.push_str(&format!(
            "\n  {{\n    plugin: require({}),\n    options: {},\n  }},",
            js_string(&module)?,
            serde_json::to_string(&binding.options)?
        ));
    }
    if !bindings.is_empty() {
        out.push('\n');
    }
    out.push_str("]\n");
    Ok(out)
}

/// Drop a previously injected plugin list from a runner template
fn strip_injected(template: &str) -> &str {
    if !template.starts_with(INJECT_START) {
        return template;
    }
    match template.find(INJECT_END) {
        Some(pos) => template[pos + INJECT_END.len()..].trim_start_matches(['\r', '\n']),
        None => template,
    }
}

/// Prefix the server runner template with the plugin list
pub fn render_server(bindings: &[HookBinding], template: &str) -> KilnResult<String> {
    let mut out = format!("{}\nvar plugins = [", INJECT_START);
    for binding in bindings {
        out.push_str(&format!(
            "\n  {{\n    name: {},\n    plugin: require({}),\n    options: {},\n  }},",
            js_string(&binding.plugin_name)?,
            js_string(&module_path_string(&binding.module))?,
            serde_json::to_string(&binding.options)?
        ));
    }
    if !bindings.is_empty() {
        out.push('\n');
    }
    out.push_str("]\n");
    out.push_str(INJECT_END);
    out.push('\n');
    out.push_str(strip_injected(template));
    Ok(out)
}

/// Write both dispatch artifacts into the cache directory
///
/// The server runner template must already be staged; a missing template is
/// fatal. Plugins without a client entry file are simply skipped.
pub async fn materialize(
    plugins: &[PluginRecord],
    layout: &SiteLayout,
) -> KilnResult<MaterializedArtifacts> {
    let server_path = layout.server_artifact();
    let template = fs::read_to_string(&server_path)
        .await
        .map_err(|source| KilnError::TemplateRead {
            path: server_path.clone(),
            source,
        })?;

    let client = bindings(plugins, HookContext::Client).await;
    let server = bindings(plugins, HookContext::Server).await;

    let client_path = layout.client_artifact();
    let client_source = render_client(&client, layout.cache_dir())?;
    fs::write(&client_path, client_source)
        .await
        .map_err(|e| KilnError::io(format!("writing {}", client_path.display()), e))?;

    let server_source = render_server(&server, &template)?;
    fs::write(&server_path, server_source)
        .await
        .map_err(|e| KilnError::io(format!("writing {}", server_path.display()), e))?;

    info!(
        "Wrote dispatch tables: {} client, {} server plugins",
        client.len(),
        server.len()
    );

    Ok(MaterializedArtifacts {
        client_plugins: client.len(),
        server_plugins: server.len(),
    })
}
