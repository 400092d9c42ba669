//! The `add` command: submit torrent files to the daemon.

use std::fs;
use std::path::Path;

use anyhow::anyhow;
use base64::{Engine as _, engine::general_purpose};
use serde_json::{Map, Value, json};

use squall_client::{CallError, Gateway, PendingCall};

use crate::cli::AddArgs;
use crate::client::{CliError, CliResult};

/// Validate each path locally, then submit one call per valid file.
///
/// Calls are issued eagerly: a rejected file never cancels the others, and
/// every file gets its own success or failure line. Local validation
/// failures are reported here and never reach the daemon.
pub(crate) async fn handle_add(gateway: &Gateway, args: AddArgs) -> CliResult<()> {
    let kwargs = build_kwargs(args.path.as_deref())?;

    let mut submitted = Vec::new();
    for torrent in &args.torrents {
        match submit_file(gateway, torrent, kwargs.clone()) {
            Ok(call) => submitted.push((torrent.display().to_string(), call)),
            Err(err) => {
                eprintln!("{}: {}", torrent.display(), err.display_message());
            }
        }
    }

    if submitted.is_empty() {
        return Err(CliError::validation("no valid torrent files to add"));
    }

    let mut failed = 0usize;
    for (display, call) in submitted {
        match call.wait().await {
            Ok(_) => println!("added {display}"),
            Err(CallError::Remote { payload }) => {
                failed += 1;
                eprintln!("failed to add {display}: {}", render_payload(&payload));
            }
            Err(err) => {
                failed += 1;
                eprintln!("failed to add {display}: {err}");
            }
        }
    }

    if failed > 0 {
        Err(CliError::failure(anyhow!(
            "{failed} torrent(s) were not added"
        )))
    } else {
        Ok(())
    }
}

/// Validate one path and issue its `core.add_torrent_file` call.
fn submit_file(
    gateway: &Gateway,
    torrent: &Path,
    kwargs: Map<String, Value>,
) -> CliResult<PendingCall> {
    if !torrent.is_file() {
        return Err(CliError::validation("not a regular file"));
    }
    let bytes = fs::read(torrent)
        .map_err(|err| CliError::failure(anyhow!("failed to read torrent file: {err}")))?;
    let filename = torrent
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::validation("path has no file name"))?;
    let filedump = general_purpose::STANDARD.encode(&bytes);

    println!("attempting to add torrent: {}", torrent.display());
    Ok(gateway.invoke_with_kwargs(
        "core.add_torrent_file",
        vec![json!(filename), json!(filedump)],
        kwargs,
    ))
}

fn build_kwargs(path: Option<&Path>) -> CliResult<Map<String, Value>> {
    let mut kwargs = Map::new();
    if let Some(path) = path {
        let location = path.to_str().ok_or_else(|| {
            CliError::validation(format!("save path '{}' is not valid UTF-8", path.display()))
        })?;
        kwargs.insert("download_location".into(), json!(location));
    }
    Ok(kwargs)
}

fn render_payload(payload: &Value) -> String {
    match payload {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
