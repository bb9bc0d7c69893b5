//! Pull command implementation.

use replichat_protocol::{Cookie, PatchOperation, PullRequest, PullResponse};
use replichat_server::PullResponder;
use replichat_store::SqliteStore;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Computes the pull response a client would receive and prints it.
pub fn run(
    path: &Path,
    client_id: &str,
    cookie: Option<u64>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No database found at {:?}", path).into());
    }

    let store = Arc::new(SqliteStore::open(path)?);
    let cookie = cookie.map_or(Cookie::NONE, Cookie::at);
    let response = PullResponder::new(store).pull(&PullRequest::new(client_id, cookie))?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&response)?),
        _ => print!("{}", render_text(&response)),
    }

    Ok(())
}

/// Renders a response for humans.
pub fn render_text(response: &PullResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Cookie: {}", response.cookie);
    let _ = writeln!(out, "Last mutation ID: {}", response.last_mutation_id);
    let _ = writeln!(out, "Patch ({} ops):", response.patch.len());
    for op in &response.patch {
        match op {
            PatchOperation::Clear => {
                let _ = writeln!(out, "  clear");
            }
            PatchOperation::Put { key, value } => {
                let _ = writeln!(
                    out,
                    "  put {key} [{}] {}: {}",
                    value.order, value.from, value.content
                );
            }
            PatchOperation::Del { key } => {
                let _ = writeln!(out, "  del {key}");
            }
        }
    }
    out
}
