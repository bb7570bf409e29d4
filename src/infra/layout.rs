//! External layout engine adapter.
//!
//! The engine is consumed as a black box: a CLI that reads the JSON layout
//! payload (canvas, embedded fonts, asset table, styled tree) from a file
//! and writes an SVG rendition of the laid-out document to stdout. Exit
//! status zero with SVG on stdout is success; anything else is a failure
//! with diagnostics on stderr.

use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::warn;

use crate::application::image::{LayoutEngine, LayoutError, LayoutPayload};

pub struct CliLayoutEngine {
    cli_path: PathBuf,
}

impl CliLayoutEngine {
    pub fn new(cli_path: PathBuf) -> Self {
        Self { cli_path }
    }
}

#[async_trait]
impl LayoutEngine for CliLayoutEngine {
    async fn layout(&self, payload: &LayoutPayload<'_>) -> Result<String, LayoutError> {
        let encoded = serde_json::to_vec(payload)
            .map_err(|err| LayoutError::Engine(format!("payload serialization failed: {err}")))?;

        let mut input_file = NamedTempFile::new()
            .map_err(|err| LayoutError::Engine(format!("failed to create payload file: {err}")))?;
        input_file
            .write_all(&encoded)
            .and_then(|()| input_file.flush())
            .map_err(|err| LayoutError::Engine(format!("failed to write payload file: {err}")))?;

        let output = Command::new(&self.cli_path)
            .arg("--input")
            .arg(input_file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| {
                if err.kind() == ErrorKind::NotFound {
                    LayoutError::Unavailable(format!("`{}` not found", self.cli_path.display()))
                } else {
                    LayoutError::Engine(err.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            warn!(
                target = "meigen::layout",
                exit_code = output.status.code().map(i64::from).unwrap_or(-1),
                stderr = %stderr,
                "layout engine invocation failed"
            );
            return Err(LayoutError::Engine(stderr));
        }

        String::from_utf8(output.stdout)
            .map_err(|err| LayoutError::Engine(format!("engine emitted invalid UTF-8: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use crate::application::image::{LayoutEngine, LayoutError, LayoutPayload};
    use crate::application::render::{NodeStyle, VisualNode};

    use super::CliLayoutEngine;

    #[tokio::test]
    async fn missing_cli_reports_unavailable() {
        let engine = CliLayoutEngine::new(PathBuf::from("/nonexistent/meigen-layout"));
        let root = VisualNode::container(NodeStyle::default(), vec![VisualNode::text("x")]);
        let payload = LayoutPayload {
            width: 1200,
            height: 630,
            fonts: Vec::new(),
            assets: BTreeMap::new(),
            root: &root,
        };

        match engine.layout(&payload).await {
            Err(LayoutError::Unavailable(_)) => {}
            other => panic!("expected unavailable error, got {other:?}"),
        }
    }
}
