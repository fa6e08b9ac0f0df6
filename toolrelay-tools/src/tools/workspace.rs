use super::{Tool, ToolFailure, optional_bool, optional_str, optional_usize, required_str};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub const WORKSPACE_ENV: &str = "TOOLRELAY_WORKSPACE";
pub const DEFAULT_WORKSPACE: &str = "~/mcp/workspace";
pub const DEFAULT_MAX_CHARS: usize = 20_000;
const TRUNCATION_MARKER: &str = "\n... (truncated) ...";

/// Directory every file tool is confined to.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Opens the directory named by `TOOLRELAY_WORKSPACE`, or the default.
    pub fn from_env() -> io::Result<Self> {
        let raw = std::env::var(WORKSPACE_ENV).unwrap_or_else(|_| DEFAULT_WORKSPACE.to_string());
        Self::open(shellexpand::tilde(&raw).as_ref())
    }

    /// Creates the directory if needed and pins its canonical path.
    pub fn open(root: impl AsRef<Path>) -> io::Result<Self> {
        std::fs::create_dir_all(root.as_ref())?;
        let root = std::fs::canonicalize(root.as_ref())?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a client-supplied relative path into the workspace, rejecting
    /// absolute paths, `..` escapes and symlinks that lead outside.
    pub async fn resolve(&self, relative: &str) -> Result<PathBuf, ToolFailure> {
        if relative.trim().is_empty() {
            return Err(ToolFailure::InvalidParams("'filename' must not be empty".into()));
        }

        let mut resolved = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir if resolved != self.root => {
                    resolved.pop();
                }
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(self.escape_error());
                }
            }
        }
        if resolved == self.root {
            return Err(ToolFailure::InvalidParams(
                "'filename' must name a file inside the workspace".into(),
            ));
        }

        let mut ancestor = resolved.clone();
        loop {
            match tokio::fs::canonicalize(&ancestor).await {
                Ok(real) if real.starts_with(&self.root) => break,
                Ok(_) => return Err(self.escape_error()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    if !ancestor.pop() {
                        break;
                    }
                }
                Err(err) => {
                    return Err(ToolFailure::Failed(format!("Cannot access {relative}: {err}")));
                }
            }
        }
        debug!(path = %resolved.display(), "Resolved workspace path");
        Ok(resolved)
    }

    fn escape_error(&self) -> ToolFailure {
        ToolFailure::Failed(format!(
            "Path must be under workspace: {}",
            self.root.display()
        ))
    }
}

async fn ensure_parent(path: &Path, filename: &str) -> Result<(), ToolFailure> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| ToolFailure::Failed(format!("Cannot create folders for {filename}: {err}")))?;
    }
    Ok(())
}

fn filename_schema(extra: Value) -> Value {
    let mut properties = Map::new();
    properties.insert(
        "filename".into(),
        json!({"type": "string", "description": "Path relative to the workspace"}),
    );
    if let Value::Object(extra) = extra {
        properties.extend(extra);
    }
    json!({"type": "object", "properties": properties, "required": ["filename"]})
}

pub struct CreateFileTool {
    workspace: Arc<Workspace>,
}

impl CreateFileTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for CreateFileTool {
    fn name(&self) -> &'static str {
        "create_file"
    }

    fn description(&self) -> &'static str {
        "Create a file under the workspace"
    }

    fn input_schema(&self) -> Value {
        filename_schema(json!({
            "content": {"type": "string", "default": ""},
            "overwrite": {"type": "boolean", "default": false}
        }))
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<String, ToolFailure> {
        let filename = required_str(args, "filename")?;
        let content = optional_str(args, "content", "")?;
        let overwrite = optional_bool(args, "overwrite", false)?;

        let path = self.workspace.resolve(filename).await?;
        ensure_parent(&path, filename).await?;
        if !overwrite && tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ToolFailure::Failed(format!(
                "File already exists: {filename} (set overwrite=true to replace)"
            )));
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(|err| ToolFailure::Failed(format!("Cannot create {filename}: {err}")))?;
        Ok(format!("Created: {filename}"))
    }
}

pub struct WriteFileTool {
    workspace: Arc<Workspace>,
}

impl WriteFileTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Write text content to a file under the workspace"
    }

    fn input_schema(&self) -> Value {
        let mut schema = filename_schema(json!({
            "content": {"type": "string"},
            "append": {"type": "boolean", "default": false}
        }));
        schema["required"] = json!(["filename", "content"]);
        schema
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<String, ToolFailure> {
        let filename = required_str(args, "filename")?;
        let content = required_str(args, "content")?;
        let append = optional_bool(args, "append", false)?;

        let path = self.workspace.resolve(filename).await?;
        ensure_parent(&path, filename).await?;
        let failed = |err: io::Error| ToolFailure::Failed(format!("Cannot write {filename}: {err}"));
        if append {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
                .map_err(failed)?;
            file.write_all(content.as_bytes()).await.map_err(failed)?;
            file.flush().await.map_err(failed)?;
        } else {
            tokio::fs::write(&path, content).await.map_err(failed)?;
        }
        Ok(format!("Wrote: {filename}"))
    }
}

pub struct ReadFileTool {
    workspace: Arc<Workspace>,
}

impl ReadFileTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read a text file under the workspace (truncated to max_chars)"
    }

    fn input_schema(&self) -> Value {
        filename_schema(json!({
            "max_chars": {"type": "integer", "default": DEFAULT_MAX_CHARS}
        }))
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<String, ToolFailure> {
        let filename = required_str(args, "filename")?;
        let max_chars = optional_usize(args, "max_chars", DEFAULT_MAX_CHARS)?;

        let path = self.workspace.resolve(filename).await?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ToolFailure::Failed(format!("Not found: {filename}")));
            }
            Err(err) => return Err(ToolFailure::Failed(format!("Cannot read {filename}: {err}"))),
        };
        Ok(truncate_chars(&String::from_utf8_lossy(&bytes), max_chars))
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace() -> (TempDir, Arc<Workspace>) {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::open(dir.path().join("ws")).unwrap();
        (dir, Arc::new(workspace))
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn resolve_keeps_paths_inside_root() {
        let (_dir, ws) = workspace();
        let nested = ws.resolve("notes/./today.txt").await.unwrap();
        assert_eq!(nested, ws.root().join("notes").join("today.txt"));

        let back_in = ws.resolve("notes/../today.txt").await.unwrap();
        assert_eq!(back_in, ws.root().join("today.txt"));
    }

    #[tokio::test]
    async fn resolve_rejects_escapes() {
        let (_dir, ws) = workspace();
        for bad in ["../secrets.txt", "a/../../secrets.txt", "/etc/passwd"] {
            let err = ws.resolve(bad).await.unwrap_err();
            assert!(
                matches!(&err, ToolFailure::Failed(message) if message.starts_with("Path must be under workspace")),
                "{bad} was accepted: {err:?}"
            );
        }
        assert!(matches!(
            ws.resolve("  ").await,
            Err(ToolFailure::InvalidParams(_))
        ));
        assert!(matches!(
            ws.resolve(".").await,
            Err(ToolFailure::InvalidParams(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn resolve_rejects_symlink_out_of_workspace() {
        let (dir, ws) = workspace();
        let outside = dir.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, ws.root().join("link")).unwrap();

        assert!(ws.resolve("link/file.txt").await.is_err());
    }

    #[tokio::test]
    async fn create_write_and_read_round_trip() {
        let (_dir, ws) = workspace();
        let create = CreateFileTool::new(ws.clone());
        let write = WriteFileTool::new(ws.clone());
        let read = ReadFileTool::new(ws.clone());

        let created = create
            .call(&args(json!({"filename": "docs/plan.md", "content": "step 1\n"})))
            .await
            .unwrap();
        assert_eq!(created, "Created: docs/plan.md");

        write
            .call(&args(json!({"filename": "docs/plan.md", "content": "step 2\n", "append": true})))
            .await
            .unwrap();
        let text = read
            .call(&args(json!({"filename": "docs/plan.md"})))
            .await
            .unwrap();
        assert_eq!(text, "step 1\nstep 2\n");

        write
            .call(&args(json!({"filename": "docs/plan.md", "content": "fresh"})))
            .await
            .unwrap();
        let text = read
            .call(&args(json!({"filename": "docs/plan.md"})))
            .await
            .unwrap();
        assert_eq!(text, "fresh");
    }

    #[tokio::test]
    async fn create_refuses_to_overwrite_by_default() {
        let (_dir, ws) = workspace();
        let create = CreateFileTool::new(ws.clone());
        create
            .call(&args(json!({"filename": "a.txt", "content": "one"})))
            .await
            .unwrap();

        let err = create
            .call(&args(json!({"filename": "a.txt", "content": "two"})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("File already exists: a.txt"));

        create
            .call(&args(json!({"filename": "a.txt", "content": "two", "overwrite": true})))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(ws.root().join("a.txt")).unwrap(), "two");
    }

    #[tokio::test]
    async fn read_reports_missing_and_truncates() {
        let (_dir, ws) = workspace();
        let read = ReadFileTool::new(ws.clone());

        let missing = read
            .call(&args(json!({"filename": "nope.txt"})))
            .await
            .unwrap_err();
        assert_eq!(missing.to_string(), "Not found: nope.txt");

        std::fs::write(ws.root().join("long.txt"), "héllo wörld").unwrap();
        let text = read
            .call(&args(json!({"filename": "long.txt", "max_chars": 5})))
            .await
            .unwrap();
        assert_eq!(text, "héllo\n... (truncated) ...");
    }

    #[tokio::test]
    async fn write_requires_content() {
        let (_dir, ws) = workspace();
        let err = WriteFileTool::new(ws)
            .call(&args(json!({"filename": "a.txt"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolFailure::InvalidParams(_)));
    }
}
