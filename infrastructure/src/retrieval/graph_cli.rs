//! Knowledge graph queries through an external query CLI
//!
//! Each query runs `<command> query --root <index> --method <mode> --query <text>`
//! where `<index>` is `<index_root>/<knowledge_source>/<project_id>`.
//! `<command>` may carry leading arguments (`python -m graphrag`). The
//! child is killed when the query times out or the future is dropped.

use crate::config::FileRetrievalConfig;
use async_trait::async_trait;
use casegen_application::{KnowledgeRetriever, RetrievalError};
use casegen_domain::{RetrievalCapability, RetrievalMode};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs graph queries as child processes.
#[derive(Debug, Clone)]
pub struct GraphCliRetriever {
    command: String,
    index_root: PathBuf,
    timeout: Duration,
}

impl GraphCliRetriever {
    pub fn new(command: impl Into<String>, index_root: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            index_root: index_root.into(),
            timeout: Duration::from_secs(300),
        }
    }

    pub fn from_config(config: &FileRetrievalConfig) -> Self {
        Self::new(config.command.clone(), config.index_root.clone()).with_timeout(config.timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Index directory queried for a capability.
    pub fn index_dir(&self, capability: &RetrievalCapability) -> PathBuf {
        self.index_root
            .join(&capability.knowledge_source)
            .join(&capability.project_id)
    }

    fn build_command(
        &self,
        index_dir: &Path,
        mode: RetrievalMode,
        query_text: &str,
    ) -> Result<Command, RetrievalError> {
        let mut words = self.command.split_whitespace();
        let program = words
            .next()
            .ok_or_else(|| RetrievalError::Launch("empty retrieval command".to_string()))?;
        let mut cmd = Command::new(program);
        cmd.args(words)
            .arg("query")
            .arg("--root")
            .arg(index_dir)
            .arg("--method")
            .arg(mode.as_str())
            .arg("--query")
            .arg(query_text)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Linux: have the kernel terminate the query if we die first.
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        Ok(cmd)
    }
}

#[async_trait]
impl KnowledgeRetriever for GraphCliRetriever {
    async fn query(
        &self,
        capability: &RetrievalCapability,
        mode: RetrievalMode,
        query_text: &str,
    ) -> Result<String, RetrievalError> {
        let index_dir = self.index_dir(capability);
        if !index_dir.is_dir() {
            return Err(RetrievalError::IndexNotFound(index_dir.display().to_string()));
        }

        debug!(
            index = %index_dir.display(),
            mode = %mode,
            "Running knowledge graph query"
        );

        let child = self
            .build_command(&index_dir, mode, query_text)?
            .spawn()
            .map_err(|e| RetrievalError::Launch(format!("{}: {}", self.command, e)))?;

        // Dropping the wait future on timeout kills the child (kill_on_drop).
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| RetrievalError::Launch(e.to_string()))?,
            Err(_) => {
                warn!(index = %index_dir.display(), "Knowledge graph query timed out");
                return Err(RetrievalError::Timeout(self.timeout));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(RetrievalError::CommandFailed {
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Shell script standing in for the query CLI, run as `sh <script>`.
    fn setup(body: &str) -> (TempDir, GraphCliRetriever, RetrievalCapability) {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("fake-graph.sh");
        std::fs::write(&script, format!("{body}\n")).unwrap();
        let root = dir.path().join("graphs");
        std::fs::create_dir_all(root.join("graph_us").join("PRJ")).unwrap();
        let retriever = GraphCliRetriever::new(format!("sh {}", script.display()), root);
        (dir, retriever, RetrievalCapability::new("graph_us", "PRJ"))
    }

    #[tokio::test]
    async fn test_query_passes_mode_and_text() {
        let (_dir, retriever, capability) = setup(r#"echo "$@""#);
        let out = retriever
            .query(&capability, RetrievalMode::Global, "login rules")
            .await
            .unwrap();

        let index = retriever.index_dir(&capability);
        assert_eq!(
            out,
            format!("query --root {} --method global --query login rules", index.display())
        );
    }

    #[tokio::test]
    async fn test_missing_index_is_reported() {
        let (_dir, retriever, _) = setup("echo unreachable");
        let err = retriever
            .query(&RetrievalCapability::new("graph_us", "OTHER"), RetrievalMode::Local, "q")
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::IndexNotFound(p) if p.ends_with("OTHER")));
    }

    #[tokio::test]
    async fn test_failing_command_returns_stderr() {
        let (_dir, retriever, capability) = setup("echo 'index corrupted' >&2\nexit 3");
        let err = retriever
            .query(&capability, RetrievalMode::Local, "q")
            .await
            .unwrap_err();
        match err {
            RetrievalError::CommandFailed { stderr, .. } => assert_eq!(stderr, "index corrupted"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_command_times_out() {
        let (_dir, retriever, capability) = setup("sleep 5");
        let retriever = retriever.with_timeout(Duration::from_millis(100));
        let err = retriever
            .query(&capability, RetrievalMode::Local, "q")
            .await
            .unwrap_err();
        assert_eq!(err, RetrievalError::Timeout(Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn test_missing_binary_is_launch_error() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("g").join("P")).unwrap();
        let retriever = GraphCliRetriever::new("casegen-no-such-binary", dir.path());
        let err = retriever
            .query(&RetrievalCapability::new("g", "P"), RetrievalMode::Local, "q")
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Launch(_)));
    }
}
