//! Git branch detection.
//!
//! The branch is read with a short-lived `git rev-parse --abbrev-ref HEAD`
//! instead of a long-lived process. The query is bounded by a hard timeout
//! and every failure degrades to [`Branch::Unavailable`].

use anyhow::{bail, Context as _, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::{swallow, ErrorCategory};

/// Upper bound on one branch query.
pub const BRANCH_QUERY_TIMEOUT: Duration = Duration::from_secs(1);

/// Outcome of a branch query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Branch {
    Named(String),
    Unavailable,
}

impl Branch {
    /// Interpret raw query output. Detached heads report `HEAD` and count as unavailable.
    pub fn from_output(raw: &str) -> Self {
        match raw.trim() {
            "" | "HEAD" => Branch::Unavailable,
            name => Branch::Named(name.to_string()),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Branch::Named(name) => Some(name),
            Branch::Unavailable => None,
        }
    }
}

/// Process-spawn primitive behind branch detection.
#[async_trait]
pub trait BranchQuery: Send + Sync {
    /// Standard output of the abbreviated current-ref query run inside `cwd`.
    async fn current_ref(&self, cwd: &Path) -> Result<String>;
}

/// Runs the system `git`.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: OsString,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::with_program("git")
    }
}

impl GitCli {
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl BranchQuery for GitCli {
    async fn current_ref(&self, cwd: &Path) -> Result<String> {
        // Dropping the wait future kills the child, so an abandoned query cannot linger.
        let child = Command::new(&self.program)
            .args(["rev-parse", "--abbrev-ref", "HEAD"])
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn git in {}", cwd.display()))?;

        let output = child
            .wait_with_output()
            .await
            .context("Failed to collect git output")?;

        if !output.status.success() {
            bail!("git rev-parse exited with {}", output.status);
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Resolves the branch of a project, never failing outward.
pub struct BranchResolver {
    query: Box<dyn BranchQuery>,
    timeout: Duration,
}

impl BranchResolver {
    pub fn new(query: impl BranchQuery + 'static) -> Self {
        Self {
            query: Box::new(query),
            timeout: BRANCH_QUERY_TIMEOUT,
        }
    }

    /// Resolver backed by the system `git`.
    pub fn git() -> Self {
        Self::new(GitCli::default())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.min(BRANCH_QUERY_TIMEOUT);
        self
    }

    /// Current branch of `project_path`. Nothing is spawned when `enabled` is false.
    pub async fn resolve(&self, project_path: &Path, enabled: bool) -> Branch {
        if !enabled {
            return Branch::Unavailable;
        }

        tracing::debug!(path = %project_path.display(), "Resolving git branch");

        let queried = match tokio::time::timeout(self.timeout, self.query.current_ref(project_path)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "git query timed out after {}ms",
                self.timeout.as_millis()
            )),
        };

        let branch = swallow(ErrorCategory::ExternalQuery, queried)
            .map(|raw| Branch::from_output(&raw))
            .unwrap_or(Branch::Unavailable);
        tracing::debug!(path = %project_path.display(), branch = ?branch.name(), "Git branch resolved");
        branch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct ScriptedQuery {
        output: Result<&'static str, &'static str>,
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedQuery {
        fn new(output: Result<&'static str, &'static str>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    output,
                    delay: Duration::ZERO,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl BranchQuery for ScriptedQuery {
        async fn current_ref(&self, _cwd: &Path) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.output.map(str::to_string).map_err(|e| anyhow::anyhow!(e))
        }
    }

    #[tokio::test]
    async fn test_disabled_spawns_nothing() {
        let (query, calls) = ScriptedQuery::new(Ok("main\n"));
        let resolver = BranchResolver::new(query);

        assert_eq!(resolver.resolve(Path::new("/proj"), false).await, Branch::Unavailable);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_output_is_trimmed() {
        let (query, calls) = ScriptedQuery::new(Ok("feature/login\n"));
        let resolver = BranchResolver::new(query);

        assert_eq!(
            resolver.resolve(Path::new("/proj"), true).await,
            Branch::Named("feature/login".into())
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_degrades() {
        let (query, _) = ScriptedQuery::new(Err("fatal: not a git repository"));
        let resolver = BranchResolver::new(query);
        assert_eq!(resolver.resolve(Path::new("/tmp"), true).await, Branch::Unavailable);

        let (query, _) = ScriptedQuery::new(Ok("  \n"));
        let resolver = BranchResolver::new(query);
        assert_eq!(resolver.resolve(Path::new("/tmp"), true).await, Branch::Unavailable);
    }

    #[tokio::test]
    async fn test_timeout_degrades() {
        let (mut query, _) = ScriptedQuery::new(Ok("main"));
        query.delay = Duration::from_secs(30);
        let resolver = BranchResolver::new(query).with_timeout(Duration::from_millis(50));

        let started = std::time::Instant::now();
        assert_eq!(resolver.resolve(Path::new("/proj"), true).await, Branch::Unavailable);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_timeout_is_capped() {
        let resolver = BranchResolver::git().with_timeout(Duration::from_secs(60));
        assert_eq!(resolver.timeout, BRANCH_QUERY_TIMEOUT);
    }

    #[test]
    fn test_from_output() {
        assert_eq!(Branch::from_output("main\n"), Branch::Named("main".into()));
        assert_eq!(Branch::from_output("HEAD\n"), Branch::Unavailable);
        assert_eq!(Branch::from_output(""), Branch::Unavailable);
        assert_eq!(Branch::Named("dev".into()).name(), Some("dev"));
        assert_eq!(Branch::Unavailable.name(), None);
    }

    #[tokio::test]
    async fn test_missing_binary_degrades() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = BranchResolver::new(GitCli::with_program("where-am-i-no-such-git"));
        assert_eq!(resolver.resolve(temp_dir.path(), true).await, Branch::Unavailable);
    }

    #[tokio::test]
    async fn test_non_repository_degrades() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = BranchResolver::git();
        assert_eq!(resolver.resolve(temp_dir.path(), true).await, Branch::Unavailable);
    }
}
