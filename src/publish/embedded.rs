use crate::error::PublishError;
use crate::publish::Publish;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A storage node that can be run in-process against a scratch repo
#[async_trait]
pub trait EmbeddedNode: Send + Sync {
    /// Add `content` to the node backed by `repo` and return its identifier
    async fn add(&self, repo: &Path, content: Vec<u8>) -> Result<String, PublishError>;

    /// Fetch the content stored under `cid` from the node backed by `repo`
    async fn get(&self, repo: &Path, cid: &str) -> Result<Vec<u8>, PublishError>;
}

/// Publishes through a throwaway node created for each call.
///
/// Without a node this build cannot publish in embedded mode and every call
/// fails with `Unimplemented`.
pub struct EmbeddedPublisher {
    node: Option<Arc<dyn EmbeddedNode>>,
    repo_root: Option<PathBuf>,
}

impl EmbeddedPublisher {
    pub fn new(node: Option<Arc<dyn EmbeddedNode>>) -> Self {
        Self {
            node,
            repo_root: None,
        }
    }

    /// Create node repos under `root` instead of the system temp dir
    pub fn with_repo_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.repo_root = Some(root.into());
        self
    }

    pub fn is_available(&self) -> bool {
        self.node.is_some()
    }
}

#[async_trait]
impl Publish for EmbeddedPublisher {
    async fn publish(&self, path: &Path) -> Result<String, PublishError> {
        let node = self.node.as_ref().ok_or(PublishError::Unimplemented)?;

        // The repo directory is removed when `repo` drops, on every path out
        let mut builder = tempfile::Builder::new();
        builder.prefix("wayback-node-");
        let repo = match &self.repo_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(PublishError::Repo)?;

        let content = tokio::fs::read(path).await.map_err(PublishError::Read)?;
        let cid = node.add(repo.path(), content.clone()).await?;

        let fetched = node.get(repo.path(), &cid).await?;
        if fetched != content {
            return Err(PublishError::Verify { cid });
        }

        ::log::debug!("Embedded node published {} as {}", path.display(), cid);
        Ok(cid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// In-memory node that remembers which repo directories it was given
    #[derive(Default)]
    struct MemoryNode {
        blocks: Mutex<HashMap<String, Vec<u8>>>,
        repos: Mutex<Vec<PathBuf>>,
        corrupt: bool,
    }

    #[async_trait]
    impl EmbeddedNode for MemoryNode {
        async fn add(&self, repo: &Path, content: Vec<u8>) -> Result<String, PublishError> {
            assert!(repo.is_dir());
            self.repos.lock().unwrap().push(repo.to_path_buf());
            let cid = format!("mem-{}", content.len());
            self.blocks.lock().unwrap().insert(cid.clone(), content);
            Ok(cid)
        }

        async fn get(&self, _repo: &Path, cid: &str) -> Result<Vec<u8>, PublishError> {
            let mut content = self.blocks.lock().unwrap()[cid].clone();
            if self.corrupt {
                content.push(b'!');
            }
            Ok(content)
        }
    }

    fn sample_file() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, b"<p>hi</p>").unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_without_node_is_unimplemented() {
        let (_dir, path) = sample_file();
        let publisher = EmbeddedPublisher::new(None);
        assert!(!publisher.is_available());
        assert!(matches!(
            publisher.publish(&path).await,
            Err(PublishError::Unimplemented)
        ));
    }

    #[tokio::test]
    async fn test_publish_and_teardown() {
        let (_dir, path) = sample_file();
        let node = Arc::new(MemoryNode::default());
        let publisher = EmbeddedPublisher::new(Some(node.clone()));

        assert_eq!(publisher.publish(&path).await.unwrap(), "mem-9");

        let repos = node.repos.lock().unwrap();
        assert_eq!(repos.len(), 1);
        assert!(!repos[0].exists());
    }

    #[tokio::test]
    async fn test_repo_creation_failure() {
        let (dir, path) = sample_file();
        let node = Arc::new(MemoryNode::default());
        let publisher =
            EmbeddedPublisher::new(Some(node.clone())).with_repo_root(dir.path().join("missing"));

        assert!(matches!(
            publisher.publish(&path).await,
            Err(PublishError::Repo(_))
        ));
        assert!(node.repos.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verify_failure_still_tears_down() {
        let (_dir, path) = sample_file();
        let node = Arc::new(MemoryNode {
            corrupt: true,
            ..MemoryNode::default()
        });
        let publisher = EmbeddedPublisher::new(Some(node.clone()));

        assert!(matches!(
            publisher.publish(&path).await,
            Err(PublishError::Verify { .. })
        ));
        assert!(!node.repos.lock().unwrap()[0].exists());
    }
}
