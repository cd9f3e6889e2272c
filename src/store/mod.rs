use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::Result;
use crate::graph::AgentGraph;
use crate::runtime::AgentRun;

/// Retained run history cap; newest first.
pub const MAX_RUN_HISTORY: usize = 50;

/// Named collection of graph documents, addressed by id.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn save_graph(&self, graph: &AgentGraph) -> Result<()>;
    async fn get_graph(&self, id: &str) -> Result<Option<AgentGraph>>;
    async fn list_graphs(&self) -> Result<Vec<AgentGraph>>;
    async fn delete_graph(&self, id: &str) -> Result<()>;
}

/// Named collection of run records, capped at `MAX_RUN_HISTORY`.
#[async_trait]
pub trait RunStore: Send + Sync {
    async fn save_run(&self, run: &AgentRun) -> Result<()>;
    async fn get_run(&self, id: &str) -> Result<Option<AgentRun>>;
    async fn list_runs(&self) -> Result<Vec<AgentRun>>;
    async fn clear_runs(&self) -> Result<()>;
}

/// In-memory store; the default collaborator for tests and the CLI.
#[derive(Default)]
pub struct MemoryStore {
    graphs: RwLock<Vec<AgentGraph>>,
    runs: RwLock<Vec<AgentRun>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn save_graph(&self, graph: &AgentGraph) -> Result<()> {
        let mut graphs = self.graphs.write();
        match graphs.iter_mut().find(|g| g.id == graph.id) {
            Some(existing) => *existing = graph.clone(),
            None => graphs.push(graph.clone()),
        }
        Ok(())
    }

    async fn get_graph(&self, id: &str) -> Result<Option<AgentGraph>> {
        Ok(self.graphs.read().iter().find(|g| g.id == id).cloned())
    }

    async fn list_graphs(&self) -> Result<Vec<AgentGraph>> {
        Ok(self.graphs.read().clone())
    }

    async fn delete_graph(&self, id: &str) -> Result<()> {
        self.graphs.write().retain(|g| g.id != id);
        Ok(())
    }
}

#[async_trait]
impl RunStore for MemoryStore {
    async fn save_run(&self, run: &AgentRun) -> Result<()> {
        let mut runs = self.runs.write();
        match runs.iter_mut().find(|r| r.id == run.id) {
            Some(existing) => *existing = run.clone(),
            None => runs.insert(0, run.clone()),
        }
        runs.truncate(MAX_RUN_HISTORY);
        Ok(())
    }

    async fn get_run(&self, id: &str) -> Result<Option<AgentRun>> {
        Ok(self.runs.read().iter().find(|r| r.id == id).cloned())
    }

    async fn list_runs(&self) -> Result<Vec<AgentRun>> {
        Ok(self.runs.read().clone())
    }

    async fn clear_runs(&self) -> Result<()> {
        self.runs.write().clear();
        Ok(())
    }
}

#[cfg(feature = "redis-store")]
pub mod redis {
    use super::*;
    use crate::error::AgentStudioError;
    use ::redis::AsyncCommands;

    const GRAPHS_KEY: &str = "agent_studio_graphs";
    const RUNS_KEY: &str = "agent_studio_runs";

    /// Stores each collection as a single JSON document, mirroring the
    /// in-memory layout.
    pub struct RedisStore {
        client: ::redis::Client,
    }

    impl RedisStore {
        pub fn new(client: ::redis::Client) -> Self {
            Self { client }
        }

        async fn connection(&self) -> Result<::redis::aio::MultiplexedConnection> {
            self.client
                .get_multiplexed_async_connection()
                .await
                .map_err(|e| AgentStudioError::Store(e.to_string()))
        }

        async fn load<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
            let mut conn = self.connection().await?;
            let raw: Option<String> = conn
                .get(key)
                .await
                .map_err(|e| AgentStudioError::Store(e.to_string()))?;
            match raw {
                Some(raw) => serde_json::from_str(&raw)
                    .map_err(|e| AgentStudioError::Store(e.to_string())),
                None => Ok(Vec::new()),
            }
        }

        async fn persist<T: serde::Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
            let mut conn = self.connection().await?;
            let raw = serde_json::to_string(items)
                .map_err(|e| AgentStudioError::Store(e.to_string()))?;
            let _: () = conn
                .set(key, raw)
                .await
                .map_err(|e| AgentStudioError::Store(e.to_string()))?;
            Ok(())
        }
    }

    #[async_trait]
    impl GraphStore for RedisStore {
        async fn save_graph(&self, graph: &AgentGraph) -> Result<()> {
            let mut graphs: Vec<AgentGraph> = self.load(GRAPHS_KEY).await?;
            match graphs.iter_mut().find(|g| g.id == graph.id) {
                Some(existing) => *existing = graph.clone(),
                None => graphs.push(graph.clone()),
            }
            self.persist(GRAPHS_KEY, &graphs).await
        }

        async fn get_graph(&self, id: &str) -> Result<Option<AgentGraph>> {
            let graphs: Vec<AgentGraph> = self.load(GRAPHS_KEY).await?;
            Ok(graphs.into_iter().find(|g| g.id == id))
        }

        async fn list_graphs(&self) -> Result<Vec<AgentGraph>> {
            self.load(GRAPHS_KEY).await
        }

        async fn delete_graph(&self, id: &str) -> Result<()> {
            let mut graphs: Vec<AgentGraph> = self.load(GRAPHS_KEY).await?;
            graphs.retain(|g| g.id != id);
            self.persist(GRAPHS_KEY, &graphs).await
        }
    }

    #[async_trait]
    impl RunStore for RedisStore {
        async fn save_run(&self, run: &AgentRun) -> Result<()> {
            let mut runs: Vec<AgentRun> = self.load(RUNS_KEY).await?;
            match runs.iter_mut().find(|r| r.id == run.id) {
                Some(existing) => *existing = run.clone(),
                None => runs.insert(0, run.clone()),
            }
            runs.truncate(MAX_RUN_HISTORY);
            self.persist(RUNS_KEY, &runs).await
        }

        async fn get_run(&self, id: &str) -> Result<Option<AgentRun>> {
            let runs: Vec<AgentRun> = self.load(RUNS_KEY).await?;
            Ok(runs.into_iter().find(|r| r.id == id))
        }

        async fn list_runs(&self) -> Result<Vec<AgentRun>> {
            self.load(RUNS_KEY).await
        }

        async fn clear_runs(&self) -> Result<()> {
            self.persist::<AgentRun>(RUNS_KEY, &[]).await
        }
    }
}
