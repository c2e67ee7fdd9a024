use anyhow::Result;
use async_trait::async_trait;

/// Success/failure tallies for one activity cycle.
#[derive(Debug, Default, Clone)]
pub struct CycleStats {
    pub success: u64,
    pub failed: u64,
}

#[derive(Debug, Clone)]
pub struct TaskResult {
    pub success: bool,
    pub message: String,
    pub tx_hash: Option<String>,
}

#[async_trait]
pub trait Task<Ctx>: Send + Sync {
    /// Returns the name of the task
    fn name(&self) -> &str;

    /// Executes the task
    async fn run(&self, ctx: Ctx) -> Result<TaskResult>;
}
