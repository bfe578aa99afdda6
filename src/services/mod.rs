pub mod advisor;
pub mod gemini;
pub mod market;
pub mod metrics_manager;
pub mod mortgage;
pub mod session_manager;
