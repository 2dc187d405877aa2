pub mod analyze_entry_points;
pub mod api;
pub mod cluster;
pub mod completion;
pub mod single_process_executor;
pub mod task_queue;

pub use analyze_entry_points::*;
pub use api::*;
pub use cluster::ClusterExecutor;
pub use single_process_executor::*;
pub use task_queue::*;
