pub mod cli;
pub mod commands;
pub mod config;
pub mod entry_point;
pub mod error;
pub mod export;
pub mod filter;
pub mod logging;
pub mod mapper;
pub mod metadata;
pub mod resolver;
pub mod selector;
pub mod util;
pub mod workspace;

pub use entry_point::{Declaration, EntryPoint};
pub use error::{MapError, MapResult, ResolveMiss};
pub use mapper::{DependencyMapper, FlowDirection, trim_to_depth};
pub use metadata::{DependencyMap, MethodMetadata};
pub use resolver::{CancellationToken, Resolver};
