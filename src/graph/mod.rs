//! 图核心模块
//!
//! 节点、边、构建器、低精度构图与展示

mod builder;
mod edge;
mod linear;
mod node;
mod present;

pub use builder::{GraphBuilder, GraphDelta};
pub use edge::{AssetKey, Edge, LinkKey};
pub use linear::build_linear;
pub use node::Node;
pub use present::{group_edges, present, present_parts, AssetDetail, GraphPayload, PresentationEdge};
