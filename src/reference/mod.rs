//! 参考数据：地址标签与外部名称

mod labels;
mod tags;

pub use labels::{Label, LabelTable};
pub use tags::{AddressTag, TagTable};
