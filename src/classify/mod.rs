//! 分类规则引擎
//!
//! 以原生交易为锚点，对同一哈希下的事件组进行形态匹配，产出语义动作与资产流

mod action;
mod classifier;
mod rules;

pub use action::Action;
pub use classifier::{
    ClassificationRunResult, Classifier, GroupMatch, GroupOutcome, UNCLASSIFIED_TARGET,
};
pub use rules::{
    AnchorContext, AnchorRule, Emission, Flow, GroupRule, Role, RowRule, ANCHOR_RULES,
    GROUP_RULES, ROW_RULES,
};
