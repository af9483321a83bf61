//! 结果打印器
//!
//! 以表格或垂直格式输出节点、展示边和统计

use crate::classify::ClassificationRunResult;
use crate::graph::{Node, PresentationEdge};
use crate::stats::StatsSummary;
use prettytable::{format, row, Cell, Row, Table};

/// 打印模式
#[derive(Clone, Copy, PartialEq)]
pub enum PrintMode {
    /// 表格模式
    Table,
    /// 垂直模式
    Vertical,
}

/// 结果打印器
pub struct Printer {
    mode: PrintMode,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new(PrintMode::Table)
    }
}

impl Printer {
    pub fn new(mode: PrintMode) -> Self {
        Self { mode }
    }

    /// 设置打印模式
    pub fn set_mode(&mut self, mode: PrintMode) {
        self.mode = mode;
    }

    /// 打印节点
    pub fn print_nodes(&self, nodes: &[Node]) -> String {
        let columns = ["address", "tags", "name", "categories"];
        let rows: Vec<Vec<String>> = nodes
            .iter()
            .map(|node| {
                let tags: Vec<&str> = node.tags.iter().map(|t| t.as_str()).collect();
                let (name, categories) = match &node.label {
                    Some(label) => (
                        label.name.clone().unwrap_or_default(),
                        label.categories.join(", "),
                    ),
                    None => (String::new(), String::new()),
                };
                vec![node.id.to_string(), tags.join(", "), name, categories]
            })
            .collect();
        self.render("node", &columns, &rows)
    }

    /// 打印展示边，每种资产一行
    pub fn print_links(&self, links: &[PresentationEdge]) -> String {
        let columns = ["source", "target", "symbol", "count", "sum", "actions", "qty"];
        let mut rows = Vec::new();
        for link in links {
            for (symbol, detail) in &link.detail {
                let actions: Vec<&str> = detail.actions.iter().map(|a| a.as_str()).collect();
                rows.push(vec![
                    link.source.to_string(),
                    link.target.to_string(),
                    symbol.clone(),
                    detail.count.to_string(),
                    format!("{:.6}", detail.sum),
                    actions.join(", "),
                    link.qty.to_string(),
                ]);
            }
        }
        self.render("link", &columns, &rows)
    }

    /// 打印统计汇总
    pub fn print_stats(&self, stats: &StatsSummary) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);
        table.set_titles(row!["Counter", "Value"]);
        for (name, value) in stats.rows() {
            table.add_row(row![name, value.to_string()]);
        }
        table.to_string()
    }

    /// 打印本次分类结果
    pub fn print_run(&self, run: &ClassificationRunResult) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);
        table.set_titles(row!["Outcome", "Groups"]);
        table.add_row(row!["classified", run.classified.to_string()]);
        table.add_row(row!["unclassified", run.unclassified.to_string()]);
        table.add_row(row!["incomplete", run.incomplete.to_string()]);
        table.add_row(row!["unmatched rows", run.unmatched_rows.to_string()]);
        for (action, count) in &run.actions {
            table.add_row(row![format!("  {}", action), count.to_string()]);
        }
        table.to_string()
    }

    fn render(&self, noun: &str, columns: &[&str], rows: &[Vec<String>]) -> String {
        if rows.is_empty() {
            return format!("Empty set (0 {}s)\n", noun);
        }

        let output = match self.mode {
            PrintMode::Table => self.format_table(columns, rows),
            PrintMode::Vertical => self.format_vertical(columns, rows),
        };

        format!("{}\n{} {}(s)\n", output, rows.len(), noun)
    }

    /// 表格格式
    fn format_table(&self, columns: &[&str], rows: &[Vec<String>]) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);

        let header: Vec<Cell> = columns.iter().map(|c| Cell::new(c)).collect();
        table.set_titles(Row::new(header));

        for row_data in rows {
            let cells: Vec<Cell> = row_data.iter().map(|v| Cell::new(v)).collect();
            table.add_row(Row::new(cells));
        }

        table.to_string()
    }

    /// 垂直格式
    fn format_vertical(&self, columns: &[&str], rows: &[Vec<String>]) -> String {
        let max_col_width = columns.iter().map(|c| c.len()).max().unwrap_or(0);
        let mut output = String::new();

        for (i, row_data) in rows.iter().enumerate() {
            output.push_str(&format!(
                "*************************** {}. row ***************************\n",
                i + 1
            ));

            for (j, col) in columns.iter().enumerate() {
                let value = row_data.get(j).map(|s| s.as_str()).unwrap_or("");
                output.push_str(&format!("{:>width$}: {}\n", col, value, width = max_col_width));
            }
        }

        output
    }
}
