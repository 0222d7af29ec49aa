//! Tables built with `tabled`

use super::{truncate, Alignment, Column, OutputConfig};
use serde::Serialize;
use serde_json::Value;
use tabled::{
    builder::Builder,
    settings::{object::Columns, style::Style, Alignment as TabledAlignment, Modify, Width},
};

pub struct TableOutput;

impl TableOutput {
    /// Lay out serializable rows, one column per [`Column`] key.
    pub fn format_with_columns<T: Serialize>(
        rows: &[T],
        columns: &[Column],
        config: &OutputConfig,
    ) -> String {
        if rows.is_empty() {
            return "(no results)".to_string();
        }

        let mut builder = Builder::default();
        builder.push_record(columns.iter().map(|c| c.name.as_str()));

        for row in rows {
            let fields = serde_json::to_value(row).unwrap_or_default();
            builder.push_record(columns.iter().map(|col| {
                let cell = cell_text(fields.get(&col.key).unwrap_or(&Value::Null));
                match col.max_width {
                    Some(max) if config.should_truncate() => truncate(&cell, max),
                    _ => cell,
                }
            }));
        }

        let mut table = builder.build();
        table.with(Style::rounded());
        for (i, col) in columns.iter().enumerate() {
            if col.align == Alignment::Right {
                table.with(Modify::new(Columns::single(i)).with(TabledAlignment::right()));
            }
        }
        if config.should_truncate() {
            table.with(Width::wrap(config.terminal_width()));
        }

        table.to_string()
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => format!("[{} items]", items.len()),
        other => other.to_string(),
    }
}
