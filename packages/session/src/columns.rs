//! Column layout customization state.
//!
//! Thin state holder for the grid's column set: which columns exist, in
//! what order, at what width, and which are hidden. No algorithmic depth
//! here on purpose; rendering owns everything visual.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub field: String,
    pub title: String,
    pub width: u32,
    pub editable: bool,
    pub required: bool,
}

impl Column {
    fn new(field: &str, title: &str, width: u32) -> Self {
        Self {
            field: field.to_string(),
            title: title.to_string(),
            width,
            editable: true,
            required: false,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnLayout {
    columns: Vec<Column>,
    hidden: HashSet<String>,
}

impl ColumnLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock part-list column set.
    pub fn standard() -> Self {
        let columns = vec![
            Column::new("customer", "Customer", 80),
            Column::new("carModel", "Car Model", 90),
            Column::new("project", "Project", 100),
            Column::new("partNumber", "Part Number", 120).required(),
            Column::new("sonPartNumber", "S/ON Part Number", 120),
            Column::new("altPartNumber", "Alt Part Number", 120),
            Column::new("partName", "Part Name", 180).required(),
            Column::new("quantity", "U/S", 60).required(),
            Column::new("material", "Material", 100),
            Column::new("surfaceTreatment", "Surface Treatment", 100),
            Column::new("drawing2d", "2D", 60).read_only(),
            Column::new("drawing3d", "3D", 60).read_only(),
            Column::new("eoNo", "EO No", 100),
            Column::new("changeNotice", "C/N", 80),
            Column::new("type", "Type", 80),
            Column::new("mfg1", "Mfg 1", 120),
            Column::new("mfg2", "Mfg 2", 120),
            Column::new("mfg3", "Mfg 3", 120),
            Column::new("remarks", "Remarks", 150),
        ];
        Self {
            columns,
            hidden: HashSet::new(),
        }
    }

    /// All columns in display order, hidden ones included.
    pub fn all(&self) -> &[Column] {
        &self.columns
    }

    /// Columns currently shown, in display order.
    pub fn visible(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .filter(move |c| !self.hidden.contains(&c.field))
    }

    pub fn is_hidden(&self, field: &str) -> bool {
        self.hidden.contains(field)
    }

    pub fn hide(&mut self, field: &str) {
        if self.columns.iter().any(|c| c.field == field) {
            self.hidden.insert(field.to_string());
        }
    }

    pub fn show(&mut self, field: &str) {
        self.hidden.remove(field);
    }

    /// Moves `field` to display position `to`, clamped.
    pub fn reorder(&mut self, field: &str, to: usize) {
        if let Some(from) = self.columns.iter().position(|c| c.field == field) {
            let column = self.columns.remove(from);
            let to = to.min(self.columns.len());
            self.columns.insert(to, column);
        }
    }

    pub fn set_width(&mut self, field: &str, width: u32) {
        if let Some(column) = self.columns.iter_mut().find(|c| c.field == field) {
            column.width = width;
        }
    }

    /// Appends a user-defined column. Duplicates by field name are ignored.
    pub fn add_custom(&mut self, field: &str, title: &str) {
        if self.columns.iter().any(|c| c.field == field) {
            return;
        }
        self.columns.push(Column::new(field, title, 150));
    }

    pub fn remove(&mut self, field: &str) {
        self.columns.retain(|c| c.field != field);
        self.hidden.remove(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout_has_required_part_columns() {
        let layout = ColumnLayout::standard();
        let required: Vec<&str> = layout
            .all()
            .iter()
            .filter(|c| c.required)
            .map(|c| c.field.as_str())
            .collect();

        assert_eq!(required, vec!["partNumber", "partName", "quantity"]);
    }

    #[test]
    fn test_hide_and_show() {
        let mut layout = ColumnLayout::standard();
        let total = layout.visible().count();

        layout.hide("remarks");
        assert_eq!(layout.visible().count(), total - 1);
        assert!(layout.is_hidden("remarks"));

        layout.show("remarks");
        assert_eq!(layout.visible().count(), total);
    }

    #[test]
    fn test_reorder_moves_column() {
        let mut layout = ColumnLayout::standard();
        layout.reorder("partName", 0);
        assert_eq!(layout.all()[0].field, "partName");
    }

    #[test]
    fn test_custom_columns_are_editable_and_deduplicated() {
        let mut layout = ColumnLayout::standard();
        let before = layout.all().len();

        layout.add_custom("workcenter", "Workcenter");
        layout.add_custom("workcenter", "Workcenter again");

        assert_eq!(layout.all().len(), before + 1);
        let added = layout.all().last().unwrap();
        assert!(added.editable);
        assert_eq!(added.title, "Workcenter");

        layout.remove("workcenter");
        assert_eq!(layout.all().len(), before);
    }
}
