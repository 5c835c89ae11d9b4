use serde::Deserialize;

pub const DEFAULT_UNIT_OF_ISSUE: &str = "EA";

/// One row of the packing list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LineItem {
    pub line_no: u32,
    pub description: String,
    #[serde(default)]
    pub nsn: Option<String>,
    #[serde(default = "default_unit_of_issue")]
    pub unit_of_issue: String,
    pub initial_qty: u32,
    #[serde(default)]
    pub spares_qty: u32,
    pub total_qty: u32,
}

fn default_unit_of_issue() -> String {
    DEFAULT_UNIT_OF_ISSUE.to_string()
}

impl LineItem {
    /// Item with a quantity of one, no spares and no NSN.
    pub fn new(line_no: u32, description: impl Into<String>) -> Self {
        LineItem {
            line_no,
            description: description.into(),
            nsn: None,
            unit_of_issue: default_unit_of_issue(),
            initial_qty: 1,
            spares_qty: 0,
            total_qty: 1,
        }
    }

    pub fn with_nsn(mut self, nsn: impl Into<String>) -> Self {
        self.nsn = Some(nsn.into());
        self
    }

    pub fn with_unit_of_issue(mut self, unit: impl Into<String>) -> Self {
        self.unit_of_issue = unit.into();
        self
    }

    /// Sets initial and spares quantities; total becomes their sum.
    pub fn with_quantities(mut self, initial: u32, spares: u32) -> Self {
        self.initial_qty = initial;
        self.spares_qty = spares;
        self.total_qty = initial.saturating_add(spares);
        self
    }

    /// NSN to draw, as given. Blank strings count as absent.
    pub fn nsn(&self) -> Option<&str> {
        self.nsn.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Free-text header block of the form. Absent or empty fields are not drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FormHeader {
    #[serde(default)]
    pub packed_by: Option<String>,
    #[serde(default)]
    pub no_boxes: Option<String>,
    #[serde(default)]
    pub requisition_no: Option<String>,
    #[serde(default)]
    pub order_no: Option<String>,
    #[serde(default)]
    pub end_item: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub certifier_name: Option<String>,
    #[serde(default)]
    pub certifier_title: Option<String>,
}

/// Returns the field text when it is present and non-empty.
pub(crate) fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Output of a render.
#[derive(Debug, Clone)]
pub struct RenderedForm {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub item_count: usize,
}
