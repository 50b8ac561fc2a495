use serde::Serialize;
use serde_json::Value;

/// Outcome of a single session step, serialized as one NDJSON line.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Record {
    pub step: usize,
    pub op: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Record {
    pub fn new<O: Into<String>>(step: usize, op: O) -> Self {
        Self {
            step,
            op: op.into(),
            label: None,
            values: Vec::new(),
            note: None,
        }
    }

    pub fn with_label<L: Into<String>>(mut self, label: L) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_values(mut self, values: Vec<Value>) -> Self {
        self.values = values;
        self
    }

    pub fn with_note<N: Into<String>>(mut self, note: N) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn to_ndjson(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string(self)?;
        json.push('\n');
        Ok(json)
    }
}
