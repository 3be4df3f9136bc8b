use crate::model::date_key::{AssembleCount, DateKey};
use serde::Serialize;

/// Two-column persisted record: date key, assembly count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRow {
    pub date_key: DateKey,
    pub count: AssembleCount,
}

impl SheetRow {
    pub fn new(date_key: DateKey, count: AssembleCount) -> Self {
        SheetRow { date_key, count }
    }

    pub fn cells(&self) -> Vec<String> {
        vec![self.date_key.to_string(), self.count.to_string()]
    }
}
