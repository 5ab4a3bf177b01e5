use super::{Decimal, IndicatorId};
use serde::{Deserialize, Serialize};

/// A named financial indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    pub id: IndicatorId,
    pub name: String,
    pub value: Decimal,
    pub unit: String,
}

impl Indicator {
    pub fn new(id: IndicatorId, name: &str, value: Decimal, unit: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            value,
            unit: unit.to_string(),
        }
    }
}
