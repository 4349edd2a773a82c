use serde::{Deserialize, Serialize};

pub const OPERATION_COLUMN: &str = "Operation";

/// Groups cases by operating regime from a marker in the case label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeRule {
    pub marker: String,
    pub matched: String,
    pub otherwise: String,
}

impl Default for RegimeRule {
    fn default() -> Self {
        Self {
            marker: "-EO".to_string(),
            matched: "Early Operation".to_string(),
            otherwise: "Late Operation".to_string(),
        }
    }
}

impl RegimeRule {
    pub fn label(&self, case: &str) -> &str {
        if case.contains(&self.marker) {
            &self.matched
        } else {
            &self.otherwise
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_selects_the_regime() {
        let rule = RegimeRule::default();
        assert_eq!(rule.label("2030-EO_Summer"), "Early Operation");
        assert_eq!(rule.label("2040-LO_Summer"), "Late Operation");
    }
}
