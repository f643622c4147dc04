// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Structural record validation
//!
//! Applied at commit time. Every violated rule produces one entry; callers
//! get the full list instead of the first failure.

use crate::config::ValidationConfig;
use crate::record::{OfferRecord, ID_FIELD};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CODE_MISSING_ID: &str = "MISSING_ID";
pub const CODE_INVALID_PRICE: &str = "INVALID_PRICE";

/// One violated rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub code: String,
}

impl ValidationError {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.into(),
        }
    }
}

/// Outcome of validating a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// A passing result with no errors
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    /// Record a violation (marks the result invalid)
    pub fn push(&mut self, error: ValidationError) {
        self.is_valid = false;
        self.errors.push(error);
    }

    /// Codes of all violations, in rule order
    pub fn codes(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.code.as_str()).collect()
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "valid");
        }
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{} ({}): {}", e.field, e.code, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Validate a record against the structural rules
pub fn validate_record(record: &OfferRecord, config: &ValidationConfig) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if record.id().map_or(true, str::is_empty) {
        result.push(ValidationError::new(
            ID_FIELD,
            "Offer ID is required",
            CODE_MISSING_ID,
        ));
    }

    for field in &config.price_fields {
        let Some(value) = record.get(field) else {
            continue;
        };
        // Non-numeric price-like values are as invalid as non-positive ones
        let positive = value.as_f64().map_or(false, |v| v > 0.0);
        if !positive {
            result.push(ValidationError::new(
                field.as_str(),
                format!("Offer {} must be positive", field),
                CODE_INVALID_PRICE,
            ));
        }
    }

    result
}
