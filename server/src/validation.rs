// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Declarative validation of incoming requests.

use std::fmt;

/// A single validation failure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldError {
    /// Path to the offending field, as seen by the caller.
    pub field: &'static str,

    /// Description of the failed rule.
    pub message: &'static str,
}

/// Collection of all the validation failures found in a request.
#[derive(Clone, Debug, Default, Eq, PartialEq, thiserror::Error)]
pub struct ValidationErrors(Vec<FieldError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl ValidationErrors {
    /// Records a failure if `value` is empty once trimmed.
    pub fn require(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.0.push(FieldError { field, message: "is required" });
        }
    }

    /// Returns the recorded failures.
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Consumes the collection and turns it into an error if any failure was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Capability of a request to check its own well-formedness.
pub trait Validate {
    /// Checks all the rules that apply to this request and reports every failure at once.
    fn validate(&self) -> Result<(), ValidationErrors>;
}
