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

//! Errors of the domain layer.

use crate::db::StorageError;
use crate::model::TenantId;
use crate::validation::ValidationErrors;
use tenancy_core::endpoint::BoxError;

/// Domain errors.  These are the errors that are visible to the callers of the service.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// A mandatory argument was not provided.
    #[error("Argument '{name}' cannot be nil")]
    ArgumentNil {
        /// Name of the missing argument.
        name: &'static str,
    },

    /// An argument was provided but is not valid.
    #[error("Invalid argument '{name}': {message}")]
    Argument {
        /// Name of the invalid argument.
        name: &'static str,

        /// Explanation of what is wrong with the argument.
        message: String,

        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
    },

    /// Catch-all for unexpected failures.
    #[error("Unknown error: {message}")]
    Unknown {
        /// Description of the failure.
        message: String,

        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
    },

    /// The tenant to create conflicts with an existing one.
    #[error("Tenant already exists")]
    EntityAlreadyExists {
        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
    },

    /// The requested tenant does not exist.
    #[error("Tenant not found: {id}")]
    EntityNotFound {
        /// Identifier of the tenant that was looked for.
        id: TenantId,

        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
    },
}

impl DomainError {
    /// Creates an error for an argument that failed validation.
    pub fn argument(name: &'static str, errors: ValidationErrors) -> Self {
        DomainError::Argument { name, message: errors.to_string(), source: Some(Box::from(errors)) }
    }

    /// Returns true if this is an `ArgumentNil` error.
    pub fn is_argument_nil(&self) -> bool {
        matches!(self, DomainError::ArgumentNil { .. })
    }

    /// Returns true if this is an `Argument` error.
    pub fn is_argument(&self) -> bool {
        matches!(self, DomainError::Argument { .. })
    }

    /// Returns true if this is an `Unknown` error.
    pub fn is_unknown(&self) -> bool {
        matches!(self, DomainError::Unknown { .. })
    }

    /// Returns true if this is an `EntityAlreadyExists` error.
    pub fn is_entity_already_exists(&self) -> bool {
        matches!(self, DomainError::EntityAlreadyExists { .. })
    }

    /// Returns true if this is an `EntityNotFound` error.
    pub fn is_entity_not_found(&self) -> bool {
        matches!(self, DomainError::EntityNotFound { .. })
    }
}

impl From<StorageError> for DomainError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::AlreadyExists { .. } => {
                DomainError::EntityAlreadyExists { source: Some(Box::from(e)) }
            }
            StorageError::NotFound { ref id, .. } => {
                DomainError::EntityNotFound { id: id.clone(), source: Some(Box::from(e)) }
            }
            StorageError::Unknown { ref message, .. } => {
                DomainError::Unknown { message: message.clone(), source: Some(Box::from(e)) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_from_storage_already_exists() {
        let err = DomainError::from(StorageError::AlreadyExists { source: None });
        assert!(err.is_entity_already_exists());
        assert_eq!("Tenant already exists", err.to_string());
        let source = err.source().unwrap().downcast_ref::<StorageError>().unwrap();
        assert!(matches!(source, StorageError::AlreadyExists { .. }));
    }

    #[test]
    fn test_from_storage_not_found() {
        let err = DomainError::from(StorageError::not_found(TenantId::from("abc")));
        assert!(err.is_entity_not_found());
        match &err {
            DomainError::EntityNotFound { id, .. } => assert_eq!(&TenantId::from("abc"), id),
            e => panic!("{:?}", e),
        }
        assert!(err.to_string().contains("abc"));
        assert!(err.source().unwrap().downcast_ref::<StorageError>().is_some());
    }

    #[test]
    fn test_from_storage_unknown_keeps_chain() {
        let cause = std::io::Error::other("disk on fire");
        let err = DomainError::from(StorageError::unknown("Write failed", cause));
        assert!(err.is_unknown());
        assert_eq!("Unknown error: Write failed", err.to_string());

        let storage = err.source().unwrap();
        assert!(storage.downcast_ref::<StorageError>().is_some());
        assert_eq!("disk on fire", storage.source().unwrap().to_string());
    }

    #[test]
    fn test_argument_wraps_validation_errors() {
        let mut errors = ValidationErrors::default();
        errors.require("tenant.name", "");
        let err = DomainError::argument("request", errors.clone());
        assert!(err.is_argument());
        assert_eq!("Invalid argument 'request': tenant.name: is required", err.to_string());
        assert_eq!(
            Some(&errors),
            err.source().and_then(|e| e.downcast_ref::<ValidationErrors>())
        );
    }

    #[test]
    fn test_predicates_are_exclusive() {
        let err = DomainError::ArgumentNil { name: "ctx" };
        assert!(err.is_argument_nil());
        assert!(!err.is_argument());
        assert!(!err.is_unknown());
        assert!(!err.is_entity_already_exists());
        assert!(!err.is_entity_not_found());
        assert_eq!("Argument 'ctx' cannot be nil", err.to_string());
    }
}
