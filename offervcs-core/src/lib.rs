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

//! Offervcs Core
//!
//! Shared types for the offer version control engine:
//! - **Records**: the opaque offer payload that gets versioned
//! - **Validation**: structural checks applied at commit time
//! - **Configuration**: branch naming, persistence keys, impact thresholds
//! - **Errors**: one error enum with a coarse kind for calling layers
//! - **Audit/Events**: collaborator traits for audit trails and notifications

pub mod audit;
pub mod config;
pub mod error;
pub mod record;
pub mod validation;

pub use audit::{
    AuditEntry, AuditError, AuditLogger, EventError, EventSink, MemoryAuditLog, MemoryEventSink,
    RepositoryEvent, TracingAuditLogger,
};
pub use config::{ImpactConfig, ImpactLevel, ValidationConfig, VcsConfig};
pub use error::{ErrorKind, VcsError, VcsResult};
pub use record::{OfferRecord, ID_FIELD};
pub use validation::{validate_record, ValidationError, ValidationResult};
