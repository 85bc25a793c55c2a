//! Checks that an external mail-to-board sync did its job.
//!
//! Messages are pulled from the mailbox, their bodies decoded and subjects
//! normalized, then compared against cards read from the board API or the
//! board UI.

pub mod config;
pub mod correlator;
pub mod error;
pub mod extract;
pub mod keywords;
pub mod normalize;
pub mod reconcile;
pub mod sources;

pub use correlator::{check_expected_card, CardExpectation, Correlator, SubjectGroup};
pub use error::{CheckError, Result};
pub use extract::{extract_body, extract_message, extract_subject};
pub use keywords::SystemKeywords;
pub use normalize::normalize_title;
pub use reconcile::{collect_messages, overall_verdict, Reconciler};
