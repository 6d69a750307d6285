//! Holiday plan domain: validation rules and the transactional service.

pub mod rules;
pub mod service;

use vplan_db::models::Participant;

/// Map client-submitted participant names into the stored object shape.
///
/// The wire format accepts bare name strings; rows store `{name}` objects.
/// Both create and update go through this single transform.
pub fn participants_to_stored(names: &[String]) -> Vec<Participant> {
    names.iter().cloned().map(Participant::new).collect()
}
