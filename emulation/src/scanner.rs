use log::{error, trace};
use snpproto::FirmwareStatus;

use crate::context::AssignmentContext;
use crate::eligibility::{Candidate, Eligibility};
use crate::services::DeviceRegistry;

/// Walks every registered interface in registry order and returns the first
/// one `eligibility` accepts.
///
/// Enumeration errors never propagate: the caller simply takes no action for
/// this event and waits for the next one.
pub fn find_first<R, E>(
    registry: &R,
    eligibility: &E,
    context: Option<&AssignmentContext>,
) -> Option<Candidate<R::Handle>>
where
    R: DeviceRegistry,
    E: Eligibility<R::Handle> + ?Sized,
{
    let handles = match registry.interfaces() {
        Ok(handles) => handles,
        Err(FirmwareStatus::NOT_FOUND) => return None,
        Err(status) => {
            error!("unexpected error enumerating SNP handles: {status}");
            return None;
        }
    };

    for handle in handles {
        let mode = match registry.describe(handle) {
            Ok(mode) => mode,
            Err(status) => {
                trace!("skipping SNP {handle:?}: {status}");
                continue;
            }
        };
        let candidate = Candidate { handle, mode };
        if eligibility.evaluate(&candidate, context) {
            return Some(candidate);
        }
    }
    None
}
