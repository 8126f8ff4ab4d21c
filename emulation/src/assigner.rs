use log::{error, info};
use snpproto::{FirmwareStatus, TaskPriorityLevel};

use crate::context::AssignmentContext;
use crate::eligibility::Candidate;
use crate::services::{DeviceRegistry, Station, TaskPriority};

/// Programs the candidate's station address with the emulated address and
/// records the device in `context` on success.
///
/// The interface is opened at the caller's priority. Only the write itself
/// runs at `CALLBACK`, the highest level network drivers accept, entered and
/// left through `HIGH_LEVEL`. The interface is closed after the previous
/// priority is back. On failure `context` is left untouched.
pub fn assign<R, T>(
    registry: &R,
    priority: &T,
    candidate: &Candidate<R::Handle>,
    context: &mut AssignmentContext,
) -> Result<(), FirmwareStatus>
where
    R: DeviceRegistry,
    T: TaskPriority,
{
    let address = *context.emulation_address();
    let result = registry.open(candidate.handle).and_then(|station| {
        let window = priority.switch_to(TaskPriorityLevel::CALLBACK);
        let written = station.set_station_address(&address);
        drop(window);
        written
    });

    if let Err(status) = result {
        error!(
            "failed to set MAC address on SNP {:?}: {status}",
            candidate.handle
        );
        return Err(status);
    }

    context.record_assignment(candidate.mode.permanent_address);
    info!(
        "emulated MAC {address} assigned to SNP {:?} (permanent {})",
        candidate.handle, candidate.mode.permanent_address
    );
    Ok(())
}
