use snpproto::MacAddress;

/// Tracks whether the emulated address has been handed to an interface and,
/// once it has, which physical device received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentContext {
    assigned: bool,
    emulation_address: MacAddress,
    permanent_address: MacAddress,
}

impl AssignmentContext {
    pub const fn new(emulation_address: MacAddress) -> Self {
        Self {
            assigned: false,
            emulation_address,
            permanent_address: MacAddress([0; 6]),
        }
    }

    pub const fn is_assigned(&self) -> bool {
        self.assigned
    }

    pub const fn emulation_address(&self) -> &MacAddress {
        &self.emulation_address
    }

    /// Factory address of the interface holding the emulation, if any.
    pub fn permanent_address(&self) -> Option<&MacAddress> {
        self.assigned.then_some(&self.permanent_address)
    }

    /// Records the device that now carries the emulated address. Once set the
    /// owner never changes.
    pub(crate) fn record_assignment(&mut self, permanent_address: MacAddress) {
        if self.assigned {
            return;
        }
        self.permanent_address = permanent_address;
        self.assigned = true;
    }
}
