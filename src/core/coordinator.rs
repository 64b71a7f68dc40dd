use crate::domain::model::OptionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Mounting,
    Live,
}

/// Single authority over which exclusive option is active.
///
/// Lives for one checkout request. While components mount, competing
/// requests are resolved by priority and no broadcast goes out; `settle`
/// emits the one initial announcement. Afterwards the latest request wins.
#[derive(Debug, Clone)]
pub struct Coordinator {
    active: Option<OptionKind>,
    phase: Phase,
}

/// Winner to announce as `ActiveServiceChanged`.
pub type Broadcast = Option<OptionKind>;

impl Coordinator {
    /// Starts the mount phase with the detector's result.
    pub fn mounting(detected: Option<OptionKind>) -> Self {
        tracing::debug!("Coordinator mounting with initial service {:?}", detected);
        Self {
            active: detected,
            phase: Phase::Mounting,
        }
    }

    pub fn active_service(&self) -> Option<OptionKind> {
        self.active
    }

    pub fn is_settled(&self) -> bool {
        self.phase == Phase::Live
    }

    /// Ends the mount phase. Always yields the initial broadcast, exactly once.
    pub fn settle(&mut self) -> Option<Broadcast> {
        if self.phase == Phase::Live {
            return None;
        }
        self.phase = Phase::Live;
        tracing::info!("Active delivery service on load: {:?}", self.active);
        Some(self.active)
    }

    pub fn request(&mut self, kind: OptionKind) -> Option<Broadcast> {
        if self.active == Some(kind) {
            return None;
        }

        if self.phase == Phase::Mounting {
            match self.active {
                Some(holder) if holder.outranks(kind) => {
                    tracing::warn!(
                        "Persisted selections for {} and {} conflict, keeping {}",
                        holder,
                        kind,
                        holder
                    );
                }
                _ => self.active = Some(kind),
            }
            return None;
        }

        tracing::debug!("Granting exclusive access to {} (was {:?})", kind, self.active);
        self.active = Some(kind);
        Some(self.active)
    }

    /// Only the current holder can release.
    pub fn release(&mut self, kind: OptionKind) -> Option<Broadcast> {
        if self.active != Some(kind) {
            return None;
        }

        self.active = None;
        match self.phase {
            Phase::Mounting => None,
            Phase::Live => {
                tracing::debug!("{} released exclusive access", kind);
                Some(None)
            }
        }
    }
}
