//! In-memory sink for tests and embedding.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use vehicle_domain::{ObserverError, VehicleObserver, VehicleSnapshot};

/// Shared view of the snapshots recorded by a [`MemorySink`].
#[derive(Debug, Clone, Default)]
pub struct MemoryHandle(Arc<Mutex<Vec<VehicleSnapshot>>>);

impl MemoryHandle {
    /// Copy of everything recorded, in notification order.
    pub fn snapshots(&self) -> Vec<VehicleSnapshot> {
        self.lock().clone()
    }

    /// Snapshots of one vehicle, in notification order.
    pub fn for_vehicle(&self, id: &str) -> Vec<VehicleSnapshot> {
        self.lock().iter().filter(|s| s.id == id).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<VehicleSnapshot>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Records every snapshot it is notified with.
#[derive(Debug, Default)]
pub struct MemorySink {
    handle: MemoryHandle,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that stays readable after the sink moves into a simulation.
    pub fn handle(&self) -> MemoryHandle {
        self.handle.clone()
    }
}

impl VehicleObserver for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn notify(&mut self, snapshot: &VehicleSnapshot) -> vehicle_domain::Result<()> {
        self.handle
            .0
            .lock()
            .map_err(|_| ObserverError::Closed("memory sink poisoned".into()))?
            .push(snapshot.clone());
        Ok(())
    }
}
