//! Shared state of all simulated nodes.
//!
//! The bus is a cheap handle around shared state. The library, every node
//! it opens and any test holding a clone see the same nodes, call logs and
//! injected failures.

use super::calls::{Operation, VendorCall};
use epos_common::hal::types::{OperationMode, SerialNumber, VendorError, VendorResult};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Error code for motion commands sent to a disabled node.
pub const ERROR_NODE_DISABLED: u32 = 0x3400_0001;
/// Error code for calls on a closed handle.
pub const ERROR_NODE_CLOSED: u32 = 0x1000_000C;
/// Error code for a fault index out of range.
pub const ERROR_BAD_FAULT_INDEX: u32 = 0x0604_0043;

/// Calls kept per node; older entries are dropped first.
pub const CALL_LOG_CAPACITY: usize = 1024;

/// State of one simulated node.
#[derive(Debug, Default)]
pub(super) struct NodeState {
    pub(super) calls: VecDeque<VendorCall>,
    pub(super) faults: Vec<u32>,
    pub(super) open: bool,
    pub(super) enabled: bool,
    pub(super) operation_mode: Option<OperationMode>,
    pub(super) position: i32,
    pub(super) velocity: i32,
    pub(super) current: i16,
}

impl NodeState {
    /// Fail unless the power stage is enabled.
    pub(super) fn require_enabled(&self) -> VendorResult<()> {
        if self.enabled {
            Ok(())
        } else {
            Err(VendorError::new(ERROR_NODE_DISABLED))
        }
    }

    /// One integration step: position advances by the actual velocity.
    pub(super) fn step(&mut self) {
        if self.enabled {
            self.position = self.position.wrapping_add(self.velocity);
        }
    }
}

#[derive(Debug)]
struct BusState {
    nodes: HashMap<SerialNumber, NodeState>,
    missing: HashSet<SerialNumber>,
    failures: HashMap<(SerialNumber, Operation), u32>,
    recording: bool,
}

impl Default for BusState {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            missing: HashSet::new(),
            failures: HashMap::new(),
            recording: true,
        }
    }
}

/// Observable state of one simulated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSnapshot {
    /// Handle open.
    pub open: bool,
    /// Power stage enabled.
    pub enabled: bool,
    /// Selected operation mode.
    pub operation_mode: Option<OperationMode>,
    /// Actual position.
    pub position: i32,
    /// Actual velocity.
    pub velocity: i32,
    /// Actual current.
    pub current: i16,
    /// Number of pending faults.
    pub pending_faults: usize,
}

/// Handle to the simulated bus.
#[derive(Debug, Clone, Default)]
pub struct SimulationBus {
    state: Arc<Mutex<BusState>>,
}

impl SimulationBus {
    /// Create an empty bus. Every serial number answers until marked missing.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enable or disable the call log. Enabled by default.
    pub fn set_recording(&self, recording: bool) {
        self.lock().recording = recording;
    }

    /// Make `serial` absent from the bus.
    pub fn set_missing(&self, serial: SerialNumber) {
        self.lock().missing.insert(serial);
    }

    /// Make every call of kind `operation` on `serial` fail with `code`.
    pub fn fail_on(&self, serial: SerialNumber, operation: Operation, code: u32) {
        self.lock().failures.insert((serial, operation), code);
    }

    /// Remove an injected failure.
    pub fn clear_failure(&self, serial: SerialNumber, operation: Operation) {
        self.lock().failures.remove(&(serial, operation));
    }

    /// Queue a pending device fault on `serial`.
    pub fn push_fault(&self, serial: SerialNumber, code: u32) {
        self.lock()
            .nodes
            .entry(serial)
            .or_default()
            .faults
            .push(code);
    }

    /// Calls issued to `serial`, in order, including failed ones.
    ///
    /// Only the last [`CALL_LOG_CAPACITY`] calls are kept.
    pub fn calls(&self, serial: SerialNumber) -> Vec<VendorCall> {
        self.lock()
            .nodes
            .get(&serial)
            .map(|n| n.calls.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Kinds of every call issued to `serial`, in order.
    pub fn operations(&self, serial: SerialNumber) -> Vec<Operation> {
        self.calls(serial).iter().map(VendorCall::operation).collect()
    }

    /// Forget the call log of `serial`.
    pub fn clear_calls(&self, serial: SerialNumber) {
        if let Some(node) = self.lock().nodes.get_mut(&serial) {
            node.calls.clear();
        }
    }

    /// Observable state of `serial`, if the node was ever touched.
    pub fn node_snapshot(&self, serial: SerialNumber) -> Option<NodeSnapshot> {
        self.lock().nodes.get(&serial).map(|n| NodeSnapshot {
            open: n.open,
            enabled: n.enabled,
            operation_mode: n.operation_mode,
            position: n.position,
            velocity: n.velocity,
            current: n.current,
            pending_faults: n.faults.len(),
        })
    }

    /// Whether `serial` answers discovery.
    pub(super) fn is_present(&self, serial: SerialNumber) -> bool {
        !self.lock().missing.contains(&serial)
    }

    /// Record `call` on `serial` and run `apply` unless a failure is
    /// injected or the handle is closed.
    ///
    /// `OpenNode` is accepted on a closed handle and reopens it.
    pub(super) fn call<T>(
        &self,
        serial: SerialNumber,
        call: VendorCall,
        apply: impl FnOnce(&mut NodeState) -> VendorResult<T>,
    ) -> VendorResult<T> {
        let mut bus = self.lock();
        let operation = call.operation();
        let injected = bus.failures.get(&(serial, operation)).copied();
        let recording = bus.recording;
        let node = bus.nodes.entry(serial).or_default();
        if recording {
            if node.calls.len() == CALL_LOG_CAPACITY {
                node.calls.pop_front();
            }
            node.calls.push_back(call);
        }

        if let Some(code) = injected {
            return Err(VendorError::new(code));
        }
        match operation {
            Operation::OpenNode => node.open = true,
            Operation::CloseNode if !node.open => return apply(node),
            _ if !node.open => return Err(VendorError::new(ERROR_NODE_CLOSED)),
            _ => {}
        }
        apply(node)
    }
}
