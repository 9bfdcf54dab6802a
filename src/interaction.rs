//! Interaction hosting: the enum-dispatched interaction kinds a robot carries, and the
//! sorted-range early-out scan loop of §4.5.
//!
//! Grounded on the reference simulator's `Robot::doLocalInteractions`/`sortLocalInteractions`
//! (the early-out scan over a range-sorted list) and generalized per §9's "tagged variant"
//! design note: `LocalInteraction`'s virtual hierarchy becomes a closed enum matched in
//! `objectStep`/`wallsStep`/`finalize` rather than dynamic dispatch, the same reasoning this
//! codebase applies to its own closed shape-kind enum.

use crate::body::Body;
use crate::camera::{Camera, OmniCamera};
use crate::math::Pose;
use crate::random::Rng;
use crate::sensor::ProximitySensor;
use crate::world::Walls;

/// A robot's range-limited interaction kinds. New kinds extend this enum (§9).
pub enum LocalInteractionKind {
    ProximitySensor(ProximitySensor),
    Camera(Camera),
    OmniCamera(OmniCamera),
}

impl LocalInteractionKind {
    /// Range used for the descending-range sort that drives the early-out scan; cameras report
    /// `f64::MAX`, matching the reference's `CircularCam`/`OmniCam` constructors which set `r` to
    /// the largest representable double (no range limit — a camera always renders).
    pub fn range(&self) -> f64 {
        match self {
            LocalInteractionKind::ProximitySensor(s) => s.range(),
            LocalInteractionKind::Camera(c) => c.range(),
            LocalInteractionKind::OmniCamera(c) => c.range(),
        }
    }

    fn init(&mut self, owner_pose: Pose) {
        match self {
            LocalInteractionKind::ProximitySensor(s) => s.init(owner_pose),
            LocalInteractionKind::Camera(c) => c.init(owner_pose),
            LocalInteractionKind::OmniCamera(c) => c.init(owner_pose),
        }
    }

    fn object_step(&mut self, other: &Body) {
        match self {
            LocalInteractionKind::ProximitySensor(s) => s.object_step(other),
            LocalInteractionKind::Camera(c) => c.object_step(other),
            LocalInteractionKind::OmniCamera(c) => c.object_step(other),
        }
    }

    fn walls_step(&mut self, walls: &Walls) {
        match self {
            LocalInteractionKind::ProximitySensor(s) => s.walls_step(walls),
            LocalInteractionKind::Camera(c) => c.walls_step(walls),
            LocalInteractionKind::OmniCamera(c) => c.walls_step(walls),
        }
    }

    fn finalize(&mut self, rng: &mut Rng) {
        match self {
            LocalInteractionKind::ProximitySensor(s) => s.finalize(rng),
            LocalInteractionKind::Camera(c) => c.finalize(),
            LocalInteractionKind::OmniCamera(c) => c.finalize(),
        }
    }
}

/// A robot's range-less interaction kinds. The one concrete kind, `Radio`, is a passive
/// tx/rx buffer: per §1/§9, the coordinator that actually routes messages between radios is an
/// external collaborator out of this crate's scope, so the interaction itself owns no delivery
/// logic, only the data the (unimplemented) coordinator would consume and supply.
pub enum GlobalInteractionKind {
    Radio(RadioLink),
}

impl GlobalInteractionKind {
    fn init(&mut self) {
        match self {
            GlobalInteractionKind::Radio(r) => r.init(),
        }
    }

    fn step(&mut self) {
        match self {
            GlobalInteractionKind::Radio(r) => r.step(),
        }
    }

    fn finalize(&mut self) {
        match self {
            GlobalInteractionKind::Radio(r) => r.finalize(),
        }
    }
}

/// Passive radio module state: an address, a range used by the external coordinator to decide
/// reachability, and a transmit/receive byte buffer pair. Grounded on the reference simulator's
/// `Bluetooth` module fields (`address`, `range`, `rxBuffer`/`txBuffer`), stripped of the
/// connection-management and message-framing logic that lives in the out-of-scope coordinator.
pub struct RadioLink {
    pub address: u32,
    pub range: f64,
    pub tx_buffer: Vec<u8>,
    pub rx_buffer: Vec<u8>,
}

impl RadioLink {
    pub fn new(address: u32, range: f64) -> Self {
        RadioLink {
            address,
            range,
            tx_buffer: Vec::new(),
            rx_buffer: Vec::new(),
        }
    }

    fn init(&mut self) {}
    fn step(&mut self) {}
    fn finalize(&mut self) {}
}

pub struct LocalInteractionSlot {
    pub kind: LocalInteractionKind,
}

impl LocalInteractionSlot {
    pub fn new(kind: LocalInteractionKind) -> Self {
        LocalInteractionSlot { kind }
    }

    pub fn range(&self) -> f64 {
        self.kind.range()
    }
}

pub struct GlobalInteractionSlot {
    pub kind: GlobalInteractionKind,
}

impl GlobalInteractionSlot {
    pub fn new(kind: GlobalInteractionKind) -> Self {
        GlobalInteractionSlot { kind }
    }
}

/// Runs the full local+global interaction cycle for one robot body against every other body in
/// `bodies`, per §4.4 steps 4-6 and §4.5's sorted-range early-out scan.
///
/// The robot's `RobotState` is temporarily taken out of `bodies[robot_idx]` so that the scan can
/// hold an immutable borrow of `bodies` to read other bodies' poses/shapes while mutating the
/// robot's own interactions — the same take-then-replace pattern used for the differential-drive
/// step in `world.rs`.
///
/// §4.4 describes this as three separate global passes (init-all, then pair-all, then
/// finalize-all) rather than one pass per robot; the two are observably equivalent here because
/// no interaction in this crate mutates any body other than its own host, so processing one
/// robot's whole init→pairs→finalize sequence before moving to the next cannot change what any
/// other robot observes.
pub fn run_robot_interactions(bodies: &mut [Body], walls: &Walls, robot_idx: usize, dt: f64, rng: &mut Rng) {
    let Some(mut state) = bodies[robot_idx].robot.take() else {
        return;
    };

    let owner_pose = Pose::new(bodies[robot_idx].pos, bodies[robot_idx].angle);
    for slot in &mut state.local_interactions {
        slot.kind.init(owner_pose);
    }
    for slot in &mut state.global_interactions {
        slot.kind.init();
    }

    for other_idx in 0..bodies.len() {
        if other_idx == robot_idx {
            continue;
        }
        let robot_pos = bodies[robot_idx].pos;
        let other = &bodies[other_idx];
        let dist_sq = (robot_pos - other.pos).mag_sq();
        for slot in &mut state.local_interactions {
            let reach = slot.range() + other.radius();
            if dist_sq <= reach * reach {
                slot.kind.object_step(other);
            } else {
                // sorted by descending range: no later interaction can reach either.
                break;
            }
        }
    }

    if !matches!(walls, Walls::None) {
        let pos = bodies[robot_idx].pos;
        for slot in &mut state.local_interactions {
            if walls.reaches_from(pos, slot.range()) {
                slot.kind.walls_step(walls);
            } else {
                break;
            }
        }
    }

    for slot in &mut state.global_interactions {
        slot.kind.step();
    }
    for slot in &mut state.local_interactions {
        slot.kind.finalize(rng);
    }
    for slot in &mut state.global_interactions {
        slot.kind.finalize();
    }

    if let Some(mut controller) = state.controller.take() {
        controller.control_step(dt, &mut bodies[robot_idx]);
        state.controller = Some(controller);
    }

    bodies[robot_idx].robot = Some(state);
}
