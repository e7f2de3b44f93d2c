use std::{
    collections::{BTreeMap, HashSet},
    time::{Duration, Instant},
};

use glam::Vec2;

use crate::{
    collision::{
        broadphase::AabbTree,
        contact::{
            pair_key, CollisionInfo, CollisionPair, CollisionStage, ContactInfo, PairKey,
        },
        gjk::GjkSolver,
        queries::RaycastHit,
    },
    config::{WorldConfig, DEFAULT_POINT_CAST_RADIUS},
    core::{
        aabb::Aabb,
        rigidbody::RigidBody,
        shape::Shape,
        types::{CollisionFilter, LayerMask, Ray2D},
    },
    dynamics::{integrator::Integrator, solver::ContactSolver},
    error::{PhysicsError, Result},
    utils::{
        allocator::{Arena, BodyHandle},
        logging::ScopedTimer,
        profiling::StepProfile,
    },
};

pub mod shared;

pub use shared::SharedWorld;

/// Receives collision lifecycle events for bodies that carry an entity id.
///
/// `info.penetration` may be rewritten; the value left there is used when the
/// contact is resolved this update, so writing zero suppresses the push-out.
pub trait CollisionListener: Send + Sync {
    fn on_collision_enter(&mut self, _entity: u64, _info: &mut CollisionInfo) {}
    fn on_collision_stay(&mut self, _entity: u64, _info: &mut CollisionInfo) {}
    fn on_collision_exit(&mut self, _entity: u64, _info: &mut CollisionInfo) {}
}

/// Owns every registered body, the broad-phase tree and the contact pairs.
///
/// Bodies added or removed between updates are queued and take effect at the
/// start (or end) of the next [`PhysicsWorld::update`].
pub struct PhysicsWorld {
    config: WorldConfig,
    bodies: Arena<RigidBody>,
    active: Vec<BodyHandle>,
    pending_adds: Vec<BodyHandle>,
    pending_removes: Vec<BodyHandle>,
    tree: AabbTree<BodyHandle>,
    pairs: BTreeMap<PairKey, CollisionPair>,
    integrator: Integrator,
    solver: ContactSolver,
    gjk: GjkSolver,
    listener: Option<Box<dyn CollisionListener>>,
    id_counter: u32,
    update_index: u64,
    profile: StepProfile,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl PhysicsWorld {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            integrator: Integrator::from_config(&config),
            solver: ContactSolver::from_config(&config),
            gjk: GjkSolver::from_config(&config),
            tree: AabbTree::new(config.bounds_margin),
            config,
            bodies: Arena::new(),
            active: Vec::new(),
            pending_adds: Vec::new(),
            pending_removes: Vec::new(),
            pairs: BTreeMap::new(),
            listener: None,
            id_counter: 0,
            update_index: 0,
            profile: StepProfile::default(),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Changes are picked up by the next update.
    pub fn config_mut(&mut self) -> &mut WorldConfig {
        &mut self.config
    }

    pub fn set_listener<L>(&mut self, listener: L)
    where
        L: CollisionListener + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) -> Option<Box<dyn CollisionListener>> {
        self.listener.take()
    }

    /// Queues `body` for registration and returns its handle right away.
    pub fn add_rigidbody(&mut self, mut body: RigidBody) -> Result<BodyHandle> {
        if body.shape().is_none() {
            return Err(PhysicsError::MissingShape);
        }
        body.id = 0;
        body.active = false;
        body.idle_time = 0.0;

        let handle = self.bodies.insert(body);
        if let Some(shape) = self.bodies.get_mut(handle).and_then(RigidBody::shape_mut) {
            shape.set_body(Some(handle));
        }
        self.pending_adds.push(handle);
        Ok(handle)
    }

    /// Queues `handle` for removal. A body that was never flushed is dropped
    /// immediately.
    pub fn remove_rigidbody(&mut self, handle: BodyHandle) -> bool {
        if !self.bodies.contains(handle) {
            log::warn!("remove_rigidbody: unknown body {handle}");
            return false;
        }
        if let Some(index) = self.pending_adds.iter().position(|h| *h == handle) {
            self.pending_adds.swap_remove(index);
            self.bodies.remove(handle);
            return true;
        }
        if self.pending_removes.contains(&handle) {
            log::warn!("remove_rigidbody: body {handle} already queued for removal");
            return false;
        }
        self.pending_removes.push(handle);
        true
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    /// Direct access. Call [`PhysicsWorld::refresh_body`] after moving the body.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> + '_ {
        self.bodies.iter()
    }

    /// Registered plus pending bodies.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn active_body_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, handle: BodyHandle) -> bool {
        self.bodies.get(handle).is_some_and(RigidBody::is_active)
    }

    pub fn tree(&self) -> &AabbTree<BodyHandle> {
        &self.tree
    }

    pub fn collision_pairs(&self) -> impl Iterator<Item = &CollisionPair> + '_ {
        self.pairs.values()
    }

    /// Pair record for two bodies in either order.
    pub fn collision_pair(&self, a: BodyHandle, b: BodyHandle) -> Option<&CollisionPair> {
        let (id_a, id_b) = (self.body(a)?.id(), self.body(b)?.id());
        self.pairs.get(&pair_key(id_a, id_b))
    }

    pub fn last_profile(&self) -> &StepProfile {
        &self.profile
    }

    fn body_or_err(&mut self, handle: BodyHandle) -> Result<&mut RigidBody> {
        self.bodies
            .get_mut(handle)
            .ok_or(PhysicsError::UnknownBody(handle))
    }

    /// Recomputes the shape transform and broad-phase leaf after the body was
    /// moved from outside the update.
    pub fn refresh_body(&mut self, handle: BodyHandle) -> Result<()> {
        let body = self.body_or_err(handle)?;
        body.update_transform();
        let registered = body.id() != 0;
        let bounds = body.shape().map(Shape::bounds);
        if let (true, Some(bounds)) = (registered, bounds) {
            self.tree.update(handle, bounds);
        }
        Ok(())
    }

    pub fn set_position(&mut self, handle: BodyHandle, position: Vec2) -> Result<()> {
        self.body_or_err(handle)?.position = position;
        self.refresh_body(handle)?;
        self.wake_body(handle)
    }

    /// Rotation in degrees, counter-clockwise.
    pub fn set_rotation(&mut self, handle: BodyHandle, degrees: f32) -> Result<()> {
        self.body_or_err(handle)?.rotation = degrees;
        self.refresh_body(handle)?;
        self.wake_body(handle)
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) -> Result<()> {
        self.body_or_err(handle)?.velocity = velocity;
        self.wake_body(handle)
    }

    /// Degrees per second.
    pub fn set_angular_velocity(&mut self, handle: BodyHandle, velocity: f32) -> Result<()> {
        self.body_or_err(handle)?.angular_velocity = velocity;
        self.wake_body(handle)
    }

    /// Queues a one-shot impulse consumed by the next update.
    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2) -> Result<()> {
        self.body_or_err(handle)?.force_impulse += impulse;
        self.wake_body(handle)
    }

    /// `f32::INFINITY` turns the body static and takes it off the active list.
    pub fn set_mass(&mut self, handle: BodyHandle, mass: f32) -> Result<()> {
        self.body_or_err(handle)?.set_mass(mass)?;
        self.reconcile_activity(handle)
    }

    pub fn set_inertia(&mut self, handle: BodyHandle, inertia: f32) -> Result<()> {
        self.body_or_err(handle)?.set_inertia(inertia)
    }

    fn reconcile_activity(&mut self, handle: BodyHandle) -> Result<()> {
        if self.body_or_err(handle)?.is_static() {
            self.sleep_body(handle)
        } else {
            self.wake_body(handle)
        }
    }

    /// Puts a registered, non-static body back on the active list.
    pub fn wake_body(&mut self, handle: BodyHandle) -> Result<()> {
        let body = self.body_or_err(handle)?;
        if body.is_static() || body.is_active() || body.id() == 0 {
            return Ok(());
        }
        body.active = true;
        body.idle_time = 0.0;
        self.active.push(handle);
        Ok(())
    }

    pub fn sleep_body(&mut self, handle: BodyHandle) -> Result<()> {
        self.body_or_err(handle)?.sleep();
        self.active.retain(|h| *h != handle);
        Ok(())
    }

    /// Advances the simulation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let started = Instant::now();
        self.profile.reset();
        self.update_index += 1;
        self.apply_config();
        self.flush_pending();

        {
            let _timer =
                ScopedTimer::accumulate("integrate::velocity", &mut self.profile.integration_time);
            for &handle in &self.active {
                if let Some(body) = self.bodies.get_mut(handle) {
                    self.integrator.integrate_velocity(body, dt);
                }
            }
        }

        self.detect_collisions();

        let mut solver_time = Duration::ZERO;
        {
            let _timer = ScopedTimer::accumulate("solver", &mut solver_time);
            self.dispatch_lifecycle(dt);
            self.solver.solve(&mut self.bodies, &mut self.pairs);
        }
        self.profile.solver_time += solver_time;

        {
            let _timer =
                ScopedTimer::accumulate("integrate::position", &mut self.profile.integration_time);
            for &handle in &self.active {
                let Some(body) = self.bodies.get_mut(handle) else {
                    continue;
                };
                self.integrator.integrate_position(body, dt);
                if let Some(bounds) = body.shape().map(Shape::bounds) {
                    self.tree.update(handle, bounds);
                }
            }
            let bodies = &self.bodies;
            self.active
                .retain(|h| bodies.get(*h).is_some_and(RigidBody::is_active));
        }

        self.flush_pending();

        self.profile.body_count = self.bodies.len();
        self.profile.active_body_count = self.active.len();
        self.profile.collision_pairs = self.pairs.len();
        self.profile.total_time = started.elapsed();
        self.profile.report();
    }

    fn apply_config(&mut self) {
        self.integrator = Integrator::from_config(&self.config);
        self.solver = ContactSolver::from_config(&self.config);
        self.gjk = GjkSolver::from_config(&self.config);
        if self.tree.margin() != self.config.bounds_margin {
            self.tree.set_margin(self.config.bounds_margin);
        }
    }

    fn flush_pending(&mut self) {
        for handle in std::mem::take(&mut self.pending_adds) {
            let Some(body) = self.bodies.get_mut(handle) else {
                continue;
            };
            self.id_counter += 1;
            body.id = self.id_counter;
            body.update_transform();

            if let Some(bounds) = body.shape().map(Shape::bounds) {
                self.tree.insert(handle, bounds);
            }
            if !body.is_static() {
                body.active = true;
                self.active.push(handle);
            }
            log::debug!("registered body {} as {handle}", body.id);
        }

        for handle in std::mem::take(&mut self.pending_removes) {
            let Some(body) = self.bodies.remove(handle) else {
                log::warn!("flush: body {handle} vanished before removal");
                continue;
            };
            self.tree.remove(handle);
            self.active.retain(|h| *h != handle);
            self.pairs.retain(|_, pair| !pair.involves(handle));
            log::debug!("removed body {} ({handle})", body.id);
        }
    }

    /// Broad phase per active body, each candidate narrowed immediately so that
    /// bodies woken by a contact are themselves queried in this update.
    fn detect_collisions(&mut self) {
        let mut broad = Duration::ZERO;
        let mut narrow = Duration::ZERO;
        let mut tested = HashSet::new();
        let mut candidates = Vec::new();

        let mut index = 0;
        while index < self.active.len() {
            let handle = self.active[index];
            index += 1;
            let Some(bounds) = self.bodies.get(handle).and_then(RigidBody::shape).map(Shape::bounds)
            else {
                continue;
            };

            {
                let _timer = ScopedTimer::accumulate("broad_phase", &mut broad);
                candidates.clear();
                self.tree.query(&bounds, |other| {
                    candidates.push(other);
                    false
                });
            }

            let _timer = ScopedTimer::accumulate("narrow_phase", &mut narrow);
            for &other in &candidates {
                self.collide(handle, other, &mut tested);
            }
        }

        self.profile.broad_phase_time += broad;
        self.profile.narrow_phase_time += narrow;
    }

    fn collide(
        &mut self,
        first: BodyHandle,
        second: BodyHandle,
        tested: &mut HashSet<PairKey>,
    ) {
        if first == second {
            return;
        }
        let (Some(body_first), Some(body_second)) = (self.bodies.get(first), self.bodies.get(second))
        else {
            return;
        };
        if body_first.is_static() && body_second.is_static() {
            return;
        }

        let (a, b, body_a, body_b) = if body_first.id() <= body_second.id() {
            (first, second, body_first, body_second)
        } else {
            (second, first, body_second, body_first)
        };
        let key = pair_key(body_a.id(), body_b.id());
        if !tested.insert(key) {
            return;
        }

        let (Some(shape_a), Some(shape_b)) = (body_a.shape(), body_b.shape()) else {
            return;
        };
        if !CollisionFilter::either_accepts(&shape_a.filter, &shape_b.filter) {
            return;
        }
        if !shape_a.bounds().overlaps(&shape_b.bounds()) {
            return;
        }

        self.profile.candidate_pairs += 1;
        self.profile.gjk_queries += 1;
        let result = self.gjk.query(shape_a, shape_b);
        if !result.colliding {
            return;
        }
        let Some(contact) = ContactInfo::from_gjk(&result) else {
            return;
        };
        let is_trigger = shape_a.is_trigger || shape_b.is_trigger;
        if self.config.verbose {
            log::debug!(
                "contact {}-{}: point {:?}, normal {:?}, depth {:.4}",
                body_a.id(),
                body_b.id(),
                contact.point,
                contact.normal,
                contact.penetration
            );
        }

        // Both handles were just resolved, so waking cannot fail.
        let _ = self.wake_body(a);
        let _ = self.wake_body(b);

        let pair = self
            .pairs
            .entry(key)
            .or_insert_with(|| CollisionPair::new(a, b));
        if pair.stage == CollisionStage::None {
            pair.stage = CollisionStage::Enter;
            pair.contacts = vec![contact];
        } else {
            pair.refresh_contacts(vec![contact]);
        }
        pair.is_trigger = is_trigger;
        pair.update_index = self.update_index;
    }

    /// Advances pair stages, notifies the listener and prepares the solver.
    fn dispatch_lifecycle(&mut self, dt: f32) {
        let mut expired = Vec::new();

        for (&key, pair) in self.pairs.iter_mut() {
            if pair.update_index != self.update_index {
                pair.stage = CollisionStage::Exit;
            }

            match pair.stage {
                CollisionStage::Enter => {
                    log::debug!("collision enter {} / {}", pair.body_a, pair.body_b);
                    notify(&mut self.listener, &self.bodies, pair, CollisionStage::Enter);
                    pair.stage = CollisionStage::Stay;
                }
                CollisionStage::Stay => {
                    notify(&mut self.listener, &self.bodies, pair, CollisionStage::Stay);
                }
                CollisionStage::Exit => {
                    log::debug!("collision exit {} / {}", pair.body_a, pair.body_b);
                    notify(&mut self.listener, &self.bodies, pair, CollisionStage::Exit);
                    pair.stage = CollisionStage::None;
                    expired.push(key);
                    continue;
                }
                CollisionStage::None => {}
            }

            if pair.stage == CollisionStage::Stay && !pair.is_trigger {
                self.solver.pre_step(dt, &mut self.bodies, pair);
            }
        }

        for key in expired {
            self.pairs.remove(&key);
        }
    }

    /// Nearest body hit by `ray` within `max_distance`.
    pub fn raycast(&self, ray: &Ray2D, max_distance: f32) -> Option<RaycastHit> {
        self.raycast_filtered(ray, max_distance, LayerMask::ALL)
    }

    /// Like [`PhysicsWorld::raycast`], ignoring shapes outside `layers`.
    pub fn raycast_filtered(
        &self,
        ray: &Ray2D,
        max_distance: f32,
        layers: LayerMask,
    ) -> Option<RaycastHit> {
        self.tree.raycast(ray, max_distance, |handle| {
            let shape = self.bodies.get(handle)?.shape()?;
            if !shape.filter.layer.intersects(layers) {
                return None;
            }
            shape.raycast(ray)
        })
    }

    /// Visits bodies whose loose bounds overlap `bounds` until `visitor`
    /// returns `true`.
    pub fn query_region<F>(&self, bounds: &Aabb, visitor: F)
    where
        F: FnMut(BodyHandle) -> bool,
    {
        self.tree.query(bounds, visitor);
    }

    /// First body whose loose bounds overlap `bounds`.
    pub fn query_shape(&self, bounds: &Aabb) -> Option<BodyHandle> {
        let mut found = None;
        self.tree.query(bounds, |handle| {
            found = Some(handle);
            true
        });
        found
    }

    /// Body whose shape contains `point`, probing a box of half size `radius`.
    pub fn point_cast(&self, point: Vec2, radius: f32) -> Option<BodyHandle> {
        let bounds = Aabb::from_center_half_extents(point, Vec2::splat(radius));
        let mut found = None;
        self.tree.query(&bounds, |handle| {
            let inside = self
                .bodies
                .get(handle)
                .and_then(RigidBody::shape)
                .is_some_and(|shape| shape.contains(point));
            if inside {
                found = Some(handle);
            }
            inside
        });
        found
    }

    /// [`PhysicsWorld::point_cast`] with the default probe size.
    pub fn point_cast_default(&self, point: Vec2) -> Option<BodyHandle> {
        self.point_cast(point, DEFAULT_POINT_CAST_RADIUS)
    }
}

fn notify(
    listener: &mut Option<Box<dyn CollisionListener>>,
    bodies: &Arena<RigidBody>,
    pair: &mut CollisionPair,
    stage: CollisionStage,
) {
    let Some(listener) = listener.as_deref_mut() else {
        return;
    };
    let (Some(body_a), Some(body_b)) = (bodies.get(pair.body_a), bodies.get(pair.body_b)) else {
        return;
    };
    let (Some(shape_a), Some(shape_b)) = (body_a.shape(), body_b.shape()) else {
        return;
    };
    let Some(contact) = pair.contacts.first_mut() else {
        return;
    };

    if let (Some(entity), true) = (body_a.entity, shape_a.filter.accepts(&shape_b.filter)) {
        let mut info = CollisionInfo {
            other: pair.body_b,
            point: contact.point,
            normal: contact.normal,
            penetration: contact.penetration,
        };
        dispatch(listener, stage, entity, &mut info);
        contact.penetration = info.penetration;
    }

    if let (Some(entity), true) = (body_b.entity, shape_b.filter.accepts(&shape_a.filter)) {
        let mut info = CollisionInfo {
            other: pair.body_a,
            point: contact.point,
            normal: -contact.normal,
            penetration: contact.penetration,
        };
        dispatch(listener, stage, entity, &mut info);
        contact.penetration = info.penetration;
    }
}

fn dispatch(
    listener: &mut dyn CollisionListener,
    stage: CollisionStage,
    entity: u64,
    info: &mut CollisionInfo,
) {
    match stage {
        CollisionStage::Enter => listener.on_collision_enter(entity, info),
        CollisionStage::Stay => listener.on_collision_stay(entity, info),
        CollisionStage::Exit => listener.on_collision_exit(entity, info),
        CollisionStage::None => {}
    }
}
