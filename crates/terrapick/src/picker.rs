//! The picking orchestrator.
//!
//! A pick runs as a small state machine:
//!
//! ```text
//! Idle -> RayComputed -> PrimaryTested -> Hit
//!                                      -> SecondaryTested -> Hit | Miss
//!                                      -> Miss
//! ```
//!
//! The secondary candidate is the second-nearest leaf found by the single
//! initial descent; a miss there ends the pick without re-descending, which
//! keeps the cost at most two leaves' worth of triangle tests.

use terrapick_core::{
    intersect, select_candidates, Candidate, ClosestTwo, PickCache, PickOptions, PickResult,
    Ray, RayBuilder, Result, TerrainGeometry, TriangleHit,
};

/// Which candidate produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// The leaf whose bounds the ray reaches first.
    Primary,
    /// The second-nearest leaf, tried after a primary miss.
    Secondary,
}

/// Why a pick found nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    /// The ray builder produced no ray.
    NoRay,
    /// The ray intersects no leaf bounds.
    NoCandidate,
    /// Every tested leaf's triangles rejected the ray.
    NoTriangleHit,
}

/// Result of one pick request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickOutcome {
    /// A triangle was hit and the cache updated.
    Hit {
        leaf_key: u32,
        distance: f32,
        attempt: Attempt,
    },
    /// Nothing was hit; the cache is unchanged.
    Miss(MissReason),
    /// Picking did not run (disabled, or already ran this frame).
    Skipped,
}

impl PickOutcome {
    /// Returns true for hits.
    #[must_use]
    pub fn is_hit(&self) -> bool {
        matches!(self, PickOutcome::Hit { .. })
    }
}

/// States of a single pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickState {
    /// Waiting for a ray.
    Idle,
    /// A terrain-local ray is available.
    RayComputed(Ray),
    /// The nearest candidate has been intersected.
    PrimaryTested {
        ray: Ray,
        candidate: Candidate,
        hit: Option<TriangleHit>,
    },
    /// The second-nearest candidate has been intersected.
    SecondaryTested {
        ray: Ray,
        candidate: Candidate,
        hit: Option<TriangleHit>,
    },
    /// Terminal: a triangle was hit.
    Hit {
        ray: Ray,
        candidate: Candidate,
        hit: TriangleHit,
        attempt: Attempt,
    },
    /// Terminal: nothing was hit.
    Miss(MissReason),
}

impl PickState {
    /// Returns true for `Hit` and `Miss`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, PickState::Hit { .. } | PickState::Miss(_))
    }
}

/// Counters over the picker's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PickStats {
    /// Picks that ran.
    pub picks: u64,
    /// Picks that hit on the primary candidate.
    pub primary_hits: u64,
    /// Picks that hit on the secondary candidate.
    pub secondary_hits: u64,
    /// Picks that hit nothing.
    pub misses: u64,
    /// Requests that did not run.
    pub skipped: u64,
    /// Ray/triangle tests performed.
    pub triangles_tested: u64,
}

impl PickStats {
    /// Returns total hits.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.primary_hits + self.secondary_hits
    }
}

/// Owns the pick cache and the scratch state reused between picks.
#[derive(Debug, Default)]
pub struct Picker {
    options: PickOptions,
    cache: PickCache,
    candidates: ClosestTwo,
    scratch_indices: Vec<u32>,
    stats: PickStats,
    last_pick_frame: Option<u64>,
}

impl Picker {
    /// Creates a picker with the given options.
    #[must_use]
    pub fn new(options: PickOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &PickOptions {
        &self.options
    }

    /// Returns the options for modification.
    pub fn options_mut(&mut self) -> &mut PickOptions {
        &mut self.options
    }

    /// Returns the cached last result.
    #[must_use]
    pub fn last_result(&self) -> &PickResult {
        self.cache.result()
    }

    /// Returns the result cache.
    #[must_use]
    pub fn cache(&self) -> &PickCache {
        &self.cache
    }

    /// Returns the lifetime counters.
    #[must_use]
    pub fn stats(&self) -> &PickStats {
        &self.stats
    }

    /// Returns the candidates found by the most recent descent.
    #[must_use]
    pub fn candidates(&self) -> &ClosestTwo {
        &self.candidates
    }

    /// Drops the cached result, for example after the terrain is reloaded.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.candidates.clear();
        self.last_pick_frame = None;
    }

    /// Picks the terrain along a world-space ray.
    ///
    /// Misses are reported as [`PickOutcome::Miss`] and leave the cache
    /// untouched. An error means the terrain's index data is corrupt.
    pub fn pick(&mut self, terrain: &TerrainGeometry, world_ray: &Ray) -> Result<PickOutcome> {
        self.run(terrain, Some(*world_ray), None)
    }

    /// Obtains the ray from `builder`, then picks.
    pub fn pick_with(
        &mut self,
        terrain: &TerrainGeometry,
        builder: &impl RayBuilder,
    ) -> Result<PickOutcome> {
        self.run(terrain, builder.compute_cursor_ray(), None)
    }

    /// Picks at most once per frame.
    ///
    /// A second request for the same `frame` returns
    /// [`PickOutcome::Skipped`] without touching the cache.
    pub fn pick_frame(
        &mut self,
        frame: u64,
        terrain: &TerrainGeometry,
        builder: &impl RayBuilder,
    ) -> Result<PickOutcome> {
        if !self.options.enabled || self.last_pick_frame == Some(frame) {
            return Ok(self.skip());
        }
        self.last_pick_frame = Some(frame);
        self.run(terrain, builder.compute_cursor_ray(), Some(frame))
    }

    fn skip(&mut self) -> PickOutcome {
        self.stats.skipped += 1;
        PickOutcome::Skipped
    }

    fn run(
        &mut self,
        terrain: &TerrainGeometry,
        world_ray: Option<Ray>,
        frame: Option<u64>,
    ) -> Result<PickOutcome> {
        if !self.options.enabled {
            return Ok(self.skip());
        }
        self.stats.picks += 1;

        let mut world_ray = world_ray;
        let mut state = PickState::Idle;
        loop {
            match state {
                PickState::Hit {
                    ray,
                    candidate,
                    hit,
                    attempt,
                } => return Ok(self.record_hit(ray, candidate, &hit, attempt, frame)),
                PickState::Miss(reason) => {
                    self.stats.misses += 1;
                    log::debug!("pick miss: {reason:?}");
                    return Ok(PickOutcome::Miss(reason));
                }
                _ => {
                    state = self.step(state, terrain, &mut world_ray)?;
                    log::trace!("pick state -> {state:?}");
                }
            }
        }
    }

    fn record_hit(
        &mut self,
        ray: Ray,
        candidate: Candidate,
        hit: &TriangleHit,
        attempt: Attempt,
        frame: Option<u64>,
    ) -> PickOutcome {
        match attempt {
            Attempt::Primary => self.stats.primary_hits += 1,
            Attempt::Secondary => self.stats.secondary_hits += 1,
        }
        self.cache
            .store(PickResult::from_hit(hit, candidate.leaf_key, ray), frame);
        log::debug!(
            "pick hit leaf {} at {} ({attempt:?})",
            candidate.leaf_key,
            hit.distance
        );
        PickOutcome::Hit {
            leaf_key: candidate.leaf_key,
            distance: hit.distance,
            attempt,
        }
    }

    /// Advances one transition. `world_ray` is consumed by `Idle`.
    fn step(
        &mut self,
        state: PickState,
        terrain: &TerrainGeometry,
        world_ray: &mut Option<Ray>,
    ) -> Result<PickState> {
        let next = match state {
            PickState::Idle => match world_ray.take() {
                None => PickState::Miss(MissReason::NoRay),
                Some(ray) => match ray.transformed(terrain.inverse_transform()) {
                    Ok(local) => PickState::RayComputed(local),
                    // A singular world transform squashes the ray to nothing
                    Err(_) => PickState::Miss(MissReason::NoRay),
                },
            },
            PickState::RayComputed(ray) => {
                select_candidates(&ray, terrain.tree(), &mut self.candidates);
                match self.candidates.primary() {
                    None => PickState::Miss(MissReason::NoCandidate),
                    Some(candidate) => PickState::PrimaryTested {
                        ray,
                        candidate,
                        hit: self.test_candidate(terrain, &ray, candidate)?,
                    },
                }
            }
            PickState::PrimaryTested {
                ray,
                candidate,
                hit: Some(hit),
            } => PickState::Hit {
                ray,
                candidate,
                hit,
                attempt: Attempt::Primary,
            },
            PickState::PrimaryTested { ray, hit: None, .. } => {
                match self.candidates.secondary() {
                    Some(candidate) if self.options.secondary_retry => {
                        PickState::SecondaryTested {
                            ray,
                            candidate,
                            hit: self.test_candidate(terrain, &ray, candidate)?,
                        }
                    }
                    _ => PickState::Miss(MissReason::NoTriangleHit),
                }
            }
            PickState::SecondaryTested {
                ray,
                candidate,
                hit: Some(hit),
            } => PickState::Hit {
                ray,
                candidate,
                hit,
                attempt: Attempt::Secondary,
            },
            PickState::SecondaryTested { hit: None, .. } => {
                PickState::Miss(MissReason::NoTriangleHit)
            }
            terminal @ (PickState::Hit { .. } | PickState::Miss(_)) => terminal,
        };
        Ok(next)
    }

    fn test_candidate(
        &mut self,
        terrain: &TerrainGeometry,
        ray: &Ray,
        candidate: Candidate,
    ) -> Result<Option<TriangleHit>> {
        let key = candidate.leaf_key;
        self.scratch_indices.clear();
        self.scratch_indices
            .extend_from_slice(terrain.tree().leaf_indices(key)?);
        self.stats.triangles_tested += (self.scratch_indices.len() / 3) as u64;

        intersect(
            ray,
            terrain.positions(),
            &self.scratch_indices,
            self.options.parallel_epsilon,
        )
        .map_err(|err| {
            let err = err.with_leaf_key(key);
            log::warn!("corrupt index run in leaf {key}: {err}");
            err
        })
    }
}
