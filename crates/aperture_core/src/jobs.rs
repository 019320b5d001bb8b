use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::frame::{evaluate_portal, evaluate_window, FrameInputs, FrameOutputs};
use crate::scene::Scene;

/// Thread pool for evaluating independent portal and window instances of one
/// frame in parallel. Output order matches [`crate::frame::evaluate`].
pub struct JobSystem {
    pool: ThreadPool,
}

impl JobSystem {
    pub fn new(num_threads: Option<usize>) -> Result<Self, ThreadPoolBuildError> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|index| format!("aperture-job-{index}"));
        if let Some(count) = num_threads {
            builder = builder.num_threads(count);
        }

        let pool = builder.build()?;
        Ok(Self { pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn evaluate(&self, scene: &Scene, inputs: &FrameInputs) -> FrameOutputs {
        let view_proj = inputs.viewer.view_projection();
        self.pool.install(|| {
            let portals = scene
                .portal_ids()
                .par_iter()
                .map(|&id| (id, evaluate_portal(scene, id, inputs, view_proj)))
                .collect();
            let windows = scene
                .windows()
                .par_iter()
                .map(|(id, surface)| (*id, evaluate_window(scene, *id, surface, inputs, view_proj)))
                .collect();
            FrameOutputs { portals, windows }
        })
    }
}
