use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use stagecraft_render::Renderer;

use crate::stage::Stage;

/// Paces the render loop between frames.
pub trait FrameScheduler {
    /// Block (or yield) until the next frame is due.
    fn next_frame(&mut self);
}

/// Runs frames back to back. Used for headless runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpaced;

impl FrameScheduler for Unpaced {
    fn next_frame(&mut self) {}
}

/// Sleeps so frames start at a fixed interval.
///
/// A frame that overruns its slot does not make later frames catch up; the
/// schedule restarts from the late frame.
#[derive(Debug, Clone)]
pub struct FixedRate {
    interval: Duration,
    next: Option<Instant>,
}

impl FixedRate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: None,
        }
    }

    pub fn per_second(fps: u32) -> Self {
        Self::new(Duration::from_secs(1) / fps.max(1))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameScheduler for FixedRate {
    fn next_frame(&mut self) {
        let now = Instant::now();
        let due = self.next.unwrap_or(now + self.interval);
        if due > now {
            std::thread::sleep(due - now);
            self.next = Some(due + self.interval);
        } else {
            std::thread::yield_now();
            self.next = Some(now + self.interval);
        }
    }
}

/// Cloneable cancellation flag for the render loop.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One frame: apply this tick's mutation, then render the result.
pub fn tick<R: Renderer>(stage: &mut Stage, renderer: &mut R) -> R::Output {
    let report = stage.update();
    if report.commands > 0 {
        tracing::debug!(
            frame = stage.scene().frame(),
            commands = report.commands,
            camera_moved = report.camera_moved,
            "applied camera commands"
        );
    }
    renderer.render(stage.scene(), stage.camera())
}

/// Tick until `keep_going` returns false, dropping each frame's output.
/// Returns the number of frames rendered.
///
/// Meant for renderers whose output is a plain value. Use [`run_with`] when
/// the output carries per-frame errors.
pub fn run<R, S, F>(
    stage: &mut Stage,
    renderer: &mut R,
    scheduler: &mut S,
    keep_going: F,
) -> u64
where
    R: Renderer,
    S: FrameScheduler + ?Sized,
    F: FnMut(&Stage) -> bool,
{
    run_with(stage, renderer, scheduler, keep_going, |_| {})
}

/// Like [`run`], but hands every frame's output to `on_frame`.
pub fn run_with<R, S, F, O>(
    stage: &mut Stage,
    renderer: &mut R,
    scheduler: &mut S,
    mut keep_going: F,
    mut on_frame: O,
) -> u64
where
    R: Renderer,
    S: FrameScheduler + ?Sized,
    F: FnMut(&Stage) -> bool,
    O: FnMut(R::Output),
{
    let _span = tracing::info_span!("render_loop", rig = stage.rig().name()).entered();
    let start = Instant::now();
    let mut frames = 0u64;
    while keep_going(stage) {
        on_frame(tick(stage, renderer));
        frames += 1;
        scheduler.next_frame();
    }
    tracing::info!(frames, elapsed = ?start.elapsed(), "render loop stopped");
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use stagecraft_assets::{Geometry, Material};
    use stagecraft_common::{Color, NodeId, Transform};
    use stagecraft_input::{CameraCommand, CameraRig, ScrollRig};
    use stagecraft_scene::{Camera, Scene};

    use crate::stage::Spin;

    /// Records what each render call saw.
    #[derive(Default)]
    struct Recorder {
        seen: Vec<(u64, f32, Vec3)>,
        watch: Option<NodeId>,
    }

    impl Renderer for Recorder {
        type Output = usize;

        fn render(&mut self, scene: &Scene, camera: &Camera) -> usize {
            let rotation = self
                .watch
                .and_then(|id| scene.get(id))
                .map(|n| n.transform.rotation)
                .unwrap_or_default();
            self.seen.push((scene.frame(), camera.position.z, rotation));
            self.seen.len()
        }
    }

    fn spinning_stage(rig: CameraRig) -> (Stage, NodeId) {
        let mut scene = Scene::new();
        let g = scene
            .geometry(Geometry::Torus {
                radius: 10.0,
                tube: 3.0,
                radial_segments: 16,
                tubular_segments: 100,
            })
            .unwrap();
        let m = scene
            .material(Material::standard("torus", Color::from_hex(0xff6347)))
            .unwrap();
        let id = scene.add_mesh(g, m, Transform::default()).unwrap();
        let mut stage = Stage::new(scene, Camera::default(), rig);
        stage.animate(id, Spin::rotation(0.01, 0.005, 0.01)).unwrap();
        (stage, id)
    }

    #[test]
    fn mutation_precedes_render() {
        let (mut stage, id) = spinning_stage(CameraRig::Scroll(ScrollRig::default()));
        let mut recorder = Recorder {
            watch: Some(id),
            ..Default::default()
        };

        stage.push(CameraCommand::Scroll { offset: -1000.0 });
        assert_eq!(tick(&mut stage, &mut recorder), 1);

        let (frame, z, rotation) = recorder.seen[0];
        assert_eq!(frame, 1);
        assert!((z - 10.0).abs() < 1e-5);
        assert!((rotation - Vec3::new(0.01, 0.005, 0.01)).length() < 1e-6);
    }

    #[test]
    fn run_stops_on_predicate() {
        let (mut stage, id) = spinning_stage(CameraRig::Fixed);
        let mut recorder = Recorder {
            watch: Some(id),
            ..Default::default()
        };
        let frames = run(&mut stage, &mut recorder, &mut Unpaced, |s| {
            s.scene().frame() < 100
        });

        assert_eq!(frames, 100);
        assert_eq!(recorder.seen.len(), 100);
        let frames_seen: Vec<u64> = recorder.seen.iter().map(|s| s.0).collect();
        assert_eq!(frames_seen, (1..=100).collect::<Vec<_>>());
        let last = recorder.seen[99].2;
        assert!((last - Spin::rotation(0.01, 0.005, 0.01).scaled(100.0).rotation).length() < 1e-3);
    }

    #[test]
    fn stop_token_ends_loop() {
        let (mut stage, _) = spinning_stage(CameraRig::Fixed);
        let token = StopToken::new();
        let remote = token.clone();
        let mut recorder = Recorder::default();

        let frames = run(&mut stage, &mut recorder, &mut Unpaced, |s| {
            if s.scene().frame() == 5 {
                remote.stop();
            }
            !token.is_stopped()
        });
        assert_eq!(frames, 5);
        assert!(token.is_stopped());
    }

    /// Fails every third frame.
    struct Flaky(u64);

    impl Renderer for Flaky {
        type Output = Result<u64, String>;

        fn render(&mut self, scene: &Scene, _camera: &Camera) -> Self::Output {
            self.0 += 1;
            if scene.frame() % 3 == 0 {
                Err(format!("frame {} dropped", scene.frame()))
            } else {
                Ok(scene.frame())
            }
        }
    }

    #[test]
    fn run_with_surfaces_frame_errors() {
        let (mut stage, _) = spinning_stage(CameraRig::Fixed);
        let mut renderer = Flaky(0);
        let mut errors = Vec::new();
        let mut rendered = Vec::new();

        let frames = run_with(
            &mut stage,
            &mut renderer,
            &mut Unpaced,
            |s| s.scene().frame() < 7,
            |out| match out {
                Ok(frame) => rendered.push(frame),
                Err(e) => errors.push(e),
            },
        );

        assert_eq!(frames, 7);
        assert_eq!(renderer.0, 7);
        assert_eq!(rendered, vec![1, 2, 4, 5, 7]);
        assert_eq!(errors, vec!["frame 3 dropped", "frame 6 dropped"]);
    }

    #[test]
    fn run_accepts_boxed_scheduler() {
        let (mut stage, _) = spinning_stage(CameraRig::Fixed);
        let mut scheduler: Box<dyn FrameScheduler> = Box::new(Unpaced);
        let mut recorder = Recorder::default();
        let frames = run(&mut stage, &mut recorder, scheduler.as_mut(), |s| {
            s.scene().frame() < 3
        });
        assert_eq!(frames, 3);
    }

    #[test]
    fn fixed_rate_paces_frames() {
        let mut scheduler = FixedRate::per_second(200);
        assert_eq!(scheduler.interval(), Duration::from_millis(5));
        let start = Instant::now();
        for _ in 0..4 {
            scheduler.next_frame();
        }
        assert!(start.elapsed() >= Duration::from_millis(15));
    }
}
