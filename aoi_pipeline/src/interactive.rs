/// Interactive session driver
///
/// Single-threaded tick loop that is the pipeline's only producer and
/// consumer of frames. Each tick:
/// - takes one operator token (typed command first, else a key sample)
///   and dispatches it along the active state path
/// - runs the state hooks and routes pending pointer events
/// - unless playback is paused, pushes one frame and blocks for one
///   composited frame
/// - draws the state overlays and hands the result to the renderer
use crate::channel::FrameChannel;
use crate::config::SessionConfig;
use crate::console::CommandSource;
use crate::display::{PointerEvent, Renderer};
use crate::error::{Result, SessionError};
use crate::image_utils::{self, AOI_COLOR};
use crate::session::Session;
use crate::sync_cell::MarkerSnapshot;
use crate::types::{Aoi, Frame};
use crate::video::FrameSource;
use crate::vsm::{StateKind, StateTree};
use crossbeam::channel::{unbounded, Receiver};
use image::Rgb;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The operator quit
    Quit,
    EndOfStream,
    /// A sentinel arrived on the output channel
    Sentinel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Stopped(StopReason),
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub reason: StopReason,
    pub frames_processed: u64,
    pub elapsed: Duration,
    pub fps: f64,
    pub aois: Vec<Aoi>,
}

type CleanupHook = Box<dyn FnOnce() + Send>;

pub struct InteractiveStateMachineBuilder {
    config: SessionConfig,
    source: Option<Box<dyn FrameSource>>,
    renderer: Option<Box<dyn Renderer>>,
    commands: Option<Box<dyn CommandSource>>,
    channels: Option<(FrameChannel, FrameChannel)>,
    markers: MarkerSnapshot,
    cleanup: Option<CleanupHook>,
    initial: StateKind,
}

impl InteractiveStateMachineBuilder {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            source: None,
            renderer: None,
            commands: None,
            channels: None,
            markers: MarkerSnapshot::default(),
            cleanup: None,
            initial: StateKind::Initial,
        }
    }

    pub fn frame_source(mut self, source: impl FrameSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn command_source(mut self, commands: impl CommandSource + 'static) -> Self {
        self.commands = Some(Box::new(commands));
        self
    }

    /// Input and output channels of the worker pool
    pub fn channels(mut self, input: FrameChannel, output: FrameChannel) -> Self {
        self.channels = Some((input, output));
        self
    }

    /// Snapshot the workers publish marker batches into
    pub fn markers(mut self, markers: MarkerSnapshot) -> Self {
        self.markers = markers;
        self
    }

    /// Runs exactly once when the session ends
    pub fn on_cleanup(mut self, cleanup: impl FnOnce() + Send + 'static) -> Self {
        self.cleanup = Some(Box::new(cleanup));
        self
    }

    pub fn initial_state(mut self, kind: StateKind) -> Self {
        self.initial = kind;
        self
    }

    pub fn build(self) -> Result<InteractiveStateMachine> {
        self.config.validate()?;
        let source = self
            .source
            .ok_or_else(|| SessionError::config("a frame source is required"))?;
        let mut renderer = self
            .renderer
            .ok_or_else(|| SessionError::config("a renderer is required"))?;
        let commands = self
            .commands
            .ok_or_else(|| SessionError::config("a command source is required"))?;
        let (input, output) = self
            .channels
            .ok_or_else(|| SessionError::config("pipeline channels are required"))?;

        let mut session = Session::new(self.markers, commands, output.clone());
        let mut tree = StateTree::new(&mut session)?;
        let root = tree.root();
        tree.enter_state(root, self.initial, &mut session)?;

        let (pointer_tx, pointer_rx) = unbounded();
        renderer.set_click_handler(Box::new(move |event| {
            let _ = pointer_tx.send(event);
        }));

        Ok(InteractiveStateMachine {
            config: self.config,
            tree,
            session,
            source,
            renderer,
            input,
            output,
            pointer_events: pointer_rx,
            cleanup: self.cleanup,
            finished: false,
            last_frame: None,
            frames_processed: 0,
            started: Instant::now(),
            announced: 0,
        })
    }
}

pub struct InteractiveStateMachine {
    config: SessionConfig,
    tree: StateTree,
    session: Session,
    source: Box<dyn FrameSource>,
    renderer: Box<dyn Renderer>,
    input: FrameChannel,
    output: FrameChannel,
    pointer_events: Receiver<PointerEvent>,
    cleanup: Option<CleanupHook>,
    finished: bool,
    last_frame: Option<Frame>,
    frames_processed: u64,
    started: Instant,
    // state entries already described to the operator
    announced: u64,
}

impl InteractiveStateMachine {
    pub fn builder(config: SessionConfig) -> InteractiveStateMachineBuilder {
        InteractiveStateMachineBuilder::new(config)
    }

    pub fn tree(&self) -> &StateTree {
        &self.tree
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_kind(&self) -> StateKind {
        self.tree.current_kind()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    fn is_stopping(&self) -> bool {
        self.session.is_stopping() || self.tree.current_kind().is_terminal()
    }

    fn next_token(&mut self) -> Result<Option<String>> {
        let input = self.session.input();
        if input.has_input() {
            return input.get_input().map(Some);
        }
        Ok(self.renderer.pressed_key().map(String::from))
    }

    fn announce_state(&mut self) {
        if self.tree.entries() != self.announced {
            self.announced = self.tree.entries();
            log::info!("[{}]\n{}", self.tree.current_kind(), self.tree.help());
        }
    }

    fn fps(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.frames_processed as f64 / elapsed
        } else {
            0.0
        }
    }

    /// One iteration of the session loop
    pub fn tick(&mut self) -> Result<Tick> {
        if let Some(token) = self.next_token()? {
            self.tree.dispatch(&token, &mut self.session)?;
        }
        if self.is_stopping() {
            return Ok(Tick::Stopped(StopReason::Quit));
        }

        self.tree.run_active(&mut self.session)?;
        if self.is_stopping() {
            return Ok(Tick::Stopped(StopReason::Quit));
        }

        while let Ok(event) = self.pointer_events.try_recv() {
            self.tree.route_pointer(event, &mut self.session)?;
        }
        self.announce_state();

        let stepping = self.session.take_step_request();
        let fresh = !self.tree.pauses_playback() || stepping || self.last_frame.is_none();
        if fresh {
            let Some(frame) = self.source.next_frame() else {
                log::info!("End of stream reached");
                return Ok(Tick::Stopped(StopReason::EndOfStream));
            };
            self.input.put(Some(frame))?;
            match self.output.get()? {
                Some(composited) => {
                    self.frames_processed += 1;
                    self.last_frame = Some(composited);
                }
                None => {
                    log::info!("Pipeline stopped");
                    return Ok(Tick::Stopped(StopReason::Sentinel));
                }
            }
        }

        self.present(fresh)?;
        Ok(Tick::Continue)
    }

    fn present(&mut self, fresh: bool) -> Result<()> {
        let Some(frame) = &self.last_frame else {
            return Ok(());
        };

        if !self.config.display {
            if fresh && self.frames_processed % self.config.progress_interval.max(1) == 0 {
                log::info!(
                    "frames processed: {}, elapsed time: {:.2}s, fps: {:.2}",
                    self.frames_processed,
                    self.started.elapsed().as_secs_f64(),
                    self.fps()
                );
            }
            return Ok(());
        }

        let mut canvas = frame.image.clone();
        for (index, aoi) in self.session.aois().iter().enumerate() {
            image_utils::draw_polygon(&mut canvas, &aoi.boundary, AOI_COLOR, 2);
            if let Some(c) = aoi.boundary.centroid() {
                let (x, y) = c.to_pixel();
                image_utils::draw_text(
                    &mut canvas,
                    &format!("A{}", index + 1),
                    x,
                    y,
                    Rgb([0, 0, 0]),
                    Some(AOI_COLOR),
                );
            }
        }
        self.tree.draw_overlays(&mut canvas);
        if self.config.draw_fps {
            image_utils::draw_fps(&mut canvas, self.fps());
        }
        self.renderer.show(&canvas)
    }

    /// Tick until a stop condition, then clean up
    pub fn run(mut self) -> Result<SessionSummary> {
        self.started = Instant::now();
        self.frames_processed = 0;

        let outcome = loop {
            match self.tick() {
                Ok(Tick::Continue) => {}
                Ok(Tick::Stopped(reason)) => break Ok(reason),
                Err(e) => break Err(e),
            }
        };
        self.finish();
        let reason = outcome?;

        let summary = SessionSummary {
            reason,
            frames_processed: self.frames_processed,
            elapsed: self.started.elapsed(),
            fps: self.fps(),
            aois: self.session.aois().iter().cloned().collect(),
        };
        log::info!(
            "Session finished ({:?}): {} frames in {:.2}s, {:.2} fps, {} AOIs",
            summary.reason,
            summary.frames_processed,
            summary.elapsed.as_secs_f64(),
            summary.fps,
            summary.aois.len()
        );
        Ok(summary)
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.source.stop();
        self.renderer.destroy();
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl Drop for InteractiveStateMachine {
    fn drop(&mut self) {
        self.finish();
    }
}
