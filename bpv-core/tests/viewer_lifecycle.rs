use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use bpv_core::{
    BlueprintMetadata, ColorSpec, Dimensions, FetchError, FetchOutcome, FontSource, FontStatus,
    Frame, FrameHandle, FrameQueue, FrameScheduler, LabelAttachmentError, LifecycleState,
    MountPoint, RenderSurface, ResourceAcquisitionError, Rgb, SchedulerError, StaticFont,
    SurfaceError, SurfaceSize, Typeface, ViewError, ViewName, Viewer, ViewerConfig, ViewerError,
};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Acquire,
    Attach,
    Draw {
        size: [f32; 3],
        color: Rgb,
        label: Option<String>,
    },
    CancelFrame,
    Detach,
}

type Log = Rc<RefCell<Vec<Event>>>;

struct RecordingSurface {
    log: Log,
    size: SurfaceSize,
}

impl RenderSurface for RecordingSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn draw(&mut self, frame: &Frame<'_>) -> Result<(), SurfaceError> {
        self.log.borrow_mut().push(Event::Draw {
            size: frame.scene.solid.size,
            color: frame.scene.solid.color,
            label: frame.scene.label().map(|l| l.spec.text.clone()),
        });
        Ok(())
    }
}

struct RecordingMount {
    log: Log,
    fail_acquire: bool,
}

impl MountPoint for RecordingMount {
    type Surface = RecordingSurface;

    fn acquire(&mut self, size: SurfaceSize) -> Result<RecordingSurface, ResourceAcquisitionError> {
        if self.fail_acquire {
            return Err(ResourceAcquisitionError::NoSurface("no canvas".into()));
        }
        self.log.borrow_mut().push(Event::Acquire);
        Ok(RecordingSurface {
            log: self.log.clone(),
            size,
        })
    }

    fn attach(&mut self, _surface: &mut RecordingSurface) -> Result<(), ResourceAcquisitionError> {
        self.log.borrow_mut().push(Event::Attach);
        Ok(())
    }

    fn detach(&mut self, _surface: RecordingSurface) {
        self.log.borrow_mut().push(Event::Detach);
    }
}

struct RecordingScheduler {
    log: Log,
    queue: FrameQueue,
    refuse: bool,
}

impl FrameScheduler for RecordingScheduler {
    fn request_frame(&mut self) -> Result<FrameHandle, SchedulerError> {
        if self.refuse {
            return Err(SchedulerError::Refused("display gone".into()));
        }
        self.queue.request_frame()
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.log.borrow_mut().push(Event::CancelFrame);
        self.queue.cancel_frame(handle);
    }
}

struct Harness {
    log: Log,
    viewer: Viewer<RecordingMount, RecordingScheduler>,
}

impl Harness {
    fn new() -> Self {
        Self::with_fonts(StaticFont(Typeface::new("sans-serif")))
    }

    fn with_fonts(fonts: impl FontSource + 'static) -> Self {
        let log: Log = Rc::default();
        let scheduler = RecordingScheduler {
            log: log.clone(),
            queue: FrameQueue::new(),
            refuse: false,
        };
        let viewer = Viewer::new(&ViewerConfig::default(), scheduler, fonts).with_blueprint(42u64);
        Self { log, viewer }
    }

    fn mount(&mut self) {
        let mount = RecordingMount {
            log: self.log.clone(),
            fail_acquire: false,
        };
        self.viewer.mount(mount).unwrap();
    }

    /// One display refresh
    fn tick(&mut self) -> usize {
        let due = self.viewer.scheduler_mut().queue.take_due();
        due.into_iter().filter(|h| self.viewer.frame(*h)).count()
    }

    fn draws(&self) -> Vec<Event> {
        self.log
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Draw { .. }))
            .cloned()
            .collect()
    }

    fn last_draw(&self) -> Event {
        self.draws().pop().expect("no frame drawn")
    }

    fn pending_frames(&self) -> usize {
        self.viewer.scheduler().queue.pending()
    }

    fn succeed_fetch(&mut self, dims: Option<Dimensions>, color: &str) -> bool {
        let request = self.viewer.take_fetch_request().expect("fetch issued");
        self.viewer.complete_fetch(FetchOutcome {
            ticket: request.ticket,
            result: Ok(BlueprintMetadata {
                dimensions: dims,
                color: ColorSpec::parse(color),
            }),
        })
    }
}

fn draw(size: [f32; 3], color: u32, label: Option<&str>) -> Event {
    Event::Draw {
        size,
        color: Rgb(color),
        label: label.map(str::to_string),
    }
}

#[test]
fn test_mount_acquires_attaches_and_starts_one_loop() {
    let mut h = Harness::new();
    assert_eq!(h.viewer.state(), LifecycleState::Unmounted);
    h.mount();

    assert_eq!(h.viewer.state(), LifecycleState::Active);
    assert_eq!(*h.log.borrow(), vec![Event::Acquire, Event::Attach]);
    assert!(h.viewer.is_loop_running());
    assert_eq!(h.pending_frames(), 1);
    assert!(h.viewer.take_fetch_request().is_some());
    assert!(h.viewer.take_fetch_request().is_none());
}

#[test]
fn test_mounting_twice_is_rejected() {
    let mut h = Harness::new();
    h.mount();
    let again = RecordingMount {
        log: h.log.clone(),
        fail_acquire: false,
    };
    assert!(matches!(
        h.viewer.mount(again),
        Err(ViewerError::InvalidState {
            expected: LifecycleState::Unmounted,
            actual: LifecycleState::Active
        })
    ));
    assert_eq!(h.pending_frames(), 1);
}

#[test]
fn test_acquisition_failure_is_fatal_and_leaves_nothing_running() {
    let mut h = Harness::new();
    let mount = RecordingMount {
        log: h.log.clone(),
        fail_acquire: true,
    };
    let err = h.viewer.mount(mount).unwrap_err();
    assert!(matches!(
        err,
        ViewerError::Initialization(ResourceAcquisitionError::NoSurface(_))
    ));
    assert_eq!(h.viewer.state(), LifecycleState::Unmounted);
    assert!(!h.viewer.is_loop_running());
    assert_eq!(h.pending_frames(), 0);
    assert!(h.viewer.take_fetch_request().is_none());
}

#[test]
fn test_scenario_dimensions_and_default_color() {
    let mut h = Harness::new();
    h.mount();
    assert!(h.succeed_fetch(Some(Dimensions::new(10.0, 20.0, 30.0)), "none"));

    assert_eq!(h.tick(), 1);
    assert_eq!(
        h.last_draw(),
        draw([10.0, 20.0, 30.0], 0x00ff00, Some("X: 10 Y: 20 Z: 30"))
    );

    let generation = h.viewer.scene_generation();
    h.viewer.set_view(ViewName::Top);
    assert_eq!(h.viewer.controls().base_position(), ViewName::Top.base_position());
    assert_eq!(h.viewer.camera().position, ViewName::Top.base_position());
    assert_eq!(h.viewer.scene_generation(), generation);

    h.tick();
    assert_relative_eq!(h.viewer.camera().position.y, 20.0, epsilon = 1e-2);
    assert_eq!(
        h.last_draw(),
        draw([10.0, 20.0, 30.0], 0x00ff00, Some("X: 10 Y: 20 Z: 30"))
    );
}

#[test]
fn test_scenario_color_change_rebuilds_without_second_loop() {
    let mut h = Harness::new();
    h.mount();
    h.succeed_fetch(Some(Dimensions::new(10.0, 20.0, 30.0)), "none");
    for _ in 0..5 {
        h.tick();
    }
    let rotation = h.viewer.controls().rotation();
    let generation = h.viewer.scene_generation();

    h.viewer.set_color("#ff0000");

    assert_eq!(h.viewer.scene_generation(), generation + 1);
    assert_eq!(h.viewer.controls().rotation(), rotation);
    assert_eq!(h.pending_frames(), 1);
    assert_eq!(h.tick(), 1);
    assert_eq!(h.pending_frames(), 1);
    assert_eq!(
        h.last_draw(),
        draw([10.0, 20.0, 30.0], 0xff0000, Some("X: 10 Y: 20 Z: 30"))
    );
    assert_eq!(h.viewer.controls().rotation().frames, rotation.frames + 1);
}

#[test]
fn test_scenario_fetch_failure_renders_default_scene() {
    let mut h = Harness::new();
    h.mount();
    let request = h.viewer.take_fetch_request().unwrap();
    assert!(h.viewer.complete_fetch(FetchOutcome {
        ticket: request.ticket,
        result: Err(FetchError::Transport("connection refused".into())),
    }));

    assert_eq!(h.viewer.state(), LifecycleState::Active);
    assert!(h.viewer.metadata().is_none());
    h.tick();
    assert_eq!(h.last_draw(), draw([10.0, 20.0, 30.0], 0x00ff00, None));
}

#[test]
fn test_malformed_payload_is_a_recovered_fetch_error() {
    let mut h = Harness::new();
    h.mount();
    let request = h.viewer.take_fetch_request().unwrap();
    let result = BlueprintMetadata::from_json(r##"{"dimensions": "{oops", "color": "#123456"}"##);
    assert!(result.is_err());
    h.viewer.complete_fetch(FetchOutcome {
        ticket: request.ticket,
        result,
    });
    h.tick();
    assert_eq!(h.last_draw(), draw([10.0, 20.0, 30.0], 0x00ff00, None));
}

#[test]
fn test_unparsable_color_falls_back_to_default() {
    let mut h = Harness::new();
    h.mount();
    h.succeed_fetch(Some(Dimensions::new(1.0, 2.0, 3.0)), "#zzzzzz");
    h.tick();
    assert_eq!(
        h.last_draw(),
        draw([1.0, 2.0, 3.0], 0x00ff00, Some("X: 1 Y: 2 Z: 3"))
    );
}

#[test]
fn test_stale_fetch_does_not_overwrite_newer_blueprint() {
    let mut h = Harness::new();
    h.mount();
    let for_a = h.viewer.take_fetch_request().unwrap();

    h.viewer.set_blueprint(7u64);
    let for_b = h.viewer.take_fetch_request().unwrap();
    assert_eq!(for_b.ticket.id.as_str(), "7");

    assert!(h.viewer.complete_fetch(FetchOutcome {
        ticket: for_b.ticket,
        result: Ok(BlueprintMetadata {
            dimensions: Some(Dimensions::new(4.0, 5.0, 6.0)),
            color: ColorSpec::parse("#0000ff"),
        }),
    }));
    assert!(!h.viewer.complete_fetch(FetchOutcome {
        ticket: for_a.ticket,
        result: Ok(BlueprintMetadata {
            dimensions: Some(Dimensions::new(10.0, 20.0, 30.0)),
            color: ColorSpec::None,
        }),
    }));

    h.tick();
    assert_eq!(
        h.last_draw(),
        draw([4.0, 5.0, 6.0], 0x0000ff, Some("X: 4 Y: 5 Z: 6"))
    );
}

#[test]
fn test_same_blueprint_does_not_refetch() {
    let mut h = Harness::new();
    h.mount();
    h.viewer.take_fetch_request().unwrap();
    h.viewer.set_blueprint(42u64);
    assert!(h.viewer.take_fetch_request().is_none());
}

#[test]
fn test_fetch_after_unmount_is_discarded() {
    let mut h = Harness::new();
    h.mount();
    let request = h.viewer.take_fetch_request().unwrap();
    h.viewer.unmount().unwrap();
    assert!(!h.viewer.complete_fetch(FetchOutcome {
        ticket: request.ticket,
        result: Ok(BlueprintMetadata::default()),
    }));
    assert!(h.viewer.scene().is_none());
}

#[test]
fn test_unmount_cancels_loop_before_release() {
    let mut h = Harness::new();
    h.mount();
    h.tick();
    h.tick();

    let mount = h.viewer.unmount();
    assert!(mount.is_some());
    assert_eq!(h.viewer.state(), LifecycleState::Unmounted);
    assert!(!h.viewer.is_loop_running());
    assert_eq!(h.pending_frames(), 0);

    let log = h.log.borrow().clone();
    let cancel = log.iter().position(|e| *e == Event::CancelFrame).unwrap();
    let detach = log.iter().position(|e| *e == Event::Detach).unwrap();
    assert!(cancel < detach);
    assert!(log[cancel..].iter().all(|e| !matches!(e, Event::Draw { .. })));
    assert_eq!(log.iter().filter(|e| **e == Event::Detach).count(), 1);

    // nothing fires afterwards, and a second unmount is a no-op
    assert_eq!(h.tick(), 0);
    assert!(h.viewer.unmount().is_none());
    assert_eq!(h.log.borrow().iter().filter(|e| **e == Event::Detach).count(), 1);
}

#[test]
fn test_stale_frame_handle_after_remount_is_ignored() {
    let mut h = Harness::new();
    h.mount();
    let old = h.viewer.scheduler_mut().queue.take_due();
    h.viewer.unmount();
    h.mount();
    assert!(!h.viewer.frame(old[0]));
    assert_eq!(h.tick(), 1);
    assert_eq!(h.pending_frames(), 1);
}

#[test]
fn test_drop_releases_surface() {
    let mut h = Harness::new();
    h.mount();
    let log = h.log.clone();
    drop(h);
    let log = log.borrow();
    assert_eq!(log.last(), Some(&Event::Detach));
    assert!(log.contains(&Event::CancelFrame));
}

#[test]
fn test_invalid_view_fails_fast() {
    let mut h = Harness::new();
    h.mount();
    let before = h.viewer.camera().position;
    assert_eq!(
        h.viewer.select_view("isometric"),
        Err(ViewError::UnknownView("isometric".into()))
    );
    assert_eq!(h.viewer.view(), ViewName::Front);
    assert_eq!(h.viewer.camera().position, before);
    assert!(h.viewer.select_view("left").is_ok());
    assert_eq!(h.viewer.camera().position, ViewName::Left.base_position());
}

#[test]
fn test_rebuild_with_same_inputs_is_identical() {
    let mut h = Harness::new();
    h.mount();
    h.succeed_fetch(Some(Dimensions::new(3.0, 3.0, 3.0)), "#abcdef");
    let first = h.viewer.scene().cloned().unwrap();
    h.viewer.set_color("#abcdef");
    h.viewer.set_color("#abcdef");
    assert_eq!(h.viewer.scene(), Some(&first));
    assert_eq!(h.viewer.scene().unwrap().solid.mesh.triangles.len(), 12);
}

struct LateFont {
    polls_until_ready: u32,
}

impl FontSource for LateFont {
    fn poll_typeface(&mut self) -> FontStatus {
        if self.polls_until_ready == 0 {
            FontStatus::Ready(Typeface::new("serif"))
        } else {
            self.polls_until_ready -= 1;
            FontStatus::Pending
        }
    }
}

struct NoFont;

impl FontSource for NoFont {
    fn poll_typeface(&mut self) -> FontStatus {
        FontStatus::Unavailable(LabelAttachmentError::FontUnavailable("404".into()))
    }
}

#[test]
fn test_label_attaches_once_font_arrives() {
    let mut h = Harness::with_fonts(LateFont {
        polls_until_ready: 2,
    });
    h.mount();
    h.succeed_fetch(Some(Dimensions::new(1.0, 1.0, 1.0)), "none");
    h.tick();
    h.tick();
    assert_eq!(h.last_draw(), draw([1.0, 1.0, 1.0], 0x00ff00, None));
    h.tick();
    assert_eq!(
        h.last_draw(),
        draw([1.0, 1.0, 1.0], 0x00ff00, Some("X: 1 Y: 1 Z: 1"))
    );
}

#[test]
fn test_missing_font_still_draws_solid() {
    let mut h = Harness::with_fonts(NoFont);
    h.mount();
    h.succeed_fetch(Some(Dimensions::new(1.0, 2.0, 3.0)), "#ff0000");
    h.tick();
    h.tick();
    assert_eq!(h.last_draw(), draw([1.0, 2.0, 3.0], 0xff0000, None));
    assert_eq!(h.pending_frames(), 1);
}

#[test]
fn test_new_blueprint_resets_color_until_fetched() {
    let mut h = Harness::new();
    h.mount();
    h.succeed_fetch(Some(Dimensions::new(1.0, 2.0, 3.0)), "#ff0000");
    h.viewer.set_blueprint("9");
    assert_eq!(h.viewer.color(), &ColorSpec::None);
    assert!(h.viewer.metadata().is_none());
    h.tick();
    assert_eq!(h.last_draw(), draw([10.0, 20.0, 30.0], 0x00ff00, None));
}

#[test]
fn test_refused_frame_request_stops_loop_but_keeps_viewer_mounted() {
    let mut h = Harness::new();
    h.mount();
    assert_eq!(h.tick(), 1);

    h.viewer.scheduler_mut().refuse = true;
    assert_eq!(h.tick(), 1);
    assert!(!h.viewer.is_loop_running());
    assert_eq!(h.pending_frames(), 0);
    assert!(h.viewer.is_mounted());
    assert_eq!(h.tick(), 0);

    // teardown still releases the surface exactly once
    assert!(h.viewer.unmount().is_some());
    assert_eq!(h.log.borrow().iter().filter(|e| **e == Event::Detach).count(), 1);
}
