//! Pointer and touch event classification.
//!
//! Stylus and mouse input arrive on the pointer stream, fingers on the touch
//! stream. The disambiguator keeps exactly one gesture mode active and turns
//! raw events into [`GestureCommand`]s for the canvas to apply.

use crate::tools::ToolKind;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Contact sizes below this (in px, either axis) identify a stylus tip.
pub const STYLUS_CONTACT_MAX: f64 = 10.0;

/// Device behind a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Mouse,
    Pen,
    Touch,
}

/// One pointer sample in surface-local screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub kind: PointerKind,
    pub position: Point,
    /// Reported pressure, if the device has any.
    pub pressure: Option<f64>,
    /// Reported contact geometry, if any.
    pub contact: Option<Size>,
}

impl PointerSample {
    pub fn new(kind: PointerKind, position: Point) -> Self {
        Self {
            kind,
            position,
            pressure: None,
            contact: None,
        }
    }

    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure);
        self
    }

    pub fn with_contact(mut self, contact: Size) -> Self {
        self.contact = Some(contact);
        self
    }

    /// Pen pointers, plus touch pointers with a stylus-sized contact.
    pub fn is_stylus(&self) -> bool {
        match self.kind {
            PointerKind::Pen => true,
            PointerKind::Touch => self
                .contact
                .is_some_and(|c| c.width < STYLUS_CONTACT_MAX || c.height < STYLUS_CONTACT_MAX),
            PointerKind::Mouse => false,
        }
    }

    /// Whether the pointer stream handles this sample at all.
    fn is_accepted(&self) -> bool {
        self.kind == PointerKind::Mouse || self.is_stylus()
    }
}

/// Pointer stream events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down(PointerSample),
    Move(PointerSample),
    Up(PointerSample),
    Cancel,
}

/// One finger on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Point,
    /// Reported force; styluses on some platforms report a non-zero value.
    #[serde(default)]
    pub force: f64,
}

impl TouchPoint {
    pub fn new(id: u64, position: Point) -> Self {
        Self {
            id,
            position,
            force: 0.0,
        }
    }
}

/// Touch stream events; each carries the touches still on the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TouchEvent {
    Start(Vec<TouchPoint>),
    Move(Vec<TouchPoint>),
    End(Vec<TouchPoint>),
    Cancel,
}

/// Which event stream owns a draw or erase gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputStream {
    Pointer,
    Touch,
}

/// The single active gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureMode {
    #[default]
    Idle,
    Drawing(InputStream),
    Erasing(InputStream),
    Panning,
    Pinching,
}

/// Canvas state the classification depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureContext {
    pub tool: ToolKind,
    /// Zoom above 1: a single finger pans instead of drawing.
    pub zoomed: bool,
    /// Drawing mode toggle; all input is ignored while off.
    pub enabled: bool,
}

/// What the canvas should do in response to an event.
///
/// Positions are screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureCommand {
    BeginStroke { position: Point, pressure: Option<f64> },
    ExtendStroke { position: Point, pressure: Option<f64> },
    CommitStroke,
    BeginErase { position: Point },
    EraseAt { position: Point },
    CommitErase,
    BeginPan { position: Point },
    UpdatePan { position: Point },
    /// `fling` starts momentum from the last pan velocity.
    EndPan { fling: bool },
    BeginPinch { a: Point, b: Point },
    UpdatePinch { a: Point, b: Point },
    EndPinch,
}

/// Turns pointer and touch events into gesture commands.
#[derive(Debug, Clone, Default)]
pub struct GestureDisambiguator {
    mode: GestureMode,
}

impl GestureDisambiguator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> GestureMode {
        self.mode
    }

    fn set_mode(&mut self, mode: GestureMode) {
        if self.mode != mode {
            log::debug!("Gesture {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    /// Classify a pointer stream event.
    pub fn handle_pointer(
        &mut self,
        event: &PointerEvent,
        ctx: GestureContext,
    ) -> Vec<GestureCommand> {
        if !ctx.enabled {
            return Vec::new();
        }

        let mut commands = Vec::new();
        match *event {
            PointerEvent::Down(sample) => {
                if !sample.is_accepted() || self.mode != GestureMode::Idle {
                    return commands;
                }
                self.begin_mark(
                    InputStream::Pointer,
                    sample.position,
                    sample.pressure,
                    ctx,
                    &mut commands,
                );
            }
            PointerEvent::Move(sample) => {
                if !sample.is_accepted() {
                    return commands;
                }
                match self.mode {
                    GestureMode::Drawing(InputStream::Pointer) => {
                        commands.push(GestureCommand::ExtendStroke {
                            position: sample.position,
                            pressure: sample.pressure,
                        })
                    }
                    GestureMode::Erasing(InputStream::Pointer) => {
                        commands.push(GestureCommand::EraseAt {
                            position: sample.position,
                        })
                    }
                    _ => {}
                }
            }
            PointerEvent::Up(sample) => {
                if sample.is_accepted() {
                    self.end_mark(InputStream::Pointer, &mut commands);
                }
            }
            PointerEvent::Cancel => self.end_mark(InputStream::Pointer, &mut commands),
        }
        commands
    }

    /// Classify a touch stream event.
    pub fn handle_touch(&mut self, event: &TouchEvent, ctx: GestureContext) -> Vec<GestureCommand> {
        if !ctx.enabled {
            return Vec::new();
        }

        let mut commands = Vec::new();
        if matches!(
            self.mode,
            GestureMode::Drawing(InputStream::Pointer) | GestureMode::Erasing(InputStream::Pointer)
        ) {
            return commands;
        }

        let (touches, started) = match event {
            TouchEvent::Start(touches) => (touches.as_slice(), true),
            TouchEvent::Move(touches) => (touches.as_slice(), false),
            TouchEvent::End(touches) => {
                if touches.is_empty() {
                    self.release_touch(true, &mut commands);
                    return commands;
                }
                (touches.as_slice(), false)
            }
            TouchEvent::Cancel => {
                self.release_touch(false, &mut commands);
                return commands;
            }
        };

        let lifted = matches!(event, TouchEvent::End(_));
        match touches {
            [a, b] => {
                if self.mode == GestureMode::Pinching && !started {
                    commands.push(GestureCommand::UpdatePinch {
                        a: a.position,
                        b: b.position,
                    });
                } else {
                    self.release_touch(false, &mut commands);
                    commands.push(GestureCommand::BeginPinch {
                        a: a.position,
                        b: b.position,
                    });
                    self.set_mode(GestureMode::Pinching);
                }
            }
            [touch] => {
                if !lifted && touch.force > 0.0 {
                    return commands;
                }
                self.single_touch(touch, started, ctx, &mut commands);
            }
            _ => {}
        }
        commands
    }

    fn single_touch(
        &mut self,
        touch: &TouchPoint,
        started: bool,
        ctx: GestureContext,
        commands: &mut Vec<GestureCommand>,
    ) {
        let position = touch.position;
        match self.mode {
            GestureMode::Pinching => {
                commands.push(GestureCommand::EndPinch);
                if ctx.zoomed {
                    commands.push(GestureCommand::BeginPan { position });
                    self.set_mode(GestureMode::Panning);
                } else {
                    self.set_mode(GestureMode::Idle);
                }
            }
            GestureMode::Panning if started => commands.push(GestureCommand::BeginPan { position }),
            GestureMode::Panning => commands.push(GestureCommand::UpdatePan { position }),
            GestureMode::Drawing(InputStream::Touch) if !started => {
                commands.push(GestureCommand::ExtendStroke {
                    position,
                    pressure: None,
                })
            }
            GestureMode::Erasing(InputStream::Touch) if !started => {
                commands.push(GestureCommand::EraseAt { position });
            }
            GestureMode::Idle if started => {
                if ctx.zoomed {
                    commands.push(GestureCommand::BeginPan { position });
                    self.set_mode(GestureMode::Panning);
                } else {
                    self.begin_mark(InputStream::Touch, position, None, ctx, commands);
                }
            }
            _ => {}
        }
    }

    fn begin_mark(
        &mut self,
        stream: InputStream,
        position: Point,
        pressure: Option<f64>,
        ctx: GestureContext,
        commands: &mut Vec<GestureCommand>,
    ) {
        match ctx.tool {
            ToolKind::Pen => {
                commands.push(GestureCommand::BeginStroke { position, pressure });
                self.set_mode(GestureMode::Drawing(stream));
            }
            ToolKind::Eraser => {
                commands.push(GestureCommand::BeginErase { position });
                self.set_mode(GestureMode::Erasing(stream));
            }
        }
    }

    /// Commit a draw or erase gesture owned by `stream`.
    fn end_mark(&mut self, stream: InputStream, commands: &mut Vec<GestureCommand>) {
        match self.mode {
            GestureMode::Drawing(owner) if owner == stream => {
                commands.push(GestureCommand::CommitStroke)
            }
            GestureMode::Erasing(owner) if owner == stream => {
                commands.push(GestureCommand::CommitErase)
            }
            _ => return,
        }
        self.set_mode(GestureMode::Idle);
    }

    /// Finalize whatever the touch stream owns.
    fn release_touch(&mut self, fling: bool, commands: &mut Vec<GestureCommand>) {
        match self.mode {
            GestureMode::Drawing(InputStream::Touch) | GestureMode::Erasing(InputStream::Touch) => {
                self.end_mark(InputStream::Touch, commands);
            }
            GestureMode::Panning => {
                commands.push(GestureCommand::EndPan { fling });
                self.set_mode(GestureMode::Idle);
            }
            GestureMode::Pinching => {
                commands.push(GestureCommand::EndPinch);
                self.set_mode(GestureMode::Idle);
            }
            _ => {}
        }
    }

    /// Force-finalize the active gesture, whichever stream owns it.
    pub fn finish(&mut self) -> Vec<GestureCommand> {
        let mut commands = Vec::new();
        match self.mode {
            GestureMode::Drawing(stream) | GestureMode::Erasing(stream) => {
                self.end_mark(stream, &mut commands)
            }
            GestureMode::Panning | GestureMode::Pinching => {
                self.release_touch(false, &mut commands)
            }
            GestureMode::Idle => {}
        }
        commands
    }

    /// Drop the active gesture without finalizing it.
    pub fn reset(&mut self) {
        self.set_mode(GestureMode::Idle);
    }
}
