// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing surface contract and a recording implementation of it.

mod renderers;

pub use renderers::{NullRenderer, PathRenderer, PolygonRenderer, Renderer, TileRenderer};

use kurbo::{Point, Rect, Vec2};

use crate::tiles::Snapshot;

/// The 2D drawing surface the map renders onto.
///
/// Pixel formats, anti-aliasing, and styling belong to the implementation.
pub trait Context2d {
    /// Draw the `src` pixels of `snapshot` into `dst`.
    fn draw_image(&mut self, snapshot: &Snapshot, src: Rect, dst: Rect);
    /// Push the transform state.
    fn save(&mut self);
    /// Pop the transform state.
    fn restore(&mut self);
    /// Translate subsequent drawing.
    fn translate(&mut self, offset: Vec2);
    /// Uniformly scale subsequent drawing.
    fn scale(&mut self, factor: f64);
    /// Start a new path.
    fn begin_path(&mut self);
    /// Start a subpath.
    fn move_to(&mut self, p: Point);
    /// Extend the current subpath.
    fn line_to(&mut self, p: Point);
    /// Close the current subpath.
    fn close_path(&mut self);
    /// Fill the current path.
    fn fill(&mut self);
    /// Stroke the current path.
    fn stroke(&mut self);
}

/// One recorded [`Context2d`] call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// [`Context2d::draw_image`].
    Image {
        /// Source content.
        snapshot: Snapshot,
        /// Source pixels.
        src: Rect,
        /// Destination pixels.
        dst: Rect,
    },
    /// [`Context2d::save`].
    Save,
    /// [`Context2d::restore`].
    Restore,
    /// [`Context2d::translate`].
    Translate(Vec2),
    /// [`Context2d::scale`].
    Scale(f64),
    /// [`Context2d::begin_path`].
    BeginPath,
    /// [`Context2d::move_to`].
    MoveTo(Point),
    /// [`Context2d::line_to`].
    LineTo(Point),
    /// [`Context2d::close_path`].
    ClosePath,
    /// [`Context2d::fill`].
    Fill,
    /// [`Context2d::stroke`].
    Stroke,
}

/// A [`Context2d`] that records calls for later replay.
///
/// The render system draws a frame into a display list, and the host replays
/// it onto its real surface.
#[derive(Clone, Debug, Default)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded commands in order.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Forget all commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Issue every recorded command on `ctx`.
    pub fn replay(&self, ctx: &mut dyn Context2d) {
        for command in &self.commands {
            match command {
                DrawCommand::Image { snapshot, src, dst } => ctx.draw_image(snapshot, *src, *dst),
                DrawCommand::Save => ctx.save(),
                DrawCommand::Restore => ctx.restore(),
                DrawCommand::Translate(v) => ctx.translate(*v),
                DrawCommand::Scale(s) => ctx.scale(*s),
                DrawCommand::BeginPath => ctx.begin_path(),
                DrawCommand::MoveTo(p) => ctx.move_to(*p),
                DrawCommand::LineTo(p) => ctx.line_to(*p),
                DrawCommand::ClosePath => ctx.close_path(),
                DrawCommand::Fill => ctx.fill(),
                DrawCommand::Stroke => ctx.stroke(),
            }
        }
    }
}

impl Context2d for DisplayList {
    fn draw_image(&mut self, snapshot: &Snapshot, src: Rect, dst: Rect) {
        self.commands.push(DrawCommand::Image {
            snapshot: snapshot.clone(),
            src,
            dst,
        });
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn translate(&mut self, offset: Vec2) {
        self.commands.push(DrawCommand::Translate(offset));
    }

    fn scale(&mut self, factor: f64) {
        self.commands.push(DrawCommand::Scale(factor));
    }

    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, p: Point) {
        self.commands.push(DrawCommand::MoveTo(p));
    }

    fn line_to(&mut self, p: Point) {
        self.commands.push(DrawCommand::LineTo(p));
    }

    fn close_path(&mut self) {
        self.commands.push(DrawCommand::ClosePath);
    }

    fn fill(&mut self) {
        self.commands.push(DrawCommand::Fill);
    }

    fn stroke(&mut self) {
        self.commands.push(DrawCommand::Stroke);
    }
}
