use crate::utils::{Pose, Position, Size};
use std::ops::Mul;

/// Column-major 4x4 matrix, laid out the way WGSL expects `mat4x4<f32>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Orthographic projection with the origin at the top-left corner of the
    /// viewport and Y increasing downward.
    pub fn ortho_top_left(viewport: Size) -> Self {
        let width = viewport.width.max(1.0);
        let height = viewport.height.max(1.0);
        Mat4 {
            cols: [
                [2.0 / width, 0.0, 0.0, 0.0],
                [0.0, -2.0 / height, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [-1.0, 1.0, 0.0, 1.0],
            ],
        }
    }

    pub fn translation(x: f32, y: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3][0] = x;
        m.cols[3][1] = y;
        m
    }

    pub fn scale(x: f32, y: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0][0] = x;
        m.cols[1][1] = y;
        m
    }

    /// Rotation about Z. With Y pointing down, positive angles turn clockwise.
    pub fn rotation_z(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let mut m = Self::IDENTITY;
        m.cols[0][0] = cos;
        m.cols[0][1] = sin;
        m.cols[1][0] = -sin;
        m.cols[1][1] = cos;
        m
    }

    pub fn transform_point(&self, p: Position) -> Position {
        let c = &self.cols;
        let x = c[0][0] * p.x + c[1][0] * p.y + c[3][0];
        let y = c[0][1] * p.x + c[1][1] * p.y + c[3][1];
        let w = c[0][3] * p.x + c[1][3] * p.y + c[3][3];
        if w != 0.0 && w != 1.0 {
            Position::new(x / w, y / w)
        } else {
            Position::new(x, y)
        }
    }

    pub fn to_cols_array_2d(self) -> [[f32; 4]; 4] {
        self.cols
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for (col, out_col) in out.iter_mut().enumerate() {
            for (row, value) in out_col.iter_mut().enumerate() {
                *value = (0..4).map(|k| self.cols[k][row] * rhs.cols[col][k]).sum();
            }
        }
        Mat4 { cols: out }
    }
}

/// Model matrix for a pose: scale to `width x height`, rotate, then move to `(x, y)`.
/// Meshes are unit sized and centred on the origin, so the pose position is the centre.
pub fn pose_matrix(pose: &Pose) -> Mat4 {
    Mat4::translation(pose.x, pose.y)
        * Mat4::rotation_z(pose.rotation)
        * Mat4::scale(pose.width, pose.height)
}

/// Local transform stack, reset to identity at the start of every frame.
#[derive(Debug, Clone)]
pub struct TransformStack {
    stack: Vec<Mat4>,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformStack {
    pub fn new() -> Self {
        Self {
            stack: vec![Mat4::IDENTITY],
        }
    }

    pub fn reset(&mut self) {
        self.stack.clear();
        self.stack.push(Mat4::IDENTITY);
    }

    pub fn top(&self) -> Mat4 {
        self.stack.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push(&mut self) {
        let top = self.top();
        self.stack.push(top);
    }

    /// Pops the current transform. The root identity is never popped.
    pub fn pop(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            log::warn!("pop_transform called with an empty transform stack");
            false
        }
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.apply(Mat4::translation(x, y));
    }

    pub fn rotate(&mut self, degrees: f32) {
        self.apply(Mat4::rotation_z(degrees));
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.apply(Mat4::scale(x, y));
    }

    fn apply(&mut self, m: Mat4) {
        if let Some(top) = self.stack.last_mut() {
            *top = *top * m;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Color;

    fn approx(a: Position, b: Position) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    #[test]
    fn ortho_maps_corners_to_clip_space() {
        let p = Mat4::ortho_top_left(Size::new(400.0, 300.0));
        assert!(approx(p.transform_point(Position::new(0.0, 0.0)), Position::new(-1.0, 1.0)));
        assert!(approx(p.transform_point(Position::new(400.0, 300.0)), Position::new(1.0, -1.0)));
        assert!(approx(p.transform_point(Position::new(200.0, 150.0)), Position::new(0.0, 0.0)));
    }

    #[test]
    fn rotation_turns_clockwise_on_screen() {
        let r = Mat4::rotation_z(90.0);
        // +X rotates onto +Y, which points down on screen.
        assert!(approx(r.transform_point(Position::new(1.0, 0.0)), Position::new(0.0, 1.0)));
    }

    #[test]
    fn pose_matrix_places_unit_corners() {
        let pose = Pose::new(200.0, 150.0, 40.0, 20.0, Color::RED);
        let m = pose_matrix(&pose);
        assert!(approx(m.transform_point(Position::new(-0.5, -0.5)), Position::new(180.0, 140.0)));
        assert!(approx(m.transform_point(Position::new(0.5, 0.5)), Position::new(220.0, 160.0)));
    }

    #[test]
    fn stack_push_pop_restores_previous_top() {
        let mut stack = TransformStack::new();
        stack.translate(10.0, 0.0);
        stack.push();
        stack.translate(5.0, 5.0);
        assert!(approx(stack.top().transform_point(Position::default()), Position::new(15.0, 5.0)));
        assert!(stack.pop());
        assert!(approx(stack.top().transform_point(Position::default()), Position::new(10.0, 0.0)));
        assert!(!stack.pop());
        stack.reset();
        assert_eq!(stack.top(), Mat4::IDENTITY);
        assert_eq!(stack.depth(), 1);
    }
}
