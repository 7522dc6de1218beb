//! Plain-data math types shared with the engine.
//!
//! Layouts match the engine's single-precision builds. Only the operations
//! the glue and its callers need are provided here.

use std::ops::{Add, Mul, Neg, Sub};

// ============================================================================
// Vectors
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2::new(0.0, 0.0);
    pub const ONE: Vector2 = Vector2::new(1.0, 1.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vector2i {
    pub x: i32,
    pub y: i32,
}

impl Vector2i {
    pub const ZERO: Vector2i = Vector2i::new(0, 0);
    pub const ONE: Vector2i = Vector2i::new(1, 1);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3::new(0.0, 0.0, 0.0);
    pub const ONE: Vector3 = Vector3::new(1.0, 1.0, 1.0);
    pub const UP: Vector3 = Vector3::new(0.0, 1.0, 0.0);
    pub const DOWN: Vector3 = Vector3::new(0.0, -1.0, 0.0);
    pub const FORWARD: Vector3 = Vector3::new(0.0, 0.0, -1.0);
    pub const RIGHT: Vector3 = Vector3::new(1.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vector3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vector3) -> Vector3 {
        Vector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    pub fn normalized(self) -> Vector3 {
        let len = self.length();
        if len == 0.0 { Vector3::ZERO } else { self * (1.0 / len) }
    }

    pub fn distance_to(self, other: Vector3) -> f32 {
        (other - self).length()
    }
}

impl Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vector3 {
    type Output = Vector3;

    fn mul(self, rhs: f32) -> Vector3 {
        Vector3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;

    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vector3i {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Vector3i {
    pub const ZERO: Vector3i = Vector3i::new(0, 0, 0);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

// ============================================================================
// Rectangles and colors
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect2 {
    pub position: Vector2,
    pub size: Vector2,
}

impl Rect2 {
    pub const fn new(position: Vector2, size: Vector2) -> Self {
        Self { position, size }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect2i {
    pub position: Vector2i,
    pub size: Vector2i,
}

impl Rect2i {
    pub const fn new(position: Vector2i, size: Vector2i) -> Self {
        Self { position, size }
    }

    pub const fn end(self) -> Vector2i {
        Vector2i::new(self.position.x + self.size.x, self.position.y + self.size.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

// ============================================================================
// Transforms
// ============================================================================

/// 3x3 matrix stored as rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    pub rows: [Vector3; 3],
}

impl Basis {
    pub const IDENTITY: Basis = Basis::from_rows(Vector3::RIGHT, Vector3::UP, Vector3::new(0.0, 0.0, 1.0));

    pub const fn from_rows(x: Vector3, y: Vector3, z: Vector3) -> Self {
        Self { rows: [x, y, z] }
    }

    pub const fn from_scale(scale: Vector3) -> Self {
        Self::from_rows(
            Vector3::new(scale.x, 0.0, 0.0),
            Vector3::new(0.0, scale.y, 0.0),
            Vector3::new(0.0, 0.0, scale.z),
        )
    }

    pub fn xform(&self, v: Vector3) -> Vector3 {
        Vector3::new(self.rows[0].dot(v), self.rows[1].dot(v), self.rows[2].dot(v))
    }
}

impl Default for Basis {
    fn default() -> Self {
        Basis::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    pub x: Vector2,
    pub y: Vector2,
    pub origin: Vector2,
}

impl Transform2D {
    pub const IDENTITY: Transform2D = Transform2D::new(Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0), Vector2::ZERO);

    pub const fn new(x: Vector2, y: Vector2, origin: Vector2) -> Self {
        Self { x, y, origin }
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Transform2D::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    pub basis: Basis,
    pub origin: Vector3,
}

impl Transform3D {
    pub const IDENTITY: Transform3D = Transform3D::new(Basis::IDENTITY, Vector3::ZERO);

    pub const fn new(basis: Basis, origin: Vector3) -> Self {
        Self { basis, origin }
    }

    pub const fn from_origin(origin: Vector3) -> Self {
        Self::new(Basis::IDENTITY, origin)
    }

    pub fn translated(self, offset: Vector3) -> Self {
        Self::new(self.basis, self.origin + offset)
    }

    pub fn xform(&self, v: Vector3) -> Vector3 {
        self.basis.xform(v) + self.origin
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Transform3D::IDENTITY
    }
}
