use serde::{Deserialize, Serialize};

/// A point in a sketch plane's local (u, v) coordinates.
pub type Point2 = [f64; 2];

/// A point or vector in world coordinates.
pub type Point3 = [f64; 3];

/// World coordinate axis.
///
/// X runs across the key (width), Y runs front (-) to back (+), Z points up
/// out of the mounting face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Component index of this axis in a `[f64; 3]`.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> Point3 {
        let mut v = [0.0; 3];
        v[self.index()] = 1.0;
        v
    }

    /// Coordinate of `p` along this axis.
    pub fn coord(self, p: Point3) -> f64 {
        p[self.index()]
    }
}

/// A sketch plane: origin, in-plane u direction and normal.
/// The in-plane v direction is `normal x x_axis`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3,
    pub x_axis: Point3,
    pub normal: Point3,
}

impl Plane {
    /// Horizontal plane: u = X, v = Y, normal +Z.
    pub fn xy() -> Self {
        Self {
            origin: [0.0; 3],
            x_axis: [1.0, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
        }
    }

    /// Side plane: u = Y, v = Z, normal +X.
    pub fn yz() -> Self {
        Self {
            origin: [0.0; 3],
            x_axis: [0.0, 1.0, 0.0],
            normal: [1.0, 0.0, 0.0],
        }
    }

    /// Front plane: u = X, v = Z, normal -Y.
    pub fn xz() -> Self {
        Self {
            origin: [0.0; 3],
            x_axis: [1.0, 0.0, 0.0],
            normal: [0.0, -1.0, 0.0],
        }
    }

    /// Same plane moved by `distance` along its normal.
    pub fn offset(&self, distance: f64) -> Self {
        Self {
            origin: add(self.origin, scale(self.normal, distance)),
            ..*self
        }
    }

    pub fn y_axis(&self) -> Point3 {
        cross(self.normal, self.x_axis)
    }

    /// Map local sketch coordinates into world space.
    pub fn to_world(&self, p: Point2) -> Point3 {
        let y_axis = self.y_axis();
        add(
            self.origin,
            add(scale(self.x_axis, p[0]), scale(y_axis, p[1])),
        )
    }
}

pub fn add(a: Point3, b: Point3) -> Point3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn sub(a: Point3, b: Point3) -> Point3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn scale(a: Point3, s: f64) -> Point3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub fn dot(a: Point3, b: Point3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: Point3, b: Point3) -> Point3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn length(a: Point3) -> f64 {
    dot(a, a).sqrt()
}

/// Unit vector along `a`, or `None` for a (near) zero vector.
pub fn normalize(a: Point3) -> Option<Point3> {
    let len = length(a);
    if len < 1e-12 {
        None
    } else {
        Some(scale(a, 1.0 / len))
    }
}

pub fn distance(a: Point3, b: Point3) -> f64 {
    length(sub(a, b))
}
