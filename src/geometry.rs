use std::f64::consts::TAU;
use std::fmt::{self, Display};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

pub type Point = Vector3<f64>;

/// Identifier of a detector volume, e.g. a calorimeter block
#[derive(Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub struct GeomId {
    pub kind: u32,
    pub address: Vec<u32>,
}

impl GeomId {
    pub fn new(kind: u32, address: impl Into<Vec<u32>>) -> Self {
        Self {
            kind,
            address: address.into(),
        }
    }
}

impl Display for GeomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:", self.kind)?;
        for (n, a) in self.address.iter().enumerate() {
            if n > 0 {
                write!(f, ".")?;
            }
            write!(f, "{a}")?;
        }
        write!(f, "]")
    }
}

/// Number of axes along which a blur spot is smeared
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub enum BlurDimension {
    #[default]
    Zero,
    One,
    Two,
    Three,
}

impl BlurDimension {
    pub fn rank(self) -> u8 {
        match self {
            BlurDimension::Zero => 0,
            BlurDimension::One => 1,
            BlurDimension::Two => 2,
            BlurDimension::Three => 3,
        }
    }

    /// Indices of the smeared axes
    pub fn axes(self) -> std::ops::Range<usize> {
        0..self.rank() as usize
    }
}

/// A point estimate with per-axis uncertainty
#[derive(Copy, Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct BlurSpot {
    pub position: Point,
    #[serde(default)]
    pub errors: Vector3<f64>,
    #[serde(default)]
    pub dimension: BlurDimension,
}

impl BlurSpot {
    pub fn at(position: Point) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_errors(position: Point, errors: Vector3<f64>) -> Self {
        Self {
            position,
            errors,
            dimension: BlurDimension::Three,
        }
    }
}

/// A fitted trajectory shape
pub trait Shape {
    fn length(&self) -> f64;

    /// Unit tangent at the point of the shape closest to `point`
    ///
    /// The tangent is oriented from the start to the end of the shape.
    fn direction_at(&self, point: &Point) -> Point;
}

#[derive(Copy, Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct LineSegment {
    pub first: Point,
    pub last: Point,
}

impl LineSegment {
    pub fn new(first: Point, last: Point) -> Self {
        Self { first, last }
    }
}

impl Shape for LineSegment {
    fn length(&self) -> f64 {
        (self.last - self.first).norm()
    }

    fn direction_at(&self, _point: &Point) -> Point {
        (self.last - self.first).normalize()
    }
}

/// Helix with its axis along z
///
/// The curve is parametrised in turns `t` as
/// `center + (r cos 2πt, r sin 2πt, step t)` for `t` between `t1` and
/// `t2`.
#[derive(Copy, Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct Helix {
    pub center: Point,
    pub radius: f64,
    pub step: f64,
    pub t1: f64,
    pub t2: f64,
}

impl Helix {
    pub fn point_at(&self, t: f64) -> Point {
        let phi = TAU * t;
        self.center
            + Point::new(
                self.radius * phi.cos(),
                self.radius * phi.sin(),
                self.step * t,
            )
    }

    fn closest_parameter(&self, point: &Point) -> f64 {
        let rel = point - self.center;
        let turn = rel.y.atan2(rel.x) / TAU;
        let t = if self.step != 0. {
            turn + (rel.z / self.step - turn).round()
        } else {
            turn + (0.5 * (self.t1 + self.t2) - turn).round()
        };
        t.clamp(self.t1.min(self.t2), self.t1.max(self.t2))
    }
}

impl Shape for Helix {
    fn length(&self) -> f64 {
        let per_turn = (TAU * self.radius).hypot(self.step);
        (self.t2 - self.t1).abs() * per_turn
    }

    fn direction_at(&self, point: &Point) -> Point {
        let t = self.closest_parameter(point);
        let phi = TAU * t;
        let tangent = Point::new(
            -TAU * self.radius * phi.sin(),
            TAU * self.radius * phi.cos(),
            self.step,
        );
        let orientation = if self.t2 >= self.t1 { 1. } else { -1. };
        orientation * tangent.normalize()
    }
}

#[derive(Copy, Clone, PartialEq, Debug, Deserialize, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Trajectory {
    Line(LineSegment),
    Helix(Helix),
}

impl Shape for Trajectory {
    fn length(&self) -> f64 {
        match self {
            Trajectory::Line(l) => l.length(),
            Trajectory::Helix(h) => h.length(),
        }
    }

    fn direction_at(&self, point: &Point) -> Point {
        match self {
            Trajectory::Line(l) => l.direction_at(point),
            Trajectory::Helix(h) => h.direction_at(point),
        }
    }
}

impl From<LineSegment> for Trajectory {
    fn from(l: LineSegment) -> Self {
        Trajectory::Line(l)
    }
}

impl From<Helix> for Trajectory {
    fn from(h: Helix) -> Self {
        Trajectory::Helix(h)
    }
}

/// Resolves the position of a calorimeter block from its identifier
pub trait CalorimeterLocator {
    fn block_position(&self, id: &GeomId) -> Option<Point>;
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct BlockPosition {
    pub geom_id: GeomId,
    pub position: Point,
}

/// Table of known calorimeter block positions
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct BlockPositions(pub Vec<BlockPosition>);

impl CalorimeterLocator for BlockPositions {
    fn block_position(&self, id: &GeomId) -> Option<Point> {
        self.0
            .iter()
            .find(|b| &b.geom_id == id)
            .map(|b| b.position)
    }
}
